//! Bebop-class drones: flight telemetry, flight envelope, and the piloting
//! intents a controller issues.

use std::time::Duration;

use arlink_command::catalog::ardrone3::{
    AltitudeChanged, AttitudeChanged, Emergency, FlyingStateChanged, HomeTypeChanged, Landing,
    MaxAltitudeChanged, MaxDistance, MaxDistanceChanged, MaxVerticalSpeedChanged,
    NoFlyOverMaxDistanceChanged, PositionChanged, ReturnHomeDelayChanged, SpeedChanged, TakeOff,
};
use arlink_command::Command;

use super::DeviceProfile;
use crate::error::Result;
use crate::session::Session;
use crate::state::{update, Attitude, Bounded, DeviceState, GpsPosition, NedSpeed};

/// Coordinate the device reports while it has no GPS fix.
const POSITION_UNAVAILABLE: f64 = 500.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BebopProfile;

impl DeviceProfile for BebopProfile {
    fn name(&self) -> &'static str {
        "bebop"
    }

    fn apply(&self, command: &dyn Command, state: &mut DeviceState) -> bool {
        let telemetry = &mut state.telemetry;
        let limits = &mut state.limits;

        if let Some(cmd) = command.downcast_ref::<SpeedChanged>() {
            let speed = NedSpeed {
                north_mps: cmd.speed_x,
                east_mps: cmd.speed_y,
                down_mps: cmd.speed_z,
            };
            update(&mut telemetry.speed, Some(speed))
        } else if let Some(cmd) = command.downcast_ref::<AltitudeChanged>() {
            update(&mut telemetry.altitude_m, Some(cmd.altitude))
        } else if let Some(cmd) = command.downcast_ref::<AttitudeChanged>() {
            let attitude = Attitude {
                roll_rad: cmd.roll,
                pitch_rad: cmd.pitch,
                yaw_rad: cmd.yaw,
            };
            update(&mut telemetry.attitude, Some(attitude))
        } else if let Some(cmd) = command.downcast_ref::<PositionChanged>() {
            let position = (cmd.latitude != POSITION_UNAVAILABLE
                && cmd.longitude != POSITION_UNAVAILABLE)
                .then_some(GpsPosition {
                    latitude: cmd.latitude,
                    longitude: cmd.longitude,
                    altitude_m: cmd.altitude,
                });
            update(&mut telemetry.position, position)
        } else if let Some(cmd) = command.downcast_ref::<FlyingStateChanged>() {
            update(&mut telemetry.flying_state, Some(cmd.state))
        } else if let Some(cmd) = command.downcast_ref::<MaxAltitudeChanged>() {
            update(
                &mut limits.altitude_ceiling_m,
                Some(Bounded {
                    current: cmd.current,
                    min: cmd.min,
                    max: cmd.max,
                }),
            )
        } else if let Some(cmd) = command.downcast_ref::<MaxDistanceChanged>() {
            update(
                &mut limits.max_distance_m,
                Some(Bounded {
                    current: cmd.current,
                    min: cmd.min,
                    max: cmd.max,
                }),
            )
        } else if let Some(cmd) = command.downcast_ref::<NoFlyOverMaxDistanceChanged>() {
            update(&mut limits.geofence_enabled, Some(cmd.should_not_fly_over == 1))
        } else if let Some(cmd) = command.downcast_ref::<MaxVerticalSpeedChanged>() {
            update(
                &mut limits.max_climb_rate_mps,
                Some(Bounded {
                    current: cmd.current,
                    min: cmd.min,
                    max: cmd.max,
                }),
            )
        } else if let Some(cmd) = command.downcast_ref::<ReturnHomeDelayChanged>() {
            update(
                &mut limits.return_home_delay,
                Some(Duration::from_secs(u64::from(cmd.delay))),
            )
        } else if let Some(cmd) = command.downcast_ref::<HomeTypeChanged>() {
            update(&mut limits.home_type, Some(cmd.home_type))
        } else {
            false
        }
    }
}

/// Take off. Returns whether the device acknowledged the request.
pub async fn take_off(session: &Session) -> Result<bool> {
    session.send_reliable(&TakeOff {}).await
}

/// Land. Returns whether the device acknowledged the request.
pub async fn land(session: &Session) -> Result<bool> {
    session.send_reliable(&Landing {}).await
}

/// Cut the motors immediately, on the emergency channel.
pub async fn emergency(session: &Session) -> Result<bool> {
    session.send_emergency(&Emergency {}).await
}

/// Set how far from home the device may fly.
pub async fn set_max_distance(session: &Session, meters: f32) -> Result<bool> {
    session.send_reliable(&MaxDistance { value: meters }).await
}
