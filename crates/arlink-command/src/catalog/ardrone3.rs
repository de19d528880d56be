//! Feature 1: piloting commands and flight state reports.
//!
//! Distances are meters, speeds meters per second, angles radians.

use crate::registry::CommandRegistry;
use crate::{define_command, define_enum};

define_enum! {
    /// Flight state reported by the device.
    pub enum FlyingState {
        Landed = 0 as "landed",
        TakingOff = 1 as "takingoff",
        Hovering = 2 as "hovering",
        Flying = 3 as "flying",
        Landing = 4 as "landing",
        Emergency = 5 as "emergency",
        /// Waiting for a hand launch.
        UserTakeOff = 6 as "usertakeoff",
        MotorRamping = 7 as "motor_ramping",
        EmergencyLanding = 8 as "emergency_landing",
    }
}

define_enum! {
    /// Where the device returns to when it goes home.
    pub enum HomeType {
        TakeOff = 0 as "TAKEOFF",
        Pilot = 1 as "PILOT",
        Followee = 2 as "FOLLOWEE",
    }
}

define_command! {
    pub struct TakeOff = (1, 0, 1) as "ardrone3.Piloting.TakeOff" {}
}

define_command! {
    pub struct Landing = (1, 0, 3) as "ardrone3.Piloting.Landing" {}
}

define_command! {
    /// Cut the motors immediately.
    pub struct Emergency = (1, 0, 4) as "ardrone3.Piloting.Emergency" {}
}

define_command! {
    pub struct MaxAltitude = (1, 2, 0) as "ardrone3.PilotingSettings.MaxAltitude" {
        current: f32,
    }
}

define_command! {
    /// Set the maximum distance from home.
    pub struct MaxDistance = (1, 2, 3) as "ardrone3.PilotingSettings.MaxDistance" {
        value: f32,
    }
}

define_command! {
    /// Enable (1) or disable (0) the geofence.
    pub struct NoFlyOverMaxDistance = (1, 2, 4) as "ardrone3.PilotingSettings.NoFlyOverMaxDistance" {
        should_not_fly_over: u8,
    }
}

define_command! {
    pub struct FlyingStateChanged = (1, 4, 1) as "ardrone3.PilotingState.FlyingStateChanged" {
        state: FlyingState,
    }
}

define_command! {
    /// GPS position; 500.0 in every field means unavailable.
    pub struct PositionChanged = (1, 4, 4) as "ardrone3.PilotingState.PositionChanged" {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    }
}

define_command! {
    /// Speed in the NED frame.
    pub struct SpeedChanged = (1, 4, 5) as "ardrone3.PilotingState.SpeedChanged" {
        speed_x: f32,
        speed_y: f32,
        speed_z: f32,
    }
}

define_command! {
    pub struct AttitudeChanged = (1, 4, 6) as "ardrone3.PilotingState.AttitudeChanged" {
        roll: f32,
        pitch: f32,
        yaw: f32,
    }
}

define_command! {
    /// Altitude above the take-off point.
    pub struct AltitudeChanged = (1, 4, 8) as "ardrone3.PilotingState.AltitudeChanged" {
        altitude: f64,
    }
}

define_command! {
    pub struct MaxAltitudeChanged = (1, 6, 0) as "ardrone3.PilotingSettingsState.MaxAltitudeChanged" {
        current: f32,
        min: f32,
        max: f32,
    }
}

define_command! {
    pub struct MaxDistanceChanged = (1, 6, 3) as "ardrone3.PilotingSettingsState.MaxDistanceChanged" {
        current: f32,
        min: f32,
        max: f32,
    }
}

define_command! {
    pub struct NoFlyOverMaxDistanceChanged = (1, 6, 4) as "ardrone3.PilotingSettingsState.NoFlyOverMaxDistanceChanged" {
        should_not_fly_over: u8,
    }
}

define_command! {
    pub struct MaxVerticalSpeedChanged = (1, 12, 0) as "ardrone3.SpeedSettingsState.MaxVerticalSpeedChanged" {
        current: f32,
        min: f32,
        max: f32,
    }
}

define_command! {
    pub struct HomeTypeChanged = (1, 24, 4) as "ardrone3.GPSSettingsState.HomeTypeChanged" {
        home_type: HomeType,
    }
}

define_command! {
    /// Seconds the device waits after losing the link before returning home.
    pub struct ReturnHomeDelayChanged = (1, 24, 5) as "ardrone3.GPSSettingsState.ReturnHomeDelayChanged" {
        delay: u16,
    }
}

pub(crate) fn register(registry: &mut CommandRegistry) {
    registry
        .register::<TakeOff>()
        .register::<Landing>()
        .register::<Emergency>()
        .register::<MaxAltitude>()
        .register::<MaxDistance>()
        .register::<NoFlyOverMaxDistance>()
        .register::<FlyingStateChanged>()
        .register::<PositionChanged>()
        .register::<SpeedChanged>()
        .register::<AttitudeChanged>()
        .register::<AltitudeChanged>()
        .register::<MaxAltitudeChanged>()
        .register::<MaxDistanceChanged>()
        .register::<NoFlyOverMaxDistanceChanged>()
        .register::<MaxVerticalSpeedChanged>()
        .register::<HomeTypeChanged>()
        .register::<ReturnHomeDelayChanged>();
}
