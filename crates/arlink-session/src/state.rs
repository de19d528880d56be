use std::time::Duration;

use serde::{Serialize, Serializer};

use arlink_command::catalog::ardrone3::{FlyingState, HomeType};

/// Health of the UDP link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Connected,
    /// The socket failed; no more datagrams will be received.
    Degraded,
    #[default]
    Disconnected,
}

/// A setting with the range the device accepts for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounded {
    pub current: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductIdentity {
    pub name: Option<String>,
    pub software_version: Option<String>,
    pub hardware_version: Option<String>,
    pub serial_high: Option<String>,
    pub serial_low: Option<String>,
}

impl ProductIdentity {
    /// Full serial number, once both halves are known.
    pub fn serial_number(&self) -> Option<String> {
        match (&self.serial_high, &self.serial_low) {
            (Some(high), Some(low)) => Some(format!("{high}{low}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub roll_rad: f32,
    pub pitch_rad: f32,
    pub yaw_rad: f32,
}

/// Speed in the north-east-down frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NedSpeed {
    pub north_mps: f32,
    pub east_mps: f32,
    pub down_mps: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

/// Live flight telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub flying_state: Option<FlyingState>,
    /// Altitude above the take-off point.
    pub altitude_m: Option<f64>,
    pub attitude: Option<Attitude>,
    pub speed: Option<NedSpeed>,
    pub position: Option<GpsPosition>,
}

/// Flight envelope settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightLimits {
    pub altitude_ceiling_m: Option<Bounded>,
    pub max_distance_m: Option<Bounded>,
    /// Whether the device refuses to fly beyond the max distance.
    pub geofence_enabled: Option<bool>,
    pub max_climb_rate_mps: Option<Bounded>,
    #[serde(serialize_with = "serialize_secs")]
    pub return_home_delay: Option<Duration>,
    pub home_type: Option<HomeType>,
}

/// Everything known about the device, published by the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    pub link: LinkStatus,
    #[serde(rename = "round_trip_ms", serialize_with = "serialize_millis")]
    pub round_trip_time: Option<Duration>,
    pub rssi_dbm: Option<i16>,
    pub outdoor_wifi: Option<bool>,
    pub battery_percent: Option<u8>,
    pub system_date: Option<String>,
    pub system_time: Option<String>,
    pub identity: ProductIdentity,
    pub telemetry: Telemetry,
    pub limits: FlightLimits,
}

fn serialize_millis<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.as_micros() as f64 / 1000.0)),
        None => serializer.serialize_none(),
    }
}

fn serialize_secs<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&d.as_secs()),
        None => serializer.serialize_none(),
    }
}

/// Store `value` in `slot`, reporting whether it changed.
pub(crate) fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_needs_both_halves() {
        let mut identity = ProductIdentity {
            serial_high: Some("PI0404".into()),
            ..ProductIdentity::default()
        };
        assert_eq!(identity.serial_number(), None);
        identity.serial_low = Some("37AA".into());
        assert_eq!(identity.serial_number().as_deref(), Some("PI040437AA"));
    }

    #[test]
    fn update_reports_change() {
        let mut slot = Some(3u8);
        assert!(!update(&mut slot, Some(3)));
        assert!(update(&mut slot, Some(4)));
        assert_eq!(slot, Some(4));
    }

    #[test]
    fn json_shape() {
        let state = DeviceState {
            link: LinkStatus::Connected,
            round_trip_time: Some(Duration::from_micros(2500)),
            telemetry: Telemetry {
                flying_state: Some(FlyingState::Hovering),
                ..Telemetry::default()
            },
            limits: FlightLimits {
                return_home_delay: Some(Duration::from_secs(60)),
                home_type: Some(HomeType::Pilot),
                ..FlightLimits::default()
            },
            ..DeviceState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["link"], "connected");
        assert_eq!(json["round_trip_ms"], 2.5);
        assert_eq!(json["telemetry"]["flying_state"], "hovering");
        assert_eq!(json["limits"]["return_home_delay"], 60);
        assert_eq!(json["limits"]["home_type"], "PILOT");
        assert!(json["battery_percent"].is_null());
    }
}
