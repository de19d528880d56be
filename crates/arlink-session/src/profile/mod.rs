//! Device profiles fold decoded commands into [`DeviceState`].
//!
//! A session runs every profile on every inbound command, so capabilities
//! compose: a Bebop session carries both the common and the Bebop profile.

pub mod bebop;
pub mod common;

use arlink_command::Command;

use crate::state::DeviceState;

pub use bebop::BebopProfile;
pub use common::CommonProfile;

/// Updates device state from the commands it understands.
pub trait DeviceProfile: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply `command` to `state`; returns true if anything changed.
    fn apply(&self, command: &dyn Command, state: &mut DeviceState) -> bool;
}

/// Profiles for a Bebop-class drone.
pub fn default_profiles() -> Vec<Box<dyn DeviceProfile>> {
    vec![Box::new(CommonProfile), Box::new(BebopProfile)]
}

/// Run every profile on `command`.
pub fn apply_all(
    profiles: &[Box<dyn DeviceProfile>],
    command: &dyn Command,
    state: &mut DeviceState,
) -> bool {
    profiles
        .iter()
        .fold(false, |changed, profile| profile.apply(command, state) | changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arlink_command::catalog::ardrone3::AltitudeChanged;
    use arlink_command::catalog::common::BatteryStateChanged;

    #[test]
    fn default_profiles_cover_common_and_bebop() {
        let profiles = default_profiles();
        let names: Vec<_> = profiles.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["common", "bebop"]);

        let mut state = DeviceState::default();
        assert!(apply_all(&profiles, &BatteryStateChanged { percent: 40 }, &mut state));
        assert!(apply_all(&profiles, &AltitudeChanged { altitude: 3.0 }, &mut state));
        assert_eq!(state.battery_percent, Some(40));
        assert_eq!(state.telemetry.altitude_m, Some(3.0));

        assert!(!apply_all(&profiles, &BatteryStateChanged { percent: 40 }, &mut state));
    }
}
