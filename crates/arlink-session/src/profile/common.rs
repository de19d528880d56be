use arlink_command::catalog::common::{
    BatteryStateChanged, CurrentDateChanged, CurrentTimeChanged, OutdoorSettingsChanged,
    ProductNameChanged, ProductSerialHighChanged, ProductSerialLowChanged, ProductVersionChanged,
    WifiSignalChanged,
};
use arlink_command::Command;

use super::DeviceProfile;
use crate::state::{update, DeviceState};

/// State every wifi device reports: identity, clock, battery and signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonProfile;

impl DeviceProfile for CommonProfile {
    fn name(&self) -> &'static str {
        "common"
    }

    fn apply(&self, command: &dyn Command, state: &mut DeviceState) -> bool {
        if let Some(cmd) = command.downcast_ref::<WifiSignalChanged>() {
            update(&mut state.rssi_dbm, Some(cmd.rssi))
        } else if let Some(cmd) = command.downcast_ref::<OutdoorSettingsChanged>() {
            update(&mut state.outdoor_wifi, Some(cmd.outdoor == 1))
        } else if let Some(cmd) = command.downcast_ref::<BatteryStateChanged>() {
            update(&mut state.battery_percent, Some(cmd.percent))
        } else if let Some(cmd) = command.downcast_ref::<ProductNameChanged>() {
            update(&mut state.identity.name, Some(cmd.name.clone()))
        } else if let Some(cmd) = command.downcast_ref::<ProductVersionChanged>() {
            update(
                &mut state.identity.software_version,
                Some(cmd.software.clone()),
            ) | update(
                &mut state.identity.hardware_version,
                Some(cmd.hardware.clone()),
            )
        } else if let Some(cmd) = command.downcast_ref::<ProductSerialHighChanged>() {
            update(&mut state.identity.serial_high, Some(cmd.high.clone()))
        } else if let Some(cmd) = command.downcast_ref::<ProductSerialLowChanged>() {
            update(&mut state.identity.serial_low, Some(cmd.low.clone()))
        } else if let Some(cmd) = command.downcast_ref::<CurrentDateChanged>() {
            update(&mut state.system_date, Some(cmd.date.clone()))
        } else if let Some(cmd) = command.downcast_ref::<CurrentTimeChanged>() {
            update(&mut state.system_time, Some(cmd.time.clone()))
        } else {
            false
        }
    }
}
