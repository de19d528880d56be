//! Feature 0: commands shared by every device.

use crate::define_command;
use crate::registry::CommandRegistry;

define_command! {
    /// Ask the device to report all of its settings.
    pub struct AllSettings = (0, 2, 0) as "common.Settings.AllSettings" {}
}

define_command! {
    /// Ask the device to report all of its states.
    pub struct AllStates = (0, 4, 0) as "common.Common.AllStates" {}
}

define_command! {
    pub struct ProductNameChanged = (0, 3, 2) as "common.SettingsState.ProductNameChanged" {
        name: String,
    }
}

define_command! {
    pub struct ProductVersionChanged = (0, 3, 3) as "common.SettingsState.ProductVersionChanged" {
        software: String,
        hardware: String,
    }
}

define_command! {
    /// First half of the serial number.
    pub struct ProductSerialHighChanged = (0, 3, 4) as "common.SettingsState.ProductSerialHighChanged" {
        high: String,
    }
}

define_command! {
    /// Second half of the serial number.
    pub struct ProductSerialLowChanged = (0, 3, 5) as "common.SettingsState.ProductSerialLowChanged" {
        low: String,
    }
}

define_command! {
    pub struct BatteryStateChanged = (0, 5, 1) as "common.CommonState.BatteryStateChanged" {
        /// Remaining charge, 0..=100.
        percent: u8,
    }
}

define_command! {
    /// Device date in ISO-8601 format.
    pub struct CurrentDateChanged = (0, 5, 4) as "common.CommonState.CurrentDateChanged" {
        date: String,
    }
}

define_command! {
    /// Device time in ISO-8601 format.
    pub struct CurrentTimeChanged = (0, 5, 5) as "common.CommonState.CurrentTimeChanged" {
        time: String,
    }
}

define_command! {
    pub struct WifiSignalChanged = (0, 5, 7) as "common.CommonState.WifiSignalChanged" {
        /// Received signal strength in dBm.
        rssi: i16,
    }
}

define_command! {
    pub struct OutdoorSettingsChanged = (0, 10, 0) as "common.WifiSettingsState.OutdoorSettingsChanged" {
        /// 1 when the wifi is configured for outdoor use.
        outdoor: u8,
    }
}

pub(crate) fn register(registry: &mut CommandRegistry) {
    registry
        .register::<AllSettings>()
        .register::<AllStates>()
        .register::<ProductNameChanged>()
        .register::<ProductVersionChanged>()
        .register::<ProductSerialHighChanged>()
        .register::<ProductSerialLowChanged>()
        .register::<BatteryStateChanged>()
        .register::<CurrentDateChanged>()
        .register::<CurrentTimeChanged>()
        .register::<WifiSignalChanged>()
        .register::<OutdoorSettingsChanged>();
}
