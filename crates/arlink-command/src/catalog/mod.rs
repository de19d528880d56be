//! Commands understood by this crate.
//!
//! Only the generic requests, the piloting intents and the state reports
//! consumed by device profiles are declared here; further commands can be
//! added with [`crate::define_command!`] and registered at startup.

pub mod ardrone3;
pub mod common;

use crate::registry::CommandRegistry;

/// Register every catalog command.
pub fn register_all(registry: &mut CommandRegistry) {
    common::register(registry);
    ardrone3::register(registry);
}
