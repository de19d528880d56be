//! Typed commands for the arlink device protocol.
//!
//! A command payload starts with a 4-byte [`CommandId`] followed by the
//! command's arguments. Commands are declared with [`define_command!`], which
//! generates the struct plus its [`Command`] and [`DecodeCommand`] impls.
//! The [`CommandRegistry`] maps identifiers back to decoders so inbound
//! payloads become strongly typed values.
//!
//! ```
//! use arlink_command::catalog::common::BatteryStateChanged;
//! use arlink_command::CommandRegistry;
//! use bytes::BytesMut;
//!
//! let registry = CommandRegistry::with_catalog();
//! let mut buf = BytesMut::new();
//! registry.encode(&BatteryStateChanged { percent: 87 }, &mut buf).unwrap();
//!
//! let mut cursor = &buf[..];
//! let command = registry.decode(&mut cursor).unwrap();
//! let battery = command.downcast_ref::<BatteryStateChanged>().unwrap();
//! assert_eq!(battery.percent, 87);
//! ```

pub mod catalog;
pub mod command;
pub mod error;
pub mod id;
pub mod packer;
pub mod registry;

pub use command::{Command, DecodeCommand};
pub use error::{CommandError, Result};
pub use id::CommandId;
pub use packer::Arg;
pub use registry::CommandRegistry;

#[doc(hidden)]
pub mod __private {
    pub use bytes::BytesMut;
    pub use serde::{Serialize, Serializer};
}
