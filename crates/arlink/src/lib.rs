//! # arlink
//!
//! Client library for consumer drones that speak a UDP command protocol
//! after a short JSON handshake over TCP.
//!
//! The layers are published as separate crates and re-exported here:
//!
//! - [`transport`]: UDP endpoint and the datagram sink seam
//! - [`frame`]: frame codec, channels and per-channel sequencing
//! - [`command`]: typed commands, argument packing and the command registry
//! - [`session`]: handshake, heartbeat, reliable delivery and device state
//! - [`discovery`]: mDNS discovery of devices on the local network
//!
//! ## Quick start
//!
//! ```no_run
//! use arlink::session::{profile::bebop, Session};
//!
//! # async fn demo() -> Result<(), arlink::session::SessionError> {
//! let session = Session::connect("192.168.42.1:44444".parse().unwrap()).await?;
//! if bebop::take_off(&session).await? {
//!     println!("battery: {:?}", session.state().battery_percent);
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub use arlink_command as command;
pub use arlink_discovery as discovery;
pub use arlink_frame as frame;
pub use arlink_session as session;
pub use arlink_transport as transport;
