//! Device sessions for the arlink protocol.
//!
//! This is the "just works" layer. [`Session::connect`] negotiates ports over
//! TCP, then runs the UDP link: heartbeats with round-trip measurement,
//! acknowledgment of device frames, retransmission of our own acknowledged
//! frames, and dispatch of inbound commands into [`DeviceState`].
//!
//! ```no_run
//! # async fn demo() -> arlink_session::Result<()> {
//! use arlink_session::{profile::bebop, Session};
//!
//! let session = Session::connect("192.168.42.1:44444".parse().unwrap()).await?;
//! let mut state = session.watch_state();
//! state.changed().await.ok();
//! println!("battery: {:?}", state.borrow().battery_percent);
//!
//! if bebop::take_off(&session).await? {
//!     println!("taking off");
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handshake;
pub mod heartbeat;
pub mod profile;
pub mod reliable;
pub mod session;
pub mod state;

pub use error::{Result, SessionError};
pub use handshake::{handshake, HandshakeConfig, HandshakeRequest, HandshakeResponse, HandshakeResult};
pub use heartbeat::HeartbeatClock;
pub use profile::{BebopProfile, CommonProfile, DeviceProfile};
pub use reliable::{AckTracker, ReliableSender, RetryPolicy};
pub use session::{Session, SessionConfig};
pub use state::{DeviceState, LinkStatus};
