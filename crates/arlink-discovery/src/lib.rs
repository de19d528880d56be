//! Service discovery for arlink devices.
//!
//! Devices announce themselves over mDNS. [`Discovery::spawn`] runs a
//! background task that folds raw [`Advertisement`]s through a
//! [`DeviceTracker`] and delivers one [`DiscoveryEvent::Found`] per device
//! address and one [`DiscoveryEvent::Lost`] when it goes away. Connecting to
//! a found device is up to the caller.

pub mod error;
#[cfg(feature = "mdns")]
pub mod mdns;
pub mod source;
pub mod tracker;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use error::{DiscoveryError, Result};
#[cfg(feature = "mdns")]
pub use mdns::{MdnsSource, SERVICE_TYPE};
pub use source::{Advertisement, AdvertisementSource};
pub use tracker::{DeviceTracker, DiscoveryEvent};

/// Events buffered before the discovery task waits for the consumer.
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// Background discovery loop.
pub struct Discovery;

impl Discovery {
    /// Start discovering with `source` until `cancel` fires, the source is
    /// exhausted, or the returned receiver is dropped.
    pub fn spawn<S: AdvertisementSource>(
        source: S,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<DiscoveryEvent> {
        Self::spawn_with_capacity(source, cancel, DEFAULT_EVENT_CAPACITY)
    }

    pub fn spawn_with_capacity<S: AdvertisementSource>(
        source: S,
        cancel: CancellationToken,
        capacity: usize,
    ) -> mpsc::Receiver<DiscoveryEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run(source, cancel, tx));
        rx
    }
}

async fn run<S: AdvertisementSource>(
    mut source: S,
    cancel: CancellationToken,
    events: mpsc::Sender<DiscoveryEvent>,
) {
    let mut tracker = DeviceTracker::new();
    'advertisements: loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = events.closed() => break,
            next = source.next_advertisement() => next,
        };
        match next {
            Ok(Some(advertisement)) => {
                for event in tracker.observe(advertisement) {
                    match &event {
                        DiscoveryEvent::Found {
                            name,
                            address,
                            port,
                        } => info!(name = %name, %address, port, "device found"),
                        DiscoveryEvent::Lost { address } => info!(%address, "device lost"),
                    }
                    if events.send(event).await.is_err() {
                        break 'advertisements;
                    }
                }
            }
            Ok(None) => {
                debug!("advertisement source exhausted");
                break;
            }
            Err(err) => warn!(error = %err, "advertisement source error"),
        }
    }
    debug!("discovery stopped");
}
