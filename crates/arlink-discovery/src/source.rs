use std::future::Future;
use std::net::IpAddr;

use crate::error::Result;

/// A change in the set of advertised services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advertisement {
    /// A service instance was resolved to an address and control port.
    Resolved {
        name: String,
        address: IpAddr,
        port: u16,
    },
    /// A service instance is no longer advertised.
    Withdrawn { name: String },
}

/// Produces service advertisements, e.g. from mDNS.
pub trait AdvertisementSource: Send + 'static {
    /// Wait for the next advertisement. `Ok(None)` means the source is
    /// exhausted and will produce nothing more.
    fn next_advertisement(&mut self) -> impl Future<Output = Result<Option<Advertisement>>> + Send;
}
