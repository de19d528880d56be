/// Errors that can occur while discovering devices.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The mDNS daemon failed.
    #[cfg(feature = "mdns")]
    #[error("mdns error: {0}")]
    Mdns(#[from] mdns_sd::Error),

    /// An advertisement source failed.
    #[error("advertisement source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
