use mdns_sd::{Receiver, ServiceDaemon, ServiceEvent, ServiceInfo};
use tracing::{debug, trace, warn};

use crate::error::{DiscoveryError, Result};
use crate::source::{Advertisement, AdvertisementSource};

/// Service type announced by devices.
pub const SERVICE_TYPE: &str = "_arsdk-0901._udp.local.";

/// Browses the local network over mDNS.
pub struct MdnsSource {
    daemon: ServiceDaemon,
    events: Receiver<ServiceEvent>,
    service_type: String,
}

impl MdnsSource {
    /// Browse for [`SERVICE_TYPE`].
    pub fn new() -> Result<Self> {
        Self::browse(SERVICE_TYPE)
    }

    /// Browse for an arbitrary service type.
    pub fn browse(service_type: &str) -> Result<Self> {
        let daemon = ServiceDaemon::new()?;
        let events = daemon.browse(service_type)?;
        debug!(service_type, "mdns browse started");
        Ok(Self {
            daemon,
            events,
            service_type: service_type.to_string(),
        })
    }

    fn resolved(&self, info: &ServiceInfo) -> Option<Advertisement> {
        let addresses = info.get_addresses();
        let address = addresses
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addresses.iter().next())
            .copied()?;
        Some(Advertisement::Resolved {
            name: instance_name(info.get_fullname(), &self.service_type).to_string(),
            address,
            port: info.get_port(),
        })
    }
}

impl AdvertisementSource for MdnsSource {
    async fn next_advertisement(&mut self) -> Result<Option<Advertisement>> {
        loop {
            let event = match self.events.recv_async().await {
                Ok(event) => event,
                Err(_) => return Ok(None),
            };
            match event {
                ServiceEvent::ServiceResolved(info) => match self.resolved(&info) {
                    Some(advertisement) => return Ok(Some(advertisement)),
                    None => {
                        debug!(name = info.get_fullname(), "resolved service has no address")
                    }
                },
                ServiceEvent::ServiceRemoved(_, fullname) => {
                    return Ok(Some(Advertisement::Withdrawn {
                        name: instance_name(&fullname, &self.service_type).to_string(),
                    }));
                }
                ServiceEvent::SearchStopped(service_type) => {
                    return Err(DiscoveryError::Source(format!(
                        "mdns search for {service_type} stopped"
                    )));
                }
                other => trace!(event = ?other, "mdns event"),
            }
        }
    }
}

impl Drop for MdnsSource {
    fn drop(&mut self) {
        if let Err(err) = self.daemon.shutdown() {
            warn!(error = %err, "mdns daemon shutdown failed");
        }
    }
}

/// Instance label of a full service name.
fn instance_name<'a>(fullname: &'a str, service_type: &str) -> &'a str {
    fullname
        .strip_suffix(service_type)
        .map(|s| s.trim_end_matches('.'))
        .filter(|s| !s.is_empty())
        .unwrap_or(fullname)
}
