use std::collections::HashMap;
use std::net::IpAddr;

use serde::Serialize;

use crate::source::Advertisement;

/// A device appearing or disappearing on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    Found {
        name: String,
        address: IpAddr,
        /// Control port for the connection handshake.
        port: u16,
    },
    Lost { address: IpAddr },
}

#[derive(Debug, Clone)]
struct Tracked {
    name: String,
    port: u16,
}

/// Turns raw advertisements into one `Found` per address and one `Lost`
/// when it goes away.
///
/// Devices re-announce periodically and may be seen on several interfaces;
/// only the first resolution of an address is reported.
#[derive(Debug, Default)]
pub struct DeviceTracker {
    devices: HashMap<IpAddr, Tracked>,
    names: HashMap<String, IpAddr>,
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one advertisement into the tracked set.
    ///
    /// A name that re-resolves to a different address retires the old
    /// address (unless another name still points at it), so a move yields
    /// `Lost` for the old address followed by `Found` for the new one.
    pub fn observe(&mut self, advertisement: Advertisement) -> Vec<DiscoveryEvent> {
        let mut events = Vec::new();
        match advertisement {
            Advertisement::Resolved {
                name,
                address,
                port,
            } => {
                if let Some(old) = self.names.insert(name.clone(), address) {
                    if old != address
                        && !self.names.values().any(|a| *a == old)
                        && self.devices.remove(&old).is_some()
                    {
                        events.push(DiscoveryEvent::Lost { address: old });
                    }
                }
                if !self.devices.contains_key(&address) {
                    self.devices.insert(
                        address,
                        Tracked {
                            name: name.clone(),
                            port,
                        },
                    );
                    events.push(DiscoveryEvent::Found {
                        name,
                        address,
                        port,
                    });
                }
            }
            Advertisement::Withdrawn { name } => {
                let Some(address) = self.names.remove(&name) else {
                    return events;
                };
                if self.devices.remove(&address).is_some() {
                    self.names.retain(|_, a| *a != address);
                    events.push(DiscoveryEvent::Lost { address });
                }
            }
        }
        events
    }

    /// Currently known devices as (address, name, port).
    pub fn devices(&self) -> impl Iterator<Item = (IpAddr, &str, u16)> + '_ {
        self.devices
            .iter()
            .map(|(address, d)| (*address, d.name.as_str(), d.port))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
