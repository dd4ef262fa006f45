use std::net::Ipv4Addr;

use uuid::Uuid;

/// A host judged worth reporting: it answered on at least one target port.
///
/// Immutable once built; the scan coordinator owns the collection and hands
/// out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub id: Uuid,
    pub ip_address: Ipv4Addr,
    pub device_name: Option<String>,
    /// Open ports in port-set order.
    pub open_ports: Vec<i32>,
}

impl DiscoveredHost {
    pub fn new(ip_address: Ipv4Addr, open_ports: Vec<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ip_address,
            device_name: None,
            open_ports,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Display name, falling back to the address.
    pub fn label(&self) -> String {
        self.device_name
            .clone()
            .unwrap_or_else(|| self.ip_address.to_string())
    }
}
