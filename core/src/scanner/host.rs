//! # Host Scanner
//!
//! Probes every port of the port set on one address concurrently and turns
//! the outcome into an optional [`DiscoveredHost`].

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::config::NamePolicy;
use lanprobe_common::network::host::DiscoveredHost;
use lanprobe_common::network::probe::ProbeResult;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::resolver::NameResolver;
use crate::network::tcp::PortProber;

#[derive(Clone)]
pub struct HostScanner {
    prober: Arc<dyn PortProber>,
    resolver: Arc<dyn NameResolver>,
    name_wait: Duration,
    name_policy: NamePolicy,
}

impl HostScanner {
    pub fn new(
        prober: Arc<dyn PortProber>,
        resolver: Arc<dyn NameResolver>,
        name_wait: Duration,
        name_policy: NamePolicy,
    ) -> Self {
        Self {
            prober,
            resolver,
            name_wait,
            name_policy,
        }
    }

    /// Returns a host record if at least one port is open and the name
    /// policy is satisfied.
    ///
    /// `cancel` is checked before each probe is issued; probes already in
    /// flight run to completion.
    pub async fn scan_host(
        &self,
        addr: Ipv4Addr,
        ports: &[i32],
        cancel: &CancellationToken,
    ) -> Option<DiscoveredHost> {
        let open_ports = self.probe_ports(addr, ports, cancel).await;
        if open_ports.is_empty() {
            return None;
        }

        let name = self.lookup_name(addr).await;
        match (name, self.name_policy) {
            (Some(name), _) => Some(DiscoveredHost::new(addr, open_ports).with_name(name)),
            (None, NamePolicy::AllowUnnamed) => Some(DiscoveredHost::new(addr, open_ports)),
            (None, NamePolicy::RequireName) => {
                debug!("{addr}: open ports {open_ports:?} but no name, dropping");
                None
            }
        }
    }

    /// Fan-out/fan-in over the port set. The result follows port-set order,
    /// not completion order.
    async fn probe_ports(
        &self,
        addr: Ipv4Addr,
        ports: &[i32],
        cancel: &CancellationToken,
    ) -> Vec<i32> {
        let mut probes: JoinSet<(usize, ProbeResult)> = JoinSet::new();

        for (idx, &port) in ports.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("{addr}: scan cancelled, {} port(s) not probed", ports.len() - idx);
                break;
            }
            let prober = Arc::clone(&self.prober);
            probes.spawn(async move { (idx, prober.probe(addr, port).await) });
        }

        let mut outcomes: Vec<Option<ProbeResult>> = vec![None; ports.len()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((idx, result)) => outcomes[idx] = Some(result),
                Err(e) => warn!("{addr}: probe task failed: {e}"),
            }
        }

        outcomes
            .into_iter()
            .flatten()
            .filter(|result| result.open)
            .map(|result| result.port)
            .collect()
    }

    async fn lookup_name(&self, addr: Ipv4Addr) -> Option<String> {
        match tokio::time::timeout(self.name_wait, self.resolver.resolve(addr)).await {
            Ok(name) => name.filter(|n| !n.trim().is_empty()),
            Err(_elapsed) => {
                debug!("{addr}: name lookup exceeded {:?}", self.name_wait);
                None
            }
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
