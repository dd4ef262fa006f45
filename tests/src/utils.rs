use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::config::ScanConfig;
use lanprobe_common::network::subnet::SubnetPrefix;
use lanprobe_core::ScanCoordinator;
use lanprobe_core::network::tcp::TcpProber;
use lanprobe_core::scanner::FixedSubnet;
use lanprobe_core::scanner::resolver::NameResolver;
use tokio::net::TcpListener;

pub const LOOPBACK_PREFIX: SubnetPrefix = SubnetPrefix::new(127, 0, 0);

/// Answers from a fixed table, everything else is unnamed.
pub struct NameTable(pub HashMap<Ipv4Addr, String>);

impl NameTable {
    pub fn single(addr: Ipv4Addr, name: &str) -> Arc<Self> {
        Arc::new(Self(HashMap::from([(addr, name.to_string())])))
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self(HashMap::new()))
    }
}

#[async_trait]
impl NameResolver for NameTable {
    async fn resolve(&self, addr: Ipv4Addr) -> Option<String> {
        self.0.get(&addr).cloned()
    }
}

/// Binds a listener on 127.0.0.1 and returns it with its port.
pub async fn open_port() -> (TcpListener, i32) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind loopback listener");
    let port = listener.local_addr().expect("listener address").port() as i32;
    (listener, port)
}

/// Port that nothing listens on.
pub async fn closed_port() -> i32 {
    let (listener, port) = open_port().await;
    drop(listener);
    port
}

pub fn loopback_config(ports: Vec<i32>) -> ScanConfig {
    ScanConfig::default()
        .with_ports(ports)
        .with_workers(32)
        .with_probe_timeout(Duration::from_millis(300))
        .with_name_wait(Duration::from_millis(200))
        .with_scan_deadline(None)
}

/// Real TCP probes against the loopback /24 with a scripted name table.
pub fn loopback_coordinator(cfg: ScanConfig, names: Arc<NameTable>) -> ScanCoordinator {
    let prober = Arc::new(TcpProber::new(cfg.probe_timeout));
    ScanCoordinator::with_collaborators(cfg, prober, names, Arc::new(FixedSubnet(LOOPBACK_PREFIX)))
}
