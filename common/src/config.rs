//! # Scan Configuration
//!
//! Tunables for a discovery run. Defaults target the common camera and
//! web-admin ports on a home network.

use std::str::FromStr;
use std::time::Duration;

/// Ports probed on every candidate when the caller does not supply a set.
pub const DEFAULT_PORTS: [i32; 4] = [80, 554, 8080, 8888];

pub const DEFAULT_WORKERS: usize = 64;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1_500);
pub const DEFAULT_NAME_WAIT: Duration = Duration::from_millis(500);
pub const DEFAULT_SCAN_DEADLINE: Duration = Duration::from_secs(60);

/// What to do with a host that has open ports but no resolvable name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    /// Drop the host from the result set.
    #[default]
    RequireName,
    /// Report the host with `device_name = None`.
    AllowUnnamed,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Ports probed on each candidate, in report order.
    ///
    /// Kept as signed integers so that a misconfigured entry (`-1`, `70000`)
    /// can travel through the engine and simply come back closed.
    pub ports: Vec<i32>,

    /// Upper bound on hosts scanned at the same time.
    pub workers: usize,

    /// Per-connect bound for a single port probe.
    pub probe_timeout: Duration,

    /// How long the name lookup may take before the host is judged unnamed.
    pub name_wait: Duration,

    pub name_policy: NamePolicy,

    /// Interface to derive the subnet from. `None` picks the primary
    /// wireless interface, falling back to any private LAN interface.
    pub interface: Option<String>,

    /// Cancels the scan cooperatively once elapsed. `None` disables it.
    pub scan_deadline: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            workers: DEFAULT_WORKERS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            name_wait: DEFAULT_NAME_WAIT,
            name_policy: NamePolicy::default(),
            interface: None,
            scan_deadline: Some(DEFAULT_SCAN_DEADLINE),
        }
    }
}

impl ScanConfig {
    pub fn with_ports(mut self, ports: Vec<i32>) -> Self {
        self.ports = ports;
        self
    }

    /// Zero is treated as one so the pool can always make progress.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_name_wait(mut self, wait: Duration) -> Self {
        self.name_wait = wait;
        self
    }

    pub fn with_name_policy(mut self, policy: NamePolicy) -> Self {
        self.name_policy = policy;
        self
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    pub fn with_scan_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.scan_deadline = deadline;
        self
    }

    /// Effective pool size, never zero.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

/// Parses a comma separated port list such as `"80,554,8080"`.
///
/// Entries only need to be integers. Range checking is left to the prober,
/// which reports invalid ports as closed.
pub fn parse_ports(s: &str) -> Result<Vec<i32>, String> {
    let ports: Vec<i32> = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| format!("invalid port: {part}"))
        })
        .collect::<Result<_, _>>()?;

    if ports.is_empty() {
        return Err(format!("no ports in: {s}"));
    }
    Ok(ports)
}

/// Port set as typed on a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortList(pub Vec<i32>);

impl FromStr for PortList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ports(s).map(PortList)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_camera_ports() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.ports, vec![80, 554, 8080, 8888]);
        assert_eq!(cfg.name_policy, NamePolicy::RequireName);
        assert_eq!(cfg.name_wait, Duration::from_millis(500));
        assert!(cfg.scan_deadline.is_some());
    }

    #[test]
    fn zero_workers_is_clamped() {
        let cfg = ScanConfig::default().with_workers(0);
        assert_eq!(cfg.worker_count(), 1);
    }

    #[test]
    fn parse_ports_keeps_order_and_out_of_range_values() {
        assert_eq!(parse_ports("80, 443,-1"), Ok(vec![80, 443, -1]));
        assert_eq!(parse_ports("8888"), Ok(vec![8888]));
    }

    #[test]
    fn port_list_from_str() {
        let list: PortList = "554,8080".parse().unwrap();
        assert_eq!(list, PortList(vec![554, 8080]));
    }

    #[test]
    fn parse_ports_rejects_garbage() {
        assert!(parse_ports("80,http").is_err());
        assert!(parse_ports("").is_err());
        assert!(parse_ports(",,").is_err());
    }
}
