pub mod discover;
pub mod info;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use lanprobe_common::config::{self, NamePolicy, PortList, ScanConfig};
use lanprobe_common::network::subnet::SubnetPrefix;

#[derive(Parser)]
#[command(name = "lanprobe")]
#[command(about = "Finds devices on the local /24 by probing well-known TCP ports.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the local subnet for devices with open ports
    #[command(alias = "d")]
    Discover(ScanArgs),
    /// Show the subnet and settings a scan would use
    #[command(alias = "i")]
    Info(ScanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Comma separated ports to probe on every host
    #[arg(short, long, default_value = "80,554,8080,8888", allow_hyphen_values = true)]
    pub ports: PortList,

    /// Hosts scanned concurrently
    #[arg(short, long, default_value_t = config::DEFAULT_WORKERS)]
    pub workers: usize,

    /// Per-port connect timeout in milliseconds
    #[arg(long, default_value_t = 1_500)]
    pub timeout_ms: u64,

    /// Time allowed for the reverse name lookup in milliseconds
    #[arg(long, default_value_t = 500)]
    pub name_wait_ms: u64,

    /// Interface to take the subnet from (defaults to the Wi-Fi interface)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Scan this prefix (e.g. 192.168.1) instead of resolving one
    #[arg(short, long)]
    pub subnet: Option<SubnetPrefix>,

    /// Also report hosts whose name could not be resolved
    #[arg(long)]
    pub keep_unnamed: bool,

    /// Give up after this many seconds, 0 disables the limit
    #[arg(long, default_value_t = 60)]
    pub deadline_secs: u64,
}

impl ScanArgs {
    pub fn to_config(&self) -> ScanConfig {
        let policy = if self.keep_unnamed {
            NamePolicy::AllowUnnamed
        } else {
            NamePolicy::RequireName
        };
        let deadline = match self.deadline_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut cfg = ScanConfig::default()
            .with_ports(self.ports.0.clone())
            .with_workers(self.workers)
            .with_probe_timeout(Duration::from_millis(self.timeout_ms))
            .with_name_wait(Duration::from_millis(self.name_wait_ms))
            .with_name_policy(policy)
            .with_scan_deadline(deadline);

        if let Some(name) = &self.interface {
            cfg = cfg.with_interface(name.clone());
        }
        cfg
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
