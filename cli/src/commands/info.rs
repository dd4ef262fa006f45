use anyhow::Context;
use lanprobe_core::scanner::{InterfaceSubnet, SubnetSource};

use super::ScanArgs;
use crate::terminal::print;

const KEY_WIDTH: usize = 10;

pub async fn info(args: &ScanArgs) -> anyhow::Result<()> {
    let cfg = args.to_config();
    let subnet = match args.subnet {
        Some(prefix) => Some(prefix),
        None => {
            let source = InterfaceSubnet::new(cfg.interface.clone());
            tokio::task::spawn_blocking(move || source.local_subnet())
                .await
                .context("subnet lookup failed")?
        }
    };

    let subnet = match subnet {
        Some(prefix) => format!("{prefix}.0/24"),
        None => "not found".to_string(),
    };
    let interface = cfg.interface.as_deref().unwrap_or("auto");
    let deadline = match cfg.scan_deadline {
        Some(limit) => format!("{}s", limit.as_secs()),
        None => "none".to_string(),
    };

    print::aligned_line("Interface", KEY_WIDTH, interface);
    print::aligned_line("Subnet", KEY_WIDTH, subnet);
    print::aligned_line("Ports", KEY_WIDTH, format!("{:?}", cfg.ports));
    print::aligned_line("Workers", KEY_WIDTH, cfg.worker_count());
    print::aligned_line("Timeout", KEY_WIDTH, format!("{:?}", cfg.probe_timeout));
    print::aligned_line("Name wait", KEY_WIDTH, format!("{:?}", cfg.name_wait));
    print::aligned_line("Names", KEY_WIDTH, format!("{:?}", cfg.name_policy));
    print::aligned_line("Deadline", KEY_WIDTH, deadline);
    print::fat_separator();
    Ok(())
}
