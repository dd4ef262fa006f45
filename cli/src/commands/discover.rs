use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use lanprobe_common::network::host::DiscoveredHost;
use lanprobe_common::network::subnet::HOSTS_PER_SUBNET;
use lanprobe_core::network::tcp::TcpProber;
use lanprobe_core::scanner::resolver::ReverseDnsResolver;
use lanprobe_core::scanner::{FixedSubnet, ScanCoordinator, ScanEvent, StartOutcome};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::ScanArgs;
use crate::terminal::{colors, print, progress::ScanProgress};

type Detail = (String, ColoredString);

pub async fn discover(args: &ScanArgs) -> anyhow::Result<()> {
    let coordinator = build_coordinator(args);
    let mut events = coordinator.events();

    let subnet = match coordinator.start().await.context("discovery could not start")? {
        StartOutcome::Started(subnet) => subnet,
        StartOutcome::AlreadyScanning => anyhow::bail!("a scan is already running"),
    };
    print::print_status(format!("Scanning {subnet}.1 to {subnet}.254, press Ctrl-C to stop"));

    let start_time: Instant = Instant::now();
    let progress = ScanProgress::start(HOSTS_PER_SUBNET as u64);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;
    let mut cancelled = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ScanEvent::Progress { scanned, .. }) => progress.set_position(scanned),
                Ok(ScanEvent::HostDiscovered(host)) => {
                    print::print_status(discovered_line(&host));
                    progress.set_message(format!("latest: {}", host.label()));
                }
                Ok(ScanEvent::Finished { cancelled: was_cancelled, .. }) => {
                    cancelled = was_cancelled;
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!("Progress display skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                coordinator.stop();
                progress.set_message("stopping, waiting for in-flight hosts...".to_string());
            }
        }
    }

    // The state is final once the coordinator is idle, events may have lagged
    coordinator.wait().await;
    progress.finish();

    let mut hosts: Vec<DiscoveredHost> = coordinator.snapshot().results;
    if cancelled {
        warn!("Scan was cancelled, results are partial");
    }
    discovery_ends(&mut hosts, start_time.elapsed());
    Ok(())
}

fn build_coordinator(args: &ScanArgs) -> ScanCoordinator {
    let cfg = args.to_config();
    match args.subnet {
        Some(prefix) => {
            let prober = Arc::new(TcpProber::new(cfg.probe_timeout));
            ScanCoordinator::with_collaborators(
                cfg,
                prober,
                Arc::new(ReverseDnsResolver),
                Arc::new(FixedSubnet(prefix)),
            )
        }
        None => ScanCoordinator::new(cfg),
    }
}

fn discovery_ends(hosts: &mut [DiscoveredHost], total_time: Duration) {
    if hosts.is_empty() {
        print::header("zero devices detected");
        print::no_results();
        return;
    }

    print::header("Network Discovery");
    hosts.sort_by_key(|host| host.ip_address);
    for (idx, host) in hosts.iter().enumerate() {
        print_host_tree(host, idx);
    }
    print_summary(hosts.len(), total_time);
}

fn print_summary(hosts_len: usize, total_time: Duration) {
    let active_hosts: ColoredString = format!("{hosts_len} devices").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    print::fat_separator();
    print::print_status(format!("Discovery Complete: {active_hosts} identified in {total_time}"));
}

fn discovered_line(host: &DiscoveredHost) -> String {
    format!(
        "Found {} at {} on {}",
        host.label(),
        host.ip_address.to_string().color(colors::IPV4_ADDR),
        join_ports(&host.open_ports).color(colors::PORT)
    )
}

fn join_ports(ports: &[i32]) -> String {
    ports
        .iter()
        .map(|port| port.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn print_host_tree(host: &DiscoveredHost, idx: usize) {
    let name = host.device_name.as_deref().unwrap_or("No hostname");
    print::tree_head(idx, name);

    let ports: String = join_ports(&host.open_ports);

    let details: Vec<Detail> = vec![
        (
            "IPv4".to_string(),
            host.ip_address.to_string().color(colors::IPV4_ADDR),
        ),
        ("Ports".to_string(), ports.color(colors::PORT)),
    ];
    print::as_tree_one_level(details);
}
