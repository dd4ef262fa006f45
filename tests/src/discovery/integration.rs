#![cfg(test)]
use std::net::Ipv4Addr;

use lanprobe_common::config::NamePolicy;
use lanprobe_common::network::host::DiscoveredHost;
use lanprobe_core::scanner::resolver::{NameResolver, ReverseDnsResolver};
use lanprobe_core::{ScanEvent, StartOutcome};

use crate::utils::{
    LOOPBACK_PREFIX, NameTable, closed_port, loopback_config, loopback_coordinator, open_port,
};

const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// A named host with one open and one closed port is reported with just the
/// open one; every other loopback address produces nothing.
#[tokio::test]
async fn discovery_reports_named_loopback_host() {
    let (_listener, open) = open_port().await;
    let closed = closed_port().await;

    let cfg = loopback_config(vec![open, closed]);
    let scanner = loopback_coordinator(cfg, NameTable::single(LOCALHOST, "Printer"));

    let outcome = scanner.start().await;
    assert_eq!(outcome, Ok(StartOutcome::Started(LOOPBACK_PREFIX)));
    scanner.wait().await;

    let results: Vec<DiscoveredHost> = scanner.snapshot().results;
    assert_eq!(results.len(), 1, "unexpected results: {results:?}");

    let host = &results[0];
    assert_eq!(host.ip_address, LOCALHOST);
    assert_eq!(host.device_name.as_deref(), Some("Printer"));
    assert_eq!(host.open_ports, vec![open]);
}

#[tokio::test]
async fn open_ports_keep_configured_order() {
    let (_first, port_a) = open_port().await;
    let (_second, port_b) = open_port().await;

    let cfg = loopback_config(vec![port_b, -1, port_a]);
    let scanner = loopback_coordinator(cfg, NameTable::single(LOCALHOST, "Camera"));

    scanner.start().await.unwrap();
    scanner.wait().await;

    let results = scanner.snapshot().results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].open_ports, vec![port_b, port_a]);
}

#[tokio::test]
async fn unnamed_host_is_gated_by_policy() {
    let (_listener, open) = open_port().await;

    let strict = loopback_coordinator(loopback_config(vec![open]), NameTable::empty());
    strict.start().await.unwrap();
    strict.wait().await;
    assert!(strict.snapshot().results.is_empty());

    let lenient_cfg = loopback_config(vec![open]).with_name_policy(NamePolicy::AllowUnnamed);
    let lenient = loopback_coordinator(lenient_cfg, NameTable::empty());
    lenient.start().await.unwrap();
    lenient.wait().await;

    let results = lenient.snapshot().results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ip_address, LOCALHOST);
    assert_eq!(results[0].device_name, None);
}

#[tokio::test]
async fn event_stream_matches_final_state() {
    let (_listener, open) = open_port().await;
    let scanner = loopback_coordinator(
        loopback_config(vec![open]),
        NameTable::single(LOCALHOST, "Printer"),
    );
    let mut events = scanner.events();
    let mut state = scanner.subscribe();

    scanner.start().await.unwrap();
    assert!(state.borrow_and_update().is_scanning);

    let mut discovered = Vec::new();
    loop {
        match events.recv().await.expect("events closed") {
            ScanEvent::HostDiscovered(host) => discovered.push(host),
            ScanEvent::Finished { found, cancelled } => {
                assert_eq!(found, 1);
                assert!(!cancelled);
                break;
            }
            _ => {}
        }
    }

    state
        .wait_for(|s| !s.is_scanning)
        .await
        .expect("coordinator dropped");
    assert_eq!(scanner.snapshot().results, discovered);
}

#[tokio::test]
async fn stopped_scan_can_be_restarted() {
    let (_listener, open) = open_port().await;
    let cfg = loopback_config(vec![open]).with_workers(1);
    let scanner = loopback_coordinator(cfg, NameTable::single(LOCALHOST, "Printer"));

    scanner.start().await.unwrap();
    assert!(scanner.stop());
    scanner.wait().await;
    assert!(!scanner.is_scanning());

    scanner.start().await.unwrap();
    scanner.wait().await;
    let results = scanner.snapshot().results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ip_address, LOCALHOST);
}

#[tokio::test]
#[ignore]
async fn reverse_dns_names_localhost() {
    let name = ReverseDnsResolver.resolve(LOCALHOST).await;
    assert!(name.is_some(), "expected a name for 127.0.0.1");
}
