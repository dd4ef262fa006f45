use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::network::probe::{ProbeResult, valid_port};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Strategy for deciding whether a single port accepts connections.
#[async_trait]
pub trait PortProber: Send + Sync {
    async fn probe(&self, addr: Ipv4Addr, port: i32) -> ProbeResult;
}

/// Plain TCP connect probe with a bounded wait.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PortProber for TcpProber {
    async fn probe(&self, addr: Ipv4Addr, port: i32) -> ProbeResult {
        connect_probe(addr, port, self.timeout).await
    }
}

/// One connect attempt, no retries.
///
/// An invalid port short-circuits to closed before any socket is opened.
/// A successful connection is dropped right away.
pub async fn connect_probe(addr: Ipv4Addr, port: i32, probe_timeout: Duration) -> ProbeResult {
    let Some(valid) = valid_port(port) else {
        debug!("{addr}: skipping invalid port {port}");
        return ProbeResult::closed(port);
    };

    let socket_addr = SocketAddr::from((addr, valid));

    match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            debug!("{socket_addr} open");
            ProbeResult::open(port)
        }
        Ok(Err(e)) => {
            debug!("{socket_addr} closed: {e}");
            ProbeResult::closed(port)
        }
        Err(_elapsed) => {
            debug!("{socket_addr} timed out");
            ProbeResult::closed(port)
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port() as i32;

        let result = connect_probe(LOCALHOST, port, Duration::from_secs(1)).await;
        assert_eq!(result, ProbeResult::open(port));
    }

    #[tokio::test]
    async fn refused_port_is_closed() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port() as i32;
        drop(listener);

        let result = connect_probe(LOCALHOST, port, Duration::from_secs(1)).await;
        assert_eq!(result, ProbeResult::closed(port));
    }

    #[tokio::test]
    async fn invalid_port_is_closed_without_connecting() {
        // TEST-NET-3 would hang until the timeout if a connect were attempted.
        let unreachable = Ipv4Addr::new(203, 0, 113, 1);
        let started = Instant::now();

        for port in [-1, 0, 65_536] {
            let result = connect_probe(unreachable, port, Duration::from_secs(5)).await;
            assert_eq!(result, ProbeResult::closed(port));
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    #[ignore]
    async fn unreachable_host_times_out_as_closed() {
        let unreachable = Ipv4Addr::new(203, 0, 113, 1);
        let prober = TcpProber::new(Duration::from_millis(200));
        let result = prober.probe(unreachable, 80).await;
        assert!(!result.open);
    }
}
