//! The **scan coordinator**: drives a full /24 discovery run.
//!
//! For every candidate address of the local subnet a host scan task is
//! dispatched through a bounded worker pool. Completed tasks report back over
//! a channel to a single aggregator task, which is the only writer of the
//! published [`ScanState`]. Presentation layers observe the state through a
//! `watch` receiver and the incremental [`ScanEvent`] stream through a
//! `broadcast` receiver.
//!
//! Cancellation is cooperative: [`ScanCoordinator::stop`] prevents new hosts
//! and new probes from starting, but work already in flight finishes
//! naturally and still reports back before the coordinator goes idle.

use std::sync::{Arc, Mutex, PoisonError};

use lanprobe_common::config::ScanConfig;
use lanprobe_common::error::ScanError;
use lanprobe_common::network::host::DiscoveredHost;
use lanprobe_common::network::interface;
use lanprobe_common::network::subnet::{HOSTS_PER_SUBNET, SubnetPrefix};
use tokio::sync::{Semaphore, broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::network::tcp::{PortProber, TcpProber};

pub mod host;
pub mod resolver;

use host::HostScanner;
use resolver::{NameResolver, ReverseDnsResolver};

const EVENT_CAPACITY: usize = 1_024;

/// Supplies the /24 prefix to scan.
pub trait SubnetSource: Send + Sync {
    fn local_subnet(&self) -> Option<SubnetPrefix>;
}

/// Derives the subnet from the host's network interfaces.
#[derive(Debug, Default, Clone)]
pub struct InterfaceSubnet {
    interface: Option<String>,
}

impl InterfaceSubnet {
    pub fn new(interface: Option<String>) -> Self {
        Self { interface }
    }
}

impl SubnetSource for InterfaceSubnet {
    fn local_subnet(&self) -> Option<SubnetPrefix> {
        interface::resolve_local_subnet(self.interface.as_deref())
    }
}

/// Always scans the same prefix.
#[derive(Debug, Clone, Copy)]
pub struct FixedSubnet(pub SubnetPrefix);

impl SubnetSource for FixedSubnet {
    fn local_subnet(&self) -> Option<SubnetPrefix> {
        Some(self.0)
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub is_scanning: bool,
    /// Hosts in completion order. Append-only while scanning.
    pub results: Vec<DiscoveredHost>,
    pub subnet: Option<SubnetPrefix>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started { subnet: SubnetPrefix },
    HostDiscovered(DiscoveredHost),
    /// `scanned` hosts out of `total` candidates have reported back.
    Progress { scanned: usize, total: usize },
    Finished { found: usize, cancelled: bool },
    /// A start attempt was aborted; the coordinator stayed idle.
    Failed(ScanError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(SubnetPrefix),
    /// A scan was already running and was left untouched.
    AlreadyScanning,
}

struct Inner {
    config: ScanConfig,
    scanner: HostScanner,
    subnet_source: Arc<dyn SubnetSource>,
    state: watch::Sender<ScanState>,
    events: broadcast::Sender<ScanEvent>,
    cancel: Mutex<CancellationToken>,
}

#[derive(Clone)]
pub struct ScanCoordinator {
    inner: Arc<Inner>,
}

impl ScanCoordinator {
    /// Coordinator wired to real sockets, reverse DNS and local interfaces.
    pub fn new(config: ScanConfig) -> Self {
        let prober = Arc::new(TcpProber::new(config.probe_timeout));
        let subnet_source = Arc::new(InterfaceSubnet::new(config.interface.clone()));
        Self::with_collaborators(config, prober, Arc::new(ReverseDnsResolver), subnet_source)
    }

    pub fn with_collaborators(
        config: ScanConfig,
        prober: Arc<dyn PortProber>,
        resolver: Arc<dyn NameResolver>,
        subnet_source: Arc<dyn SubnetSource>,
    ) -> Self {
        let scanner = HostScanner::new(prober, resolver, config.name_wait, config.name_policy);
        let (state, _) = watch::channel(ScanState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                config,
                scanner,
                subnet_source,
                state,
                events,
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.inner.config
    }

    /// Begins a scan of the local subnet in the background.
    ///
    /// Does nothing if a scan is already running. Fails with
    /// [`ScanError::NoSubnet`] when no subnet can be determined, leaving the
    /// coordinator idle and the previous run's state in place. Subnet lookup
    /// touches the OS and runs on the blocking pool.
    pub async fn start(&self) -> Result<StartOutcome, ScanError> {
        if self.is_scanning() {
            debug!("Scan already in progress, ignoring start request");
            return Ok(StartOutcome::AlreadyScanning);
        }

        let Some(subnet) = self.resolve_subnet().await else {
            warn!("Unable to determine subnet");
            let _ = self.inner.events.send(ScanEvent::Failed(ScanError::NoSubnet));
            return Err(ScanError::NoSubnet);
        };

        let cancel = CancellationToken::new();
        let claimed = self.inner.state.send_if_modified(|state| {
            if state.is_scanning {
                return false;
            }
            *self.inner.lock_cancel() = cancel.clone();
            *state = ScanState {
                is_scanning: true,
                results: Vec::new(),
                subnet: Some(subnet),
            };
            true
        });

        if !claimed {
            debug!("Lost start race to a concurrent scan");
            return Ok(StartOutcome::AlreadyScanning);
        }

        info!(
            "Scanning {subnet}.1-254 on ports {:?} with {} workers",
            self.inner.config.ports,
            self.inner.config.worker_count()
        );
        let _ = self.inner.events.send(ScanEvent::Started { subnet });

        tokio::spawn(run_scan(Arc::clone(&self.inner), subnet, cancel));
        Ok(StartOutcome::Started(subnet))
    }

    async fn resolve_subnet(&self) -> Option<SubnetPrefix> {
        let source = Arc::clone(&self.inner.subnet_source);
        match tokio::task::spawn_blocking(move || source.local_subnet()).await {
            Ok(subnet) => subnet,
            Err(e) => {
                warn!("Subnet lookup failed: {e}");
                None
            }
        }
    }

    /// Requests cooperative cancellation of the running scan.
    ///
    /// Returns whether a scan was running. The coordinator only becomes idle
    /// once in-flight host tasks have drained; use [`Self::wait`] for that.
    pub fn stop(&self) -> bool {
        let running = self.is_scanning();
        if running {
            info!("Stopping scan");
            self.inner.lock_cancel().cancel();
        }
        running
    }

    /// Resolves once no scan is running.
    pub async fn wait(&self) {
        let mut state = self.inner.state.subscribe();
        let _ = state.wait_for(|s| !s.is_scanning).await;
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.state.borrow().is_scanning
    }

    pub fn snapshot(&self) -> ScanState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a host unless the scan already ended or the address is known.
    fn record(&self, host: DiscoveredHost) -> bool {
        let appended = self.state.send_if_modified(|state| {
            let duplicate = state
                .results
                .iter()
                .any(|known| known.ip_address == host.ip_address);
            if !state.is_scanning || duplicate {
                return false;
            }
            state.results.push(host.clone());
            true
        });

        if appended {
            info!(
                "Found {} ({}) with open ports {:?}",
                host.label(),
                host.ip_address,
                host.open_ports
            );
            let _ = self.events.send(ScanEvent::HostDiscovered(host));
        }
        appended
    }
}

/// Aggregator: sole writer of the scan state until every host task is done.
async fn run_scan(inner: Arc<Inner>, subnet: SubnetPrefix, cancel: CancellationToken) {
    let (tx, mut rx) = mpsc::channel::<Option<DiscoveredHost>>(inner.config.worker_count());
    let dispatcher = tokio::spawn(dispatch_hosts(
        Arc::clone(&inner),
        subnet,
        cancel.clone(),
        tx,
    ));

    let deadline = async {
        match inner.config.scan_deadline {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut deadline_hit = false;
    let mut scanned: usize = 0;

    loop {
        tokio::select! {
            outcome = rx.recv() => {
                let Some(outcome) = outcome else { break };
                scanned += 1;
                if let Some(host) = outcome {
                    inner.record(host);
                }
                let _ = inner.events.send(ScanEvent::Progress {
                    scanned,
                    total: HOSTS_PER_SUBNET,
                });
            }
            _ = &mut deadline, if !deadline_hit => {
                warn!("Scan deadline reached, cancelling remaining work");
                deadline_hit = true;
                cancel.cancel();
            }
        }
    }

    if let Err(e) = dispatcher.await {
        warn!("Host dispatcher ended abnormally: {e}");
    }

    let cancelled = cancel.is_cancelled();
    // Finished goes out under the state lock so a restart cannot slip its
    // Started event in ahead of it.
    inner.state.send_modify(|state| {
        state.is_scanning = false;
        let found = state.results.len();
        info!("Scanning completed: {found} host(s) after {scanned} probed, cancelled: {cancelled}");
        let _ = inner.events.send(ScanEvent::Finished { found, cancelled });
    });
}

/// Feeds candidates into the worker pool until exhausted or cancelled.
async fn dispatch_hosts(
    inner: Arc<Inner>,
    subnet: SubnetPrefix,
    cancel: CancellationToken,
    tx: mpsc::Sender<Option<DiscoveredHost>>,
) {
    let pool = Arc::new(Semaphore::new(inner.config.worker_count()));
    let ports: Arc<[i32]> = inner.config.ports.clone().into();

    for addr in subnet.enumerate() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&pool).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_closed) => break,
            },
        };

        debug!("Dispatching {addr}");
        let scanner = inner.scanner.clone();
        let ports = Arc::clone(&ports);
        let cancel = cancel.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let found = scanner.scan_host(addr, &ports, &cancel).await;
            let _ = tx.send(found).await;
            drop(permit);
        });
    }

    if cancel.is_cancelled() {
        debug!("Dispatch stopped early");
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
