use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use tracing::debug;

/// Best-effort lookup of a human readable name for an address.
///
/// Callers bound the call with their own timeout; implementations only need
/// to return `None` when nothing useful is known.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, addr: Ipv4Addr) -> Option<String>;
}

/// PTR lookup through the system resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReverseDnsResolver;

#[async_trait]
impl NameResolver for ReverseDnsResolver {
    async fn resolve(&self, addr: Ipv4Addr) -> Option<String> {
        let ip = IpAddr::V4(addr);

        // getnameinfo blocks, keep it off the async workers
        let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip)).await;

        match lookup {
            Ok(Ok(name)) => meaningful_name(addr, name),
            Ok(Err(e)) => {
                debug!("{addr}: reverse lookup failed: {e}");
                None
            }
            Err(e) => {
                debug!("{addr}: reverse lookup task aborted: {e}");
                None
            }
        }
    }
}

/// Rejects empty answers and the numeric echo some resolvers return when no
/// PTR record exists.
fn meaningful_name(addr: Ipv4Addr, name: String) -> Option<String> {
    let name = name.trim().trim_end_matches('.');
    if name.is_empty() || name == addr.to_string() {
        return None;
    }
    Some(name.to_string())
}
