//! # Subnet Prefix
//!
//! A /24 network named by its first three octets (`"192.168.1"`) and the
//! enumeration of the 254 host addresses inside it.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::ScanError;

const FIRST_HOST: u8 = 1;
const LAST_HOST: u8 = 254;

/// Number of candidate addresses in every /24 scan.
pub const HOSTS_PER_SUBNET: usize = (LAST_HOST - FIRST_HOST + 1) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetPrefix([u8; 3]);

impl SubnetPrefix {
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// Address `prefix.host`.
    pub fn host(&self, host: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, host)
    }

    /// Yields `prefix.1` through `prefix.254` in ascending order.
    ///
    /// Lazy and restartable: every call starts a fresh sequence.
    pub fn enumerate(self) -> impl Iterator<Item = Ipv4Addr> + Send {
        (FIRST_HOST..=LAST_HOST).map(move |host| self.host(host))
    }
}

impl From<Ipv4Addr> for SubnetPrefix {
    fn from(addr: Ipv4Addr) -> Self {
        let [a, b, c, _] = addr.octets();
        Self([a, b, c])
    }
}

impl FromStr for SubnetPrefix {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScanError::InvalidPrefix(s.to_string());

        let octets: Vec<u8> = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;

        match octets.as_slice() {
            [a, b, c] => Ok(Self([*a, *b, *c])),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for SubnetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}")
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
