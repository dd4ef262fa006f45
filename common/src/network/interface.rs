//! # Subnet Resolver
//!
//! Picks the local interface the scan should run from and derives its /24
//! prefix. Not finding one is a normal outcome (no Wi-Fi, airplane mode) and
//! is reported as `None`.

use pnet::datalink::{self, NetworkInterface};
use tracing::debug;

#[cfg(target_os = "linux")]
use linux_impl::is_wireless;
#[cfg(target_os = "macos")]
use macos_impl::is_wireless;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback_impl::is_wireless;

use crate::network::subnet::SubnetPrefix;
use crate::utils::interface::NetworkInterfaceExtension;

/// Inspects the host's interfaces and returns the prefix of the active LAN.
///
/// `preferred` names an interface explicitly; otherwise the primary wireless
/// interface wins, then any up interface holding a private IPv4 address.
pub fn resolve_local_subnet(preferred: Option<&str>) -> Option<SubnetPrefix> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    debug!("Inspecting {} network interface(s)", interfaces.len());
    select_subnet(&interfaces, preferred, is_wireless)
}

/// Pure selection over an interface list, see [`resolve_local_subnet`].
pub fn select_subnet(
    interfaces: &[NetworkInterface],
    preferred: Option<&str>,
    is_wireless: impl Fn(&NetworkInterface) -> bool,
) -> Option<SubnetPrefix> {
    if let Some(name) = preferred {
        return interfaces
            .iter()
            .find(|intf| intf.name == name)
            .and_then(|intf| intf.first_ipv4())
            .map(SubnetPrefix::from);
    }

    let wireless = interfaces
        .iter()
        .filter(|intf| intf.is_usable() && is_wireless(*intf))
        .find_map(|intf| intf.first_ipv4());

    let selected = wireless.or_else(|| {
        interfaces
            .iter()
            .filter(|intf| intf.is_usable())
            .find_map(|intf| intf.first_private_ipv4())
    })?;

    debug!("Selected local address {selected}");
    Some(SubnetPrefix::from(selected))
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    /// Queried once; `networksetup` is slow.
    fn wireless_devices() -> &'static HashSet<String> {
        static WIRELESS: OnceLock<HashSet<String>> = OnceLock::new();

        WIRELESS.get_or_init(|| {
            let mut devices = HashSet::new();

            let Ok(output) = Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()
            else {
                return devices;
            };

            let stdout = String::from_utf8_lossy(&output.stdout);
            for device in stdout.lines().filter_map(|l| l.strip_prefix("Device: ")) {
                let device = device.trim();
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    devices.insert(device.to_string());
                }
            }
            devices
        })
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        wireless_devices().contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback_impl {
    use super::*;

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        interface.name.starts_with("wl")
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
    use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
    use pnet::util::MacAddr;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const UP: u32 = 0x1;
    const BROADCAST: u32 = 0x2;
    const LOOPBACK: u32 = 0x8;

    fn ni(name: &str, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.into(),
            description: "".into(),
            index: 0,
            mac: Some(MacAddr::new(0x02, 0, 0, 0, 0, 1)),
            ips: ips.to_vec(),
            flags,
        }
    }

    fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
        IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
    }

    fn v6(s: &str, p: u8) -> IpNetwork {
        IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
    }

    fn lo() -> NetworkInterface {
        ni("lo", &[v4(127, 0, 0, 1, 8), v6("::1", 128)], UP | LOOPBACK)
    }

    fn eth0() -> NetworkInterface {
        ni("eth0", &[v4(10, 0, 5, 20, 24)], UP | BROADCAST)
    }

    fn wlan0() -> NetworkInterface {
        ni(
            "wlan0",
            &[v6("fe80::1", 64), v4(192, 168, 1, 42, 24)],
            UP | BROADCAST,
        )
    }

    fn wlan_down() -> NetworkInterface {
        ni("wlan1", &[v4(192, 168, 9, 9, 24)], BROADCAST)
    }

    fn by_name(intf: &NetworkInterface) -> bool {
        intf.name.starts_with("wlan")
    }

    #[test]
    fn wireless_interface_wins_over_wired() {
        let interfaces = vec![lo(), eth0(), wlan0()];
        let prefix = select_subnet(&interfaces, None, by_name);
        assert_eq!(prefix, Some(SubnetPrefix::new(192, 168, 1)));
    }

    #[test]
    fn falls_back_to_private_lan_without_wireless() {
        let interfaces = vec![lo(), eth0()];
        let prefix = select_subnet(&interfaces, None, by_name);
        assert_eq!(prefix, Some(SubnetPrefix::new(10, 0, 5)));
    }

    #[test]
    fn down_interfaces_are_ignored() {
        let interfaces = vec![lo(), wlan_down()];
        assert_eq!(select_subnet(&interfaces, None, by_name), None);
    }

    #[test]
    fn explicit_interface_is_honoured() {
        let interfaces = vec![lo(), eth0(), wlan0()];
        let prefix = select_subnet(&interfaces, Some("eth0"), by_name);
        assert_eq!(prefix, Some(SubnetPrefix::new(10, 0, 5)));
    }

    #[test]
    fn explicit_interface_without_ipv4_yields_none() {
        let v6_only = ni("wlan0", &[v6("fe80::1", 64)], UP | BROADCAST);
        let interfaces = vec![lo(), eth0(), v6_only];
        assert_eq!(select_subnet(&interfaces, Some("wlan0"), by_name), None);
        assert_eq!(select_subnet(&interfaces, Some("missing0"), by_name), None);
    }

    #[test]
    fn loopback_only_yields_none() {
        assert_eq!(select_subnet(&[lo()], None, |_| true), None);
    }
}
