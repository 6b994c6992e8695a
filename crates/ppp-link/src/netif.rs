//! Network interface record
//!
//! The network stack's view of the PPP interface: addresses negotiated by
//! IPCP, DNS servers and routing flags.

use std::net::Ipv4Addr;

/// Address configuration as exposed by `ifconfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfConfig {
    /// Our address
    pub addr: Ipv4Addr,
    /// Netmask
    pub netmask: Ipv4Addr,
    /// Gateway, the peer's address on a point-to-point link
    pub gateway: Ipv4Addr,
    /// Primary DNS server
    pub dns: Ipv4Addr,
}

impl Default for IfConfig {
    fn default() -> Self {
        Self {
            addr: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            dns: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Logical network interface owned by a link engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    name: String,
    addr: Ipv4Addr,
    netmask: Ipv4Addr,
    gateway: Ipv4Addr,
    dns: [Ipv4Addr; 2],
    is_default: bool,
}

impl InterfaceRecord {
    /// Create an unconfigured interface record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            dns: [Ipv4Addr::UNSPECIFIED; 2],
            is_default: false,
        }
    }

    /// Interface name, e.g. `ppp0`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Our address
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Netmask
    pub fn netmask(&self) -> Ipv4Addr {
        self.netmask
    }

    /// Peer address
    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    /// DNS server at `index` (0 or 1)
    pub fn dns(&self, index: usize) -> Ipv4Addr {
        self.dns.get(index).copied().unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    /// True when a non-zero address has been assigned
    pub fn has_address(&self) -> bool {
        !self.addr.is_unspecified()
    }

    /// Whether this interface carries the default route
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Mark or unmark this interface as the default route
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    /// Store the addresses negotiated by IPCP
    pub fn set_addresses(&mut self, addr: Ipv4Addr, netmask: Ipv4Addr, gateway: Ipv4Addr) {
        self.addr = addr;
        self.netmask = netmask;
        self.gateway = gateway;
    }

    /// Store a DNS server; indices past the second slot are ignored
    pub fn set_dns(&mut self, index: usize, server: Ipv4Addr) {
        if let Some(slot) = self.dns.get_mut(index) {
            *slot = server;
        }
    }

    /// Clear negotiated addresses (link down)
    pub fn clear_addresses(&mut self) {
        self.addr = Ipv4Addr::UNSPECIFIED;
        self.netmask = Ipv4Addr::UNSPECIFIED;
        self.gateway = Ipv4Addr::UNSPECIFIED;
    }

    /// Current address configuration
    pub fn ifconfig(&self) -> IfConfig {
        IfConfig {
            addr: self.addr,
            netmask: self.netmask,
            gateway: self.gateway,
            dns: self.dns[0],
        }
    }

    /// Overwrite the address configuration
    pub fn set_ifconfig(&mut self, config: &IfConfig) {
        self.set_addresses(config.addr, config.netmask, config.gateway);
        self.dns[0] = config.dns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unconfigured() {
        let netif = InterfaceRecord::new("ppp0");
        assert_eq!(netif.name(), "ppp0");
        assert!(!netif.has_address());
        assert!(!netif.is_default());
        assert_eq!(netif.ifconfig(), IfConfig::default());
    }

    #[test]
    fn test_ifconfig_round_trip() {
        let mut netif = InterfaceRecord::new("ppp0");
        let config = IfConfig {
            addr: Ipv4Addr::new(10, 0, 0, 2),
            netmask: Ipv4Addr::new(255, 255, 255, 255),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
            dns: Ipv4Addr::new(8, 8, 8, 8),
        };
        netif.set_ifconfig(&config);

        assert!(netif.has_address());
        assert_eq!(netif.ifconfig(), config);
        assert_eq!(netif.dns(0), Ipv4Addr::new(8, 8, 8, 8));
    }

    #[test]
    fn test_dns_out_of_range() {
        let mut netif = InterfaceRecord::new("ppp0");
        netif.set_dns(5, Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(netif.dns(5), Ipv4Addr::UNSPECIFIED);
        assert_eq!(netif.dns(1), Ipv4Addr::UNSPECIFIED);
    }
}
