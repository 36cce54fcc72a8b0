//! IPv4 address ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network in CIDR notation, with all host bits zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// The `index`-th block of length `prefix` inside this network.
    pub fn nth_subnet(&self, prefix: u8, index: u32) -> Option<Ipv4Cidr> {
        if prefix < self.prefix || prefix > 32 {
            return None;
        }
        let bits = u32::from(prefix - self.prefix);
        if bits < 32 && u64::from(index) >= 1u64 << bits {
            return None;
        }
        let step = if prefix == 32 { 1 } else { 1u32 << (32 - prefix) };
        let base = u32::from(self.addr).checked_add(index.checked_mul(step)?)?;
        Some(Ipv4Cidr {
            addr: Ipv4Addr::from(base),
            prefix,
        })
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("'{}' is not in address/prefix form", s))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("'{}' is not an IPv4 address", addr))?;
        let prefix: u8 = Some(prefix)
            .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|p| p.parse().ok())
            .filter(|p| *p <= 32)
            .ok_or_else(|| format!("'{}' is not a prefix length between 0 and 32", prefix))?;

        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        if u32::from(addr) & !mask != 0 {
            return Err(format!("'{}' has host bits set for a /{} network", addr, prefix));
        }

        Ok(Self { addr, prefix })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let cidr: Ipv4Cidr = "10.1.0.0/16".parse().unwrap();
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.1.0.0/16");
    }

    #[test]
    fn test_rejects_malformed_ranges() {
        assert!("10.1.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0.1/16".parse::<Ipv4Cidr>().is_err());
        assert!("not-a-range".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_prefix_must_be_plain_digits() {
        assert!("10.1.0.0/+16".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0.0/ 16".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0.0/".parse::<Ipv4Cidr>().is_err());
        assert!("10.1.0.0/016".parse::<Ipv4Cidr>().is_ok());
    }

    #[test]
    fn test_nth_subnet() {
        let cidr: Ipv4Cidr = "10.1.0.0/16".parse().unwrap();
        assert_eq!(cidr.nth_subnet(24, 0).unwrap().to_string(), "10.1.0.0/24");
        assert_eq!(cidr.nth_subnet(24, 1).unwrap().to_string(), "10.1.1.0/24");
        assert_eq!(cidr.nth_subnet(24, 255).unwrap().to_string(), "10.1.255.0/24");
        assert!(cidr.nth_subnet(24, 256).is_none());
        assert!(cidr.nth_subnet(8, 0).is_none());
    }
}
