//! Host screening for user-submitted URLs.
//!
//! Rejects hostnames and IP addresses that point at local, private, or
//! otherwise reserved destinations. This covers:
//! - Loopback addresses (127.0.0.0/8, ::1)
//! - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
//! - Link-local addresses (169.254/16, fe80::/10)
//! - Multicast addresses (224/4, ff00::/8)
//! - Unspecified addresses (0.0.0.0/8, ::)
//! - IPv6 unique local (fc00::/7)

use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use ipnet::Ipv4Net;
use url::{Host, Url};
use urlvault_core::Error;

/// Hostnames that are never fetchable.
pub const BLOCKED_HOSTS: &[&str] = &["localhost"];

static PRIVATE_V4_RANGES: LazyLock<Vec<Ipv4Net>> = LazyLock::new(|| {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "169.254.0.0/16"]
        .iter()
        .map(|net| net.parse().expect("valid CIDR literal"))
        .collect()
});

fn is_private_v4(ip: Ipv4Addr) -> bool {
    PRIVATE_V4_RANGES.iter().any(|net| net.contains(&ip))
}

/// Check if an IP address is private, reserved, or otherwise blocked.
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || is_private_v4(v4)
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that a URL's host is fetchable.
///
/// Returns a [`Error::BlockedUrl`] naming the offending host otherwise.
pub fn screen_host(url: &Url) -> Result<(), Error> {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let lower = domain.to_ascii_lowercase();
            if BLOCKED_HOSTS.contains(&lower.as_str()) {
                return Err(Error::BlockedUrl(format!("domain not allowed: {lower}")));
            }
            Ok(())
        }
        Some(Host::Ipv4(ip)) => {
            if is_private_or_reserved(IpAddr::V4(ip)) {
                return Err(Error::BlockedUrl(format!("private or reserved IP address: {ip}")));
            }
            Ok(())
        }
        Some(Host::Ipv6(ip)) => {
            if is_private_or_reserved(IpAddr::V6(ip)) {
                return Err(Error::BlockedUrl(format!("private or reserved IP address: {ip}")));
            }
            Ok(())
        }
        None => Err(Error::InvalidUrl("URL has no host".to_string())),
    }
}
