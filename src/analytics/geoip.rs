//! Country lookup for visitor addresses
//!
//! Addresses are resolved against an offline table, either a memory-mapped
//! MaxMind GeoLite2/GeoIP2 database or an in-memory CIDR table. Loopback,
//! private and otherwise non-routable addresses are never looked up.

use anyhow::{Context, Result};
use ipnet::IpNet;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, LazyLock};

use crate::analytics::visitor::UNKNOWN;
use crate::config::AnalyticsConfig;

/// Networks whose addresses never carry a country
const NON_ROUTABLE: &[(IpAddr, u8)] = &[
    (IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8),
    (IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 8),
    (IpAddr::V4(Ipv4Addr::new(100, 64, 0, 0)), 10),
    (IpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)), 8),
    (IpAddr::V4(Ipv4Addr::new(169, 254, 0, 0)), 16),
    (IpAddr::V4(Ipv4Addr::new(172, 16, 0, 0)), 12),
    (IpAddr::V4(Ipv4Addr::new(192, 168, 0, 0)), 16),
    (IpAddr::V4(Ipv4Addr::new(255, 255, 255, 255)), 32),
    (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 128),
    (IpAddr::V6(Ipv6Addr::LOCALHOST), 128),
    (IpAddr::V6(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0)), 7),
    (IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0)), 10),
];

static NON_ROUTABLE_NETS: LazyLock<Vec<IpNet>> = LazyLock::new(|| {
    NON_ROUTABLE
        .iter()
        .filter_map(|(addr, prefix)| IpNet::new(*addr, *prefix).ok())
        .collect()
});

/// Parse a client address as extracted from request headers
///
/// Accepts bare IPv4/IPv6 addresses as well as `ip:port` and `[ip]:port`
/// forms. IPv4-mapped IPv6 addresses are returned as IPv4.
pub fn parse_client_address(address: &str) -> Option<IpAddr> {
    let address = address.trim();
    if address.is_empty() || address.eq_ignore_ascii_case(UNKNOWN) {
        return None;
    }

    let ip = address
        .parse::<IpAddr>()
        .ok()
        .or_else(|| address.parse::<SocketAddr>().ok().map(|s| s.ip()))?;

    Some(ip.to_canonical())
}

/// Whether an address may be geolocated at all
pub fn is_routable(ip: IpAddr) -> bool {
    let ip = ip.to_canonical();
    !NON_ROUTABLE_NETS.iter().any(|net| net.contains(&ip))
}

/// An offline IP to country table
pub trait CountryTable: Send + Sync {
    /// Look up the country for a routable address
    fn country_code(&self, ip: IpAddr) -> Option<String>;
}

/// MaxMind GeoLite2/GeoIP2 database (Country or City edition)
pub struct MaxMindTable {
    reader: Reader<Mmap>,
}

impl MaxMindTable {
    /// Memory-map the .mmdb file at `path`
    pub fn open(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
        Ok(Self { reader })
    }
}

impl CountryTable for MaxMindTable {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        // geoip2::Country decodes from both the Country and City editions,
        // the latter being a superset.
        let result = self.reader.lookup(ip).ok()?;
        let country = result.decode::<geoip2::Country>().ok()??;
        country.country.iso_code.map(|s| s.to_string())
    }
}

/// In-memory CIDR table, longest prefix wins
#[derive(Debug, Clone, Default)]
pub struct CidrTable {
    entries: Vec<(IpNet, String)>,
}

impl CidrTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, net: IpNet, country_code: impl Into<String>) {
        self.entries.push((net.trunc(), country_code.into()));
    }

    pub fn with_entry(mut self, net: IpNet, country_code: impl Into<String>) -> Self {
        self.insert(net, country_code);
        self
    }
}

impl CountryTable for CidrTable {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        self.entries
            .iter()
            .filter(|(net, _)| net.contains(&ip))
            .max_by_key(|(net, _)| net.prefix_len())
            .map(|(_, code)| code.clone())
    }
}

/// Resolves client addresses to ISO 3166-1 alpha-2 country codes
#[derive(Clone, Default)]
pub struct CountryResolver {
    table: Option<Arc<dyn CountryTable>>,
}

impl CountryResolver {
    pub fn new(table: Arc<dyn CountryTable>) -> Self {
        Self { table: Some(table) }
    }

    /// A resolver without a table; every address is unresolved
    pub fn disabled() -> Self {
        Self { table: None }
    }

    /// Build a resolver from the configured GeoIP database, if any
    pub fn from_config(config: &AnalyticsConfig) -> Result<Self> {
        match config.geoip_db_path.as_deref() {
            Some(path) => Ok(Self::new(Arc::new(MaxMindTable::open(path)?))),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Resolve an extracted client address
    ///
    /// Returns `None` for `unknown`, unparsable, loopback and private
    /// addresses without consulting the table, and for addresses the table
    /// does not know.
    pub fn resolve(&self, address: &str) -> Option<String> {
        let ip = parse_client_address(address)?;
        if !is_routable(ip) {
            return None;
        }

        let code = self.table.as_ref()?.country_code(ip)?;
        normalize_country_code(&code)
    }
}

fn normalize_country_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}
