use crate::error::{Error, Result};

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;

/// Where a device lives. Fixed for the lifetime of a `Device`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    address: String,
    port: u16,
}

impl Endpoint {
    /// Checks the shape of the endpoint only. Name resolution happens when a
    /// connection is opened, and failing there is a connect error, not this.
    pub fn new(address: &str, port: u16) -> Result<Endpoint> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidEndpoint("empty address".into()));
        }
        if port == 0 {
            return Err(Error::InvalidEndpoint(format!("{}: port 0", address)));
        }
        // accept [::1] as well as ::1
        let bare = address.strip_prefix('[').and_then(|a| a.strip_suffix(']')).unwrap_or(address);
        if bare.parse::<IpAddr>().is_err() && !is_scoped_ipv6(bare) && !is_host_name(bare) {
            return Err(Error::InvalidEndpoint(format!("{} is neither an ip address nor a host name", address)));
        }
        Ok(Endpoint { address: bare.to_string(), port })
    }

    /// Parses `host:port`, or `[v6]:port`.
    pub fn parse(s: &str) -> Result<Endpoint> {
        let (address, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidEndpoint(format!("{} has no port", s)))?;
        let port = port
            .parse()
            .map_err(|_| Error::InvalidEndpoint(format!("{} is not a port", port)))?;
        Endpoint::new(address, port)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// `fe80::1%2` or `fe80::1%eth0`, a link-local address with its zone.
fn is_scoped_ipv6(s: &str) -> bool {
    match s.split_once('%') {
        Some((addr, zone)) => {
            addr.parse::<Ipv6Addr>().is_ok()
                && !zone.is_empty()
                && zone.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Host name labels, leniently: underscores are allowed since hosts files
/// carry them, and one trailing dot marks a fully qualified name.
fn is_host_name(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    s.len() <= 253
        && s.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Timeouts and socket options for a device.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    connect_timeout: Duration,
    request_timeout: Duration,
    frame_timeout: Duration,
    nodelay: bool,
}

impl Default for DeviceConfig {
    fn default() -> DeviceConfig {
        DeviceConfig {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            frame_timeout: Duration::from_secs(15),
            nodelay: true,
        }
    }
}

impl DeviceConfig {
    pub fn new() -> DeviceConfig {
        DeviceConfig::default()
    }

    /// Bound on establishing a connection.
    pub fn connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.connect_timeout = nonzero(timeout, self.connect_timeout);
        self
    }

    /// Bound on waiting for the answer to ping, open, get, set and release.
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.request_timeout = nonzero(timeout, self.request_timeout);
        self
    }

    /// Bound on waiting for a frame. Capture plus transfer takes a while, so
    /// this is kept well above the request timeout.
    pub fn frame_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.frame_timeout = nonzero(timeout, self.frame_timeout);
        self
    }

    pub fn nodelay(&mut self, nodelay: bool) -> &mut Self {
        self.nodelay = nodelay;
        self
    }

    pub fn get_connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn get_request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn get_frame_timeout(&self) -> Duration {
        self.frame_timeout
    }

    pub fn get_nodelay(&self) -> bool {
        self.nodelay
    }
}

// A zero timeout means "block forever" to the socket layer, which is exactly
// what the timeouts are there to prevent.
fn nonzero(timeout: Duration, current: Duration) -> Duration {
    if timeout.is_zero() {
        current
    } else {
        timeout
    }
}
