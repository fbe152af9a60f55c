// ── Reader endpoint ──
//
// Address of the KOReader HTTP server. An `Endpoint` may hold a value that
// fails validation; every request validates it first and refuses to touch
// the network when it is malformed.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Host used when nothing has been configured yet.
pub const DEFAULT_HOST: &str = "192.168.1.100";
/// Port used when nothing has been configured yet.
pub const DEFAULT_PORT: u16 = 8080;

/// Address and port of the remote reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Field-level validation failure for text input (settings forms, CLI flags).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointFieldError {
    Host(&'static str),
    Port(&'static str),
}

impl EndpointFieldError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Port(_) => "port",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Host(msg) | Self::Port(msg) => msg,
        }
    }
}

impl fmt::Display for EndpointFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for EndpointFieldError {}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Validate free-form host and port text, reporting the first bad field.
    pub fn parse(host: &str, port: &str) -> Result<Self, EndpointFieldError> {
        let host = host.trim();
        let port = port.trim();

        if host.is_empty() {
            return Err(EndpointFieldError::Host("IP address is required"));
        }
        if parse_dotted_quad(host).is_none() {
            return Err(EndpointFieldError::Host(
                "Invalid IPv4 address format (e.g., 192.168.1.100)",
            ));
        }
        if port.is_empty() {
            return Err(EndpointFieldError::Port("Port is required"));
        }
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or(EndpointFieldError::Port("Port must be between 1-65535"))?;

        Ok(Self::new(host, port))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the invariant and return the normalised socket parts.
    pub fn validate(&self) -> Result<(Ipv4Addr, u16), Error> {
        match parse_dotted_quad(&self.host) {
            Some(ip) if self.port != 0 => Ok((ip, self.port)),
            _ => Err(Error::InvalidEndpoint {
                host: self.host.clone(),
                port: self.port,
            }),
        }
    }

    /// Build `http://{ip}:{port}{path}` after validation.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let (ip, port) = self.validate()?;
        Url::parse(&format!("http://{ip}:{port}{path}")).map_err(|e| Error::Unexpected {
            message: format!("invalid request URL: {e}"),
        })
    }
}

/// Four 1-3 digit decimal octets, each <= 255. Leading zeros are accepted
/// and read as decimal so `010.0.0.1` targets 10.0.0.1, never octal 8.
fn parse_dotted_quad(host: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = host.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse::<u8>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}
