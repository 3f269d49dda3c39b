//! Composite key codec.
//!
//! A composite key packs several parent-identifying fields into one string,
//! joined with `:`. Decoding reads from the right: the trailing tokens are
//! the fixed-shape components (port, protocol, name) and everything before
//! them is the host, which may itself contain colons (IPv6).
//!
//! ```text
//! 10.0.0.5:443:tcp            port key
//! fe80::1:22:tcp              port key, IPv6 host "fe80::1"
//! 10.0.0.5:443:tcp:https      service key = {port key}:{service name}
//! ```

use std::fmt::{self, Write};
use std::str::FromStr;
use thiserror::Error;

pub const SEPARATOR: char = ':';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("composite key '{key}' has {found} component(s), expected at least {expected}")]
    TooFewComponents {
        key: String,
        found: usize,
        expected: usize,
    },

    #[error("composite key '{key}' has non-integer port '{token}'")]
    InvalidPort { key: String, token: String },

    #[error("composite key '{key}' has an empty {component}")]
    EmptyComponent {
        key: String,
        component: &'static str,
    },
}

/// Join components with the separator.
pub fn encode<I, T>(components: I) -> String
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    let mut key = String::new();
    for (i, c) in components.into_iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        let _ = write!(key, "{}", c);
    }
    key
}

fn component_count(key: &str) -> usize {
    key.split(SEPARATOR).count()
}

/// `{host}:{port}:{protocol}`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortKey {
    pub host: String,
    pub port: u16,
    pub protocol: String,
}

impl PortKey {
    pub fn new(host: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: protocol.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode([self.host.as_str(), &self.port.to_string(), self.protocol.as_str()])
    }

    pub fn decode(key: &str) -> Result<Self, KeyError> {
        decode_port_key(key, key)
    }
}

// `original` is the full key reported in errors when decoding the prefix of
// a longer key.
fn decode_port_key(key: &str, original: &str) -> Result<PortKey, KeyError> {
    let mut tokens = key.rsplitn(3, SEPARATOR);
    let (Some(protocol), Some(port), Some(host)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(KeyError::TooFewComponents {
            key: original.to_string(),
            found: component_count(original),
            expected: component_count(original) - component_count(key) + 3,
        });
    };

    if host.is_empty() {
        return Err(KeyError::EmptyComponent {
            key: original.to_string(),
            component: "host",
        });
    }
    if protocol.is_empty() {
        return Err(KeyError::EmptyComponent {
            key: original.to_string(),
            component: "protocol",
        });
    }
    let port = port.parse::<u16>().map_err(|_| KeyError::InvalidPort {
        key: original.to_string(),
        token: port.to_string(),
    })?;

    Ok(PortKey::new(host, port, protocol))
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for PortKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// `{port key}:{service name}`: the two-level key a service's children carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub port: PortKey,
    pub name: String,
}

impl ServiceKey {
    pub fn new(port: PortKey, name: impl Into<String>) -> Self {
        Self {
            port,
            name: name.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode([self.port.encode(), self.name.clone()])
    }

    pub fn decode(key: &str) -> Result<Self, KeyError> {
        let Some((port_key, name)) = key.rsplit_once(SEPARATOR) else {
            return Err(KeyError::TooFewComponents {
                key: key.to_string(),
                found: component_count(key),
                expected: 4,
            });
        };
        if name.is_empty() {
            return Err(KeyError::EmptyComponent {
                key: key.to_string(),
                component: "service name",
            });
        }
        let port = decode_port_key(port_key, key)?;
        Ok(Self::new(port, name))
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for ServiceKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
