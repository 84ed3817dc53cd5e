//! WebSocket endpoint addressing

use crate::osc::OscError;
use std::fmt;
use std::str::FromStr;

/// A `ws://` or `wss://` endpoint with explicit host and port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    secure: bool,
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Plain `ws://host:port/`
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, OscError> {
        let host = host.into();
        if host.is_empty() || port == 0 {
            return Err(OscError::InvalidEndpoint(format!("ws://{}:{}", host, port)));
        }
        Ok(Self {
            secure: false,
            host,
            port,
            path: "/".to_string(),
        })
    }

    /// Switch to `wss://`
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Full URL handed to the WebSocket client
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        if self.host.contains(':') {
            format!("{}://[{}]:{}{}", scheme, self.host, self.port, self.path)
        } else {
            format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
        }
    }
}

impl FromStr for Endpoint {
    type Err = OscError;

    /// Parse `ws://host[:port][/path]`; the port defaults to 80 (443 for `wss`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OscError::InvalidEndpoint(s.to_string());

        let (secure, rest) = if let Some(rest) = s.strip_prefix("ws://") {
            (false, rest)
        } else if let Some(rest) = s.strip_prefix("wss://") {
            (true, rest)
        } else {
            return Err(invalid());
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            // IPv6 literal: [::1]:8081
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            let port = match after.strip_prefix(':') {
                Some(p) => Some(p),
                None if after.is_empty() => None,
                None => return Err(invalid()),
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid())?,
            None if secure => 443,
            None => 80,
        };
        if host.is_empty() || port == 0 {
            return Err(invalid());
        }

        Ok(Self {
            secure,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
