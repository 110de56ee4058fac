/// Identity under which a logged-in remote session is registered
use std::fmt;

/// Port used when the client does not name one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Full connection identity of a remote session.
///
/// The password is deliberately not part of the key. The textual form is
/// `"{host}:{port}{username}"`, the key handed back to clients on login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl SessionKey {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
        }
    }

    /// Build the key from the `hostIp` field of an API request (`host` or `host:port`).
    pub fn from_request(host_and_port: &str, username: &str) -> Option<Self> {
        let (host, port) = parse_host_port(host_and_port)?;
        Some(Self::new(host, port, username))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.username)
    }
}

/// Split `host[:port]`, accepting `[v6addr]:port` and bare IPv6 addresses.
pub fn parse_host_port(value: &str) -> Option<(String, u16)> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().ok()?,
            None if tail.is_empty() => DEFAULT_SSH_PORT,
            None => return None,
        };
        return (!host.is_empty()).then(|| (host.to_string(), port));
    }

    let (host, port) = match value.matches(':').count() {
        0 => (value, DEFAULT_SSH_PORT),
        1 => {
            let (host, port) = value.split_once(':')?;
            (host, port.parse().ok()?)
        }
        _ => (value, DEFAULT_SSH_PORT),
    };
    (!host.is_empty()).then(|| (host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_text_combines_host_port_and_user() {
        let key = SessionKey::from_request("10.0.0.5:2222", "alice").unwrap();
        assert_eq!(key.to_string(), "10.0.0.5:2222alice");
        assert_eq!(key, SessionKey::new("10.0.0.5", 2222, "alice"));
    }

    #[test]
    fn missing_port_defaults_to_22() {
        let key = SessionKey::from_request("example.org", "bob").unwrap();
        assert_eq!(key.port, 22);
        assert_eq!(key.to_string(), "example.org:22bob");
    }

    #[test]
    fn different_ports_are_different_sessions() {
        let a = SessionKey::from_request("h:22", "u").unwrap();
        let b = SessionKey::from_request("h:2222", "u").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn ipv6_forms_are_accepted() {
        assert_eq!(parse_host_port("[::1]:2200"), Some(("::1".to_string(), 2200)));
        assert_eq!(parse_host_port("[::1]"), Some(("::1".to_string(), 22)));
        assert_eq!(parse_host_port("fe80::1"), Some(("fe80::1".to_string(), 22)));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(parse_host_port(""), None);
        assert_eq!(parse_host_port(":22"), None);
        assert_eq!(parse_host_port("host:notaport"), None);
        assert_eq!(parse_host_port("host:70000"), None);
        assert_eq!(parse_host_port("[::1]x"), None);
    }
}
