pub mod describe;
pub mod spec;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ForwardKind {
    Local,
    Remote,
    Dynamic,
}

impl ForwardKind {
    /// The ssh CLI flag that declares a forward of this kind.
    pub fn flag(&self) -> &'static str {
        match self {
            ForwardKind::Local => "-L",
            ForwardKind::Remote => "-R",
            ForwardKind::Dynamic => "-D",
        }
    }
}

/// A single directional port mapping carried over an ssh connection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PortForward {
    pub kind: ForwardKind,
    pub host: String,
    pub src: u16,
    pub dst: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

impl PortForward {
    /// Renders this forward in ssh's native colon syntax, suitable as the
    /// operand of `flag()`.
    pub fn to_flag_spec(&self) -> String {
        match self.kind {
            ForwardKind::Dynamic => match &self.bind {
                Some(bind) => format!("{}:{}", bind, self.src),
                None => self.src.to_string(),
            },
            ForwardKind::Local | ForwardKind::Remote => match &self.bind {
                Some(bind) => format!("{}:{}:{}:{}", bind, self.src, self.host, self.dst),
                None => format!("{}:{}:{}", self.src, self.host, self.dst),
            },
        }
    }
}

/// Loopback check used for grouping and host-qualified display. Exact string
/// match only, no resolution.
pub fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" || host == "::1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_spec_round_trip_shapes() {
        let fwd = PortForward {
            kind: ForwardKind::Local,
            host: "db.internal".to_string(),
            src: 8080,
            dst: 5432,
            bind: None,
        };
        assert_eq!(fwd.to_flag_spec(), "8080:db.internal:5432");

        let bound = PortForward {
            bind: Some("127.0.0.1".to_string()),
            ..fwd
        };
        assert_eq!(bound.to_flag_spec(), "127.0.0.1:8080:db.internal:5432");

        let dynamic = PortForward {
            kind: ForwardKind::Dynamic,
            host: "localhost".to_string(),
            src: 1080,
            dst: 1080,
            bind: None,
        };
        assert_eq!(dynamic.to_flag_spec(), "1080");
    }

    #[test]
    fn loopback_is_string_match() {
        assert!(is_loopback("localhost"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("::1"));
        assert!(!is_loopback("127.0.0.2"));
        assert!(!is_loopback("jump.example.com"));
    }
}
