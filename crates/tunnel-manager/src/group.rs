//! Display-time aggregation of forwards across connections, keyed by the
//! effective remote host.

use forward_protocol::{is_loopback, PortForward};
use serde::Serialize;

use crate::inspect::Connection;

/// Forwards from all connections that target the same effective host. A
/// loopback-bound forward counts toward the owning connection's destination
/// host rather than the local machine.
#[derive(Clone, Debug, Serialize)]
pub struct PortForwardGroup {
    pub host: String,
    pub fwds: Vec<PortForward>,
    pub cons: Vec<Connection>,
}

/// Groups every forward by effective host. Keys compare by exact string
/// match; group and member order follow first appearance in the input.
pub fn group_connections(connections: &[Connection]) -> Vec<PortForwardGroup> {
    let mut groups: Vec<PortForwardGroup> = Vec::new();
    for connection in connections {
        for fwd in &connection.fwds {
            let effective_host = if is_loopback(&fwd.host) {
                connection.host.as_str()
            } else {
                fwd.host.as_str()
            };
            let idx = match groups.iter().position(|g| g.host == effective_host) {
                Some(idx) => idx,
                None => {
                    groups.push(PortForwardGroup {
                        host: effective_host.to_string(),
                        fwds: Vec::new(),
                        cons: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            group.fwds.push(fwd.clone());
            if !group.cons.iter().any(|c| c.pid == connection.pid) {
                group.cons.push(connection.clone());
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use forward_protocol::ForwardKind;

    fn fwd(host: &str, src: u16, dst: u16) -> PortForward {
        PortForward {
            kind: ForwardKind::Local,
            host: host.to_string(),
            src,
            dst,
            bind: None,
        }
    }

    fn con(pid: u32, host: &str, fwds: Vec<PortForward>) -> Connection {
        Connection {
            host: host.to_string(),
            pid,
            fwds,
        }
    }

    #[test]
    fn loopback_forwards_group_under_connection_host() {
        let cons = [con(1, "jump.example.com", vec![fwd("127.0.0.1", 8080, 8080)])];
        let groups = group_connections(&cons);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].host, "jump.example.com");
    }

    #[test]
    fn named_hosts_group_by_exact_string() {
        let cons = [con(
            1,
            "jump",
            vec![fwd("db.internal", 8080, 5432), fwd("db.internal", 8081, 5433)],
        )];
        let groups = group_connections(&cons);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].host, "db.internal");
        assert_eq!(groups[0].fwds.len(), 2);
    }

    #[test]
    fn groups_aggregate_across_connections() {
        let cons = [
            con(1, "a.example.com", vec![fwd("localhost", 8080, 8080)]),
            con(2, "a.example.com", vec![fwd("localhost", 9090, 9090)]),
        ];
        let groups = group_connections(&cons);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fwds.len(), 2);
        let pids: Vec<u32> = groups[0].cons.iter().map(|c| c.pid).collect();
        assert_eq!(pids, vec![1, 2]);
    }

    #[test]
    fn each_forward_lands_in_exactly_one_group() {
        let cons = [con(
            1,
            "jump",
            vec![fwd("localhost", 8080, 8080), fwd("db.internal", 5432, 5432)],
        )];
        let groups = group_connections(&cons);
        let total: usize = groups.iter().map(|g| g.fwds.len()).sum();
        assert_eq!(total, 2);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn connection_listed_once_per_group() {
        let cons = [con(
            1,
            "jump",
            vec![fwd("localhost", 1, 1), fwd("127.0.0.1", 2, 2)],
        )];
        let groups = group_connections(&cons);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].cons.len(), 1);
    }

    #[test]
    fn connections_without_forwards_produce_no_groups() {
        let cons = [con(1, "plain", vec![])];
        assert!(group_connections(&cons).is_empty());
    }
}
