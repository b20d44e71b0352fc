use forward_protocol::describe::describe_forwards;
use tunnel_manager::PortForwardGroup;

/// Plain-text listing: one block per group, the summary line first, then the
/// contributing connections with their pids.
pub(crate) fn render_groups(groups: &[PortForwardGroup], host_qualified: bool) -> String {
    if groups.is_empty() {
        return "no active tunnels".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let noun = if group.cons.len() == 1 {
            "connection"
        } else {
            "connections"
        };
        out.push_str(&format!(
            "{}  {}  ({} {})\n",
            group.host,
            describe_forwards(&group.fwds, host_qualified),
            group.cons.len(),
            noun
        ));
        for con in &group.cons {
            out.push_str(&format!(
                "  pid {:<8} {}  {}\n",
                con.pid,
                con.host,
                describe_forwards(&con.fwds, host_qualified)
            ));
        }
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use forward_protocol::{ForwardKind, PortForward};
    use tunnel_manager::{group_connections, Connection};

    #[test]
    fn renders_group_header_and_members() {
        let cons = [Connection {
            host: "jump.example.com".to_string(),
            pid: 312,
            fwds: vec![PortForward {
                kind: ForwardKind::Local,
                host: "127.0.0.1".to_string(),
                src: 8080,
                dst: 8080,
                bind: None,
            }],
        }];
        let groups = group_connections(&cons);
        let text = render_groups(&groups, false);
        assert!(text.starts_with("jump.example.com  ← [8080]  (1 connection)"));
        assert!(text.contains("pid 312"));
    }

    #[test]
    fn empty_snapshot_has_a_placeholder() {
        assert_eq!(render_groups(&[], false), "no active tunnels");
    }
}
