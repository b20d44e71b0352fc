//! Reconstructs live tunnel state from running ssh client processes. Each
//! snapshot is built from scratch; a `Connection` is only meaningful within
//! the snapshot that produced it.

use forward_protocol::{spec::parse_flag_spec, ForwardKind, PortForward};
use serde::Serialize;
use system_utils::process::ProcessInfo;
use tracing::debug;

use crate::config::SshClientConfig;

/// One live ssh client process and the forwards it carries, combining
/// command-line flags with forwards inherited from ssh_config.
#[derive(Clone, Debug, Serialize)]
pub struct Connection {
    pub host: String,
    pub pid: u32,
    pub fwds: Vec<PortForward>,
}

/// ssh flags that consume one operand and are irrelevant here. `-L`, `-R`
/// and `-D` also take an operand but are handled explicitly.
const FLAGS_WITH_OPERAND: &[char] = &[
    'B', 'b', 'c', 'E', 'e', 'F', 'I', 'i', 'J', 'l', 'm', 'O', 'o', 'p', 'Q', 'S', 'W', 'w',
];

/// Builds the current connection set from a process listing. Processes whose
/// executable name is not exactly `ssh` are ignored, as are ssh invocations
/// with no destination host.
pub fn connections_from_processes(
    procs: &[ProcessInfo],
    config: &SshClientConfig,
) -> Vec<Connection> {
    let mut connections = Vec::new();
    for proc in procs {
        if proc.name != "ssh" {
            continue;
        }
        let Some(mut connection) = parse_ssh_command(&proc.cmd, proc.pid) else {
            continue;
        };
        connection
            .fwds
            .extend(config.forwards_for_host(&connection.host));
        connections.push(connection);
    }
    connections
}

/// Walks the tokenized command line left to right. Forward flags consume an
/// operand that is parsed into a `PortForward`; other operand-taking flags
/// discard theirs; the first non-flag token is the destination host and ends
/// the walk (ssh puts the host before any trailing command).
fn parse_ssh_command(cmd: &str, pid: u32) -> Option<Connection> {
    let tokens = match shell_words::split(cmd) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!(pid, error = %err, "skipping unparseable ssh command line");
            return None;
        }
    };
    let mut fwds = Vec::new();
    let mut host = None;
    let mut tokens = tokens.into_iter().skip(1);
    while let Some(token) = tokens.next() {
        let Some(flag_body) = token.strip_prefix('-') else {
            host = Some(token);
            break;
        };
        let mut chars = flag_body.chars();
        let Some(flag) = chars.next() else {
            continue;
        };
        let attached: String = chars.collect();
        let forward_kind = match flag {
            'L' => Some(ForwardKind::Local),
            'R' => Some(ForwardKind::Remote),
            'D' => Some(ForwardKind::Dynamic),
            _ => None,
        };
        if let Some(kind) = forward_kind {
            let operand = if attached.is_empty() {
                tokens.next()
            } else {
                Some(attached)
            };
            let Some(operand) = operand else {
                continue;
            };
            match parse_flag_spec(kind, &operand) {
                Ok(forward) => fwds.push(forward),
                Err(err) => {
                    debug!(pid, operand, error = %err, "skipping unparseable forward flag");
                }
            }
        } else if FLAGS_WITH_OPERAND.contains(&flag) && attached.is_empty() {
            tokens.next();
        }
    }
    let host = host?;
    Some(Connection { host, pid, fwds })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(pid: u32, name: &str, cmd: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.to_string(),
            cmd: cmd.to_string(),
        }
    }

    fn inspect(cmd: &str) -> Connection {
        let procs = [proc(42, "ssh", cmd)];
        let mut cons = connections_from_processes(&procs, &SshClientConfig::default());
        assert_eq!(cons.len(), 1);
        cons.remove(0)
    }

    #[test]
    fn non_ssh_processes_are_ignored() {
        let procs = [
            proc(1, "sshd", "sshd: worker"),
            proc(2, "bash", "bash -c 'ssh somewhere'"),
        ];
        assert!(connections_from_processes(&procs, &SshClientConfig::default()).is_empty());
    }

    #[test]
    fn host_is_first_non_flag_token() {
        let con = inspect("ssh -N -L 8080:db.internal:5432 jump.example.com");
        assert_eq!(con.host, "jump.example.com");
        assert_eq!(con.pid, 42);
        assert_eq!(con.fwds.len(), 1);
        assert_eq!(con.fwds[0].host, "db.internal");
        assert_eq!((con.fwds[0].src, con.fwds[0].dst), (8080, 5432));
    }

    #[test]
    fn four_part_spec_keeps_bind_address() {
        let con = inspect("ssh -L 127.0.0.1:8080:db.internal:5432 jump");
        assert_eq!(con.fwds[0].bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(con.fwds[0].src, 8080);
    }

    #[test]
    fn operand_flags_do_not_swallow_the_host() {
        let con = inspect("ssh -o ServerAliveInterval=30 -p 2222 -i /key -N example.com");
        assert_eq!(con.host, "example.com");
        assert!(con.fwds.is_empty());
    }

    #[test]
    fn attached_operands_are_recognized() {
        let con = inspect("ssh -oBatchMode=yes -L9000:localhost:9000 -D1080 box");
        assert_eq!(con.host, "box");
        assert_eq!(con.fwds.len(), 2);
        assert_eq!(con.fwds[0].kind, ForwardKind::Local);
        assert_eq!(con.fwds[1].kind, ForwardKind::Dynamic);
        assert_eq!((con.fwds[1].src, con.fwds[1].dst), (1080, 1080));
    }

    #[test]
    fn scan_stops_at_host_before_remote_command() {
        let con = inspect("ssh host tail -f /var/log/syslog");
        assert_eq!(con.host, "host");
        assert!(con.fwds.is_empty());
    }

    #[test]
    fn connection_without_host_is_dropped() {
        let procs = [proc(7, "ssh", "ssh -V")];
        assert!(connections_from_processes(&procs, &SshClientConfig::default()).is_empty());
    }

    #[test]
    fn bad_forward_operand_does_not_drop_the_connection() {
        let con = inspect("ssh -L garbage -L 8080:db:80 jump");
        assert_eq!(con.host, "jump");
        assert_eq!(con.fwds.len(), 1);
    }

    #[test]
    fn config_forwards_are_appended_after_cli_forwards() {
        let config =
            SshClientConfig::parse("Host jump\nRemoteForward 2222 localhost:22\n");
        let procs = [proc(9, "ssh", "ssh -L 8080:db:5432 jump")];
        let cons = connections_from_processes(&procs, &config);
        assert_eq!(cons[0].fwds.len(), 2);
        assert_eq!(cons[0].fwds[0].kind, ForwardKind::Local);
        assert_eq!(cons[0].fwds[1].kind, ForwardKind::Remote);
        assert_eq!((cons[0].fwds[1].src, cons[0].fwds[1].dst), (2222, 22));
    }

    #[test]
    fn absent_config_stanza_leaves_cli_forwards_unchanged() {
        let config = SshClientConfig::parse("Host other\nLocalForward 1 localhost:1\n");
        let procs = [proc(9, "ssh", "ssh -D 1080 jump")];
        let cons = connections_from_processes(&procs, &config);
        assert_eq!(cons[0].fwds.len(), 1);
        assert_eq!(cons[0].fwds[0].kind, ForwardKind::Dynamic);
    }
}
