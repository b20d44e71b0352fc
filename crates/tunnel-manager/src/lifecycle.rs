//! Snapshot, create and stop operations. A snapshot is recomputed from OS
//! state on every call; nothing is persisted between calls.

use anyhow::Context;
use forward_protocol::{spec::parse_port_specs, ForwardKind};
use tokio::time::Duration;
use tracing::{debug, info};

use crate::config::SshClientConfig;
use crate::inspect::{connections_from_processes, Connection};

/// How long to watch a freshly spawned ssh for an early exit before calling
/// the tunnel established. A failure after this window goes undetected.
const SPAWN_GRACE: Duration = Duration::from_secs(1);

/// Builds the current set of live ssh connections. A missing or unreadable
/// ssh_config only suppresses config-declared forwards, never the listing.
pub async fn snapshot() -> anyhow::Result<Vec<Connection>> {
    let procs = system_utils::process::list_processes().await?;
    let config = match SshClientConfig::load_default() {
        Ok(config) => config,
        Err(err) => {
            debug!(error = %err, "ssh_config unavailable, using CLI forwards only");
            SshClientConfig::default()
        }
    };
    Ok(connections_from_processes(&procs, &config))
}

/// Parses the port specs and spawns a detached `ssh -N` carrying them. If
/// the child exits with a failure inside the grace window the tunnel is
/// reported as failed; otherwise returns the child's pid. Best effort: a
/// clean early exit or a failure after the window both count as success.
pub async fn create_tunnel(
    kind: ForwardKind,
    host: &str,
    specs: &str,
) -> anyhow::Result<u32> {
    let fwds = parse_port_specs(kind, specs)?;
    if fwds.is_empty() {
        anyhow::bail!("no port specs given");
    }
    let mut args = vec!["-N".to_string()];
    for fwd in &fwds {
        args.push(fwd.kind.flag().to_string());
        args.push(fwd.to_flag_spec());
    }
    args.push(host.to_string());

    let mut child = system_utils::process::spawn_detached("ssh", &args)?;
    let pid = child.id().context("spawned ssh has no pid")?;
    info!(pid, host, forwards = fwds.len(), "spawned tunnel");

    tokio::select! {
        status = child.wait() => {
            let status = status.context("failed to wait on spawned ssh")?;
            if !status.success() {
                anyhow::bail!("Failed to create tunnel (ssh exited with {status})");
            }
        }
        _ = tokio::time::sleep(SPAWN_GRACE) => {}
    }
    Ok(pid)
}

/// Signals the recorded pid with SIGTERM. No check that the process was
/// still one of ours or that it actually died.
pub fn stop_tunnel(pid: u32) -> anyhow::Result<()> {
    system_utils::signal::terminate(pid)
}
