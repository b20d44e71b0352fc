use tracing::info;

/// Sends SIGTERM to a process. Delivery is fire-and-forget; whether the
/// process actually exits is not verified.
pub fn terminate(pid: u32) -> anyhow::Result<()> {
    info!(pid, "sending SIGTERM");
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        anyhow::bail!("failed to signal pid {pid}: {err}");
    }
    Ok(())
}
