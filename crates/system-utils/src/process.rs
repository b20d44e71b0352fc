use std::process::{Output, Stdio};

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};

const PS_TIMEOUT: Duration = Duration::from_secs(5);

/// A point-in-time view of one OS process: enough to recognize ssh clients
/// and to signal them later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cmd: String,
}

/// Lists all processes via `ps`, keeping pid, executable name and the full
/// command line. The executable name is the basename of the comm column.
pub async fn list_processes() -> anyhow::Result<Vec<ProcessInfo>> {
    let mut cmd = Command::new("ps");
    cmd.arg("-axww").arg("-o").arg("pid=,comm=,args=");
    let output = run_command_with_timeout(&mut cmd, PS_TIMEOUT, "ps").await?;
    if !output.status.success() {
        anyhow::bail!(
            "ps failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_ps_output(&stdout))
}

fn parse_ps_output(stdout: &str) -> Vec<ProcessInfo> {
    let mut processes = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        let Some((pid, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let Some((comm, args)) = rest.trim_start().split_once(char::is_whitespace) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };
        let name = comm.rsplit('/').next().unwrap_or(comm).to_string();
        processes.push(ProcessInfo {
            pid,
            name,
            cmd: args.trim_start().to_string(),
        });
    }
    processes
}

/// Spawns a detached child with all stdio closed. The returned handle does
/// not kill the child when dropped.
pub fn spawn_detached(program: &str, args: &[String]) -> anyhow::Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    Ok(child)
}

pub async fn run_command_with_timeout(
    cmd: &mut Command,
    command_timeout: Duration,
    label: &str,
) -> anyhow::Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|err| anyhow::anyhow!(err))?;
    // drain both pipes while waiting; a child filling the pipe buffer would
    // otherwise block and never exit
    let stdout_task = tokio::spawn(drain_pipe(child.stdout.take()));
    let stderr_task = tokio::spawn(drain_pipe(child.stderr.take()));
    let status = match timeout(command_timeout, child.wait()).await {
        Ok(result) => result.with_context(|| format!("{label} failed"))?,
        Err(_) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            anyhow::bail!("{label} timed out after {}s", command_timeout.as_secs())
        }
    };
    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn drain_pipe<R>(pipe: Option<R>) -> Vec<u8>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}
