mod cli;
mod render;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Command};
use render::render_groups;
use std::io::{self, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tunnel_manager::{create_tunnel, group_connections, snapshot, stop_tunnel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    match args.command {
        Command::List { json, hosts } => list(json, hosts).await,
        Command::Watch { interval, hosts } => watch(interval, hosts).await,
        Command::Create { kind, host, ports } => {
            let pid = create_tunnel(kind.into(), &host, &ports).await?;
            println!("tunnel to {host} created (pid {pid})");
            Ok(())
        }
        Command::Stop { pid, yes } => stop(pid, yes),
    }
}

async fn list(json: bool, hosts: bool) -> anyhow::Result<()> {
    let connections = snapshot().await?;
    let groups = group_connections(&connections);
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        println!("{}", render_groups(&groups, hosts));
    }
    Ok(())
}

async fn watch(interval: Duration, hosts: bool) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        handle.cancel();
    });
    loop {
        let connections = snapshot().await?;
        let groups = group_connections(&connections);
        // full repaint each tick, the previous snapshot is discarded
        println!("\x1b[2J\x1b[H{}", render_groups(&groups, hosts));
        io::stdout().flush().ok();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    Ok(())
}

fn stop(pid: u32, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm(&format!("Stop tunnel pid {pid}?"))? {
        println!("aborted");
        return Ok(());
    }
    stop_tunnel(pid)?;
    println!("sent SIGTERM to pid {pid}");
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry().with(filter).with(layer).init();
}
