use clap::{Parser, Subcommand, ValueEnum};
use forward_protocol::ForwardKind;
use std::time::Duration;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KindArg {
    Local,
    Remote,
    Dynamic,
}

impl From<KindArg> for ForwardKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Local => ForwardKind::Local,
            KindArg::Remote => ForwardKind::Remote,
            KindArg::Dynamic => ForwardKind::Dynamic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tunnelscope",
    version,
    about = "Inspect and manage live ssh tunnels"
)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show active tunnels grouped by destination host
    List {
        #[arg(long)]
        json: bool,
        /// Qualify each forward with its destination host
        #[arg(long)]
        hosts: bool,
    },
    /// Re-list tunnels on a fixed interval until interrupted
    Watch {
        #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
        interval: Duration,
        #[arg(long)]
        hosts: bool,
    },
    /// Spawn a detached `ssh -N` tunnel
    Create {
        #[arg(long, value_enum, default_value_t = KindArg::Local)]
        kind: KindArg,
        /// ssh destination host
        host: String,
        /// Whitespace-separated port specs (src, src:dst or src:host:dst)
        ports: String,
    },
    /// Terminate a tunnel by pid
    Stop {
        pid: u32,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
