pub mod config;
pub mod group;
pub mod inspect;
pub mod lifecycle;

pub use config::SshClientConfig;
pub use group::{group_connections, PortForwardGroup};
pub use inspect::{connections_from_processes, Connection};
pub use lifecycle::{create_tunnel, snapshot, stop_tunnel};
