//! Compact one-line summaries of forward lists, e.g.
//! `← [8080, 9000:9001] → [2222] ←D [1080]`.

use crate::{is_loopback, ForwardKind, PortForward};

/// Renders a forward list as arrow-prefixed groups per direction. Directions
/// with no entries are omitted. With `host_qualified` set, entries carry the
/// destination host unless it is loopback.
pub fn describe_forwards(fwds: &[PortForward], host_qualified: bool) -> String {
    let mut sections = Vec::new();
    for (kind, arrow) in [
        (ForwardKind::Local, "←"),
        (ForwardKind::Remote, "→"),
        (ForwardKind::Dynamic, "←D"),
    ] {
        let entries: Vec<String> = fwds
            .iter()
            .filter(|fwd| fwd.kind == kind)
            .map(|fwd| describe_forward(fwd, host_qualified))
            .collect();
        if !entries.is_empty() {
            sections.push(format!("{arrow} [{}]", entries.join(", ")));
        }
    }
    sections.join(" ")
}

fn describe_forward(fwd: &PortForward, host_qualified: bool) -> String {
    let mut parts = vec![fwd.src.to_string()];
    if host_qualified && !is_loopback(&fwd.host) {
        parts.push(fwd.host.clone());
    }
    if fwd.dst != fwd.src {
        parts.push(fwd.dst.to_string());
    }
    parts.join(":")
}
