//! Parsers for the three textual shapes a forward arrives in: the user-typed
//! port-spec mini-grammar, ssh's native colon syntax on `-L`/`-R`/`-D`
//! operands, and the two-token form used by ssh_config forward directives.

use crate::{ForwardKind, PortForward};

const DEFAULT_HOST: &str = "localhost";

/// Parses a whitespace-separated list of user-typed port specs.
///
/// Each token splits on `:` and is read by segment count:
/// one segment is a bare port, two segments are either `host:port` or
/// `src:dst` depending on whether the first segment is numeric, three
/// segments are `src:host:dst`. Any malformed token fails the whole batch;
/// no partial result is returned.
pub fn parse_port_specs(
    kind: ForwardKind,
    specs: &str,
) -> anyhow::Result<Vec<PortForward>> {
    let mut forwards = Vec::new();
    for token in specs.split_whitespace() {
        forwards.push(parse_port_spec(kind, token)?);
    }
    Ok(forwards)
}

fn parse_port_spec(kind: ForwardKind, token: &str) -> anyhow::Result<PortForward> {
    let segments: Vec<&str> = token.split(':').collect();
    let (host, src, dst) = match segments.as_slice() {
        [port] => {
            let port = parse_port(port, token)?;
            (DEFAULT_HOST.to_string(), port, port)
        }
        [first, second] => {
            // numeric-first is a src:dst pair, non-numeric-first overrides
            // the host and uses one port for both ends
            if first.parse::<u16>().is_ok() {
                (
                    DEFAULT_HOST.to_string(),
                    parse_port(first, token)?,
                    parse_port(second, token)?,
                )
            } else {
                let port = parse_port(second, token)?;
                (first.to_string(), port, port)
            }
        }
        [src, host, dst] => (
            host.to_string(),
            parse_port(src, token)?,
            parse_port(dst, token)?,
        ),
        _ => anyhow::bail!("Failed to parse port ({token})."),
    };
    let forward = match kind {
        ForwardKind::Dynamic => PortForward {
            kind,
            host: DEFAULT_HOST.to_string(),
            src,
            dst: src,
            bind: None,
        },
        ForwardKind::Local | ForwardKind::Remote => PortForward {
            kind,
            host,
            src,
            dst,
            bind: None,
        },
    };
    Ok(forward)
}

// ports are 1..=65535; 0 is not a bindable forward port
fn parse_port(segment: &str, token: &str) -> anyhow::Result<u16> {
    match segment.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(anyhow::anyhow!("Failed to parse port ({token}).")),
    }
}

/// Parses the operand of a `-L`/`-R`/`-D` flag as found on a live ssh
/// command line: `[bind:]src:host:dst` for local/remote, `[bind:]port` for
/// dynamic.
pub fn parse_flag_spec(kind: ForwardKind, spec: &str) -> anyhow::Result<PortForward> {
    match kind {
        ForwardKind::Dynamic => parse_listen_part(kind, spec, DEFAULT_HOST, None),
        ForwardKind::Local | ForwardKind::Remote => {
            let segments: Vec<&str> = spec.split(':').collect();
            let (bind, src, host, dst) = match segments.as_slice() {
                [src, host, dst] => (None, *src, *host, *dst),
                [bind, src, host, dst] => (Some(bind.to_string()), *src, *host, *dst),
                _ => anyhow::bail!("invalid forward spec {spec}, expected [bind:]src:host:dst"),
            };
            Ok(PortForward {
                kind,
                host: host.to_string(),
                src: parse_port(src, spec)?,
                dst: parse_port(dst, spec)?,
                bind,
            })
        }
    }
}

/// Parses the value of a `LocalForward`/`RemoteForward` ssh_config
/// directive: a listen token (`src` or `bind:src`) followed by the
/// destination `host:dst`. `DynamicForward` carries only the listen token.
pub fn parse_config_entry(kind: ForwardKind, entry: &str) -> anyhow::Result<PortForward> {
    let entry = entry.trim();
    match kind {
        ForwardKind::Dynamic => parse_flag_spec(kind, entry),
        ForwardKind::Local | ForwardKind::Remote => {
            let (listen, dest) = entry
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow::anyhow!("invalid forward entry {entry}, expected <listen> <host:port>"))?;
            let (host, dst) = dest
                .trim()
                .rsplit_once(':')
                .ok_or_else(|| anyhow::anyhow!("invalid destination in {entry}, expected host:port"))?;
            let dst = parse_port(dst, entry)?;
            let forward = parse_listen_part(kind, listen, host, Some(dst))?;
            Ok(forward)
        }
    }
}

fn parse_listen_part(
    kind: ForwardKind,
    listen: &str,
    host: &str,
    dst: Option<u16>,
) -> anyhow::Result<PortForward> {
    let (bind, src) = match listen.rsplit_once(':') {
        Some((bind, src)) => (Some(bind.to_string()), src),
        None => (None, listen),
    };
    let src = parse_port(src, listen)?;
    Ok(PortForward {
        kind,
        host: host.to_string(),
        src,
        dst: dst.unwrap_or(src),
        bind,
    })
}
