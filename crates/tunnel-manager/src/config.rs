//! Minimal ssh_config reader: just enough of the grammar to recover the
//! forward directives (`LocalForward`, `RemoteForward`, `DynamicForward`)
//! that apply to a given destination host. Host patterns support `*`, `?`
//! and `!` negation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use forward_protocol::{spec::parse_config_entry, ForwardKind, PortForward};
use tracing::debug;

#[derive(Debug, Default)]
pub struct SshClientConfig {
    stanzas: Vec<Stanza>,
}

#[derive(Debug, Default)]
struct Stanza {
    patterns: Vec<String>,
    forwards: Vec<(ForwardKind, String)>,
}

impl SshClientConfig {
    /// Reads and parses the user's `~/.ssh/config`.
    pub fn load_default() -> anyhow::Result<Self> {
        Self::load(&default_config_path()?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    /// Parses ssh_config text. Unknown keywords and malformed lines are
    /// skipped; only Host stanzas and forward directives are retained.
    pub fn parse(raw: &str) -> Self {
        let mut stanzas = Vec::new();
        let mut current: Option<Stanza> = None;
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((keyword, value)) = split_directive(line) else {
                continue;
            };
            match keyword.as_str() {
                "host" => {
                    if let Some(stanza) = current.take() {
                        stanzas.push(stanza);
                    }
                    current = Some(Stanza {
                        patterns: value.split_whitespace().map(str::to_string).collect(),
                        forwards: Vec::new(),
                    });
                }
                // a Match block ends the current Host stanza; its criteria
                // are not evaluated here
                "match" => {
                    if let Some(stanza) = current.take() {
                        stanzas.push(stanza);
                    }
                }
                "localforward" | "remoteforward" | "dynamicforward" => {
                    let kind = match keyword.as_str() {
                        "localforward" => ForwardKind::Local,
                        "remoteforward" => ForwardKind::Remote,
                        _ => ForwardKind::Dynamic,
                    };
                    if let Some(stanza) = current.as_mut() {
                        stanza.forwards.push((kind, value.to_string()));
                    }
                }
                _ => {}
            }
        }
        if let Some(stanza) = current.take() {
            stanzas.push(stanza);
        }
        Self { stanzas }
    }

    /// All forwards declared for stanzas whose patterns match `host`,
    /// in file order. Entries that fail to parse are dropped.
    pub fn forwards_for_host(&self, host: &str) -> Vec<PortForward> {
        let mut forwards = Vec::new();
        for stanza in &self.stanzas {
            if !matches_host_patterns(host, &stanza.patterns) {
                continue;
            }
            for (kind, entry) in &stanza.forwards {
                match parse_config_entry(*kind, entry) {
                    Ok(forward) => forwards.push(forward),
                    Err(err) => {
                        debug!(host, entry, error = %err, "skipping unparseable config forward");
                    }
                }
            }
        }
        forwards
    }
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").context("failed to resolve HOME")?;
    Ok(PathBuf::from(home).join(".ssh").join("config"))
}

/// Splits a config line into lowercased keyword and raw value, accepting
/// both `Key value` and `Key=value` forms.
fn split_directive(line: &str) -> Option<(String, &str)> {
    let split_at = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let keyword = line[..split_at].to_ascii_lowercase();
    let value = line[split_at..].trim_start_matches(['=', ' ', '\t']).trim();
    if value.is_empty() {
        return None;
    }
    Some((keyword, value))
}

/// A host matches a pattern list when at least one positive pattern matches
/// and no negated pattern does.
fn matches_host_patterns(host: &str, patterns: &[String]) -> bool {
    let mut matched = false;
    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            if wildcard_match(host, negated) {
                return false;
            }
        } else if wildcard_match(host, pattern) {
            matched = true;
        }
    }
    matched
}

fn wildcard_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    match_from(&text, &pattern)
}

fn match_from(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'*', rest)) => (0..=text.len()).any(|skip| match_from(&text[skip..], rest)),
        Some((&'?', rest)) => match text.split_first() {
            Some((_, text_rest)) => match_from(text_rest, rest),
            None => false,
        },
        Some((ch, rest)) => match text.split_first() {
            Some((tc, text_rest)) => tc.eq_ignore_ascii_case(ch) && match_from(text_rest, rest),
            None => false,
        },
    }
}
