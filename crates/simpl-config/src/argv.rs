//! Command-line token handling ahead of the argument backend.
//!
//! Tokens are split at `--`, argument files are expanded, and what remains
//! is partitioned into tokens some declared option claims and tokens nobody
//! claims. Only claimed tokens reach the backend; unclaimed ones become
//! pass-through arguments.

use std::collections::HashMap;

use simpl_fs::{NormalizedPath, io};

use crate::option::{ArgKind, ConfigOption};
use crate::{Error, Result};

/// Separator after which every token is passed through verbatim.
pub const PASS_THRU_SEPARATOR: &str = "--";

/// Split at the first `--`, dropping the separator itself.
pub fn split_pass_thru(tokens: Vec<String>) -> (Vec<String>, Vec<String>) {
    match tokens.iter().position(|t| t == PASS_THRU_SEPARATOR) {
        Some(idx) => {
            let mut before = tokens;
            let after = before.split_off(idx + 1);
            before.pop();
            (before, after)
        }
        None => (tokens, Vec::new()),
    }
}

/// Replace `@path` tokens with the whitespace-separated contents of `path`.
///
/// Argument files may reference further argument files; a file that
/// (directly or indirectly) includes itself is rejected.
pub fn expand_arg_files(tokens: Vec<String>, prefix: Option<char>) -> Result<Vec<String>> {
    let Some(prefix) = prefix else {
        return Ok(tokens);
    };
    let mut out = Vec::with_capacity(tokens.len());
    let mut stack = Vec::new();
    expand_into(tokens, prefix, &mut stack, &mut out)?;
    Ok(out)
}

fn expand_into(
    tokens: Vec<String>,
    prefix: char,
    stack: &mut Vec<NormalizedPath>,
    out: &mut Vec<String>,
) -> Result<()> {
    for token in tokens {
        let Some(raw_path) = token.strip_prefix(prefix).filter(|p| !p.is_empty()) else {
            out.push(token);
            continue;
        };
        let path = NormalizedPath::expand(raw_path)?;
        if stack.contains(&path) {
            return Err(Error::ArgFileCycle {
                path: path.to_string(),
            });
        }
        tracing::debug!(%path, "Expanding argument file");
        let content = io::read_text(&path)?;
        stack.push(path);
        expand_into(
            content.split_whitespace().map(str::to_string).collect(),
            prefix,
            stack,
            out,
        )?;
        stack.pop();
    }
    Ok(())
}

/// Tokens sorted by whether a declared option claims them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub claimed: Vec<String>,
    pub unclaimed: Vec<String>,
}

/// Sort `tokens` into claimed and unclaimed.
///
/// A known flag claims itself and, when it takes a value, the following
/// token. Bundled short flags (`-vq`) and attached values (`-kVALUE`,
/// `--key=VALUE`) are understood. Bare tokens fill positional options in
/// order. `help` makes `-h`/`--help` known.
pub fn partition(tokens: &[String], options: &[ConfigOption], help: bool) -> Partition {
    let mut longs: HashMap<&str, bool> = HashMap::new();
    let mut shorts: HashMap<char, bool> = HashMap::new();
    for option in options {
        let takes_value = option.kind().takes_value();
        for flag in option.flags() {
            match flag.strip_prefix("--") {
                Some(long) => {
                    longs.insert(long, takes_value);
                }
                None => {
                    if let Some(c) = flag.chars().nth(1) {
                        shorts.insert(c, takes_value);
                    }
                }
            }
        }
    }
    if help {
        longs.entry("help").or_insert(false);
        shorts.entry('h').or_insert(false);
    }

    let positionals: Vec<&ConfigOption> = options.iter().filter(|o| o.is_positional()).collect();
    let unlimited = positionals.iter().any(|o| o.kind() == ArgKind::Append);
    let mut slots = positionals.len();

    let mut result = Partition::default();
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if let Some(body) = token.strip_prefix("--").filter(|b| !b.is_empty()) {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            match longs.get(name) {
                Some(&takes_value) => {
                    result.claimed.push(token.clone());
                    if takes_value && inline.is_none() {
                        result.claimed.extend(iter.next().cloned());
                    }
                }
                None => result.unclaimed.push(token.clone()),
            }
            continue;
        }

        if token.len() > 1 && token.starts_with('-') && !looks_numeric(token) {
            match short_cluster(&token[1..], &shorts) {
                Some(needs_value) => {
                    result.claimed.push(token.clone());
                    if needs_value {
                        result.claimed.extend(iter.next().cloned());
                    }
                }
                None => result.unclaimed.push(token.clone()),
            }
            continue;
        }

        if unlimited || slots > 0 {
            slots = slots.saturating_sub(1);
            result.claimed.push(token.clone());
        } else {
            result.unclaimed.push(token.clone());
        }
    }
    result
}

/// Check a bundle of short flags. Returns whether the next token is needed
/// as a value, or `None` if any letter is unknown.
fn short_cluster(body: &str, shorts: &HashMap<char, bool>) -> Option<bool> {
    let count = body.chars().count();
    for (idx, c) in body.chars().enumerate() {
        match shorts.get(&c) {
            Some(false) => continue,
            // The rest of the token, if any, is the value
            Some(true) => return Some(idx + 1 == count),
            None => return None,
        }
    }
    Some(false)
}

fn looks_numeric(token: &str) -> bool {
    token[1..].parse::<f64>().is_ok()
}
