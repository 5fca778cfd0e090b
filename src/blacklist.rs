//! Static domain blacklist.
//!
//! Loaded once at startup from `blacklist.txt` and never mutated again, so a
//! plain `Vec` behind an `Arc` needs no interior synchronization — the same
//! shape as the reference crate's read-only globals.

use std::path::Path;

const MAX_ENTRIES: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct Blacklist {
    entries: Vec<String>,
}

impl Blacklist {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Loads `blacklist.txt`-style content: one host substring per line,
    /// CR/LF trimmed, blank lines skipped, capped at [`MAX_ENTRIES`].
    /// A missing file yields an empty (permissive) blacklist.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::warn!(path = %path.display(), "blacklist file not found, no domains blocked");
                return Self::default();
            }
        };

        let entries: Vec<String> = contents
            .lines()
            .map(|line| line.trim_end_matches(['\r', '\n']).trim())
            .filter(|line| !line.is_empty())
            .take(MAX_ENTRIES)
            .map(str::to_string)
            .collect();

        tracing::info!(path = %path.display(), count = entries.len(), "blacklist loaded");
        Self::new(entries)
    }

    /// True iff any blacklist entry is a substring of `host`. An empty host
    /// is never blacklisted.
    pub fn is_blacklisted(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.entries.iter().any(|entry| host.contains(entry.as_str()))
    }
}
