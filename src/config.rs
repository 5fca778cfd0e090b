//! `proxy.conf` loading.
//!
//! Line-oriented `key = value`, grounded directly in the original C
//! `load_configuration`: no TOML/YAML/`serde` machinery for four integers,
//! blank lines and `#` comments ignored, unknown keys ignored, missing file
//! falls back to defaults.

use std::path::Path;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_CACHE_SIZE_MB: usize = 200;
pub const DEFAULT_ELEMENT_SIZE_MB: usize = 10;
pub const DEFAULT_MAX_CLIENTS: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    pub port: u16,
    pub threads: usize,
    pub cache_size_bytes: usize,
    pub element_size_bytes: usize,
    pub max_clients: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            threads: DEFAULT_THREADS,
            cache_size_bytes: DEFAULT_CACHE_SIZE_MB * 1024 * 1024,
            element_size_bytes: DEFAULT_ELEMENT_SIZE_MB * 1024 * 1024,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }
}

impl ProxyConfig {
    /// Loads configuration from `path`. A missing file is not an error: it
    /// yields [`ProxyConfig::default`]. A present-but-unreadable file (rare:
    /// permissions) is also treated as "use defaults" rather than failing
    /// startup, matching the reference implementation's tolerance.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
                return Self::default();
            }
        };

        let mut config = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "port" => {
                    if let Ok(v) = value.parse() {
                        config.port = v;
                    }
                }
                "threads" => {
                    if let Ok(v) = value.parse() {
                        config.threads = v;
                    }
                }
                "cache_size_mb" => {
                    if let Ok(v) = value.parse::<usize>() {
                        config.cache_size_bytes = v * 1024 * 1024;
                    }
                }
                "element_size_mb" => {
                    if let Ok(v) = value.parse::<usize>() {
                        config.element_size_bytes = v * 1024 * 1024;
                    }
                }
                _ => {
                    // Unknown keys are forward-compatible no-ops.
                }
            }
        }

        tracing::info!(path = %path.display(), "configuration loaded");
        config
    }
}
