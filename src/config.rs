//! Configuration file support.
//!
//! Settings are read from TOML. Every section and key is optional and falls
//! back to the defaults below.

use crate::circuit::{MAX_CIRCUIT_K, MIN_CIRCUIT_K};
use crate::encoding::{Alphabet, DEFAULT_SYMBOLS, DEFAULT_WILDCARD};
use crate::expansion::DEFAULT_MAX_LEAVES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alphabet: AlphabetConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub circuit: CircuitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphabetConfig {
    #[serde(default = "default_symbols")]
    pub symbols: String,
    #[serde(default = "default_wildcard")]
    pub wildcard: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Upper bound on the number of expanded leaves.
    #[serde(default = "default_max_leaves")]
    pub max_leaves: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Lower bound on `log2` of the circuit's row count.
    #[serde(default = "default_min_k")]
    pub min_k: u32,
    /// Shapes needing a larger circuit are refused, including shapes read
    /// from untrusted proof files.
    #[serde(default = "default_max_k")]
    pub max_k: u32,
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            wildcard: DEFAULT_WILDCARD,
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_leaves: DEFAULT_MAX_LEAVES,
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            min_k: MIN_CIRCUIT_K,
            max_k: MAX_CIRCUIT_K,
        }
    }
}

fn default_symbols() -> String {
    DEFAULT_SYMBOLS.to_string()
}

fn default_wildcard() -> char {
    DEFAULT_WILDCARD
}

fn default_max_leaves() -> u64 {
    DEFAULT_MAX_LEAVES
}

fn default_min_k() -> u32 {
    MIN_CIRCUIT_K
}

fn default_max_k() -> u32 {
    MAX_CIRCUIT_K
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// The configured alphabet, validated.
    pub fn alphabet(&self) -> Result<Alphabet> {
        Alphabet::new(&self.alphabet.symbols, self.alphabet.wildcard)
            .context("Invalid [alphabet] configuration")
    }
}
