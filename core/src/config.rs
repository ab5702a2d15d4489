//! Node configuration
//!
//! Loaded from the file named by `UMBRA_CONFIG`, falling back to
//! `./umbra.toml`, falling back to built-in defaults. Every field has a
//! default so partial files work.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use umbra_shielded::TokenId;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UmbraConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub relayer: RelayerConfig,
    #[serde(default)]
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,
    #[serde(default = "default_root_history")]
    pub root_history: usize,
    /// Supported token ids as 64-char hex; the native token is always implied
    #[serde(default)]
    pub supported_tokens: Vec<String>,
    #[serde(default = "default_vk_dir")]
    pub verifying_key_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    #[serde(default = "default_base_cost")]
    pub base_cost: u64,
    #[serde(default = "default_reserve")]
    pub reserve: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureConfig {
    /// Accept every proof instead of loading verifying keys; local
    /// development only
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_port() -> u16 {
    8808
}

fn default_tree_depth() -> usize {
    20
}

fn default_root_history() -> usize {
    30
}

fn default_vk_dir() -> PathBuf {
    PathBuf::from("keys")
}

fn default_base_cost() -> u64 {
    5
}

fn default_reserve() -> u64 {
    1_000_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tree_depth: default_tree_depth(),
            root_history: default_root_history(),
            supported_tokens: Vec::new(),
            verifying_key_dir: default_vk_dir(),
        }
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            base_cost: default_base_cost(),
            reserve: default_reserve(),
        }
    }
}

impl UmbraConfig {
    /// Load from `UMBRA_CONFIG`, then `./umbra.toml`, then defaults
    pub fn load() -> Result<Self> {
        let path = std::env::var("UMBRA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("umbra.toml"));

        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config: Self = toml::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!("loaded config from {}", path.display());
            Ok(config)
        } else {
            info!("no config file at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse the configured token list into token ids
    pub fn supported_tokens(&self) -> Result<Vec<TokenId>> {
        self.ledger
            .supported_tokens
            .iter()
            .map(|s| {
                let bytes = hex::decode(s).with_context(|| format!("bad token id hex: {s}"))?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("token id must be 32 bytes: {s}"))?;
                Ok(TokenId(arr))
            })
            .collect()
    }
}
