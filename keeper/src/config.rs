//! Keeper configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC URL for Solana cluster
    pub rpc_url: String,

    /// WebSocket URL for event subscription
    pub ws_url: String,

    /// Manager program ID
    pub manager_program: Pubkey,

    /// Keeper wallet keypair path
    pub keypair_path: String,

    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// Seconds between pool directory refreshes from the registry
    pub directory_refresh_secs: u64,

    /// Maximum purge transactions per batch
    pub max_purges_per_batch: usize,

    /// Tick crossings per purge instruction, 0 for the on-chain ceiling
    pub max_crossings_per_purge: u32,

    /// Seconds past a tick boundary before a pool counts as due
    pub crossing_grace_secs: i64,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("KEEPER_CONFIG")
            .unwrap_or_else(|_| "keeper-config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default_devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            ws_url: "wss://api.devnet.solana.com".to_string(),
            manager_program: Pubkey::from_str("PgeK4NTqzu1FLSUvhEhVAcDU8Va18nAjkmBej5M846R")
                .unwrap(),
            keypair_path: "~/.config/solana/id.json".to_string(),
            poll_interval_secs: 5,
            directory_refresh_secs: 60,
            max_purges_per_batch: 5,
            max_crossings_per_purge: 0,
            crossing_grace_secs: 5,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_devnet();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
