//! Swap client configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

/// Default config file, used when neither `--config` nor `DUOPOOL_CONFIG` is set
pub const DEFAULT_CONFIG_PATH: &str = "duopool.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// RPC URL for Solana cluster
    pub rpc_url: String,

    /// Pool program ID
    pub program_id: String,

    /// Base asset mint the pool was created for
    pub base_asset: String,

    /// Payer wallet keypair path
    pub keypair_path: String,

    /// Decimal places of user-facing amounts
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Commitment level (processed, confirmed, finalized)
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Payer's base asset account, the swap source when selling base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_account: Option<String>,
}

fn default_decimals() -> u8 {
    duopool_core::DECIMALS
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to the devnet defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("Config file {} not found, using default devnet config", path.display());
            return Ok(Self::default_devnet());
        }
        Self::load(path)
    }

    /// Create default configuration
    pub fn default_devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: "4pUWBrXKX1JXQv5fdn76LTGfYjvJqHzkPKxf3it86JPS".to_string(),
            base_asset: "CLnitJ46dmqSi181CQgus9s94fxEufNfJ6gzgpxvxqvA".to_string(),
            keypair_path: "~/.config/solana/id.json".to_string(),
            decimals: default_decimals(),
            commitment: default_commitment(),
            base_account: None,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &Path) -> Result<()> {
        let config = Self::default_devnet();
        let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path.display()))?;

        log::info!("Created default config at {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.program_id()?;
        self.base_asset()?;
        self.commitment_config()?;
        if let Some(account) = &self.base_account {
            parse_pubkey("base_account", account)?;
        }
        if self.decimals > 19 {
            anyhow::bail!("decimals must be at most 19, got {}", self.decimals);
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        parse_pubkey("program_id", &self.program_id)
    }

    pub fn base_asset(&self) -> Result<Pubkey> {
        parse_pubkey("base_asset", &self.base_asset)
    }

    pub fn base_account(&self) -> Result<Option<Pubkey>> {
        self.base_account
            .as_deref()
            .map(|account| parse_pubkey("base_account", account))
            .transpose()
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| anyhow::anyhow!("Unknown commitment level: {}", self.commitment))
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).context(format!("Invalid {} in config: {}", field, value))
}
