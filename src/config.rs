use anyhow::{ Context, Result };
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;

/// Top-level configuration, loaded from a TOML file.
/// Every section has working defaults so a missing file still runs
/// against a local database (provider calls need a real API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub follow: FollowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the enhanced-transactions API
    pub api_url: String,
    /// JSON-RPC endpoint for signature listing
    pub rpc_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    /// Minimum interval between RPC-style calls (signature paging)
    pub rpc_min_interval_ms: u64,
    /// Minimum interval between enhanced-transaction calls
    pub enhance_min_interval_ms: u64,
    pub max_retries: u32,
    /// Initial retry backoff; doubled per attempt, tripled on 429
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.helius.xyz/v0".to_string(),
            rpc_url: "https://mainnet.helius-rpc.com".to_string(),
            api_key: String::new(),
            timeout_seconds: 30,
            rpc_min_interval_ms: 100,
            enhance_min_interval_ms: 600,
            max_retries: 5,
            retry_backoff_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/copyscope.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cap on new signatures ingested per run
    pub max_signatures_per_run: usize,
    pub status_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_signatures_per_run: crate::constants::MAX_SIGNATURES_PER_SYNC,
            status_channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// SOL value of one stablecoin unit, used when a swap shows only
    /// intermediate flow and no usable SOL delta. A fixed magnitude that
    /// drifts with SOL price; tune or feed from a price source.
    pub stable_to_sol_rate: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            stable_to_sol_rate: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowConfig {
    pub default_delay_seconds: u32,
    pub default_slippage_model: String,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            default_delay_seconds: 5,
            default_slippage_model: "moderate".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            database: DatabaseConfig::default(),
            sync: SyncConfig::default(),
            parser: ParserConfig::default(),
            follow: FollowConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Config::default());
        }
        let contents = fs
            ::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = toml
            ::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.rpc_min_interval_ms, 100);
        assert_eq!(config.provider.enhance_min_interval_ms, 600);
        assert_eq!(config.parser.stable_to_sol_rate, 0.01);
        assert_eq!(config.follow.default_delay_seconds, 5);
    }

    #[test]
    fn test_partial_toml() {
        let parsed: Config = toml
            ::from_str("[parser]\nstable_to_sol_rate = 0.005\n")
            .unwrap();
        assert_eq!(parsed.parser.stable_to_sol_rate, 0.005);
        // Untouched sections keep defaults
        assert_eq!(parsed.provider.max_retries, 5);
    }
}
