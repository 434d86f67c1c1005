use crate::fleet::strategies::StrategyKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_fallbacks: Vec<String>,
    /// Network name ("devnet", "testnet", "mainnet-beta")
    pub network: String,
    pub pool: PoolSection,
    pub fleet: FleetSection,
    pub funding: FundingSection,
    pub general: GeneralSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSection {
    /// Paired token mint address of the simulated pool
    pub token_mint: String,
    pub token_decimals: u8,
    /// Seed reserves for the simulator, in UI units
    pub seed_reserve_sol: f64,
    pub seed_reserve_token: f64,
    /// Swap fee in basis points (25 = 0.25%)
    pub fee_bps: u32,
    /// Default slippage tolerance for quotes, in percent
    pub default_slippage_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSection {
    /// Default tick interval for bots without an explicit one
    pub tick_interval_ms: u64,
    /// Strategy assigned to adopted wallets unless overridden; the trading
    /// variants carry their own size bounds
    pub default_strategy: StrategyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSection {
    pub wallet_count: usize,
    /// Total capital to distribute across the fleet, in SOL
    pub total_sol: f64,
    /// Window within which all funding events must land
    pub duration_minutes: u64,
    /// Per-wallet random delay bounds
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            rpc_fallbacks: vec![],
            network: "devnet".to_string(),
            pool: PoolSection {
                token_mint: String::new(),
                token_decimals: 6,
                seed_reserve_sol: 10.0,
                seed_reserve_token: 1000.0,
                fee_bps: 25,
                default_slippage_percent: 1.0,
            },
            fleet: FleetSection {
                tick_interval_ms: 10_000,
                default_strategy: StrategyKind::MarketMaker {
                    min_sol: 0.01,
                    max_sol: 0.1,
                },
            },
            funding: FundingSection {
                wallet_count: 6,
                total_sol: 3.0,
                duration_minutes: 5,
                min_delay_ms: 5_000,
                max_delay_ms: 35_000,
            },
            general: GeneralSection {
                log_level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            let default_config = Self::default();
            default_config.save(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    pub fn reload(&mut self, path: &str) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Reject invalid values before any state is touched
    fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            anyhow::bail!("rpc_url is required in config");
        }
        if self.funding.total_sol <= 0.0 {
            anyhow::bail!("funding.total_sol must be positive");
        }
        if self.funding.wallet_count == 0 {
            anyhow::bail!("funding.wallet_count must be at least 1");
        }
        if self.funding.duration_minutes == 0 {
            anyhow::bail!("funding.duration_minutes must be at least 1");
        }
        if self.funding.min_delay_ms > self.funding.max_delay_ms {
            anyhow::bail!("funding.min_delay_ms must not exceed max_delay_ms");
        }
        if let StrategyKind::MarketMaker { min_sol, max_sol }
        | StrategyKind::RandomTrader { min_sol, max_sol } = &self.fleet.default_strategy
        {
            if *min_sol <= 0.0 || max_sol < min_sol {
                anyhow::bail!("fleet.default_strategy trade bounds are invalid");
            }
        }
        if self.pool.fee_bps >= 10_000 {
            anyhow::bail!("pool.fee_bps must be below 10000");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("defaults must validate");
    }

    #[test]
    fn validation_rejects_zero_wallet_count() {
        let mut config = Config::default();
        config.funding.wallet_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_inverted_delay_bounds() {
        let mut config = Config::default();
        config.funding.min_delay_ms = 40_000;
        config.funding.max_delay_ms = 5_000;
        assert!(config.validate().is_err());
    }
}
