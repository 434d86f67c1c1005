//! Session orchestration
//!
//! Wires the components into one running session: seed the pool simulator,
//! obtain funded wallets (from the store, or a fresh funding run through the
//! worker), adopt them into a bot fleet, then serve until ctrl-c.

use crate::arguments;
use crate::config::Config;
use crate::errors::SwarmBotError;
use crate::fleet::{BotRegistry, BotWallet, FleetDefaults};
use crate::funding::worker::{FundingWorker, FundingWorkerOptions, LedgerFactory};
use crate::funding::{plan_funding, FundingCommand, FundingEvent};
use crate::ledger::{LedgerClient, RpcLedgerClient};
use crate::logger::{self, LogTag};
use crate::paths;
use crate::pool::{PoolSim, SeedPool};
use crate::wallets::{passphrase_from_env, WalletStore};
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use solana_sdk::signature::Keypair;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(config: Config) -> Result<()> {
    if arguments::is_dry_run_enabled() {
        return dry_run(&config);
    }

    let pool = Arc::new(PoolSim::new());
    pool.set_pool(Some(seed_pool_from_config(&config)?));
    logger::info(
        LogTag::Pool,
        &format!(
            "simulated pool seeded: {} SOL / {} token, fee {} bps",
            config.pool.seed_reserve_sol, config.pool.seed_reserve_token, config.pool.fee_bps
        ),
    );

    let registry = Arc::new(BotRegistry::new(
        pool.clone(),
        FleetDefaults {
            tick_interval_ms: config.fleet.tick_interval_ms,
            fee_bps: config.pool.fee_bps,
            slippage_percent: decimal_from_config(
                config.pool.default_slippage_percent,
                "pool.default_slippage_percent",
            )?,
            strategy: config.fleet.default_strategy.clone(),
        },
    ));

    let passphrase = passphrase_from_env()?;
    let store = WalletStore::open(paths::get_wallets_db_path(), &passphrase)?;

    let mut wallets = store.load(&config.network)?;
    if wallets.is_empty() {
        logger::info(
            LogTag::System,
            "no stored wallets for this network, starting a funding run",
        );
        wallets = fund_fleet(&config, &store).await?;
    } else {
        logger::info(
            LogTag::Wallet,
            &format!(
                "loaded {} stored wallets for network {}",
                wallets.len(),
                config.network
            ),
        );
    }

    if wallets.is_empty() {
        bail!("no funded wallets available, cannot start the fleet");
    }

    for keypair in wallets {
        let wallet = BotWallet::from_keypair(keypair);
        let id = wallet.address.clone();
        registry.add_bot(wallet, None, None);
        registry.start_bot(&id, None, None);
    }

    logger::info(
        LogTag::System,
        &format!(
            "fleet of {} bots running, press ctrl-c to stop",
            registry.list_bots().len()
        ),
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    logger::info(LogTag::System, "shutting down");
    registry.dispose().await;
    logger::flush();
    Ok(())
}

/// Run one funding round through the worker and persist the result
async fn fund_fleet(config: &Config, store: &WalletStore) -> Result<Vec<Keypair>> {
    let factory: LedgerFactory = Arc::new(|endpoint: &str| {
        Arc::new(RpcLedgerClient::new(endpoint.to_string())) as Arc<dyn LedgerClient>
    });

    let (worker, mut events) = FundingWorker::spawn(
        factory,
        FundingWorkerOptions {
            wallet_count: config.funding.wallet_count,
            min_delay_ms: config.funding.min_delay_ms,
            max_delay_ms: config.funding.max_delay_ms,
        },
    );

    worker
        .submit(FundingCommand {
            total_sol: config.funding.total_sol,
            duration_minutes: config.funding.duration_minutes,
            network: config.network.clone(),
            rpc_endpoint: config.rpc_url.clone(),
        })
        .await?;

    let mut wallets = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            FundingEvent::Log(line) => logger::info(LogTag::Worker, &line),
            FundingEvent::Error(message) => {
                worker.terminate();
                bail!("funding run failed: {}", message);
            }
            FundingEvent::Wallets(secrets) => {
                for secret in secrets {
                    match Keypair::try_from(secret.as_slice()) {
                        Ok(keypair) => wallets.push(keypair),
                        Err(e) => logger::warning(
                            LogTag::Worker,
                            &format!("discarding malformed wallet key: {}", e),
                        ),
                    }
                }
                break;
            }
        }
    }
    worker.terminate();

    store.save(&config.network, &wallets)?;
    Ok(wallets)
}

/// Plan a funding run and print it without touching the network
fn dry_run(config: &Config) -> Result<()> {
    let total = decimal_from_config(config.funding.total_sol, "funding.total_sol")?;
    let window = Duration::from_secs(config.funding.duration_minutes * 60);

    let mut rng = StdRng::from_entropy();
    let plan = plan_funding(
        total,
        config.funding.wallet_count,
        window,
        (config.funding.min_delay_ms, config.funding.max_delay_ms),
        &mut rng,
    )?;

    logger::info(
        LogTag::Funding,
        &format!(
            "dry run {}: {} SOL across {} wallets",
            plan.run_id,
            plan.total_sol,
            plan.wallet_count()
        ),
    );
    let mut offset_ms = 0u64;
    for (index, (share, delay)) in plan.shares.iter().zip(plan.delays_ms.iter()).enumerate() {
        offset_ms += delay;
        logger::info(
            LogTag::Funding,
            &format!("wallet {}: {} SOL at +{:.1}s", index, share, offset_ms as f64 / 1000.0),
        );
    }
    logger::flush();
    Ok(())
}

fn seed_pool_from_config(config: &Config) -> Result<SeedPool> {
    Ok(SeedPool {
        token_mint: config.pool.token_mint.clone(),
        token_decimals: config.pool.token_decimals,
        reserve_sol: decimal_from_config(config.pool.seed_reserve_sol, "pool.seed_reserve_sol")?,
        reserve_token: decimal_from_config(
            config.pool.seed_reserve_token,
            "pool.seed_reserve_token",
        )?,
        candles: vec![],
    })
}

fn decimal_from_config(value: f64, field: &str) -> Result<Decimal, SwarmBotError> {
    Decimal::from_f64(value).ok_or_else(|| {
        crate::errors::ConfigurationError::Generic {
            message: format!("{} is not a usable number: {}", field, value),
        }
        .into()
    })
}
