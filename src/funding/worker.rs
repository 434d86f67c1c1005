//! Funding worker
//!
//! Dedicated task executing funding runs away from the fleet scheduler. The
//! host talks to it exclusively over channels: commands in, progress events
//! out, no shared mutable state. Terminating the worker cancels every
//! pending scheduled send at once (the per-wallet tasks live in the
//! worker-owned `JoinSet`).
//!
//! Each wallet's pipeline is two-hop and independent: capital reaches the
//! intermediate wallet first (faucet grant on test networks, an operator
//! transfer request otherwise), then the intermediate forwards the exact
//! share to the destination. One wallet failing never aborts the others.

use super::{plan_funding, FundingCommand, FundingEvent, FundingPlan};
use crate::errors::SwarmBotError;
use crate::ledger::LedgerClient;
use crate::logger::{self, LogTag};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;

/// Extra lamports granted to each intermediate to cover the forward fee
const FORWARD_FEE_BUFFER_LAMPORTS: u64 = 10_000;

/// Poll cadence while waiting for an operator to fund an intermediate
const OPERATOR_FUNDING_POLL: Duration = Duration::from_secs(2);

/// Give up waiting for operator funding after this many polls
const OPERATOR_FUNDING_MAX_POLLS: u32 = 150;

/// Builds a ledger client for the endpoint named in a command
pub type LedgerFactory = Arc<dyn Fn(&str) -> Arc<dyn LedgerClient> + Send + Sync>;

/// Tunables the worker applies to every run
#[derive(Debug, Clone)]
pub struct FundingWorkerOptions {
    pub wallet_count: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Handle to a spawned funding worker
pub struct FundingWorker {
    commands: mpsc::Sender<FundingCommand>,
    task: JoinHandle<()>,
}

impl FundingWorker {
    /// Spawn the worker task. Events for every run arrive on the returned
    /// receiver.
    pub fn spawn(
        ledger_factory: LedgerFactory,
        options: FundingWorkerOptions,
    ) -> (Self, mpsc::Receiver<FundingEvent>) {
        let (command_tx, mut command_rx) = mpsc::channel::<FundingCommand>(8);
        let (event_tx, event_rx) = mpsc::channel::<FundingEvent>(64);

        let task = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let ledger = ledger_factory(&command.rpc_endpoint);
                run_funding(ledger, &options, command, &event_tx).await;
            }
        });

        (
            Self {
                commands: command_tx,
                task,
            },
            event_rx,
        )
    }

    /// Queue one funding run
    pub async fn submit(&self, command: FundingCommand) -> Result<(), SwarmBotError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SwarmBotError::Funding(crate::errors::FundingError::WorkerUnavailable))
    }

    /// Abort the worker and every pending scheduled send
    pub fn terminate(self) {
        self.task.abort();
        logger::info(LogTag::Worker, "funding worker terminated");
    }
}

async fn emit(events: &mpsc::Sender<FundingEvent>, event: FundingEvent) {
    // A host that dropped its receiver just stops observing the run
    let _ = events.send(event).await;
}

async fn run_funding(
    ledger: Arc<dyn LedgerClient>,
    options: &FundingWorkerOptions,
    command: FundingCommand,
    events: &mpsc::Sender<FundingEvent>,
) {
    let total_sol = match Decimal::from_f64(command.total_sol) {
        Some(d) => d.round_dp(9),
        None => {
            emit(
                events,
                FundingEvent::Error(format!("unusable amount: {}", command.total_sol)),
            )
            .await;
            return;
        }
    };
    let window = Duration::from_secs(command.duration_minutes * 60);

    let plan = {
        let mut rng = StdRng::from_entropy();
        match plan_funding(
            total_sol,
            options.wallet_count,
            window,
            (options.min_delay_ms, options.max_delay_ms),
            &mut rng,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                emit(events, FundingEvent::Error(e.to_string())).await;
                return;
            }
        }
    };

    emit(
        events,
        FundingEvent::Log(format!(
            "funding run {} started: {} SOL across {} wallets within {} min on {}",
            plan.run_id,
            plan.total_sol,
            plan.wallet_count(),
            command.duration_minutes,
            command.network,
        )),
    )
    .await;
    logger::info(
        LogTag::Worker,
        &format!(
            "funding run {}: {} wallets, {} SOL",
            plan.run_id,
            plan.wallet_count(),
            plan.total_sol
        ),
    );

    let FundingPlan {
        run_id,
        shares,
        delays_ms,
        wallets,
        ..
    } = plan;

    // Pipelines are owned by this JoinSet: dropping the worker aborts them
    // all atomically
    let mut pipelines = JoinSet::new();
    let mut offset_ms: u64 = 0;

    for (index, ((wallet, share), delay_ms)) in wallets
        .into_iter()
        .zip(shares.into_iter())
        .zip(delays_ms.into_iter())
        .enumerate()
    {
        offset_ms += delay_ms;

        let ledger = ledger.clone();
        let events = events.clone();
        let network = command.network.clone();
        pipelines.spawn(async move {
            sleep(Duration::from_millis(offset_ms)).await;
            fund_one_wallet(
                ledger,
                &network,
                index,
                wallet.intermediate,
                wallet.destination,
                share,
                &events,
            )
            .await
            .map(|secret| (index, secret))
        });
    }

    let mut funded: Vec<(usize, Vec<u8>)> = Vec::new();
    while let Some(result) = pipelines.join_next().await {
        if let Ok(Some(entry)) = result {
            funded.push(entry);
        }
    }

    if funded.is_empty() {
        emit(
            events,
            FundingEvent::Error(format!("funding run {} produced no funded wallets", run_id)),
        )
        .await;
        return;
    }

    funded.sort_by_key(|(index, _)| *index);
    let count = funded.len();
    let secrets = funded.into_iter().map(|(_, secret)| secret).collect();

    emit(
        events,
        FundingEvent::Log(format!(
            "funding run {} complete: {} of {} wallets funded",
            run_id, count, options.wallet_count
        )),
    )
    .await;
    emit(events, FundingEvent::Wallets(secrets)).await;
}

/// Two-hop pipeline for one wallet. Returns the destination's secret key
/// bytes on success; failures are logged and isolated.
async fn fund_one_wallet(
    ledger: Arc<dyn LedgerClient>,
    network: &str,
    index: usize,
    intermediate: Keypair,
    destination: Keypair,
    share_sol: Decimal,
    events: &mpsc::Sender<FundingEvent>,
) -> Option<Vec<u8>> {
    let share_lamports = match (share_sol * dec!(1000000000)).floor().to_u64() {
        Some(l) if l > 0 => l,
        _ => {
            emit(
                events,
                FundingEvent::Log(format!(
                    "wallet {}: share {} SOL is below one lamport, skipping",
                    index, share_sol
                )),
            )
            .await;
            return None;
        }
    };
    let grant_lamports = share_lamports + FORWARD_FEE_BUFFER_LAMPORTS;
    let intermediate_address = intermediate.pubkey();

    // Hop 1: capital reaches the intermediate
    if is_test_network(network) {
        let signature = match ledger
            .request_faucet_grant(&intermediate_address, grant_lamports)
            .await
        {
            Ok(sig) => sig,
            Err(e) => {
                emit(
                    events,
                    FundingEvent::Log(format!("wallet {}: faucet grant failed: {}", index, e)),
                )
                .await;
                return None;
            }
        };
        if let Err(e) = ledger.confirm_transaction(&signature).await {
            emit(
                events,
                FundingEvent::Log(format!(
                    "wallet {}: grant confirmation failed: {}",
                    index, e
                )),
            )
            .await;
            return None;
        }
    } else {
        // The worker cannot self-fund from an arbitrary source in
        // production: it requests an operator-signed transfer and waits for
        // the balance to appear
        emit(
            events,
            FundingEvent::Log(format!(
                "wallet {}: operator action required: send {} SOL to {}",
                index,
                crate::ledger::lamports_to_sol(grant_lamports),
                intermediate_address
            )),
        )
        .await;

        if !wait_for_balance(&*ledger, &intermediate_address, grant_lamports).await {
            emit(
                events,
                FundingEvent::Log(format!(
                    "wallet {}: intermediate {} was never funded",
                    index, intermediate_address
                )),
            )
            .await;
            return None;
        }
    }

    // Hop 2: forward the exact share to the destination
    let destination_address = destination.pubkey();
    match ledger
        .transfer(&intermediate, &destination_address, share_lamports)
        .await
    {
        Ok(signature) => {
            if let Err(e) = ledger.confirm_transaction(&signature).await {
                emit(
                    events,
                    FundingEvent::Log(format!(
                        "wallet {}: forward confirmation failed: {}",
                        index, e
                    )),
                )
                .await;
                return None;
            }
            emit(
                events,
                FundingEvent::Log(format!(
                    "wallet {}: funded {} with {} SOL",
                    index, destination_address, share_sol
                )),
            )
            .await;
            Some(destination.to_bytes().to_vec())
        }
        Err(e) => {
            emit(
                events,
                FundingEvent::Log(format!(
                    "wallet {}: forward transfer failed: {}",
                    index, e
                )),
            )
            .await;
            None
        }
    }
}

/// Poll an account until it holds at least `lamports`
async fn wait_for_balance(ledger: &dyn LedgerClient, address: &solana_sdk::pubkey::Pubkey, lamports: u64) -> bool {
    for _ in 0..OPERATOR_FUNDING_MAX_POLLS {
        match ledger.get_account_info(address).await {
            Ok(Some(account)) if account.lamports >= lamports => return true,
            Ok(_) => {}
            Err(e) => {
                logger::debug(
                    LogTag::Worker,
                    &format!("balance poll for {} failed: {}", address, e),
                );
            }
        }
        sleep(OPERATOR_FUNDING_POLL).await;
    }
    false
}

fn is_test_network(network: &str) -> bool {
    matches!(network, "devnet" | "testnet" | "localnet")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testing::MockLedgerClient;
    use crate::ledger::sol_to_lamports;

    fn test_options() -> FundingWorkerOptions {
        FundingWorkerOptions {
            wallet_count: 3,
            min_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    fn test_command() -> FundingCommand {
        FundingCommand {
            total_sol: 0.3,
            duration_minutes: 1,
            network: "devnet".to_string(),
            rpc_endpoint: "http://localhost:8899".to_string(),
        }
    }

    async fn drain_until_terminal(
        events: &mut mpsc::Receiver<FundingEvent>,
    ) -> (Vec<String>, Option<FundingEvent>) {
        let mut logs = Vec::new();
        while let Some(event) = events.recv().await {
            match event {
                FundingEvent::Log(line) => logs.push(line),
                terminal => return (logs, Some(terminal)),
            }
        }
        (logs, None)
    }

    #[tokio::test]
    async fn full_run_funds_every_destination_exactly() {
        let mock = Arc::new(MockLedgerClient::new());
        let factory: LedgerFactory = {
            let mock = mock.clone();
            Arc::new(move |_endpoint| mock.clone() as Arc<dyn LedgerClient>)
        };

        let (worker, mut events) = FundingWorker::spawn(factory, test_options());
        worker.submit(test_command()).await.unwrap();

        let (logs, terminal) = drain_until_terminal(&mut events).await;
        let secrets = match terminal {
            Some(FundingEvent::Wallets(secrets)) => secrets,
            other => panic!("expected Wallets event, got {:?} (logs: {:?})", other, logs),
        };
        assert_eq!(secrets.len(), 3);

        // Each destination holds exactly its share; shares sum to the total
        let mut funded_total = 0u64;
        for secret in &secrets {
            let keypair = Keypair::try_from(secret.as_slice()).unwrap();
            let balance = mock.balance_of(&keypair.pubkey());
            assert!(balance > 0);
            funded_total += balance;
        }
        assert_eq!(funded_total, sol_to_lamports(0.3));

        worker.terminate();
    }

    #[tokio::test]
    async fn one_failing_wallet_does_not_abort_the_others() {
        let mock = Arc::new(MockLedgerClient::new());

        // Fails the first faucet call it sees, then delegates to the mock
        struct FlakyFaucet {
            inner: Arc<MockLedgerClient>,
            calls: parking_lot::Mutex<u32>,
        }

        #[async_trait::async_trait]
        impl LedgerClient for FlakyFaucet {
            async fn request_faucet_grant(
                &self,
                pubkey: &solana_sdk::pubkey::Pubkey,
                lamports: u64,
            ) -> Result<String, SwarmBotError> {
                let call = {
                    let mut guard = self.calls.lock();
                    *guard += 1;
                    *guard
                };
                if call == 1 {
                    return Err(SwarmBotError::Funding(
                        crate::errors::FundingError::GrantFailed {
                            wallet: pubkey.to_string(),
                            message: "flaky faucet".to_string(),
                        },
                    ));
                }
                self.inner.request_faucet_grant(pubkey, lamports).await
            }

            async fn transfer(
                &self,
                from: &Keypair,
                to: &solana_sdk::pubkey::Pubkey,
                lamports: u64,
            ) -> Result<String, SwarmBotError> {
                self.inner.transfer(from, to, lamports).await
            }

            async fn confirm_transaction(&self, signature: &str) -> Result<bool, SwarmBotError> {
                self.inner.confirm_transaction(signature).await
            }

            async fn get_token_account_balance(
                &self,
                vault: &solana_sdk::pubkey::Pubkey,
            ) -> Result<crate::ledger::TokenBalanceView, SwarmBotError> {
                self.inner.get_token_account_balance(vault).await
            }

            async fn get_account_info(
                &self,
                address: &solana_sdk::pubkey::Pubkey,
            ) -> Result<Option<crate::ledger::AccountView>, SwarmBotError> {
                self.inner.get_account_info(address).await
            }
        }

        let flaky = Arc::new(FlakyFaucet {
            inner: mock.clone(),
            calls: parking_lot::Mutex::new(0),
        });
        let factory: LedgerFactory = {
            let flaky = flaky.clone();
            Arc::new(move |_endpoint| flaky.clone() as Arc<dyn LedgerClient>)
        };

        let (worker, mut events) = FundingWorker::spawn(factory, test_options());
        worker.submit(test_command()).await.unwrap();

        let (logs, terminal) = drain_until_terminal(&mut events).await;
        match terminal {
            Some(FundingEvent::Wallets(secrets)) => assert_eq!(secrets.len(), 2),
            other => panic!("expected Wallets event, got {:?}", other),
        }
        assert!(
            logs.iter().any(|l| l.contains("faucet grant failed")),
            "failure must surface in the log stream: {:?}",
            logs
        );

        worker.terminate();
    }

    #[tokio::test]
    async fn invalid_command_yields_error_event() {
        let factory: LedgerFactory =
            Arc::new(|_endpoint| Arc::new(MockLedgerClient::new()) as Arc<dyn LedgerClient>);
        let (worker, mut events) = FundingWorker::spawn(factory, test_options());

        worker
            .submit(FundingCommand {
                total_sol: -1.0,
                ..test_command()
            })
            .await
            .unwrap();

        let (_, terminal) = drain_until_terminal(&mut events).await;
        assert!(matches!(terminal, Some(FundingEvent::Error(_))));

        worker.terminate();
    }
}
