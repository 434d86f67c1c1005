//! Types shared by the funding planner and worker

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;

/// One planned wallet pair: capital lands on the intermediate first, then is
/// forwarded to the destination in a second hop. Signing material is owned
/// exclusively by the plan until handed over.
pub struct PlannedWallet {
    pub destination: Keypair,
    pub intermediate: Keypair,
}

impl std::fmt::Debug for PlannedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use solana_sdk::signer::Signer;
        f.debug_struct("PlannedWallet")
            .field("destination", &self.destination.pubkey().to_string())
            .field("intermediate", &self.intermediate.pubkey().to_string())
            .finish()
    }
}

/// Ephemeral output of one planning pass
#[derive(Debug)]
pub struct FundingPlan {
    pub run_id: String,
    pub total_sol: Decimal,
    /// Per-wallet SOL shares; their Decimal sum equals `total_sol` exactly
    pub shares: Vec<Decimal>,
    /// Per-wallet delay relative to the previous scheduled event; the
    /// cumulative sum never exceeds the requested window
    pub delays_ms: Vec<u64>,
    pub wallets: Vec<PlannedWallet>,
}

impl FundingPlan {
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }
}

/// Inbound command starting one funding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingCommand {
    pub total_sol: f64,
    pub duration_minutes: u64,
    pub network: String,
    pub rpc_endpoint: String,
}

/// Outbound worker events
#[derive(Debug, Clone, PartialEq)]
pub enum FundingEvent {
    /// Progress/status line
    Log(String),
    /// Secret-key byte arrays of the funded destination wallets, emitted
    /// once per run
    Wallets(Vec<Vec<u8>>),
    /// The run failed before producing any funded wallet
    Error(String),
}
