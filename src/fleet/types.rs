//! Core types for the bot fleet

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;

/// Per-bot log capacity; the oldest entries are evicted beyond it
pub const BOT_LOG_CAPACITY: usize = 100;

/// A managed wallet: public address plus exclusively-owned signing material
#[derive(Clone)]
pub struct BotWallet {
    pub address: String,
    pub keypair: Arc<Keypair>,
}

impl BotWallet {
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            address: keypair.pubkey().to_string(),
            keypair: Arc::new(keypair),
        }
    }
}

impl std::fmt::Debug for BotWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose signing material through Debug output
        f.debug_struct("BotWallet")
            .field("address", &self.address)
            .finish()
    }
}

/// One timestamped bot log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub is_error: bool,
}

impl BotLogEntry {
    pub fn new(message: impl Into<String>, is_error: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            is_error,
        }
    }
}

/// Public view of one registered bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSummary {
    pub address: String,
    pub is_running: bool,
    pub strategy: String,
    pub interval_ms: u64,
}
