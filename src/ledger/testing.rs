//! In-memory ledger for tests and dry runs
//!
//! Tracks lamport balances per address and records every operation so tests
//! can assert on the exact call sequence. Individual operations can be
//! forced to fail per address to exercise isolation paths.

use super::{AccountView, LedgerClient, TokenBalanceView};
use crate::errors::{FundingError, NetworkError, SwarmBotError};
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct MockState {
    balances: HashMap<String, u64>,
    operations: Vec<String>,
    fail_faucet_for: HashSet<String>,
    fail_transfer_from: HashSet<String>,
    signature_counter: u64,
}

/// Deterministic ledger double
#[derive(Default)]
pub struct MockLedgerClient {
    state: Mutex<MockState>,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &Pubkey, lamports: u64) {
        self.state
            .lock()
            .balances
            .insert(address.to_string(), lamports);
    }

    pub fn balance_of(&self, address: &Pubkey) -> u64 {
        self.state
            .lock()
            .balances
            .get(&address.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Force faucet grants for this address to fail
    pub fn fail_faucet_for(&self, address: &Pubkey) {
        self.state
            .lock()
            .fail_faucet_for
            .insert(address.to_string());
    }

    /// Force outgoing transfers from this address to fail
    pub fn fail_transfer_from(&self, address: &Pubkey) {
        self.state
            .lock()
            .fail_transfer_from
            .insert(address.to_string());
    }

    pub fn operations(&self) -> Vec<String> {
        self.state.lock().operations.clone()
    }

    fn next_signature(state: &mut MockState) -> String {
        state.signature_counter += 1;
        format!("MockSig{:04}", state.signature_counter)
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn request_faucet_grant(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError> {
        let mut state = self.state.lock();
        let address = pubkey.to_string();

        if state.fail_faucet_for.contains(&address) {
            state.operations.push(format!("faucet_fail {}", address));
            return Err(SwarmBotError::Funding(FundingError::GrantFailed {
                wallet: address,
                message: "faucet rejected the request".to_string(),
            }));
        }

        *state.balances.entry(address.clone()).or_insert(0) += lamports;
        state
            .operations
            .push(format!("faucet {} {}", address, lamports));
        Ok(Self::next_signature(&mut state))
    }

    async fn transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError> {
        let mut state = self.state.lock();
        let from_address = from.pubkey().to_string();
        let to_address = to.to_string();

        if state.fail_transfer_from.contains(&from_address) {
            state
                .operations
                .push(format!("transfer_fail {} {}", from_address, to_address));
            return Err(SwarmBotError::Network(NetworkError::TransferFailed {
                from: from_address,
                to: to_address,
                message: "forced failure".to_string(),
            }));
        }

        let available = state.balances.get(&from_address).copied().unwrap_or(0);
        if available < lamports {
            return Err(SwarmBotError::Network(NetworkError::TransferFailed {
                from: from_address,
                to: to_address,
                message: format!("insufficient balance: {} < {}", available, lamports),
            }));
        }

        state.balances.insert(from_address.clone(), available - lamports);
        *state.balances.entry(to_address.clone()).or_insert(0) += lamports;
        state
            .operations
            .push(format!("transfer {} {} {}", from_address, to_address, lamports));
        Ok(Self::next_signature(&mut state))
    }

    async fn confirm_transaction(&self, _signature: &str) -> Result<bool, SwarmBotError> {
        Ok(true)
    }

    async fn get_token_account_balance(
        &self,
        vault: &Pubkey,
    ) -> Result<TokenBalanceView, SwarmBotError> {
        let lamports = self.balance_of(vault);
        Ok(TokenBalanceView {
            ui_amount: super::lamports_to_sol(lamports),
            decimals: 9,
        })
    }

    async fn get_account_info(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AccountView>, SwarmBotError> {
        let state = self.state.lock();
        Ok(state
            .balances
            .get(&address.to_string())
            .map(|lamports| AccountView { lamports: *lamports }))
    }
}
