//! Ledger client boundary
//!
//! The funding pipeline consumes a narrow ledger interface: faucet grants,
//! plain transfers, confirmation and balance reads. Everything on-chain
//! beyond that shape is out of scope; the simulator and quote engine only
//! ever see two UI-denominated reserves plus decimals.

pub mod testing;

use crate::errors::{NetworkError, SwarmBotError};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

/// Convert SOL to lamports, rounding to the nearest lamport
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Minimal account view consumed by the funding pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub lamports: u64,
}

/// Token vault balance in the shape the simulator consumes
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalanceView {
    pub ui_amount: f64,
    pub decimals: u8,
}

/// External ledger collaborator
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Request a faucet grant on test networks. Returns the signature.
    async fn request_faucet_grant(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError>;

    /// Transfer lamports between wallets. Returns the signature.
    async fn transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError>;

    /// Whether a signature has reached the confirmed commitment
    async fn confirm_transaction(&self, signature: &str) -> Result<bool, SwarmBotError>;

    /// UI balance of a token vault account
    async fn get_token_account_balance(
        &self,
        vault: &Pubkey,
    ) -> Result<TokenBalanceView, SwarmBotError>;

    /// Lamport view of an account, None if it does not exist
    async fn get_account_info(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AccountView>, SwarmBotError>;
}

/// Read a live pool's two vault balances into the reserve shape the quote
/// engine consumes. This is the whole live-quote boundary: everything past
/// the two UI amounts plus decimals stays ledger-side.
pub async fn fetch_pool_reserves(
    ledger: &dyn LedgerClient,
    sol_vault: &Pubkey,
    token_vault: &Pubkey,
) -> Result<crate::quote::PoolReserves, SwarmBotError> {
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;

    let sol = ledger.get_token_account_balance(sol_vault).await?;
    let token = ledger.get_token_account_balance(token_vault).await?;

    Ok(crate::quote::PoolReserves {
        sol: Decimal::from_f64(sol.ui_amount).unwrap_or_default(),
        token: Decimal::from_f64(token.ui_amount).unwrap_or_default(),
        token_decimals: token.decimals,
    })
}

/// `LedgerClient` over a Solana JSON-RPC endpoint
pub struct RpcLedgerClient {
    client: RpcClient,
    endpoint: String,
}

impl RpcLedgerClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: RpcClient::new_with_commitment(endpoint.clone(), CommitmentConfig::confirmed()),
            endpoint,
        }
    }

    fn network_error(&self, message: String) -> SwarmBotError {
        SwarmBotError::Network(NetworkError::RpcRequestFailed {
            endpoint: self.endpoint.clone(),
            message,
        })
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn request_faucet_grant(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError> {
        let signature = self
            .client
            .request_airdrop(pubkey, lamports)
            .await
            .map_err(|e| {
                SwarmBotError::Network(NetworkError::FaucetUnavailable {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })
            })?;
        Ok(signature.to_string())
    }

    async fn transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        lamports: u64,
    ) -> Result<String, SwarmBotError> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|e| self.network_error(e.to_string()))?;

        let instruction = system_instruction::transfer(&from.pubkey(), to, lamports);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&from.pubkey()),
            &[from],
            blockhash,
        );

        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| {
                SwarmBotError::Network(NetworkError::TransferFailed {
                    from: from.pubkey().to_string(),
                    to: to.to_string(),
                    message: e.to_string(),
                })
            })?;

        Ok(signature.to_string())
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<bool, SwarmBotError> {
        let parsed: Signature = signature.parse().map_err(|_| {
            SwarmBotError::Network(NetworkError::ConfirmationFailed {
                signature: signature.to_string(),
                message: "not a valid signature".to_string(),
            })
        })?;

        self.client
            .confirm_transaction(&parsed)
            .await
            .map_err(|e| {
                SwarmBotError::Network(NetworkError::ConfirmationFailed {
                    signature: signature.to_string(),
                    message: e.to_string(),
                })
            })
    }

    async fn get_token_account_balance(
        &self,
        vault: &Pubkey,
    ) -> Result<TokenBalanceView, SwarmBotError> {
        let balance = self
            .client
            .get_token_account_balance(vault)
            .await
            .map_err(|e| self.network_error(e.to_string()))?;

        Ok(TokenBalanceView {
            ui_amount: balance.ui_amount.unwrap_or(0.0),
            decimals: balance.decimals,
        })
    }

    async fn get_account_info(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AccountView>, SwarmBotError> {
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| self.network_error(e.to_string()))?;

        Ok(response.value.map(|account| AccountView {
            lamports: account.lamports,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::compute_swap_quote;
    use rust_decimal_macros::dec;

    #[test]
    fn lamport_conversions_round_trip_whole_sol() {
        assert_eq!(sol_to_lamports(1.0), LAMPORTS_PER_SOL);
        assert_eq!(lamports_to_sol(LAMPORTS_PER_SOL), 1.0);
        assert_eq!(sol_to_lamports(0.000000001), 1);
    }

    #[tokio::test]
    async fn live_reserves_feed_the_quote_engine() {
        let mock = testing::MockLedgerClient::new();
        let sol_vault = Pubkey::new_unique();
        let token_vault = Pubkey::new_unique();
        mock.set_balance(&sol_vault, 10 * LAMPORTS_PER_SOL);
        mock.set_balance(&token_vault, 1_000 * LAMPORTS_PER_SOL);

        let reserves = fetch_pool_reserves(&mock, &sol_vault, &token_vault)
            .await
            .unwrap();
        assert_eq!(reserves.sol, dec!(10));
        assert_eq!(reserves.token, dec!(1000));

        let quote = compute_swap_quote(dec!(1), true, Some(&reserves), 25, dec!(1)).unwrap();
        assert!(quote.estimated_output > dec!(90));
    }
}
