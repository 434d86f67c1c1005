//! Wallet persistence
//!
//! Opaque store interface keyed by network: `save` / `load` / `clear`. The
//! operator passphrase is the single source of key material and comes from
//! the environment; see [`store::WalletStore`] for the sealing scheme.

pub mod crypto;
mod store;

pub use store::WalletStore;

use crate::errors::{ConfigurationError, SwarmBotError};

/// Environment variable holding the wallet store passphrase
pub const PASSPHRASE_ENV_VAR: &str = "SWARMBOT_WALLET_PASSPHRASE";

/// Read the passphrase from the environment. A missing or empty value is a
/// hard configuration error: the store never falls back to a built-in
/// passphrase.
pub fn passphrase_from_env() -> Result<String, SwarmBotError> {
    match std::env::var(PASSPHRASE_ENV_VAR) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigurationError::MissingPassphrase {
            env_var: PASSPHRASE_ENV_VAR.to_string(),
        }
        .into()),
    }
}
