//! Encrypted wallet persistence
//!
//! Stores managed wallets keyed by network in sqlite. Secret keys never
//! touch disk in the clear: each is sealed individually (see
//! [`super::crypto`]). A key-check record written at store creation rejects
//! a wrong passphrase up front instead of handing back garbage key bytes.
//! There is no fallback passphrase and no second encryption lineage.

use super::crypto::{self, SealedKey};
use crate::errors::{StoreError, SwarmBotError};
use crate::logger::{self, LogTag};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::path::Path;

/// Sentinel sealed at store creation to validate the passphrase later
const KEY_CHECK_PLAINTEXT: &[u8] = b"swarmbot-key-check-v1";

pub struct WalletStore {
    conn: Mutex<Connection>,
    key: [u8; 32],
}

impl WalletStore {
    /// Open (or create) a store and authenticate the passphrase against it
    pub fn open<P: AsRef<Path>>(path: P, passphrase: &str) -> Result<Self, SwarmBotError> {
        if passphrase.is_empty() {
            return Err(crate::errors::ConfigurationError::MissingPassphrase {
                env_var: super::PASSPHRASE_ENV_VAR.to_string(),
            }
            .into());
        }

        let conn = Connection::open(path).map_err(db_error)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS wallets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                network TEXT NOT NULL,
                address TEXT NOT NULL UNIQUE,
                encrypted_key TEXT NOT NULL,
                nonce TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_wallets_network ON wallets(network);",
        )
        .map_err(db_error)?;

        let salt = load_or_create_salt(&conn)?;
        let key = crypto::derive_key(passphrase, &salt);

        verify_or_write_key_check(&conn, &key)?;

        Ok(Self {
            conn: Mutex::new(conn),
            key,
        })
    }

    /// Replace the stored wallet set for one network
    pub fn save(&self, network: &str, wallets: &[Keypair]) -> Result<(), SwarmBotError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_error)?;

        tx.execute("DELETE FROM wallets WHERE network = ?1", params![network])
            .map_err(db_error)?;

        let created_at = Utc::now().to_rfc3339();
        for keypair in wallets {
            let sealed = crypto::seal(&self.key, &keypair.to_bytes())
                .map_err(SwarmBotError::Store)?;
            tx.execute(
                "INSERT INTO wallets (network, address, encrypted_key, nonce, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    network,
                    keypair.pubkey().to_string(),
                    sealed.ciphertext,
                    sealed.nonce,
                    created_at
                ],
            )
            .map_err(db_error)?;
        }

        tx.commit().map_err(db_error)?;

        logger::info(
            LogTag::Wallet,
            &format!("saved {} wallets for network {}", wallets.len(), network),
        );
        Ok(())
    }

    /// Load and decrypt every wallet stored for one network
    pub fn load(&self, network: &str) -> Result<Vec<Keypair>, SwarmBotError> {
        let conn = self.conn.lock();
        let mut statement = conn
            .prepare(
                "SELECT address, encrypted_key, nonce FROM wallets
                 WHERE network = ?1 ORDER BY id",
            )
            .map_err(db_error)?;

        let rows = statement
            .query_map(params![network], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_error)?;

        let mut wallets = Vec::new();
        for row in rows {
            let (address, ciphertext, nonce) = row.map_err(db_error)?;
            let sealed = SealedKey { ciphertext, nonce };
            let secret = crypto::open(&self.key, &sealed).map_err(SwarmBotError::Store)?;
            let keypair =
                Keypair::try_from(secret.as_slice()).map_err(|e| {
                    SwarmBotError::Store(StoreError::CorruptRecord {
                        address: address.clone(),
                        message: e.to_string(),
                    })
                })?;
            wallets.push(keypair);
        }

        Ok(wallets)
    }

    /// Forget every wallet stored for one network
    pub fn clear(&self, network: &str) -> Result<(), SwarmBotError> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM wallets WHERE network = ?1", params![network])
            .map_err(db_error)?;

        logger::warning(
            LogTag::Wallet,
            &format!("cleared {} wallets for network {}", removed, network),
        );
        Ok(())
    }

    pub fn count(&self, network: &str) -> Result<usize, SwarmBotError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM wallets WHERE network = ?1",
            params![network],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
        .map_err(db_error)
    }
}

fn db_error(e: rusqlite::Error) -> SwarmBotError {
    SwarmBotError::Store(StoreError::DatabaseError {
        message: e.to_string(),
    })
}

fn load_or_create_salt(conn: &Connection) -> Result<Vec<u8>, SwarmBotError> {
    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;

    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE name = 'salt'",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(db_error(other)),
        })?;

    if let Some(encoded) = existing {
        return engine.decode(&encoded).map_err(|e| {
            SwarmBotError::Store(StoreError::DatabaseError {
                message: format!("stored salt is not valid base64: {}", e),
            })
        });
    }

    let salt = crypto::random_salt();
    conn.execute(
        "INSERT INTO meta (name, value) VALUES ('salt', ?1)",
        params![engine.encode(salt)],
    )
    .map_err(db_error)?;
    Ok(salt.to_vec())
}

fn verify_or_write_key_check(conn: &Connection, key: &[u8; 32]) -> Result<(), SwarmBotError> {
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT value, (SELECT value FROM meta WHERE name = 'key_check_nonce')
             FROM meta WHERE name = 'key_check'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(db_error(other)),
        })?;

    match existing {
        Some((ciphertext, nonce)) => {
            let sealed = SealedKey { ciphertext, nonce };
            let plaintext = crypto::open(key, &sealed).map_err(SwarmBotError::Store)?;
            if plaintext != KEY_CHECK_PLAINTEXT {
                return Err(SwarmBotError::Store(StoreError::WrongPassphrase));
            }
            Ok(())
        }
        None => {
            let sealed = crypto::seal(key, KEY_CHECK_PLAINTEXT).map_err(SwarmBotError::Store)?;
            conn.execute(
                "INSERT INTO meta (name, value) VALUES ('key_check', ?1), ('key_check_nonce', ?2)",
                params![sealed.ciphertext, sealed.nonce],
            )
            .map_err(db_error)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SwarmBotError;

    fn temp_db_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("swarmbot-wallets-{}.db", uuid::Uuid::new_v4()))
    }

    #[test]
    fn save_and_load_round_trip_by_network() {
        let path = temp_db_path();
        let store = WalletStore::open(&path, "test passphrase").unwrap();

        let devnet: Vec<Keypair> = (0..3).map(|_| Keypair::new()).collect();
        let mainnet: Vec<Keypair> = (0..2).map(|_| Keypair::new()).collect();
        store.save("devnet", &devnet).unwrap();
        store.save("mainnet-beta", &mainnet).unwrap();

        let loaded = store.load("devnet").unwrap();
        assert_eq!(loaded.len(), 3);
        for (original, restored) in devnet.iter().zip(loaded.iter()) {
            assert_eq!(original.pubkey(), restored.pubkey());
            assert_eq!(original.to_bytes(), restored.to_bytes());
        }
        assert_eq!(store.count("mainnet-beta").unwrap(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reopen_with_same_passphrase_reads_back() {
        let path = temp_db_path();
        let wallets: Vec<Keypair> = (0..2).map(|_| Keypair::new()).collect();

        {
            let store = WalletStore::open(&path, "passphrase").unwrap();
            store.save("devnet", &wallets).unwrap();
        }

        let store = WalletStore::open(&path, "passphrase").unwrap();
        let loaded = store.load("devnet").unwrap();
        assert_eq!(loaded[0].pubkey(), wallets[0].pubkey());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn wrong_passphrase_is_rejected_at_open() {
        let path = temp_db_path();
        {
            WalletStore::open(&path, "right").unwrap();
        }

        let result = WalletStore::open(&path, "wrong");
        assert!(matches!(
            result,
            Err(SwarmBotError::Store(StoreError::WrongPassphrase))
        ));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn empty_passphrase_is_a_configuration_error() {
        let result = WalletStore::open(temp_db_path(), "");
        assert!(matches!(result, Err(SwarmBotError::Configuration(_))));
    }

    #[test]
    fn clear_forgets_only_the_named_network() {
        let path = temp_db_path();
        let store = WalletStore::open(&path, "passphrase").unwrap();

        store.save("devnet", &[Keypair::new()]).unwrap();
        store.save("testnet", &[Keypair::new()]).unwrap();
        store.clear("devnet").unwrap();

        assert_eq!(store.count("devnet").unwrap(), 0);
        assert_eq!(store.count("testnet").unwrap(), 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_replaces_the_previous_set() {
        let path = temp_db_path();
        let store = WalletStore::open(&path, "passphrase").unwrap();

        store
            .save("devnet", &(0..4).map(|_| Keypair::new()).collect::<Vec<_>>())
            .unwrap();
        let replacement = vec![Keypair::new()];
        store.save("devnet", &replacement).unwrap();

        let loaded = store.load("devnet").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pubkey(), replacement[0].pubkey());

        let _ = std::fs::remove_file(path);
    }
}
