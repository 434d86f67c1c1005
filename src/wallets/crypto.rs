//! Wallet key encryption
//!
//! Secret keys are sealed with ChaCha20-Poly1305 under a key derived from
//! the operator passphrase via PBKDF2-HMAC-SHA256 (100 000 iterations,
//! per-store random salt). Every record gets a fresh random 96-bit nonce;
//! ciphertext and nonce are base64-encoded for storage.

use crate::errors::StoreError;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use ring::pbkdf2;
use std::num::NonZeroU32;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// An encrypted secret key as stored at rest
#[derive(Debug, Clone)]
pub struct SealedKey {
    pub ciphertext: String,
    pub nonce: String,
}

/// Derive the store key from the operator passphrase
pub fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).expect("iterations are non-zero");

    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        passphrase.as_bytes(),
        &mut key,
    );

    key
}

pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Encrypt a secret under the store key with a fresh random nonce
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<SealedKey, StoreError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| StoreError::DatabaseError {
            message: "encryption failed".to_string(),
        })?;

    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;
    Ok(SealedKey {
        ciphertext: engine.encode(ciphertext),
        nonce: engine.encode(nonce_bytes),
    })
}

/// Decrypt a sealed secret. Authentication failure means either a wrong
/// passphrase or a tampered record.
pub fn open(key: &[u8; 32], sealed: &SealedKey) -> Result<Vec<u8>, StoreError> {
    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;

    let ciphertext = engine
        .decode(&sealed.ciphertext)
        .map_err(|e| StoreError::DatabaseError {
            message: format!("ciphertext is not valid base64: {}", e),
        })?;
    let nonce_bytes = engine
        .decode(&sealed.nonce)
        .map_err(|e| StoreError::DatabaseError {
            message: format!("nonce is not valid base64: {}", e),
        })?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(StoreError::DatabaseError {
            message: format!("nonce has wrong length: {}", nonce_bytes.len()),
        });
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map_err(|_| StoreError::WrongPassphrase)
}
