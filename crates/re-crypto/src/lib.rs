//! Ed25519 key lifecycle, signing, and verification.
//!
//! Grounded on `crypto-primitives::Ed25519KeyPair`/`Ed25519PublicKey` for the
//! key types and `decision_receipt.rs::sign_receipt`/`verify_receipt` for
//! the base64-at-boundary signature convention. `KeyStore` file-permission
//! enforcement follows the `revaultd` reference's
//! `OpenOptionsExt::mode(0o400)` pattern, checked on read rather than write
//! since RansomEye never generates keys itself (`spec.md` non-goals).

pub mod keystore;
pub mod sign;

pub use keystore::{KeyId, KeyStore, KeyStoreError};
pub use sign::{sign_canonical, verify_canonical, SignatureB64, SigningError, VerificationError};

use sha2::{Digest, Sha256};

/// `key_id = hex(SHA256(raw_public_key_bytes))`, per `spec.md` §4.2.
pub fn key_id_for_public_bytes(public_key_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key_bytes);
    hex::encode(hasher.finalize())
}
