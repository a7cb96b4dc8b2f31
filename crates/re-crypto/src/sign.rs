//! Canonical-bytes signing and verification.
//!
//! Grounded on `decision_receipt.rs::sign_receipt`/`verify_receipt`: sign
//! canonical bytes directly (no pre-hash), encode the 64-byte signature as
//! base64 at the boundary (`spec.md` §4.3, §6).

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub type SignatureB64 = String;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("signing operation failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("signature is not valid base64: {0}")]
    MalformedEncoding(String),
    #[error("signature is not 64 bytes")]
    MalformedSignature,
    #[error("signature does not verify under the given public key")]
    InvalidSignature,
}

/// Sign `canonical_bytes` with `signing_key`, returning a base64-encoded
/// 64-byte ed25519 signature.
pub fn sign_canonical(signing_key: &SigningKey, canonical_bytes: &[u8]) -> SignatureB64 {
    let signature = signing_key.sign(canonical_bytes);
    BASE64_STANDARD.encode(signature.to_bytes())
}

/// Verify `signature_b64` over `canonical_bytes` under `public_key`.
/// Never returns `Ok` on a parse failure — malformed encoding and malformed
/// signature bytes are distinct error variants from an actually-invalid
/// signature (`spec.md` §4.3).
pub fn verify_canonical(
    public_key: &VerifyingKey,
    canonical_bytes: &[u8],
    signature_b64: &str,
) -> Result<(), VerificationError> {
    let sig_bytes = BASE64_STANDARD
        .decode(signature_b64)
        .map_err(|e| VerificationError::MalformedEncoding(e.to_string()))?;
    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|_| VerificationError::MalformedSignature)?;
    public_key
        .verify(canonical_bytes, &signature)
        .map_err(|_| VerificationError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn sign_then_verify_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key();
        let sig = sign_canonical(&signing_key, b"hello");
        verify_canonical(&public_key, b"hello", &sig).unwrap();
    }

    #[test]
    fn tampered_bytes_fail_verification() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key();
        let sig = sign_canonical(&signing_key, b"hello");
        let err = verify_canonical(&public_key, b"goodbye", &sig).unwrap_err();
        assert_eq!(err, VerificationError::InvalidSignature);
    }

    #[test]
    fn malformed_base64_is_distinct_error() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key();
        let err = verify_canonical(&public_key, b"hello", "not base64!!").unwrap_err();
        assert!(matches!(err, VerificationError::MalformedEncoding(_)));
    }

    #[test]
    fn malformed_signature_length_is_distinct_error() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key();
        let short = BASE64_STANDARD.encode([0u8; 10]);
        let err = verify_canonical(&public_key, b"hello", &short).unwrap_err();
        assert_eq!(err, VerificationError::MalformedSignature);
    }
}
