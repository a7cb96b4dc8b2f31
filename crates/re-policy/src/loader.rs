//! BundleLoader: `spec.md` §4.8. Grounded on
//! `alert-policy/crypto/bundle_verifier.py` for the signature-then-parse
//! ordering — a bundle's contents are never trusted until its signature has
//! verified.

use std::sync::Arc;

use re_crypto::KeyStore;
use re_records::PolicyBundle;

use crate::error::{PolicyError, Result};

pub struct BundleLoader {
    keystore: Arc<KeyStore>,
}

impl BundleLoader {
    pub fn new(keystore: Arc<KeyStore>) -> Self {
        Self { keystore }
    }

    /// Verify `bundle`'s signature against the configured key directory,
    /// then validate rule-priority uniqueness. Signature check runs first:
    /// an unsigned or malformed bundle is rejected before any rule is even
    /// inspected.
    pub fn load(&self, bundle: PolicyBundle) -> Result<PolicyBundle> {
        let key_id = bundle
            .bundle_key_id
            .clone()
            .ok_or(PolicyError::Unsigned)?;
        let signature = bundle
            .bundle_signature
            .clone()
            .ok_or(PolicyError::Unsigned)?;

        let public_key = self.keystore.load_public(&key_id)?;
        let bytes = bundle.bytes_for_signing()?;
        re_crypto::verify_canonical(&public_key, &bytes, &signature)?;

        bundle.validate_priority_uniqueness()?;

        tracing::info!(bundle_id = %bundle.bundle_id, bundle_version = %bundle.bundle_version, "policy bundle loaded and verified");
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use re_crypto::key_id_for_public_bytes;
    use re_records::{AuthorityLevel, Rule};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn rule(id: &str, priority: u32) -> Rule {
        Rule {
            rule_id: id.to_string(),
            priority,
            match_predicates: vec![],
            allowed_actions: vec!["notify".to_string()],
            required_authority: AuthorityLevel::None,
            explanation_template_id: "tmpl-1".to_string(),
        }
    }

    fn signed_bundle(rules: Vec<Rule>, signing_key: &SigningKey, key_id: &str) -> PolicyBundle {
        let mut bundle = PolicyBundle {
            bundle_id: "B1".into(),
            bundle_version: "1".into(),
            authority_scope: vec!["isolate".into()],
            created_by: "ops".into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            rules,
            bundle_key_id: None,
            bundle_signature: None,
        };
        let bytes = bundle.bytes_for_signing().unwrap();
        bundle.bundle_signature = Some(re_crypto::sign_canonical(signing_key, &bytes));
        bundle.bundle_key_id = Some(key_id.to_string());
        bundle
    }

    fn keystore_dir_with_key() -> (tempfile::TempDir, SigningKey, String) {
        let dir = tempfile::tempdir().unwrap();
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let key_id = key_id_for_public_bytes(verifying_key.as_bytes());
        fs::write(dir.path().join(format!("{key_id}.pub")), verifying_key.as_bytes()).unwrap();
        let key_path = dir.path().join(format!("{key_id}.key"));
        fs::write(&key_path, signing_key.to_bytes()).unwrap();
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600)).unwrap();
        (dir, signing_key, key_id)
    }

    #[test]
    fn accepts_validly_signed_bundle_with_unique_priorities() {
        let (dir, signing_key, key_id) = keystore_dir_with_key();
        let keystore = Arc::new(KeyStore::open(dir.path()).unwrap());
        let loader = BundleLoader::new(keystore);
        let bundle = signed_bundle(vec![rule("r1", 10), rule("r2", 20)], &signing_key, &key_id);
        assert!(loader.load(bundle).is_ok());
    }

    #[test]
    fn rejects_tampered_bundle() {
        let (dir, signing_key, key_id) = keystore_dir_with_key();
        let keystore = Arc::new(KeyStore::open(dir.path()).unwrap());
        let loader = BundleLoader::new(keystore);
        let mut bundle = signed_bundle(vec![rule("r1", 10)], &signing_key, &key_id);
        bundle.rules[0].priority = 999;
        assert!(matches!(loader.load(bundle), Err(PolicyError::Verification(_))));
    }

    #[test]
    fn rejects_duplicate_priorities() {
        let (dir, signing_key, key_id) = keystore_dir_with_key();
        let keystore = Arc::new(KeyStore::open(dir.path()).unwrap());
        let loader = BundleLoader::new(keystore);
        let bundle = signed_bundle(vec![rule("r1", 10), rule("r2", 10)], &signing_key, &key_id);
        assert!(matches!(loader.load(bundle), Err(PolicyError::Record(_))));
    }
}
