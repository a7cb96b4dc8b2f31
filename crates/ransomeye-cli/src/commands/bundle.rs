use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use re_crypto::KeyStore;
use re_policy::BundleLoader;
use re_records::PolicyBundle;

use crate::error::CliFailure;
use crate::io_util::{read_json, write_json_pretty};

#[derive(Subcommand)]
pub enum BundleCommand {
    /// Verify a policy bundle's signature and rule-priority uniqueness,
    /// then write the accepted bundle back out unchanged.
    Load {
        #[arg(long)]
        bundle: PathBuf,
        /// Falls back to `RANSOMEYE_POLICY_ENGINE_KEY_DIR` when omitted.
        #[arg(long)]
        keys: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Verify a policy bundle without producing any output file.
    Verify {
        #[arg(long)]
        bundle: PathBuf,
        /// Falls back to `RANSOMEYE_POLICY_ENGINE_KEY_DIR` when omitted.
        #[arg(long)]
        keys: Option<PathBuf>,
    },
}

pub fn run(cmd: BundleCommand) -> anyhow::Result<()> {
    match cmd {
        BundleCommand::Load { bundle, keys, out } => {
            let keys = resolve_policy_engine_key_dir(keys)?;
            let loaded = load_and_verify(&bundle, &keys)?;
            write_json_pretty(&out, &loaded)?;
            println!("bundle {} version {} accepted", loaded.bundle_id, loaded.bundle_version);
            Ok(())
        }
        BundleCommand::Verify { bundle, keys } => {
            let keys = resolve_policy_engine_key_dir(keys)?;
            let loaded = load_and_verify(&bundle, &keys)?;
            println!("bundle {} version {} verifies", loaded.bundle_id, loaded.bundle_version);
            Ok(())
        }
    }
}

/// `test_policy_engine_signer.py`'s policy engine raises `SystemExit` when
/// no key directory is configured; it never assumes an implicit default.
fn resolve_policy_engine_key_dir(keys: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match keys {
        Some(path) => Ok(path),
        None => std::env::var("RANSOMEYE_POLICY_ENGINE_KEY_DIR")
            .map(PathBuf::from)
            .map_err(|_| {
                CliFailure::MissingInput(
                    "--keys not given and RANSOMEYE_POLICY_ENGINE_KEY_DIR is not set".into(),
                )
                .into()
            }),
    }
}

fn load_and_verify(bundle_path: &PathBuf, keys_dir: &PathBuf) -> anyhow::Result<PolicyBundle> {
    let bundle: PolicyBundle = read_json(bundle_path)?;
    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let loader = BundleLoader::new(Arc::new(keystore));
    loader
        .load(bundle)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("loading policy bundle")
}
