//! Top-level command surface. Each domain gets its own nested subcommand
//! enum, following `installer/metanode/src/main.rs`'s `Commands` ->
//! `XyzOperation` nesting.

use clap::{Parser, Subcommand};

use crate::commands::{bundle, dispatch, ledger, replay, risk, router, uba};

#[derive(Parser)]
#[command(name = "ransomeye")]
#[command(about = "RansomEye trust spine: canonical records, the audit ledger, policy routing, and signed command dispatch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Policy bundle loading and verification.
    Bundle {
        #[command(subcommand)]
        operation: bundle::BundleCommand,
    },
    /// Append-only ledger operations.
    Ledger {
        #[command(subcommand)]
        operation: ledger::LedgerCommand,
    },
    /// Alert routing against a policy bundle.
    Router {
        #[command(subcommand)]
        operation: router::RouterCommand,
    },
    /// Signed command construction and dispatch.
    Dispatch {
        #[command(subcommand)]
        operation: dispatch::DispatchCommand,
    },
    /// Offline ledger replay and validation.
    Replay {
        #[command(subcommand)]
        operation: replay::ReplayCommand,
    },
    /// Risk score normalization and export.
    Risk {
        #[command(subcommand)]
        operation: risk::RiskCommand,
    },
    /// User/entity behavior baseline, drift, and signal composition.
    Uba {
        #[command(subcommand)]
        operation: uba::UbaCommand,
    },
}

pub fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Bundle { operation } => bundle::run(operation),
        Commands::Ledger { operation } => ledger::run(operation),
        Commands::Router { operation } => router::run(operation),
        Commands::Dispatch { operation } => dispatch::run(operation),
        Commands::Replay { operation } => replay::run(operation),
        Commands::Risk { operation } => risk::run(operation),
        Commands::Uba { operation } => uba::run(operation),
    }
}
