mod cli;
mod commands;
mod error;
mod io_util;
mod record_kind;

use clap::Parser;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(3);
    }

    if let Err(err) = cli::dispatch(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(error::exit_code_for(&err));
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        "ransomeye_cli=debug,re_canon=debug,re_crypto=debug,re_records=debug,re_store=debug,re_ledger=debug,re_policy=debug,re_dedup=debug,re_dispatch=debug,re_replay=debug,re_uba=debug"
    } else {
        "ransomeye_cli=info,re_canon=info,re_crypto=info,re_records=info,re_store=info,re_ledger=info,re_policy=info,re_dedup=info,re_dispatch=info,re_replay=info,re_uba=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
