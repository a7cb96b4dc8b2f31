use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use re_records::{Alert, RandomIdSource, SystemClock};
use re_policy::Router;

use crate::error::CliFailure;
use crate::io_util::{read_json, write_json_pretty};

#[derive(Subcommand)]
pub enum RouterCommand {
    /// Route one alert against a bundle and print the resulting decision.
    /// Does not verify the bundle's signature — pipe it through
    /// `bundle load` first if the bundle's custody matters.
    TestRoute {
        #[arg(long)]
        bundle: PathBuf,
        #[arg(long)]
        alert: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

pub fn run(cmd: RouterCommand) -> anyhow::Result<()> {
    match cmd {
        RouterCommand::TestRoute { bundle, alert, out } => test_route(&bundle, &alert, &out),
    }
}

fn test_route(bundle_path: &PathBuf, alert_path: &PathBuf, out: &PathBuf) -> anyhow::Result<()> {
    let bundle = read_json(bundle_path)?;
    let alert: Alert = read_json(alert_path)?;

    let router = Router::new(bundle);
    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let decision = router
        .route_alert(&alert, &mut ids, &clock)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("routing alert")?;

    write_json_pretty(out, &decision)?;
    println!("alert {} routed to rule '{}'", alert.alert_id, decision.rule_id);
    Ok(())
}
