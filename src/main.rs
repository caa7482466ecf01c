use std::io;
use std::process;

use anyhow::Context;
use bank_ledger::{config::Args, features::Store, menu::Menu};
use clap::Parser;
#[macro_use]
extern crate log;

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    if let Err(e) = run(&args) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut store = Store::open(args.store_config())
        .with_context(|| format!("failed to load ledger from {}", args.data_dir.display()))?;
    info!("ledger ready in {}", store.data_dir().display());

    let stdin = io::stdin();
    Menu::new(&mut store, stdin.lock(), io::stdout())
        .ask_account_kind(args.ask_account_kind)
        .run()
}
