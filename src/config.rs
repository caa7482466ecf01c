use std::path::PathBuf;

use clap::Parser;

use crate::features::{AccountKind, StoreConfig, WriteMode};

/// Console bank account ledger backed by flat text files.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Args {
    /// Directory holding accounts.txt and users.txt
    #[clap(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Kind of account opened by "Create Account" (savings or current)
    #[clap(long, default_value = "savings")]
    pub account_kind: AccountKind,

    /// Ask for the account kind each time an account is created
    #[clap(long)]
    pub ask_account_kind: bool,

    /// Save through a temporary file and rename it into place
    #[clap(long)]
    pub atomic_writes: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            account_kind: self.account_kind,
            write_mode: if self.atomic_writes {
                WriteMode::Atomic
            } else {
                WriteMode::Overwrite
            },
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
