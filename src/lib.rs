//! Console bank account ledger.
//!
//! Accounts and users live in memory and are written back to flat text files
//! after every change. See [`features::Store`] for the operations.

#[macro_use]
extern crate log;

pub mod config;
pub mod features;
pub mod menu;
