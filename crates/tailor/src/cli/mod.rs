//! Subcommand implementations.

pub mod check;
pub mod classify;
pub mod config;
pub mod models;
pub mod run;

mod setup;
