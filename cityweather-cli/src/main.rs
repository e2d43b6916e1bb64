//! Binary crate for the `cityweather` terminal client.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and browsing
//! - Human-friendly output formatting
//!
//! All weather state lives in `cityweather-core`; this crate only reads it
//! and forwards user actions to the store.

use clap::Parser;

mod cli;
mod logging;
mod render;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
