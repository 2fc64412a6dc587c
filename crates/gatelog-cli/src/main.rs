//! Gatelog - vehicle checkpoint log
//!
//! A CLI that records vehicles entering and leaving a facility and tells
//! registered (internal) vehicles apart from visitors.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tokio::task::LocalSet;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Store round trips are spawned as local tasks
    if let Err(e) = LocalSet::new().run_until(commands::execute(cli)).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
