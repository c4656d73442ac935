//! Arcana: a tarot reading chat bot.
//!
//! `arcana serve` answers chat messages posted to its webhook and exposes
//! health and readiness endpoints; `arcana console` answers commands typed
//! on stdin.

mod commands;
mod config;
mod error;
mod http;
mod router;
mod store;
mod transport;

use std::process;

use clap::Parser;

use crate::config::{Cli, Commands};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            chat_token,
            common,
        } => commands::serve::run(port, chat_token, &common).await,
        Commands::Console {
            user,
            image_dir,
            common,
        } => commands::console::run(&user, image_dir, &common).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
