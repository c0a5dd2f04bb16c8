mod analyzer;
mod app;
mod cli;
mod config;
mod export;
mod filter;
mod model;
mod parser;
mod scraper;
mod service;
mod storage;

use clap::Parser;
use cli::Cli;
use config::load_config;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = app::run(cli.command, &config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
