mod cli;
mod config;
mod main_lib;
mod report;

use clap::Parser;
use cli::Cli;
use config::Config;
use main_lib::init_tracing;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return ExitCode::from(2);
        }
    };
    init_tracing();
    cli::run(cli, &config).await
}
