use std::process;

use clap::Parser;

mod cli;
mod commands;
mod config;
mod exit_codes;
mod logging;

use cli::Cli;
use config::{Overrides, Settings};
use exit_codes::EXIT_ERROR;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load(
        cli.config.as_deref(),
        Overrides {
            fields_dir: cli.fields_dir.clone(),
            output: cli.output,
        },
    ) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_ERROR);
        }
    };

    logging::init(cli.debug, cli.quiet, &settings.log_filter);

    let code = match commands::run(cli.command, &settings).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    };
    process::exit(code);
}
