//! studiotree CLI binary

use clap::Parser;
use std::process;
use studiotree::logging::init_logging;
use studiotree::tooling::cli::{Cli, CliContext};

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {}", e);
            process::exit(1);
        }
    };

    // Command-line flags override the configured logging section
    let mut logging = context.config().logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
        logging.output = "stderr".to_string();
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.clone();
    }
    if cli.log_file.is_some() {
        logging.file = cli.log_file.clone();
    }
    if let Err(e) = init_logging(Some(&logging), Some(&cli.workspace)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
