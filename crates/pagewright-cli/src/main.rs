//! Pagewright CLI
//!
//! ## Usage
//!
//! ```bash
//! pagewright render TestData/Users.json --id admin --seed 7
//! pagewright read --data-dir fixtures Billing.Invoices overdue
//! pagewright tokens
//! pagewright config --file pagewright.yaml
//! ```

use clap::Parser;
use pagewright_cli::{
    handlers::{config::execute_config, data, tokens::execute_tokens},
    Cli, CliConfig, CliResult, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.color.apply();
    config.init_tracing();

    let output = match &cli.command {
        Commands::Render(args) => data::execute_render(args)?,
        Commands::Read(args) => data::execute_read(args)?,
        Commands::Tokens(args) => execute_tokens(args.format)?,
        Commands::Config(args) => execute_config(args)?,
    };
    println!("{}", output.trim_end());
    Ok(())
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
}
