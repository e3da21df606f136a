//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pagewright: test-data and configuration tooling for page-object UI tests
#[derive(Parser, Debug)]
#[command(name = "pagewright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand placeholder tokens in a test-data file
    Render(RenderArgs),

    /// Read records by TestDataId from a test-data directory
    Read(ReadArgs),

    /// List the supported placeholder tokens
    Tokens(TokensArgs),

    /// Show the effective framework configuration
    Config(ConfigArgs),
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// File to render
    pub file: PathBuf,

    /// Only emit records with these TestDataId values
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Seed for reproducible random values
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fixed "now" for date tokens (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub now: Option<String>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the read command
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Directory holding the `TestData` folder
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Resource name, dotted (e.g. `Billing.Invoices`)
    pub name: String,

    /// TestDataId values to read
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Seed for reproducible random values
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the tokens command
#[derive(Parser, Debug)]
pub struct TokensArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML file to load instead of `PAGEWRIGHT_CONFIG`
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    pub init: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "yaml")]
    pub format: ConfigFormatArg,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Token listing format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Aligned table
    #[default]
    Text,
    /// JSON array
    Json,
}

/// Configuration output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormatArg {
    /// YAML, the on-disk format
    #[default]
    Yaml,
    /// JSON
    Json,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from([
            "pagewright", "render", "users.json", "--id", "admin", "--id", "guest", "--seed", "7",
        ]);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.file, PathBuf::from("users.json"));
                assert_eq!(args.ids, vec!["admin", "guest"]);
                assert_eq!(args.seed, Some(7));
                assert!(!args.compact);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_read_requires_ids() {
        assert!(Cli::try_parse_from(["pagewright", "read", "Users"]).is_err());
        let cli = Cli::try_parse_from(["pagewright", "-v", "read", "-d", "fixtures", "Users", "a"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Read(args) => {
                assert_eq!(args.data_dir, PathBuf::from("fixtures"));
                assert_eq!(args.ids, vec!["a"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_format() {
        let cli = Cli::parse_from(["pagewright", "config", "--format", "json"]);
        match cli.command {
            Commands::Config(args) => assert_eq!(args.format, ConfigFormatArg::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
