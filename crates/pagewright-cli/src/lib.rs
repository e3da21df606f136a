//! Pagewright CLI Library
//!
//! Command-line tooling around the Pagewright test framework: expanding
//! placeholder tokens in test-data files, reading records by `TestDataId`,
//! listing the token catalogue and showing the effective configuration.

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormatArg, OutputFormatArg, ReadArgs, RenderArgs,
    TokensArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
