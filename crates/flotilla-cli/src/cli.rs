//! Command-line surface of the `flotilla` driver.

use std::fmt;

use clap::Parser;

use crate::errors::AppError;

/// Runs one command against a freshly spawned backend instance.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "flotilla", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// The command to run (currently only `ps`).
    #[arg(value_name = "COMMAND")]
    pub(crate) command: Option<String>,
    /// Arguments for the command.
    #[arg(
        value_name = "ARG",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub(crate) arguments: Vec<String>,
}

/// A validated user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Lists the instance's containers, one name per line.
    Ps,
}

impl Command {
    /// Command name as typed by the user.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ps => "ps",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl TryFrom<Cli> for Command {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let Some(command) = cli.command else {
            return Err(AppError::MissingCommand);
        };
        match command.as_str() {
            "ps" if cli.arguments.is_empty() => Ok(Self::Ps),
            "ps" => Err(AppError::CommandUsage("ps")),
            _ => Err(AppError::UnknownCommand(command)),
        }
    }
}
