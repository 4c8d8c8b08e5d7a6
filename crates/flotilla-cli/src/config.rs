//! Separates configuration flags from the command line.
//!
//! Configuration flags must precede the command. Everything from the first
//! unrecognised token onwards belongs to the command.

use std::ffi::OsString;

use flotilla_config::Config;
use ortho_config::OrthoConfig;

use crate::errors::AppError;

/// Flags forwarded to the configuration loader.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--backend",
    "--engine-host",
    "--log-filter",
    "--log-format",
    "--operation-timeout-secs",
];

/// Source of the CLI configuration.
pub trait ConfigLoader {
    /// Loads configuration from the program name plus the config flags.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoadConfiguration`] when a layer fails to parse.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads configuration through `ortho_config`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

/// Arguments split into the loader's share and the command's share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by every recognised config flag and value.
    pub(crate) config_arguments: Vec<OsString>,
    /// Program name followed by the command tokens.
    pub(crate) command_arguments: Vec<OsString>,
}

/// Whether `argument` is a config flag, and if so whether its value is the
/// next token.
fn config_flag(argument: &OsString) -> Option<bool> {
    let text = argument.to_str()?;
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text, false),
    };
    CONFIG_CLI_FLAGS.contains(&flag).then_some(!inline_value)
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut tokens = args.iter();
    let program: Vec<OsString> = tokens.next().cloned().into_iter().collect();
    let mut config_arguments = program.clone();
    let mut tokens = tokens.peekable();

    while let Some(needs_value) = tokens.peek().and_then(|token| config_flag(token)) {
        config_arguments.extend(tokens.next().cloned());
        if needs_value {
            config_arguments.extend(tokens.next().cloned());
        }
    }

    let mut command_arguments = program;
    command_arguments.extend(tokens.cloned());
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
