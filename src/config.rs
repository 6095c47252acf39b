//! Command-line flags and environment settings.
//!
//! A self restart re-execs the program with nothing but its own path, so every setting
//! can also come from the environment, and [`Config::exports`] lists what has to be put
//! there to survive the restart. Flags win over the environment.

use anyhow::{Context, Result};
use argh::FromArgs;
use std::ffi::OsString;
use std::path::PathBuf;

/// Name used as the prefix of diagnostics.
pub const PROGRAM_NAME: &str = "execshell";

pub const PROMPT_VAR: &str = "EXECSHELL_PROMPT";
pub const HISTORY_SIZE_VAR: &str = "EXECSHELL_HISTORY_SIZE";
pub const HISTORY_FILE_VAR: &str = "EXECSHELL_HISTORY_FILE";

pub const DEFAULT_PROMPT: &str = "> ";
pub const DEFAULT_HISTORY_SIZE: usize = 500;

#[derive(FromArgs, Debug, Default)]
/// Interactive execline-style command runner that restarts itself when it crashes.
/// Type `self` to restart in place.
pub struct Args {
    #[argh(option)]
    /// prompt printed before each line (default "> ")
    pub prompt: Option<String>,

    #[argh(option)]
    /// maximum number of history entries kept (default 500)
    pub history_size: Option<usize>,

    #[argh(option)]
    /// file the line history is loaded from and saved to
    pub history_file: Option<PathBuf>,
}

/// Resolved settings shared by both roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub history_size: usize,
    pub history_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
            history_file: None,
        }
    }
}

impl Config {
    /// Merge parsed flags with the process environment.
    pub fn resolve(args: Args) -> Result<Self> {
        Self::from_sources(args, |key| std::env::var_os(key))
    }

    fn from_sources(args: Args, lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let defaults = Config::default();

        let prompt = match args.prompt {
            Some(prompt) => prompt,
            None => match lookup(PROMPT_VAR) {
                Some(value) => value.into_string().map_err(|_| {
                    anyhow::anyhow!("{PROMPT_VAR} is not valid UTF-8")
                })?,
                None => defaults.prompt,
            },
        };

        let history_size = match args.history_size {
            Some(size) => size,
            None => match lookup(HISTORY_SIZE_VAR) {
                Some(value) => value
                    .to_string_lossy()
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid {HISTORY_SIZE_VAR}: {value:?}"))?,
                None => defaults.history_size,
            },
        };

        let history_file = args
            .history_file
            .or_else(|| lookup(HISTORY_FILE_VAR).map(PathBuf::from))
            .filter(|path| !path.as_os_str().is_empty());

        Ok(Self {
            prompt,
            history_size,
            history_file,
        })
    }

    /// Environment entries that carry this configuration into the next generation.
    pub fn exports(&self) -> Vec<(&'static str, OsString)> {
        let mut exports = vec![
            (PROMPT_VAR, OsString::from(&self.prompt)),
            (HISTORY_SIZE_VAR, OsString::from(self.history_size.to_string())),
        ];
        if let Some(path) = &self.history_file {
            exports.push((HISTORY_FILE_VAR, path.clone().into_os_string()));
        }
        exports
    }
}
