//! Runner and supervisor failures.

use crate::command::{ExitCode, FAILURE, INTERNAL_FAILURE};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use rustyline::error::ReadlineError;
use std::ffi::NulError;
use thiserror::Error;

/// Fatal conditions of either role. Each one ends the process with [`ShellError::exit_code`].
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("could not read input: {0}")]
    Read(#[source] ReadlineError),

    #[error("could not set up line editing: {0}")]
    Editor(#[source] ReadlineError),

    #[error("could not install signal dispositions: {0}")]
    Signals(#[source] Errno),

    #[error("could not fork: {0}")]
    Fork(#[source] Errno),

    #[error("could not wait on command runner: {0}")]
    Wait(#[source] Errno),

    #[error("could not execvp: {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },

    #[error("argument contains a NUL byte: {0}")]
    Argument(#[from] NulError),

    #[error("command runner process died with signal {0}")]
    RunnerKilled(Signal),
}

impl ShellError {
    /// Read infrastructure failures use the sentinel so the supervisor stops; the rest are
    /// plain failures.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::Read(_) | ShellError::Editor(_) => INTERNAL_FAILURE,
            _ => FAILURE,
        }
    }
}
