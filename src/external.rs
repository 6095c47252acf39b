//! Running commands in forked children, and the in-place re-exec behind `self`.

use crate::command::{Argv, ExitCode};
use crate::env;
use crate::error::ShellError;
use crate::runner::Executor;
use crate::signals;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::convert::Infallible;
use std::ffi::{CString, OsString};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(ExitCode),
    Signaled(Signal),
}

impl Termination {
    /// Shell-style status: the exit code, or 128 plus the signal number.
    pub fn code(&self) -> ExitCode {
        match self {
            Termination::Exited(code) => *code,
            Termination::Signaled(signal) => 128 + *signal as i32,
        }
    }
}

/// Block until `pid` has terminated.
///
/// Stop and continue notifications are not terminations and are waited through, as
/// are interrupted waits.
pub fn wait_for(pid: Pid) -> nix::Result<Termination> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(Termination::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(Termination::Signaled(signal)),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Executor backed by real `fork`/`execvp`/`waitpid`.
pub struct ProcessExecutor {
    exports: Vec<(&'static str, OsString)>,
}

impl ProcessExecutor {
    /// `exports` are set in the environment before a self restart, next to the role marker.
    pub fn new(exports: Vec<(&'static str, OsString)>) -> Self {
        Self { exports }
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, argv: &Argv) -> Result<Option<Termination>, ShellError> {
        let args = argv.to_cstrings()?;
        if args.is_empty() {
            return Ok(None);
        }

        signals::protect().map_err(ShellError::Signals)?;

        // SAFETY: the runner is single threaded, and the child only resets signal
        // dispositions before exec.
        match unsafe { fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => exec_or_die(&args),
            ForkResult::Parent { child } => {
                log::debug!("started {:?} as {}", argv.to_strings_lossy(), child);
                let status = match wait_for(child) {
                    Ok(termination) => {
                        log::debug!("{} finished with status {}", child, termination.code());
                        Some(termination)
                    }
                    Err(e) => {
                        log::warn!("could not waitpid {}: {}", child, e);
                        None
                    }
                };
                signals::unprotect().map_err(ShellError::Signals)?;
                Ok(status)
            }
        }
    }

    fn replace(&mut self, argv: &Argv) -> Result<Infallible, ShellError> {
        let args = argv.to_cstrings()?;
        let program = argv.program().unwrap_or_default().to_string_lossy().into_owned();
        let Some(file) = args.first() else {
            return Err(ShellError::Exec {
                program,
                source: Errno::ENOENT,
            });
        };

        log::info!("restarting via {:?}", argv.to_strings_lossy());
        env::mark_next_generation(self.exports.iter().map(|(k, v)| (*k, v.as_os_str())));
        signals::unprotect().map_err(ShellError::Signals)?;

        execvp(file, &args).map_err(|source| ShellError::Exec { program, source })
    }
}

/// Child side of a fork: restore default signals and become the command.
fn exec_or_die(args: &[CString]) -> ! {
    let name = args[0].to_string_lossy();
    if let Err(e) = signals::unprotect() {
        eprintln!("{}: could not reset signals: {}", crate::config::PROGRAM_NAME, e);
    }
    let Err(e) = execvp(&args[0], args);
    eprintln!("{}: could not execvp: {}: {}", crate::config::PROGRAM_NAME, name, e);
    // SAFETY: skip atexit handlers and stdio flushing inherited from the runner.
    unsafe { nix::libc::_exit(1) }
}
