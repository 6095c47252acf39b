//! The respawn loop.
//!
//! The supervisor never reads input itself. It starts one runner generation at a time,
//! waits for it to end and looks only at how it ended:
//!
//! ```text
//! exit 0                  → shut down with 0
//! exit 112 (sentinel)     → shut down with 112
//! any other exit code     → start a fresh runner
//! killed by a signal      → fatal, no respawn
//! ```

use crate::command::{ExitCode, INTERNAL_FAILURE, SUCCESS};
use crate::error::ShellError;
use crate::external::{Termination, wait_for};
use crate::signals;
use nix::unistd::{ForkResult, fork};

/// What to do after a runner generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Respawn,
    Exit(ExitCode),
}

impl Verdict {
    pub fn of(termination: Termination) -> Result<Verdict, ShellError> {
        match termination {
            Termination::Signaled(signal) => Err(ShellError::RunnerKilled(signal)),
            Termination::Exited(code) if code == SUCCESS || code == INTERNAL_FAILURE => {
                Ok(Verdict::Exit(code))
            }
            Termination::Exited(_) => Ok(Verdict::Respawn),
        }
    }
}

/// Source of runner generations.
pub trait Generations {
    /// Start one runner and block until it has terminated.
    fn run_generation(&mut self) -> Result<Termination, ShellError>;
}

/// Runs each generation in a forked child.
///
/// The child calls `body` and exits with its result; it never returns into the
/// supervisor loop.
pub struct ForkedRunner<F> {
    body: F,
}

impl<F: FnMut() -> ExitCode> ForkedRunner<F> {
    pub fn new(body: F) -> Self {
        Self { body }
    }
}

impl<F: FnMut() -> ExitCode> Generations for ForkedRunner<F> {
    fn run_generation(&mut self) -> Result<Termination, ShellError> {
        // SAFETY: the supervisor is single threaded.
        match unsafe { fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => {
                let code = (self.body)();
                std::process::exit(code)
            }
            ForkResult::Parent { child } => {
                log::debug!("runner generation started as {}", child);
                wait_for(child).map_err(ShellError::Wait)
            }
        }
    }
}

pub struct Supervisor<G> {
    generations: G,
    respawns: usize,
}

impl<G: Generations> Supervisor<G> {
    pub fn new(generations: G) -> Self {
        Self {
            generations,
            respawns: 0,
        }
    }

    /// Number of runners started after the first one.
    pub fn respawns(&self) -> usize {
        self.respawns
    }

    /// Shield this process from terminal signals, then supervise until a runner asks
    /// to stop.
    pub fn run(&mut self) -> Result<ExitCode, ShellError> {
        signals::protect().map_err(ShellError::Signals)?;
        self.respawn_loop()
    }

    fn respawn_loop(&mut self) -> Result<ExitCode, ShellError> {
        loop {
            let termination = self.generations.run_generation()?;
            match Verdict::of(termination)? {
                Verdict::Exit(code) => {
                    log::debug!("runner exited with {}, shutting down", code);
                    return Ok(code);
                }
                Verdict::Respawn => {
                    self.respawns += 1;
                    log::info!(
                        "runner exited with {}, respawning (respawn #{})",
                        termination.code(),
                        self.respawns
                    );
                }
            }
        }
    }
}
