//! A supervised, self-restarting command runner.
//!
//! The executable plays two roles. The [`Supervisor`] forks a runner, waits for it and
//! decides from its exit status whether to start a fresh one. The [`Runner`] reads lines
//! from a [`LineSource`], turns them into argument vectors with a [`Tokenizer`] and either
//! forks and execs an external command or, for the reserved `self` command, replaces
//! its own process image in place.
//!
//! Which role a process plays is decided once at process entry by [`Role::take_from_env`];
//! everything below that point receives the role as a plain value.

pub mod command;
pub mod config;
pub mod env;
mod error;
mod external;
mod lexer;
mod line_source;
mod runner;
pub mod signals;
mod supervisor;

pub use command::{Argv, Dispatch, ExitCode, Tokenizer};
pub use config::{Args, Config};
pub use env::Role;
pub use error::ShellError;
pub use external::{ProcessExecutor, Termination};
pub use lexer::{BlockLexer, SyntaxError};
pub use line_source::{Editor, Input, LineSource};
pub use runner::{Executor, Runner};
pub use supervisor::{ForkedRunner, Generations, Supervisor, Verdict};
