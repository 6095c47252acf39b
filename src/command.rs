//! Argument vectors, exit codes and the split between external commands and `self`.

use crate::lexer::SyntaxError;
use std::ffi::{CString, NulError, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Clean shutdown. A runner exiting with this code ends the whole program.
pub const SUCCESS: ExitCode = 0;

/// Generic failure for fork, exec and signal setup errors.
pub const FAILURE: ExitCode = 1;

/// A runner ended its session on a syntax error. The supervisor respawns it.
pub const SYNTAX_FAILURE: ExitCode = 2;

/// Reserved for read and parse infrastructure failures. Never respawned.
pub const INTERNAL_FAILURE: ExitCode = 112;

/// First-word token that restarts the program in place instead of running a command.
pub const RESTART_BUILTIN: &str = "self";

/// Owned argument vector for one dispatched line.
///
/// The first element is the program name, looked up on `PATH` by `execvp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argv(Vec<OsString>);

impl Argv {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The program to execute, if any.
    pub fn program(&self) -> Option<&OsStr> {
        self.0.first().map(OsString::as_os_str)
    }

    /// Lossy UTF-8 view, used for logging and tests.
    pub fn to_strings_lossy(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Convert into the NUL-terminated form `execvp` expects.
    ///
    /// Done before forking so the child does not allocate between fork and exec.
    pub fn to_cstrings(&self) -> Result<Vec<CString>, NulError> {
        self.0
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect()
    }

    /// Drop the builtin name and append the program's own path as the last argument.
    ///
    /// `self` alone restarts the program; `self nice -n 5` runs `nice -n 5 <program>`.
    fn into_restart(mut self, program: &OsStr) -> Argv {
        if !self.0.is_empty() {
            self.0.remove(0);
        }
        self.0.push(program.to_owned());
        self
    }
}

impl<S: Into<OsString>> FromIterator<S> for Argv {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// What the runner does with a non-empty argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Fork, exec the command in the child and wait for it.
    External(Argv),
    /// Replace the current process image with this vector. Control never comes back.
    Restart(Argv),
}

impl Dispatch {
    /// Decide between an external command and a self restart.
    ///
    /// `program` is the path this process was invoked as; it becomes the trailing
    /// argument of the restart vector.
    pub fn classify(argv: Argv, builtin: &str, program: &OsStr) -> Dispatch {
        if argv.program() == Some(OsStr::new(builtin)) {
            Dispatch::Restart(argv.into_restart(program))
        } else {
            Dispatch::External(argv)
        }
    }
}

/// Converts one input line into an argument vector.
///
/// An empty vector is a valid result and means there is nothing to run.
pub trait Tokenizer {
    fn parse(&self, line: &str) -> Result<Argv, SyntaxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Argv {
        args.iter().copied().collect()
    }

    #[test]
    fn external_command_is_passed_through() {
        let dispatch = Dispatch::classify(argv(&["echo", "hi"]), "self", OsStr::new("/bin/x"));
        assert_eq!(dispatch, Dispatch::External(argv(&["echo", "hi"])));
    }

    #[test]
    fn bare_builtin_restarts_program() {
        let dispatch = Dispatch::classify(argv(&["self"]), "self", OsStr::new("/usr/bin/execshell"));
        assert_eq!(dispatch, Dispatch::Restart(argv(&["/usr/bin/execshell"])));
    }

    #[test]
    fn builtin_with_prefix_command_appends_program_last() {
        let dispatch = Dispatch::classify(
            argv(&["self", "nice", "-n", "5"]),
            "self",
            OsStr::new("execshell"),
        );
        assert_eq!(
            dispatch,
            Dispatch::Restart(argv(&["nice", "-n", "5", "execshell"]))
        );
    }

    #[test]
    fn builtin_only_matches_first_word() {
        let dispatch = Dispatch::classify(argv(&["echo", "self"]), "self", OsStr::new("x"));
        assert!(matches!(dispatch, Dispatch::External(_)));

        let dispatch = Dispatch::classify(argv(&["selfish"]), "self", OsStr::new("x"));
        assert!(matches!(dispatch, Dispatch::External(_)));
    }

    #[test]
    fn cstrings_keep_order() {
        let c = argv(&["ls", "-l", "/tmp"]).to_cstrings().unwrap();
        let back: Vec<&str> = c.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(back, vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn cstrings_reject_interior_nul() {
        assert!(argv(&["a\0b"]).to_cstrings().is_err());
    }

    #[test]
    fn program_of_empty_vector_is_none() {
        let empty = Argv::default();
        assert!(empty.is_empty());
        assert_eq!(empty.program(), None);
    }
}
