//! Role selection across the `fork`/`exec` boundary.
//!
//! The only state carried from one process generation to the next is the
//! [`ROLE_MARKER`] environment variable. It is read once at process entry, turned into a
//! [`Role`] and removed; from there on the role travels as a plain value.

use std::env as stdenv;
use std::ffi::OsStr;

/// Environment variable that tells a freshly exec'd image to act as a runner.
pub const ROLE_MARKER: &str = "EXECSHELL_RUNNING";

/// The part a process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the respawn loop.
    Supervisor,
    /// Drives the interactive read/parse/dispatch loop.
    Runner,
}

impl Role {
    /// Read and consume the role marker.
    ///
    /// The marker is single use: after this call it is gone from the environment, so
    /// commands started from this process never inherit it.
    pub fn take_from_env() -> Role {
        if stdenv::var_os(ROLE_MARKER).is_none() {
            return Role::Supervisor;
        }
        // SAFETY: called from `main` before any other thread exists.
        unsafe { stdenv::remove_var(ROLE_MARKER) };
        log::debug!("{ROLE_MARKER} observed and cleared, acting as runner");
        Role::Runner
    }
}

/// Prepare the environment of the next generation right before a self re-exec.
///
/// Sets the role marker and any exported settings so the new image comes up as a
/// runner with the same configuration.
pub fn mark_next_generation<'a, I>(exports: I)
where
    I: IntoIterator<Item = (&'a str, &'a OsStr)>,
{
    // SAFETY: the runner is single threaded and about to exec.
    unsafe {
        for (key, value) in exports {
            stdenv::set_var(key, value);
        }
        stdenv::set_var(ROLE_MARKER, "1");
    }
}
