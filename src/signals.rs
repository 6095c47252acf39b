//! Signal dispositions for the supervisor and runner.
//!
//! While a command may be pending, both roles ignore every signal they are allowed to
//! touch, so a stray Ctrl-C or terminal hangup can't take them down. `SIGCHLD` stays at
//! its default so blocking waits see terminations. Right before exec everything is
//! put back to default so the command gets ordinary signal behaviour.
//!
//! `SIGKILL` and `SIGSTOP` can't be changed; `SIGSEGV` is left alone so crashes still
//! produce diagnostics.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

/// Signals never touched by [`protect`] or [`unprotect`].
pub const EXCLUDED: [Signal; 3] = [Signal::SIGKILL, Signal::SIGSTOP, Signal::SIGSEGV];

fn managed() -> impl Iterator<Item = Signal> {
    Signal::iterator().filter(|sig| !EXCLUDED.contains(sig))
}

fn install(sig: Signal, handler: SigHandler) -> nix::Result<()> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // SAFETY: only SIG_IGN and SIG_DFL are installed; no handler code ever runs.
    unsafe { sigaction(sig, &action) }.map(drop)
}

/// Ignore every managed signal except `SIGCHLD`, which is reset to default.
pub fn protect() -> nix::Result<()> {
    for sig in managed() {
        let handler = if sig == Signal::SIGCHLD {
            SigHandler::SigDfl
        } else {
            SigHandler::SigIgn
        };
        install(sig, handler)?;
    }
    Ok(())
}

/// Reset every managed signal to its default disposition.
pub fn unprotect() -> nix::Result<()> {
    for sig in managed() {
        install(sig, SigHandler::SigDfl)?;
    }
    Ok(())
}
