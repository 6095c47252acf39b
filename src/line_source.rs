//! Line input with history, backed by rustyline.

use crate::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Outcome of one successful poll of a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Nothing was read, but the source is still usable. Poll again.
    Retry,
    /// End of input.
    End,
}

/// Supplies input lines and keeps their history.
pub trait LineSource {
    /// Prompt for and read one line. An `Err` means the source is broken.
    fn read_line(&mut self, prompt: &str) -> Result<Input, ReadlineError>;

    /// Record a line so it can be recalled later.
    fn add_history(&mut self, line: &str);

    /// Limit the number of remembered lines.
    fn set_history_limit(&mut self, limit: usize) -> Result<(), ReadlineError>;
}

/// Terminal line editor with optional on-disk history.
pub struct Editor {
    rl: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl Editor {
    pub fn new(config: &Config) -> rustyline::Result<Self> {
        let mut rl = DefaultEditor::new()?;
        rl.history_mut().set_max_len(config.history_size)?;

        if let Some(path) = &config.history_file {
            match rl.load_history(path) {
                Ok(()) => log::debug!("loaded history from {}", path.display()),
                Err(ReadlineError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!("could not load history from {}: {}", path.display(), e),
            }
        }

        Ok(Self {
            rl,
            history_file: config.history_file.clone(),
        })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Input, ReadlineError> {
        match self.rl.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(err) => classify(err),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.rl.add_history_entry(line) {
            log::warn!("could not add history entry: {}", e);
            return;
        }
        if let Some(path) = &self.history_file {
            if let Err(e) = self.rl.save_history(path) {
                log::warn!("could not save history to {}: {}", path.display(), e);
            }
        }
    }

    fn set_history_limit(&mut self, limit: usize) -> Result<(), ReadlineError> {
        self.rl.history_mut().set_max_len(limit)
    }
}

/// Separate transient read failures from end of input and from real errors.
///
/// Ctrl-C at the prompt only discards the line being edited.
pub(crate) fn classify(err: ReadlineError) -> Result<Input, ReadlineError> {
    match err {
        ReadlineError::Eof => Ok(Input::End),
        ReadlineError::Interrupted => Ok(Input::Retry),
        ReadlineError::Io(ref e)
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) =>
        {
            Ok(Input::Retry)
        }
        #[cfg(unix)]
        ReadlineError::Errno(errno)
            if matches!(errno as i32, nix::libc::EAGAIN | nix::libc::EINTR) =>
        {
            Ok(Input::Retry)
        }
        other => Err(other),
    }
}
