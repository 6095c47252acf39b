//! The interactive loop of a runner generation.
//!
//! Each line is read, tokenized and dispatched. Syntax errors and end of input end the
//! generation with an exit code the supervisor acts on; `self` never returns.

use crate::command::{
    Argv, Dispatch, ExitCode, RESTART_BUILTIN, SUCCESS, SYNTAX_FAILURE, Tokenizer,
};
use crate::config::{Config, PROGRAM_NAME};
use crate::error::ShellError;
use crate::external::Termination;
use crate::line_source::{Input, LineSource};
use std::convert::Infallible;
use std::ffi::OsString;

/// Runs dispatched argument vectors as processes.
pub trait Executor {
    /// Fork, exec `argv` in the child and block until it terminates.
    ///
    /// `Ok(None)` means the child could not be waited on; that is not fatal.
    fn execute(&mut self, argv: &Argv) -> Result<Option<Termination>, ShellError>;

    /// Replace the current process image with `argv`.
    ///
    /// Only returns on failure.
    fn replace(&mut self, argv: &Argv) -> Result<Infallible, ShellError>;
}

/// The interactive read/parse/dispatch loop.
///
/// Example
/// ```no_run
/// use execshell::{BlockLexer, Config, Editor, ProcessExecutor, Runner};
/// let config = Config::default();
/// let editor = Editor::new(&config).unwrap();
/// let executor = ProcessExecutor::new(config.exports());
/// let mut runner = Runner::new(editor, BlockLexer, executor, &config, "execshell".into());
/// let code = runner.run().unwrap();
/// std::process::exit(code);
/// ```
pub struct Runner<L, T, E> {
    lines: L,
    tokenizer: T,
    executor: E,
    prompt: String,
    history_limit: usize,
    program: OsString,
}

impl<L: LineSource, T: Tokenizer, E: Executor> Runner<L, T, E> {
    /// `program` is the path this process was started as; `self` re-execs it.
    pub fn new(lines: L, tokenizer: T, executor: E, config: &Config, program: OsString) -> Self {
        Self {
            lines,
            tokenizer,
            executor,
            prompt: config.prompt.clone(),
            history_limit: config.history_size,
            program,
        }
    }

    /// Read and dispatch lines until end of input or a syntax error.
    ///
    /// Returns the code the runner process should exit with. A successful self restart
    /// never returns.
    pub fn run(&mut self) -> Result<ExitCode, ShellError> {
        if let Err(e) = self.lines.set_history_limit(self.history_limit) {
            log::warn!("could not set history limit: {}", e);
        }

        loop {
            let line = match self.lines.read_line(&self.prompt).map_err(ShellError::Read)? {
                Input::Line(line) => line,
                Input::Retry => continue,
                Input::End => return Ok(SUCCESS),
            };

            self.lines.add_history(&line);

            let argv = match self.tokenizer.parse(&line) {
                Ok(argv) => argv,
                Err(kind) => {
                    eprintln!("{}: {}", PROGRAM_NAME, kind);
                    return Ok(SYNTAX_FAILURE);
                }
            };

            if argv.is_empty() {
                continue;
            }

            match Dispatch::classify(argv, RESTART_BUILTIN, &self.program) {
                Dispatch::Restart(argv) => match self.executor.replace(&argv)? {},
                Dispatch::External(argv) => {
                    if let Some(Termination::Signaled(signal)) = self.executor.execute(&argv)? {
                        log::debug!("{:?} killed by {}", argv.to_strings_lossy(), signal);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::INTERNAL_FAILURE;
    use crate::lexer::BlockLexer;
    use nix::errno::Errno;
    use rustyline::error::ReadlineError;
    use std::collections::VecDeque;
    use std::io;

    #[derive(Default)]
    struct ScriptedLines {
        script: VecDeque<Result<Input, ReadlineError>>,
        history: Vec<String>,
        limit: Option<usize>,
        prompts: usize,
    }

    impl ScriptedLines {
        fn new(lines: &[&str]) -> Self {
            Self {
                script: lines.iter().map(|l| Ok(Input::Line(l.to_string()))).collect(),
                ..Default::default()
            }
        }

        fn then(mut self, next: Result<Input, ReadlineError>) -> Self {
            self.script.push_back(next);
            self
        }
    }

    impl LineSource for ScriptedLines {
        fn read_line(&mut self, _prompt: &str) -> Result<Input, ReadlineError> {
            self.prompts += 1;
            self.script.pop_front().unwrap_or(Ok(Input::End))
        }

        fn add_history(&mut self, line: &str) {
            self.history.push(line.to_string());
        }

        fn set_history_limit(&mut self, limit: usize) -> Result<(), ReadlineError> {
            self.limit = Some(limit);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        executed: Vec<Vec<String>>,
        replaced: Vec<Vec<String>>,
    }

    impl Executor for RecordingExecutor {
        fn execute(&mut self, argv: &Argv) -> Result<Option<Termination>, ShellError> {
            self.executed.push(argv.to_strings_lossy());
            Ok(Some(Termination::Exited(0)))
        }

        fn replace(&mut self, argv: &Argv) -> Result<Infallible, ShellError> {
            self.replaced.push(argv.to_strings_lossy());
            Err(ShellError::Exec {
                program: argv.to_strings_lossy()[0].clone(),
                source: Errno::ENOENT,
            })
        }
    }

    type TestRunner = Runner<ScriptedLines, BlockLexer, RecordingExecutor>;

    fn runner(lines: ScriptedLines) -> TestRunner {
        Runner::new(
            lines,
            BlockLexer,
            RecordingExecutor::default(),
            &Config::default(),
            "/usr/local/bin/execshell".into(),
        )
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let mut r = runner(ScriptedLines::default());
        assert_eq!(r.run().unwrap(), SUCCESS);
        assert!(r.executor.executed.is_empty());
        assert_eq!(r.lines.limit, Some(500));
    }

    #[test]
    fn external_command_is_executed_and_loop_continues() {
        let mut r = runner(ScriptedLines::new(&["echo hi", "true"]));
        assert_eq!(r.run().unwrap(), SUCCESS);
        assert_eq!(
            r.executor.executed,
            vec![vec!["echo".to_string(), "hi".to_string()], vec!["true".to_string()]]
        );
        assert!(r.executor.replaced.is_empty());
    }

    #[test]
    fn empty_lines_dispatch_nothing() {
        let mut r = runner(ScriptedLines::new(&["", "   ", "# comment"]));
        assert_eq!(r.run().unwrap(), SUCCESS);
        assert!(r.executor.executed.is_empty());
        assert!(r.executor.replaced.is_empty());
        assert_eq!(r.lines.history.len(), 3);
    }

    #[test]
    fn restart_replaces_image_without_forking() {
        let mut r = runner(ScriptedLines::new(&["self", "echo never"]));
        let err = r.run().unwrap_err();
        assert!(matches!(err, ShellError::Exec { .. }));
        assert_eq!(r.executor.replaced, vec![vec!["/usr/local/bin/execshell".to_string()]]);
        assert!(r.executor.executed.is_empty());
        // the line after `self` is never read
        assert_eq!(r.lines.prompts, 1);
    }

    #[test]
    fn restart_through_prefix_command() {
        let mut r = runner(ScriptedLines::new(&["self env FOO=1"]));
        let _ = r.run();
        assert_eq!(
            r.executor.replaced,
            vec![vec![
                "env".to_string(),
                "FOO=1".to_string(),
                "/usr/local/bin/execshell".to_string()
            ]]
        );
    }

    #[test]
    fn syntax_error_ends_session_for_respawn() {
        let mut r = runner(ScriptedLines::new(&["{unclosed", "echo later"]));
        assert_eq!(r.run().unwrap(), SYNTAX_FAILURE);
        assert!(r.executor.executed.is_empty());
        assert_eq!(r.lines.history, vec!["{unclosed".to_string()]);
    }

    #[test]
    fn every_syntax_error_kind_ends_session() {
        for line in ["}", "{", "\"open", "a\0b"] {
            let mut r = runner(ScriptedLines::new(&[line]));
            assert_eq!(r.run().unwrap(), SYNTAX_FAILURE, "line {line:?}");
        }
    }

    #[test]
    fn retry_does_not_consume_a_line() {
        let lines = ScriptedLines::default()
            .then(Ok(Input::Retry))
            .then(Ok(Input::Retry))
            .then(Ok(Input::Line("ls".into())));
        let mut r = runner(lines);
        assert_eq!(r.run().unwrap(), SUCCESS);
        assert_eq!(r.executor.executed, vec![vec!["ls".to_string()]]);
        assert_eq!(r.lines.history, vec!["ls".to_string()]);
    }

    #[test]
    fn read_failure_is_internal_failure() {
        let lines = ScriptedLines::new(&["true"])
            .then(Err(ReadlineError::Io(io::Error::other("tty gone"))));
        let mut r = runner(lines);
        let err = r.run().unwrap_err();
        assert!(matches!(err, ShellError::Read(_)));
        assert_eq!(err.exit_code(), INTERNAL_FAILURE);
        assert_eq!(r.executor.executed.len(), 1);
    }

    #[test]
    fn lines_are_recorded_before_dispatch() {
        let mut r = runner(ScriptedLines::new(&["echo a", "echo b"]));
        r.run().unwrap();
        assert_eq!(r.lines.history, vec!["echo a".to_string(), "echo b".to_string()]);
    }
}
