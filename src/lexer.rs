//! Lexical analysis for execline-style command lines.
//!
//! A line is split into words on unquoted whitespace. Double quotes group a word and
//! understand the escapes `\n`, `\t`, `\r`, `\\` and `\"`; outside quotes a backslash
//! takes the next character literally. An unquoted `#` at the start of a word comments
//! out the rest of the line.
//!
//! Unquoted `{` and `}` delimit blocks. Blocks are flattened into the argument vector the
//! way execline does it: every word inside a block is prefixed with one space per nesting
//! level, and the block is closed by a terminator word made of `depth - 1` spaces. So
//! `foreground { sleep 1 } echo done` becomes
//! `["foreground", " sleep", " 1", "", "echo", "done"]`.

use crate::command::{Argv, Tokenizer};
use thiserror::Error;

/// Reasons a line can't be turned into an argument vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A `}` with no open block.
    #[error("unmatched }}")]
    UnmatchedClose,
    /// A `{` still open at the end of the line.
    #[error("unmatched {{")]
    UnmatchedOpen,
    /// Unterminated quote or dangling escape.
    #[error("syntax error")]
    Syntax,
    /// The line contains something that can never become an argument, such as a NUL byte.
    #[error("unable to parse input")]
    Unparseable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingDoubleQuote,
    Comment,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    depth: usize,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            depth: 0,
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole input and returns the flattened words.
    fn make_words(&mut self) -> Result<Vec<String>, SyntaxError> {
        if self.input.contains(&'\0') {
            return Err(SyntaxError::Unparseable);
        }

        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
                LexingState::Comment => {}
            }
        }

        match self.state {
            LexingState::ReadingDoubleQuote => return Err(SyntaxError::Syntax),
            LexingState::ReadingWord => self.finish_word(&mut out),
            LexingState::Start | LexingState::Comment => {}
        }

        if self.depth > 0 {
            return Err(SyntaxError::UnmatchedOpen);
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), SyntaxError> {
        match ch {
            c if is_blank(c) => {}
            '#' => self.state = LexingState::Comment,
            '{' | '}' => self.handle_brace(ch, out)?,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                let escaped = self.read_char().ok_or(SyntaxError::Syntax)?;
                self.buffer.push(escaped);
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), SyntaxError> {
        match ch {
            c if is_blank(c) => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '{' | '}' => {
                self.finish_word(out);
                self.state = LexingState::Start;
                self.handle_brace(ch, out)?;
            }
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                let escaped = self.read_char().ok_or(SyntaxError::Syntax)?;
                self.buffer.push(escaped);
            }
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), SyntaxError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => {
                let escaped = match self.read_char().ok_or(SyntaxError::Syntax)? {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    c => c,
                };
                self.buffer.push(escaped);
            }
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_brace(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), SyntaxError> {
        if ch == '{' {
            self.depth += 1;
            return Ok(());
        }
        if self.depth == 0 {
            return Err(SyntaxError::UnmatchedClose);
        }
        self.depth -= 1;
        out.push(" ".repeat(self.depth));
        Ok(())
    }

    /// Pushes the buffered word, quoted with one space per open block.
    fn finish_word(&mut self, out: &mut Vec<String>) {
        let word = std::mem::take(&mut self.buffer);
        out.push(format!("{}{}", " ".repeat(self.depth), word));
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Splits a line into words, flattening `{ ... }` blocks.
pub fn split_into_words(line: &str) -> Result<Vec<String>, SyntaxError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_words()
}

/// The tokenizer used by the interactive runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLexer;

impl Tokenizer for BlockLexer {
    fn parse(&self, line: &str) -> Result<Argv, SyntaxError> {
        split_into_words(line).map(|words| words.into_iter().collect())
    }
}
