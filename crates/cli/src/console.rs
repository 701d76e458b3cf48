//! Line-based console I/O
//!
//! Generic over reader/writer so the menu can be driven from tests.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// End of input - the operator closed the session
    #[error("input closed")]
    Closed,

    #[error("console IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl Display) -> ConsoleResult<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Print the prompt and read one trimmed line
    pub fn prompt(&mut self, message: &str) -> ConsoleResult<String> {
        write!(self.output, "{} ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::Closed);
        }
        Ok(line.trim().to_string())
    }

    /// Blank answer becomes `None`
    pub fn prompt_optional(&mut self, message: &str) -> ConsoleResult<Option<String>> {
        let answer = self.prompt(message)?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }

    /// Re-prompt until `parse` accepts the answer
    pub fn prompt_until<T, E, F>(&mut self, message: &str, mut parse: F) -> ConsoleResult<T>
    where
        E: Display,
        F: FnMut(&str) -> Result<T, E>,
    {
        loop {
            let answer = self.prompt(message)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.say(format!("{} - please try again.", e))?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_prompt_trims_and_detects_eof() {
        let mut c = console("  hello  \n");
        assert_eq!(c.prompt("Say:").unwrap(), "hello");
        assert!(matches!(c.prompt("Again:"), Err(ConsoleError::Closed)));
    }

    #[test]
    fn test_prompt_until_reprompts() {
        let mut c = console("abc\n-1\n42\n");
        let value = c
            .prompt_until("Number:", |s| match s.parse::<u32>() {
                Ok(n) => Ok(n),
                Err(_) => Err(format!("'{}' is not a number", s)),
            })
            .unwrap();
        assert_eq!(value, 42);

        let out = String::from_utf8(c.into_output()).unwrap();
        assert_eq!(out.matches("please try again").count(), 2);
    }

    #[test]
    fn test_prompt_optional() {
        let mut c = console("\n  note \n");
        assert_eq!(c.prompt_optional("Reason:").unwrap(), None);
        assert_eq!(c.prompt_optional("Reason:").unwrap().as_deref(), Some("note"));
    }
}
