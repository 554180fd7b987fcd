//! Line-based prompting with retry loops

use asciitab_core::Result;
use std::fmt::Display;
use std::io::{BufRead, Write};

/// Reads answers from `input` and writes prompts and messages to `output`
pub struct Prompter<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Prompter<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Print a message followed by a newline
    pub fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    /// Print `question` and read one line without its line ending.
    /// Returns `None` at end of input.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    /// Ask until `parse` accepts the answer, printing each rejection.
    /// Returns `None` at end of input.
    pub fn ask_until<T, F>(&mut self, question: &str, mut parse: F) -> Result<Option<T>>
    where
        F: FnMut(&str) -> Result<T>,
    {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => self.say(format!("Invalid input: {}", rejection(&e)))?,
            }
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> O {
        self.output
    }
}

/// Message for a rejected answer, without the "invalid input" prefix the
/// error's own Display carries
fn rejection(error: &asciitab_core::Error) -> String {
    match error {
        asciitab_core::Error::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}
