use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Outcome of one prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input<T> {
    Value(T),
    /// The line could not be parsed; it has already been discarded.
    Invalid(String),
    /// End of input.
    Closed,
}

/// Line-oriented terminal I/O. Generic so tests can drive it from memory.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Writes `prompt` without a newline and reads one line, minus its terminator.
    pub fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    pub fn prompt_parse<T: FromStr>(&mut self, prompt: &str) -> io::Result<Input<T>> {
        let Some(line) = self.prompt_line(prompt)? else {
            return Ok(Input::Closed);
        };
        Ok(match line.trim().parse::<T>() {
            Ok(value) => Input::Value(value),
            Err(_) => Input::Invalid(line),
        })
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
