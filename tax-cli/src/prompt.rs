//! Line-oriented terminal I/O.
//!
//! Generic over the reader and writer so sessions can be driven from
//! scripted input in tests.

use std::io::{self, BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(
        input: R,
        output: W,
    ) -> Self {
        Self { input, output }
    }

    /// Writes `prompt` without a newline and reads one line. Returns `None`
    /// at end of input; the trailing line break is stripped.
    pub fn ask(
        &mut self,
        prompt: &str,
    ) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub fn say(
        &mut self,
        message: &str,
    ) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
