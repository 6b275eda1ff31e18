use std::io::Write;

use crate::bridge::LineSink;

/// Host-side sink: writes each line to a terminal-like writer with a tag.
pub struct ConsoleSink<W: Write> {
    out: W,
    tag: &'static str,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(tag: &'static str) -> Self {
        Self { out: std::io::stdout(), tag }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, tag: &'static str) -> Self {
        Self { out, tag }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LineSink for ConsoleSink<W> {
    fn line(&mut self, line: &str) {
        let _ = writeln!(self.out, "[{}] {}", self.tag, line);
        let _ = self.out.flush();
    }
}
