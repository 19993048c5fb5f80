//! Outgoing message sink.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::debug;

/// Destination for produced messages.
pub trait MessageSender {
    fn send_message(&mut self, text: &str) -> Result<()>;
}

/// Writes each message to an output stream, separated by blank lines.
#[derive(Debug)]
pub struct WriterSender<W> {
    out: W,
    sent: usize,
}

impl WriterSender<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriterSender<W> {
    pub fn new(out: W) -> Self {
        Self { out, sent: 0 }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MessageSender for WriterSender<W> {
    fn send_message(&mut self, text: &str) -> Result<()> {
        if self.sent > 0 {
            writeln!(self.out).context("write message separator")?;
        }
        writeln!(self.out, "{text}").context("write message")?;
        self.out.flush().context("flush message")?;
        self.sent += 1;
        debug!(sent = self.sent, "message sent");
        Ok(())
    }
}
