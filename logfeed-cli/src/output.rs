//! Text / JSON rendering of command payloads.
//!
//! Handlers build a payload and hand it to [`OutputWriter`]; they never
//! branch on `--output` themselves.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Payload that can be printed for humans as well as serialized.
pub trait Render: Serialize {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;
}

/// Prints payloads in the format chosen with `--output`.
#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write to a locked stdout.
    pub fn render<T: Render>(&self, payload: &T) -> Result<(), CliError> {
        self.render_to(payload, &mut io::stdout().lock())
    }

    /// JSON output is one pretty-printed document followed by a newline.
    pub fn render_to<T: Render>(&self, payload: &T, w: &mut dyn Write) -> Result<(), CliError> {
        if self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut *w, payload)?;
            writeln!(w)?;
        } else {
            payload.render_text(w)?;
        }
        w.flush()?;
        Ok(())
    }
}
