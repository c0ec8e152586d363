//! JSON lines adapter.

use std::io::Write;

use super::{Request, SutAdapter, SutError};

/// Adapter that writes every request as one JSON object per line.
///
/// Useful for replaying a generated workload with an external client.
#[derive(Debug)]
pub struct JsonLinesAdapter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesAdapter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of requests written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SutAdapter for JsonLinesAdapter<W> {
    fn send_requests(&mut self, batch: Vec<Request>) -> Result<(), SutError> {
        for request in &batch {
            serde_json::to_writer(&mut self.writer, request)?;
            self.writer.write_all(b"\n")?;
            self.written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json-lines"
    }
}
