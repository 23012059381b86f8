use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reads one JSON message per line.
pub struct SyncReader<I: Read> {
    inner: BufReader<I>,
}
impl<I: Read> SyncReader<I> {
    // Creates a new sync reader with the given input stream.
    pub fn new(input: I) -> Self {
        Self {
            inner: BufReader::new(input),
        }
    }

    /// Reads a message, skipping blank lines. Returns `None` at the end of the
    /// input.
    pub fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, EndpointError> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            if self.inner.read_line(&mut buffer)? == 0 {
                return Ok(None);
            }
            if !buffer.trim().is_empty() {
                return Ok(Some(serde_json::from_str(buffer.trim())?));
            }
        }
    }
}

/// Writes one JSON message per line.
pub struct SyncWriter<O: Write> {
    inner: BufWriter<O>,
}
impl<O: Write> SyncWriter<O> {
    // Creates a new sync writer with the given output stream.
    pub fn new(output: O) -> Self {
        Self {
            inner: BufWriter::new(output),
        }
    }

    /// Sends a message.
    pub fn send_message<T: Serialize>(&mut self, message: &T) -> Result<(), EndpointError> {
        serde_json::to_writer(&mut self.inner, message)?;
        writeln!(self.inner)?;
        self.inner.flush()?;
        Ok(())
    }
}
