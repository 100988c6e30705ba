//! `std::io` view of a [`SystemBuffer`].
//!
//! Reads advance a cursor from the start of the stream; writes always append.

use super::SystemBuffer;
use crate::domain::value_objects::Address;
use crate::errors::BufferError;
use std::io;
use std::sync::Arc;

/// Cursor-based reader and appending writer over a shared buffer.
#[derive(Debug, Clone)]
pub struct BufferStream {
    buffer: Arc<SystemBuffer>,
    cursor: u64,
}

impl BufferStream {
    /// Opens a stream positioned at the start of `buffer`.
    #[must_use]
    pub fn new(buffer: Arc<SystemBuffer>) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Address of the contract that owns the buffer.
    #[must_use]
    pub fn contract_address(&self) -> Address {
        self.buffer.address()
    }

    /// Bytes consumed by reads so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Frees the underlying buffer and rewinds the cursor.
    ///
    /// # Errors
    ///
    /// Whatever [`SystemBuffer::close`] reports.
    pub fn close(&mut self) -> Result<(), BufferError> {
        self.buffer.close()?;
        self.cursor = 0;
        Ok(())
    }
}

fn to_io(err: BufferError) -> io::Error {
    io::Error::other(err)
}

impl io::Read for BufferStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length = self.buffer.length();
        if self.cursor >= length || buf.is_empty() {
            return Ok(0);
        }
        let size = (length - self.cursor).min(buf.len() as u64);
        let data = self.buffer.read(self.cursor, size).map_err(to_io)?;
        buf[..data.len()].copy_from_slice(&data);
        self.cursor += data.len() as u64;
        Ok(data.len())
    }
}

impl io::Write for BufferStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.buffer.write(buf).map_err(to_io)?;
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
