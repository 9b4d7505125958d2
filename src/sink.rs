// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::io::Write;
use std::num::NonZeroUsize;

/// The default capacity of a [`BufferedSink`] in bytes.
pub const DEFAULT_BUFFER_SIZE: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// An in-memory write buffer in front of a writable resource.
///
/// Bytes handed to the sink are either held in the buffer or already written to the inner
/// resource. A failed flush keeps the unwritten bytes buffered so that a later flush can retry
/// them.
///
/// The sink does no locking; its owner is expected to serialize access. Dropping a sink does
/// not flush it.
#[derive(Debug)]
pub struct BufferedSink<W: Write> {
    inner: W,
    buf: Vec<u8>,
    capacity: usize,
}

impl<W: Write> BufferedSink<W> {
    /// Create a sink with the [default capacity](DEFAULT_BUFFER_SIZE).
    pub fn new(inner: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Create a sink that holds up to `capacity` bytes before writing through.
    pub fn with_capacity(capacity: NonZeroUsize, inner: W) -> Self {
        let capacity = capacity.get();
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `bytes` to the sink.
    ///
    /// If the bytes do not fit into the remaining buffer space, the buffered bytes are written
    /// to the inner resource first. A payload larger than the whole capacity bypasses the buffer.
    ///
    /// Returns the number of accepted bytes, which is always `bytes.len()` on success.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.buf.len() + bytes.len() > self.capacity {
            self.flush_buf()?;
        }

        if bytes.len() > self.capacity {
            self.inner.write_all(bytes)?;
        } else {
            self.buf.extend_from_slice(bytes);
        }

        Ok(bytes.len())
    }

    /// Append `line` followed by a newline, as one unit.
    ///
    /// Behaves like [`write`](Self::write) on the terminated line without building it first:
    /// either both parts are buffered or both are written through, so an implicit flush error
    /// never leaves a line without its terminator in the buffer.
    ///
    /// Returns `line.len() + 1` on success.
    pub fn write_line(&mut self, line: &[u8]) -> io::Result<usize> {
        let len = line.len() + 1;
        if self.buf.len() + len > self.capacity {
            self.flush_buf()?;
        }

        if len > self.capacity {
            self.inner.write_all(line)?;
            self.inner.write_all(b"\n")?;
        } else {
            self.buf.extend_from_slice(line);
            self.buf.push(b'\n');
        }

        Ok(len)
    }

    /// Write all buffered bytes to the inner resource and flush it.
    ///
    /// Flushing an empty sink only flushes the inner resource, so calling this repeatedly is
    /// harmless.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.inner.flush()
    }

    /// The bytes currently held in the buffer.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// The configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A reference to the inner resource.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush the sink and return the inner resource.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        let mut written = 0;
        let mut ret = Ok(());

        while written < self.buf.len() {
            match self.inner.write(&self.buf[written..]) {
                Ok(0) => {
                    ret = Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write the buffered data",
                    ));
                    break;
                }
                Ok(n) => written += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    ret = Err(err);
                    break;
                }
            }
        }

        // keep whatever the inner resource did not take
        self.buf.drain(..written);
        ret
    }
}

impl<W: Write> Write for BufferedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        BufferedSink::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        BufferedSink::flush(self)
    }
}
