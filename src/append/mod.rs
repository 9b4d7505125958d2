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

//! Appenders that accept encoded log events.

use std::fmt;

use crate::Error;

mod file;
mod flusher;
mod rotatable;
mod stdio;

pub use self::file::File;
pub use self::file::FileBuilder;
pub use self::rotatable::RotatableFile;
pub use self::rotatable::RotatableFileBuilder;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;

/// The default interval between two periodic flushes of a file appender.
pub const DEFAULT_FLUSH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// An appender that accepts encoded log events.
///
/// Each call to [`write`](Append::write) is one record. Dispatch code holds appenders as
/// `Arc<dyn Append>` and does not know whether the target is rotatable.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Write one encoded record.
    ///
    /// Returns the number of bytes accepted, including any record terminator the appender adds.
    fn write(&self, bytes: &[u8]) -> Result<usize, Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Flush and release the target. Later writes fail.
    ///
    /// Default to [`flush`](Append::flush).
    fn close(&self) -> Result<(), Error> {
        self.flush()
    }
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
