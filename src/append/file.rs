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

use std::fs;
use std::fs::OpenOptions;
use std::mem;
use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::append::Append;
use crate::append::DEFAULT_FLUSH_INTERVAL;
use crate::append::flusher::Flusher;
use crate::sink::BufferedSink;
use crate::sink::DEFAULT_BUFFER_SIZE;
use crate::trap::BestEffortTrap;

/// Everything needed to open a [`File`]; kept around to reopen the same path on rotation.
#[derive(Debug, Clone)]
pub(crate) struct FileOptions {
    path: PathBuf,
    buffer_size: NonZeroUsize,
    flush_interval: Duration,
    thread_name: String,
    trap: Arc<dyn Trap>,
}

impl FileOptions {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn trap(&self) -> &Arc<dyn Trap> {
        &self.trap
    }

    pub(crate) fn open(&self) -> Result<File, Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                Error::new(ErrorKind::Open, "failed to open log file")
                    .with_context("path", self.path.display())
                    .with_source(err)
            })?;

        let (stop, stopped) = crossbeam_channel::bounded(0);
        let sink = BufferedSink::with_capacity(self.buffer_size, file);
        let state = Arc::new(Mutex::new(State::Active { sink, stop }));

        let flusher = Flusher::new(
            self.flush_interval,
            stopped,
            periodic_flush(Arc::downgrade(&state), self.trap.clone()),
        );
        let handle = flusher.spawn(self.thread_name.clone())?;

        Ok(File {
            path: self.path.clone(),
            state,
            flusher: Mutex::new(Some(handle)),
            trap: self.trap.clone(),
        })
    }
}

/// A builder to configure and create a [`File`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    options: FileOptions,
}

impl FileBuilder {
    /// Create a new file appender builder for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            options: FileOptions {
                path: path.into(),
                buffer_size: DEFAULT_BUFFER_SIZE,
                flush_interval: DEFAULT_FLUSH_INTERVAL,
                thread_name: "reopenlog-flush".to_string(),
                trap: Arc::new(BestEffortTrap::default()),
            },
        }
    }

    /// Build the [`File`] appender.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Open`] error if the file cannot be created or opened for appending.
    pub fn build(self) -> Result<File, Error> {
        self.options.open()
    }

    /// Set the capacity of the write buffer in bytes.
    ///
    /// Default to 4096.
    #[must_use]
    pub fn buffer_size(mut self, n: NonZeroUsize) -> Self {
        self.options.buffer_size = n;
        self
    }

    /// Set the interval between two periodic flushes.
    ///
    /// Default to 5 minutes. A zero interval disables periodic flushing.
    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.options.flush_interval = interval;
        self
    }

    /// Set the name of the periodic flush thread.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.options.thread_name = name.into();
        self
    }

    /// Set the trap for errors raised by periodic flushes and by dropping the appender.
    ///
    /// Default to [`BestEffortTrap`], which drops them.
    ///
    /// # Examples
    ///
    /// ```
    /// use reopenlog::append::FileBuilder;
    /// use reopenlog::trap::DefaultTrap;
    ///
    /// let builder = FileBuilder::new("app.log");
    /// builder.trap(DefaultTrap::default());
    /// ```
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.options.trap = Arc::from(trap.into());
        self
    }

    pub(crate) fn into_options(self) -> FileOptions {
        self.options
    }
}

/// An appender that buffers records in memory and appends them to a file.
///
/// Every record is written as the given bytes followed by a newline. Buffered records reach the
/// file when the buffer fills up, on every periodic flush, on an explicit flush, and on close.
///
/// # Examples
///
/// ```
/// use reopenlog::Append;
/// use reopenlog::append::FileBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let file = FileBuilder::new(dir.path().join("app.log")).build().unwrap();
/// file.write(b"hello").unwrap();
/// file.close().unwrap();
///
/// let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
/// assert_eq!(content, "hello\n");
/// ```
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    state: Arc<Mutex<State>>,
    flusher: Mutex<Option<JoinHandle<()>>>,
    trap: Arc<dyn Trap>,
}

#[derive(Debug)]
enum State {
    Active {
        sink: BufferedSink<fs::File>,
        // dropped to stop the periodic flusher
        stop: Sender<()>,
    },
    Closed,
}

impl File {
    /// Open the file at `path` with default options.
    ///
    /// See [`FileBuilder`] for customization.
    pub fn open(path: impl Into<PathBuf>) -> Result<File, Error> {
        FileBuilder::new(path).build()
    }

    /// The path this appender writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`close`](Append::close) has been called.
    pub fn is_closed(&self) -> bool {
        matches!(*self.state(), State::Closed)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }
}

impl Append for File {
    fn write(&self, bytes: &[u8]) -> Result<usize, Error> {
        match &mut *self.state() {
            State::Active { sink, .. } => sink.write_line(bytes).map_err(Error::from_io_error),
            State::Closed => Err(Error::closed()),
        }
    }

    fn flush(&self) -> Result<(), Error> {
        match &mut *self.state() {
            State::Active { sink, .. } => sink.flush().map_err(Error::from_io_error),
            State::Closed => Ok(()),
        }
    }

    fn close(&self) -> Result<(), Error> {
        let mut state = self.state();
        let result = match mem::replace(&mut *state, State::Closed) {
            State::Closed => return Ok(()),
            State::Active { mut sink, stop } => {
                // stop the flusher together with marking closed
                drop(stop);
                sink.flush().map_err(|err| {
                    Error::from_io_error(err).with_context("path", self.path.display())
                })
                // the file handle is released with the sink
            }
        };
        drop(state);

        let handle = self.flusher.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                let err = Error::new(ErrorKind::Unexpected, "periodic flusher panicked")
                    .with_context("path", self.path.display());
                self.trap.trap(&err);
            }
        }

        result
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            let err = Error::new(ErrorKind::Io, "failed to close file appender on drop")
                .with_source(err);
            self.trap.trap(&err);
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn periodic_flush(
    state: Weak<Mutex<State>>,
    trap: Arc<dyn Trap>,
) -> impl FnMut() -> ControlFlow<()> + Send + 'static {
    move || {
        let Some(state) = state.upgrade() else {
            return ControlFlow::Break(());
        };

        match &mut *lock(&state) {
            State::Active { sink, .. } => {
                if let Err(err) = sink.flush() {
                    let err = Error::new(ErrorKind::Io, "failed to flush log file periodically")
                        .with_source(err);
                    trap.trap(&err);
                }
                ControlFlow::Continue(())
            }
            State::Closed => ControlFlow::Break(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_records_are_newline_terminated_in_call_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.log");
        let file = FileBuilder::new(&path).build().unwrap();

        assert_eq!(file.write(b"first").unwrap(), 6);
        assert_eq!(file.write(b"").unwrap(), 1);
        assert_eq!(file.write(b"third").unwrap(), 6);
        file.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n\nthird\n");
    }

    #[test]
    fn test_write_is_buffered_until_flush() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("buffered.log");
        let file = FileBuilder::new(&path).build().unwrap();

        file.write(b"pending").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        file.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pending\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("existing.log");
        fs::write(&path, "old\n").unwrap();

        let file = File::open(&path).unwrap();
        file.write(b"new").unwrap();
        file.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no-such-dir").join("app.log");

        let err = File::open(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Open);
        assert!(err.to_string().contains("no-such-dir"));
    }

    #[test]
    fn test_write_after_close_fails_without_io() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("closed.log");
        let file = File::open(&path).unwrap();
        file.write(b"kept").unwrap();
        file.close().unwrap();
        assert!(file.is_closed());

        let err = file.write(b"dropped").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert!(file.flush().is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = File::open(temp_dir.path().join("twice.log")).unwrap();
        file.close().unwrap();
        file.close().unwrap();
        drop(file);
    }

    #[test]
    fn test_close_joins_flusher() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileBuilder::new(temp_dir.path().join("join.log"))
            .flush_interval(Duration::from_millis(1))
            .build()
            .unwrap();
        file.close().unwrap();
        assert!(file.flusher.lock().unwrap().is_none());
    }

    #[test]
    fn test_large_record_bypasses_buffer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("large.log");
        let file = FileBuilder::new(&path)
            .buffer_size(NonZeroUsize::new(8).unwrap())
            .build()
            .unwrap();

        file.write(b"0123456789").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0123456789\n");
        file.close().unwrap();
    }

    #[test]
    fn test_periodic_flush_makes_writes_visible() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("periodic.log");
        let file = FileBuilder::new(&path)
            .flush_interval(Duration::from_millis(20))
            .build()
            .unwrap();

        file.write(b"tick").unwrap();

        let mut content = String::new();
        for _ in 0..100 {
            thread::sleep(Duration::from_millis(10));
            content = fs::read_to_string(&path).unwrap();
            if !content.is_empty() {
                break;
            }
        }
        assert_eq!(content, "tick\n");
        file.close().unwrap();
    }

    #[test]
    fn test_close_concurrent_with_periodic_flush() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..32 {
            let path = temp_dir.path().join(format!("race-{i}.log"));
            let file = FileBuilder::new(&path)
                .flush_interval(Duration::from_micros(50))
                .build()
                .unwrap();
            file.write(b"x").unwrap();
            thread::sleep(Duration::from_micros(i * 10));
            file.close().unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
        }
    }
}
