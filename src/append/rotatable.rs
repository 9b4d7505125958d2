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

use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::select;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::append::Append;
use crate::append::File;
use crate::append::FileBuilder;
use crate::append::file::FileOptions;
use crate::rotate;
use crate::rotate::RotationHandle;
use crate::trap::DefaultTrap;

/// A builder to configure and create a [`RotatableFile`] appender.
#[derive(Debug)]
pub struct RotatableFileBuilder {
    file: FileBuilder,
    thread_name: String,
    rotation_trap: Box<dyn Trap>,
}

impl RotatableFileBuilder {
    /// Create a new rotatable file appender builder for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileBuilder::new(path),
            thread_name: "reopenlog-rotate".to_string(),
            rotation_trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Build the [`RotatableFile`] appender.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Open`] error if the file cannot be created or opened for appending.
    pub fn build(self) -> Result<RotatableFile, Error> {
        let Self {
            file,
            thread_name,
            rotation_trap,
        } = self;
        let options = file.into_options();

        let (stop, stopped) = crossbeam_channel::bounded(0);
        let current = Arc::new(Mutex::new(Current {
            file: options.open()?,
            stop: Some(stop),
        }));

        let (rotation, requests) = rotate::channel();
        let trap = options.trap().clone();

        let listener = Listener {
            current: Arc::downgrade(&current),
            options,
            rotation_trap,
            requests,
            stopped,
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || listener.run())
            .map_err(|err| {
                Error::new(ErrorKind::Unexpected, "failed to spawn rotation listener thread")
                    .with_source(err)
            })?;

        Ok(RotatableFile {
            current,
            rotation,
            listener: Mutex::new(Some(handle)),
            trap,
        })
    }

    /// Set the capacity of the write buffer in bytes.
    ///
    /// Default to 4096.
    #[must_use]
    pub fn buffer_size(mut self, n: NonZeroUsize) -> Self {
        self.file = self.file.buffer_size(n);
        self
    }

    /// Set the interval between two periodic flushes.
    ///
    /// Default to 5 minutes. A zero interval disables periodic flushing.
    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.file = self.file.flush_interval(interval);
        self
    }

    /// Set the name of the rotation listener thread.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the trap for errors raised by periodic flushes and by dropping the appender.
    ///
    /// Default to [`BestEffortTrap`](crate::trap::BestEffortTrap).
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.file = self.file.trap(trap);
        self
    }

    /// Set the trap for errors raised while closing the old file on rotation.
    ///
    /// Records still buffered when such an error occurs are lost with the old file, so the trap
    /// is the only place they are reported.
    ///
    /// Default to [`DefaultTrap`], which prints them to standard error.
    #[must_use]
    pub fn rotation_trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.rotation_trap = trap.into();
        self
    }
}

/// A file appender that reopens its path whenever a rotation is triggered.
///
/// A rotation flushes and closes the current file, opens the same path again, and only then
/// makes the new file visible to writers. Every write lands entirely in either the old or the
/// new file. The appender never renames files: the operator moves the old file away before
/// triggering the rotation, and the reopen creates a fresh file under the original name.
///
/// If the path cannot be reopened during a rotation, the error is printed to standard error and
/// the process aborts. Carrying on without a file would lose every later record silently.
///
/// # Examples
///
/// ```
/// use reopenlog::Append;
/// use reopenlog::append::RotatableFileBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("app.log");
/// let file = RotatableFileBuilder::new(&path).build().unwrap();
///
/// file.write(b"before").unwrap();
/// std::fs::rename(&path, dir.path().join("app.log.1")).unwrap();
/// file.rotation_handle().rotate_and_wait().unwrap();
/// file.write(b"after").unwrap();
/// file.close().unwrap();
///
/// assert_eq!(std::fs::read_to_string(&path).unwrap(), "after\n");
/// ```
#[derive(Debug)]
pub struct RotatableFile {
    current: Arc<Mutex<Current>>,
    rotation: RotationHandle,
    listener: Mutex<Option<JoinHandle<()>>>,
    trap: Arc<dyn Trap>,
}

#[derive(Debug)]
struct Current {
    file: File,
    // dropped to stop the rotation listener; `None` once closed
    stop: Option<Sender<()>>,
}

impl RotatableFile {
    /// Open the file at `path` with default options.
    ///
    /// See [`RotatableFileBuilder`] for customization.
    pub fn open(path: impl Into<PathBuf>) -> Result<RotatableFile, Error> {
        RotatableFileBuilder::new(path).build()
    }

    /// A handle that triggers rotations of this appender.
    pub fn rotation_handle(&self) -> RotationHandle {
        self.rotation.clone()
    }

    /// The path this appender writes to.
    pub fn path(&self) -> PathBuf {
        self.current().file.path().to_path_buf()
    }

    /// Whether [`close`](Append::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.current().stop.is_none()
    }

    fn current(&self) -> MutexGuard<'_, Current> {
        lock(&self.current)
    }
}

impl Append for RotatableFile {
    fn write(&self, bytes: &[u8]) -> Result<usize, Error> {
        self.current().file.write(bytes)
    }

    fn flush(&self) -> Result<(), Error> {
        self.current().file.flush()
    }

    fn close(&self) -> Result<(), Error> {
        let mut current = self.current();
        let result = match current.stop.take() {
            None => Ok(()),
            Some(stop) => {
                drop(stop);
                current.file.close()
            }
        };
        drop(current);

        let handle = self.listener.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                let err = Error::new(ErrorKind::Unexpected, "rotation listener panicked");
                self.trap.trap(&err);
            }
        }

        result
    }
}

impl Drop for RotatableFile {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            let err = Error::new(ErrorKind::Io, "failed to close rotatable file on drop")
                .with_source(err);
            self.trap.trap(&err);
        }
    }
}

fn lock(current: &Mutex<Current>) -> MutexGuard<'_, Current> {
    current.lock().unwrap_or_else(|e| e.into_inner())
}

struct Listener {
    current: Weak<Mutex<Current>>,
    options: FileOptions,
    rotation_trap: Box<dyn Trap>,
    requests: Receiver<rotate::Request>,
    stopped: Receiver<()>,
}

impl Listener {
    fn run(self) {
        loop {
            select! {
                recv(self.requests) -> request => {
                    let Ok(request) = request else {
                        break;
                    };
                    if !self.rotate() {
                        break;
                    }
                    if let Some(ack) = request.ack {
                        let _ = ack.send(());
                    }
                }
                recv(self.stopped) -> _ => break,
            }
        }
    }

    /// Swap in a freshly opened file. Returns `false` once the appender is closed.
    fn rotate(&self) -> bool {
        let Some(current) = self.current.upgrade() else {
            return false;
        };
        let mut current = lock(&current);
        if current.stop.is_none() {
            return false;
        }

        if let Err(err) = current.file.close() {
            let err = Error::new(ErrorKind::Io, "failed to close log file on rotation")
                .with_context("path", self.options.path().display())
                .with_source(err);
            self.rotation_trap.trap(&err);
        }

        match self.options.open() {
            Ok(file) => {
                current.file = file;
                true
            }
            Err(err) => fatal(self.options.path(), err),
        }
    }
}

fn fatal(path: &Path, err: Error) -> ! {
    let err = Error::new(ErrorKind::RotationOpen, "failed to reopen log file on rotation")
        .with_context("path", path.display())
        .with_source(err);
    DefaultTrap::default().trap(&err);
    std::process::abort()
}
