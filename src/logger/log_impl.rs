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

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::Append;
use crate::Error;
use crate::ErrorKind;
use crate::Layout;
use crate::Trap;
use crate::record::Level;
use crate::record::Metadata;

/// A logger that encodes events and writes them to the appenders enabled for their level.
///
/// Levels without appenders are disabled and cost nothing beyond the lookup.
#[derive(Debug)]
pub struct Logger {
    name: String,
    appends: [Vec<Arc<dyn Append>>; 6],
    layout: Box<dyn Layout>,
    metadata: bool,
    trap: Box<dyn Trap>,
}

impl Logger {
    pub(super) fn new(
        name: String,
        appends: [Vec<Arc<dyn Append>>; 6],
        layout: Box<dyn Layout>,
        metadata: bool,
        trap: Box<dyn Trap>,
    ) -> Self {
        Self {
            name,
            appends,
            layout,
            metadata,
            trap,
        }
    }

    /// The name written into every event's metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any appender receives events of `level`.
    pub fn enabled(&self, level: Level) -> bool {
        !self.appends[level as usize].is_empty()
    }

    /// Log an event at `level`, recording the caller as its source location.
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments) {
        let location = Location::caller();
        self.dispatch(level, &args, Some(location.file()), Some(location.line()));
    }

    /// Log an event at [`Level::Trace`].
    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments) {
        self.log(Level::Trace, args)
    }

    /// Log an event at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }

    /// Log an event at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args)
    }

    /// Log an event at [`Level::Warn`].
    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args)
    }

    /// Log an event at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args)
    }

    /// Log an event at [`Level::Fatal`], then [close](Self::close) every appender and exit the
    /// process with status 1.
    ///
    /// Use [`log`](Self::log) with [`Level::Fatal`] to record a fatal event without exiting.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments) -> ! {
        self.log(Level::Fatal, args);
        self.close();
        std::process::exit(1)
    }

    /// Flush every appender.
    pub fn flush(&self) {
        for append in self.distinct_appends() {
            if let Err(err) = append.flush() {
                let err = Error::new(ErrorKind::Io, "failed to flush appender").with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    /// Close every appender once, even if it serves several levels.
    ///
    /// Failures are handed to the trap; the remaining appenders are still closed.
    pub fn close(&self) {
        for append in self.distinct_appends() {
            if let Err(err) = append.close() {
                let err = Error::new(ErrorKind::Io, "failed to close appender").with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    /// Install this logger as the global logger of the `log` crate.
    ///
    /// The `log` crate's max level is set to the least severe enabled level. Events logged
    /// through the `log` macros carry their source location but use this logger's name.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = Level::ALL
            .into_iter()
            .find(|level| self.enabled(*level))
            .map(log::LevelFilter::from)
            .unwrap_or(log::LevelFilter::Off);

        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }

    fn dispatch(&self, level: Level, args: &fmt::Arguments, file: Option<&str>, line: Option<u32>) {
        let appends = &self.appends[level as usize];
        if appends.is_empty() {
            return;
        }

        let bytes = if self.metadata {
            let metadata = Metadata::new(level, &self.name).source(file, line);
            self.layout.format(args, Some(&metadata))
        } else {
            self.layout.format(args, None)
        };

        for append in appends {
            if let Err(err) = append.write(&bytes) {
                let err = Error::new(ErrorKind::Io, "failed to append record")
                    .with_context("level", level)
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    fn distinct_appends(&self) -> Vec<&Arc<dyn Append>> {
        let mut distinct: Vec<&Arc<dyn Append>> = vec![];
        for append in self.appends.iter().flatten() {
            let seen = distinct
                .iter()
                .any(|known| Arc::as_ptr(known).cast::<()>() == Arc::as_ptr(append).cast::<()>());
            if !seen {
                distinct.push(append);
            }
        }
        distinct
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        self.dispatch(
            record.level().into(),
            record.args(),
            record.file(),
            record.line(),
        );
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}
