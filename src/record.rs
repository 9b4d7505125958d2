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

//! Log levels and the metadata captured alongside a log event.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

use crate::Error;
use crate::ErrorKind;

/// The severity of a log event, from the least to the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Very verbose tracing.
    Trace,
    /// Debugging information.
    Debug,
    /// Informational messages.
    Info,
    /// Potential problems.
    Warn,
    /// Errors the program can recover from.
    Error,
    /// Errors the program cannot recover from.
    Fatal,
}

impl Level {
    /// All levels, from the least to the most severe.
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// The upper-case name of the level.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// All levels at least as severe as this one.
    pub fn and_above(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |level| *level >= self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::new(ErrorKind::Unexpected, "unknown log level").with_context("level", s)
            })
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => log::LevelFilter::Trace,
            Level::Debug => log::LevelFilter::Debug,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error | Level::Fatal => log::LevelFilter::Error,
        }
    }
}

/// What is known about a log event besides its payload.
#[derive(Debug, Clone)]
pub struct Metadata<'a> {
    level: Level,
    time: Timestamp,
    logger_name: &'a str,
    file: Option<&'a str>,
    line: Option<u32>,
}

impl<'a> Metadata<'a> {
    /// Create metadata for an event emitted now.
    pub fn new(level: Level, logger_name: &'a str) -> Self {
        Self {
            level,
            time: Timestamp::now(),
            logger_name,
            file: None,
            line: None,
        }
    }

    /// Set the source location of the event.
    #[must_use]
    pub fn source(mut self, file: Option<&'a str>, line: Option<u32>) -> Self {
        self.file = file;
        self.line = line;
        self
    }

    /// Set the time of the event.
    #[must_use]
    pub fn time(mut self, time: Timestamp) -> Self {
        self.time = time;
        self
    }

    /// The level of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// When the event was emitted.
    pub fn timestamp(&self) -> Timestamp {
        self.time
    }

    /// The name of the logger that emitted the event.
    pub fn logger_name(&self) -> &'a str {
        self.logger_name
    }

    /// The source file that emitted the event, if known.
    pub fn file(&self) -> Option<&'a str> {
        self.file
    }

    /// The source line that emitted the event, if known.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_and_names() {
        assert!(Level::Fatal > Level::Error);
        assert!(Level::Trace < Level::Debug);
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert_eq!(
            Level::Warn.and_above().collect::<Vec<_>>(),
            vec![Level::Warn, Level::Error, Level::Fatal]
        );
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("FATAL".parse::<Level>().unwrap(), Level::Fatal);
        assert!("verbose".parse::<Level>().is_err());
    }
}
