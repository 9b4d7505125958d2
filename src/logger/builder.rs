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

use std::sync::Arc;

use crate::Append;
use crate::Layout;
use crate::Logger;
use crate::Trap;
use crate::layout::TextLayout;
use crate::record::Level;
use crate::trap::DefaultTrap;

/// Create a new [`LoggerBuilder`] for a logger called `name`.
///
/// # Examples
///
/// ```
/// use reopenlog::append;
/// use reopenlog::record::Level;
///
/// let logger = reopenlog::builder("app")
///     .level(Level::Info)
///     .append(append::Stdout::default())
///     .build();
///
/// logger.info(format_args!("Hello info!"));
/// logger.debug(format_args!("This is dropped."));
/// ```
pub fn builder(name: impl Into<String>) -> LoggerBuilder {
    LoggerBuilder {
        name: name.into(),
        level: Level::Trace,
        appends: vec![],
        level_appends: vec![],
        layout: Box::new(TextLayout::default()),
        metadata: true,
        trap: Box::new(DefaultTrap::default()),
    }
}

/// A builder for configuring a [`Logger`].
#[must_use = "call `build` to construct a logger instance"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: Level,
    appends: Vec<Arc<dyn Append>>,
    level_appends: Vec<(Level, Arc<dyn Append>)>,
    layout: Box<dyn Layout>,
    metadata: bool,
    trap: Box<dyn Trap>,
}

impl LoggerBuilder {
    /// Set the least severe level that appenders added with [`append`](Self::append) receive.
    ///
    /// Default to [`Level::Trace`].
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Add an appender for every level at least as severe as the configured [`level`](Self::level).
    pub fn append(self, append: impl Into<Box<dyn Append>>) -> Self {
        self.append_shared(Arc::from(append.into()))
    }

    /// Add an appender shared with other loggers or kept by the caller, for every level at least
    /// as severe as the configured [`level`](Self::level).
    ///
    /// [`Logger::close`] closes a shared appender once, however many levels it serves.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use reopenlog::Append;
    /// use reopenlog::append;
    ///
    /// let stderr: Arc<dyn Append> = Arc::new(append::Stderr::default());
    /// let first = reopenlog::builder("first").append_shared(stderr.clone()).build();
    /// let second = reopenlog::builder("second").append_shared(stderr).build();
    /// ```
    pub fn append_shared(mut self, append: Arc<dyn Append>) -> Self {
        self.appends.push(append);
        self
    }

    /// Add an appender that receives events of exactly `level`.
    ///
    /// # Examples
    ///
    /// ```
    /// use reopenlog::append;
    /// use reopenlog::record::Level;
    ///
    /// let logger = reopenlog::builder("app")
    ///     .level(Level::Fatal)
    ///     .append(append::Stdout::default())
    ///     .append_with_level(Level::Error, append::Stderr::default())
    ///     .build();
    ///
    /// assert!(logger.enabled(Level::Error));
    /// assert!(!logger.enabled(Level::Warn));
    /// ```
    pub fn append_with_level(self, level: Level, append: impl Into<Box<dyn Append>>) -> Self {
        self.append_shared_with_level(level, Arc::from(append.into()))
    }

    /// Add a shared appender that receives events of exactly `level`.
    pub fn append_shared_with_level(mut self, level: Level, append: Arc<dyn Append>) -> Self {
        self.level_appends.push((level, append));
        self
    }

    /// Set the layout that encodes events.
    ///
    /// Default to [`TextLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Write only the payload of every event, without level, time, name or source location.
    pub fn disable_metadata(mut self) -> Self {
        self.metadata = false;
        self
    }

    /// Set the trap for errors raised while appending, flushing or closing.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the [`Logger`].
    pub fn build(self) -> Logger {
        let Self {
            name,
            level,
            appends,
            level_appends,
            layout,
            metadata,
            trap,
        } = self;

        let mut table: [Vec<Arc<dyn Append>>; 6] = Default::default();
        for level in level.and_above() {
            table[level as usize].extend(appends.iter().cloned());
        }
        for (level, append) in level_appends {
            table[level as usize].push(append);
        }

        Logger::new(name, table, layout, metadata, trap)
    }
}
