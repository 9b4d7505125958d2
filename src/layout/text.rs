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

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::layout::Layout;
use crate::record::Metadata;

/// A layout that renders events as a single line of plain text.
///
/// Output format:
///
/// ```text
/// [ERROR] 2024-08-11T22:44:57.172105+08:00 app main.rs(51) Hello error!
/// [WARN] 2024-08-11T22:44:57.172219+08:00 app main.rs(52) Hello warn!
/// ```
///
/// Without metadata only the payload is written. Source files are shortened to their file name.
///
/// # Examples
///
/// ```
/// use reopenlog::layout::TextLayout;
///
/// let layout = TextLayout::default();
/// ```
#[derive(Debug, Clone)]
pub struct TextLayout {
    timezone: TimeZone,
    timestamp_format: Option<fn(Timestamp, &TimeZone) -> String>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            timezone: TimeZone::system(),
            timestamp_format: None,
        }
    }
}

impl TextLayout {
    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use reopenlog::layout::TextLayout;
    ///
    /// let layout = TextLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// Set a user-defined timestamp format function.
    ///
    /// Default to formatting the timestamp with offset as ISO 8601.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::Timestamp;
    /// use jiff::tz::TimeZone;
    /// use reopenlog::layout::TextLayout;
    ///
    /// let layout = TextLayout::default()
    ///     .timestamp_format(|ts, tz| ts.to_zoned(tz.clone()).strftime("%F %T").to_string());
    /// ```
    pub fn timestamp_format(mut self, format: fn(Timestamp, &TimeZone) -> String) -> Self {
        self.timestamp_format = Some(format);
        self
    }
}

fn default_timestamp_format(ts: Timestamp, tz: &TimeZone) -> String {
    let offset = tz.to_offset(ts);
    format!("{:.6}", ts.display_with_offset(offset))
}

impl Layout for TextLayout {
    fn format(&self, payload: &fmt::Arguments, metadata: Option<&Metadata>) -> Vec<u8> {
        let Some(metadata) = metadata else {
            return payload.to_string().into_bytes();
        };

        let ts = metadata.timestamp();
        let time = match self.timestamp_format {
            Some(format) => format(ts, &self.timezone),
            None => default_timestamp_format(ts, &self.timezone),
        };

        let level = metadata.level();
        let name = metadata.logger_name();
        let file = metadata.file().map(super::file_name).unwrap_or_default();
        let line = metadata.line().unwrap_or_default();

        format!("[{level}] {time} {name} {file}({line}) {payload}").into_bytes()
    }
}
