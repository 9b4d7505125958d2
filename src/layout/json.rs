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

use jiff::TimestampDisplayWithOffset;
use jiff::tz::TimeZone;
use serde::Serialize;

use crate::layout::Layout;
use crate::record::Metadata;

/// A layout that renders every event as one JSON object.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"ERROR","logger":"app","file":"main.rs","line":51,"message":"Hello error!"}
/// {"timestamp":"2024-08-11T22:44:57.172187+08:00","level":"WARN","logger":"app","file":"main.rs","line":52,"message":"Hello warn!"}
/// ```
///
/// Without metadata only the message is written: `{"message":"Hello error!"}`. Source files are
/// shortened to their file name.
///
/// # Examples
///
/// ```
/// use reopenlog::layout::JsonLayout;
///
/// let layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use reopenlog::layout::JsonLayout;
    ///
    /// let layout = JsonLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

#[derive(Debug, Serialize)]
struct RecordLine<'a> {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    timestamp: Option<TimestampDisplayWithOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logger: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    message: &'a str,
}

fn serialize_timestamp<S>(
    timestamp: &Option<TimestampDisplayWithOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match timestamp {
        Some(timestamp) => serializer.collect_str(&format_args!("{timestamp:.6}")),
        None => serializer.serialize_none(),
    }
}

impl Layout for JsonLayout {
    fn format(&self, payload: &fmt::Arguments, metadata: Option<&Metadata>) -> Vec<u8> {
        let message = payload.to_string();

        let record_line = match metadata {
            None => RecordLine {
                timestamp: None,
                level: None,
                logger: None,
                file: None,
                line: None,
                message: &message,
            },
            Some(metadata) => {
                let ts = metadata.timestamp();
                let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
                let offset = tz.to_offset(ts);

                RecordLine {
                    timestamp: Some(ts.display_with_offset(offset)),
                    level: Some(metadata.level().name()),
                    logger: Some(metadata.logger_name()),
                    file: metadata.file().map(super::file_name),
                    line: metadata.line(),
                    message: &message,
                }
            }
        };

        // SAFETY: RecordLine only holds strings and integers, which always serialize.
        serde_json::to_vec(&record_line).unwrap()
    }
}
