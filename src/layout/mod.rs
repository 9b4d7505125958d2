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

//! Layouts for encoding log events into bytes.

use std::fmt;
use std::path::Path;

use crate::record::Metadata;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::TextLayout;

/// A layout that encodes a log event into the bytes handed to appenders.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Encode `payload`, decorated with `metadata` if any.
    fn format(&self, payload: &fmt::Arguments, metadata: Option<&Metadata>) -> Vec<u8>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

// `src/logger/mod.rs` is shown as `mod.rs`
fn file_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}
