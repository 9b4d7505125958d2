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

//! Reopenlog is a buffered file appender that cooperates with external log rotation.
//!
//! # Overview
//!
//! Records written to a [`File`](append::File) appender are kept in an in-memory buffer and
//! reach the file when the buffer fills up, on a periodic flush, or on close. A
//! [`RotatableFile`](append::RotatableFile) additionally reopens its path whenever a rotation is
//! triggered, so that logrotate-style tooling can rename the file and ask the process to start a
//! fresh one.
//!
//! Any number of threads may write concurrently. Each write is one record, stored as the given
//! bytes followed by a newline.
//!
//! # Examples
//!
//! Write through a rotatable appender and rotate it:
//!
//! ```
//! use reopenlog::Append;
//! use reopenlog::append::RotatableFileBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("app.log");
//!
//! let file = RotatableFileBuilder::new(&path).build().unwrap();
//! file.write(b"first").unwrap();
//!
//! std::fs::rename(&path, dir.path().join("app.log.1")).unwrap();
//! file.rotation_handle().rotate_and_wait().unwrap();
//!
//! file.write(b"second").unwrap();
//! file.close().unwrap();
//! ```
//!
//! Dispatch leveled events to appenders:
//!
//! ```
//! use reopenlog::append;
//! use reopenlog::record::Level;
//!
//! let logger = reopenlog::builder("app")
//!     .level(Level::Info)
//!     .append(append::Stderr::default())
//!     .build();
//!
//! logger.warn(format_args!("disk usage at {}%", 91));
//! logger.close();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod layout;
pub mod record;
pub mod rotate;
pub mod sink;
pub mod trap;

pub use append::Append;
pub use layout::Layout;
pub use trap::Trap;

mod error;
pub use error::Error;
pub use error::ErrorKind;

mod logger;
pub use logger::*;
