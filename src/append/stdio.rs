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

use std::io::Write;

use crate::Error;
use crate::append::Append;

/// An appender that prints records to standard output.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Stdout {}

impl Append for Stdout {
    fn write(&self, bytes: &[u8]) -> Result<usize, Error> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes).map_err(Error::from_io_error)?;
        stdout.write_all(b"\n").map_err(Error::from_io_error)?;
        Ok(bytes.len() + 1)
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)
    }
}

/// An appender that prints records to standard error.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Stderr {}

impl Append for Stderr {
    fn write(&self, bytes: &[u8]) -> Result<usize, Error> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(bytes).map_err(Error::from_io_error)?;
        stderr.write_all(b"\n").map_err(Error::from_io_error)?;
        Ok(bytes.len() + 1)
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr().flush().map_err(Error::from_io_error)
    }
}
