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
use std::thread::JoinHandle;

use signal_hook::consts::SIGHUP;
use signal_hook::iterator::Handle;
use signal_hook::iterator::Signals;

use crate::Error;
use crate::ErrorKind;
use crate::rotate::RotationHandle;

/// Forwards every `SIGHUP` delivered to the process to a [`RotationHandle`].
///
/// Several appenders may each register their own `SignalRotation`; every one of them sees every
/// signal. Dropping the value unregisters it.
///
/// # Examples
///
/// ```no_run
/// use reopenlog::append::RotatableFileBuilder;
/// use reopenlog::rotate::SignalRotation;
///
/// let file = RotatableFileBuilder::new("/var/log/app.log").build().unwrap();
/// let _sighup = SignalRotation::register(file.rotation_handle()).unwrap();
/// ```
pub struct SignalRotation {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl fmt::Debug for SignalRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRotation")
            .field("closed", &self.handle.is_closed())
            .finish_non_exhaustive()
    }
}

impl SignalRotation {
    /// Start forwarding `SIGHUP` to `rotation`.
    pub fn register(rotation: RotationHandle) -> Result<SignalRotation, Error> {
        let mut signals = Signals::new([SIGHUP]).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to register SIGHUP handler").with_source(err)
        })?;
        let handle = signals.handle();

        let thread = std::thread::Builder::new()
            .name("reopenlog-sighup".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    // the appender is gone; nothing left to rotate
                    if rotation.rotate().is_err() {
                        break;
                    }
                }
            })
            .map_err(|err| {
                handle.close();
                Error::new(ErrorKind::Unexpected, "failed to spawn SIGHUP listener thread")
                    .with_source(err)
            })?;

        Ok(SignalRotation {
            handle,
            thread: Some(thread),
        })
    }

    /// Stop forwarding signals and wait for the listener thread to exit.
    pub fn close(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SignalRotation {
    fn drop(&mut self) {
        self.close();
    }
}
