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

//! Triggers that ask a [`RotatableFile`](crate::append::RotatableFile) to reopen its file.
//!
//! Every rotatable appender owns its own trigger channel. Event sources such as signal handlers,
//! admin endpoints or timers hold a [`RotationHandle`] and call [`RotationHandle::rotate`].
//!
//! Rotation only reopens the path. Moving the old file away is left to the operator, usually
//! logrotate-style tooling that renames the file and then sends the trigger.

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;

#[cfg(all(unix, feature = "signal"))]
mod signal;

#[cfg(all(unix, feature = "signal"))]
pub use self::signal::SignalRotation;

/// A request to rotate, optionally acknowledged once the new file is in place.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) ack: Option<Sender<()>>,
}

pub(crate) fn channel() -> (RotationHandle, Receiver<Request>) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (RotationHandle { sender }, receiver)
}

/// A cloneable handle that triggers rotations of one appender.
#[derive(Debug, Clone)]
pub struct RotationHandle {
    sender: Sender<Request>,
}

impl RotationHandle {
    /// Ask the appender to reopen its file and return immediately.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Closed`](crate::ErrorKind::Closed) error if the appender has been
    /// closed.
    pub fn rotate(&self) -> Result<(), Error> {
        self.sender
            .send(Request { ack: None })
            .map_err(|_| Error::closed())
    }

    /// Ask the appender to reopen its file and wait until writers see the new file.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Closed`](crate::ErrorKind::Closed) error if the appender has been
    /// closed before the rotation happened.
    pub fn rotate_and_wait(&self) -> Result<(), Error> {
        let (ack, acked) = crossbeam_channel::bounded(1);
        self.sender
            .send(Request { ack: Some(ack) })
            .map_err(|_| Error::closed())?;
        acked.recv().map_err(|_| Error::closed())
    }
}
