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

use std::ops::ControlFlow;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::select;

use crate::Error;
use crate::ErrorKind;

/// A background task that runs `tick` every `interval` until stopped.
///
/// The task stops when `tick` breaks, or when every sender of `stopped` has been dropped.
pub(crate) struct Flusher<F> {
    interval: Duration,
    stopped: Receiver<()>,
    tick: F,
}

impl<F> Flusher<F>
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    pub(crate) fn new(interval: Duration, stopped: Receiver<()>, tick: F) -> Self {
        Self {
            interval,
            stopped,
            tick,
        }
    }

    fn run(self) {
        let Self {
            interval,
            stopped,
            mut tick,
        } = self;

        // a zero interval disables periodic flushing
        let ticker = if interval.is_zero() {
            crossbeam_channel::never()
        } else {
            crossbeam_channel::tick(interval)
        };

        loop {
            select! {
                recv(ticker) -> _ => {
                    if tick().is_break() {
                        break;
                    }
                }
                recv(stopped) -> _ => break,
            }
        }
    }

    pub(crate) fn spawn(self, name: String) -> Result<JoinHandle<()>, Error> {
        std::thread::Builder::new()
            .name(name)
            .spawn(move || self.run())
            .map_err(|err| {
                Error::new(ErrorKind::Unexpected, "failed to spawn flusher thread").with_source(err)
            })
    }
}
