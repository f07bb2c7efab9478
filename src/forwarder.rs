// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Write forwarding that tolerates sink failures.
//!
//! When the reader pushes decoded blocks into a caller's sink, a failing sink
//! must not cost any decoded bytes: those bytes have already been read from
//! the source and verified, and cannot be read again. The forwarder passes
//! bytes through until the sink first fails and from then on keeps everything
//! it is given, so the caller can deliver it later.

use std::io::{self, Write};
use std::mem;

use log::debug;

/// Mode of a [`PartialWriteForwarder`].
#[derive(Debug)]
enum ForwardMode {
    /// Bytes go straight to the sink.
    Forwarding,
    /// The sink failed; bytes are kept in memory.
    Buffering {
        /// Bytes the sink has not accepted, in order.
        buffer: Vec<u8>,
        /// The sink's error, until observed through `take_error`.
        error: Option<io::Error>,
    },
}

/// Forwards writes to a sink, switching to in-memory buffering when the sink fails.
///
/// The forwarder itself never fails: [`Write::write`] always reports the full
/// length as written. The sink's first error is kept for the caller and
/// handed out once by [`take_error`](Self::take_error).
#[derive(Debug)]
pub struct PartialWriteForwarder<W: Write> {
    /// Destination sink.
    sink: W,

    /// Current mode.
    mode: ForwardMode,

    /// Bytes the sink has accepted.
    written: u64,
}

impl<W: Write> PartialWriteForwarder<W> {
    /// Creates a new forwarder in forwarding mode.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            mode: ForwardMode::Forwarding,
            written: 0,
        }
    }

    /// Number of bytes the sink has accepted.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Whether the sink has failed and bytes are being buffered.
    pub fn is_buffering(&self) -> bool {
        matches!(self.mode, ForwardMode::Buffering { .. })
    }

    /// Bytes held back since the sink failed.
    pub fn buffered(&self) -> &[u8] {
        match &self.mode {
            ForwardMode::Forwarding => &[],
            ForwardMode::Buffering { buffer, .. } => buffer,
        }
    }

    /// Returns the sink's error the first time it is called after a failure.
    pub fn take_error(&mut self) -> Option<io::Error> {
        match &mut self.mode {
            ForwardMode::Forwarding => None,
            ForwardMode::Buffering { error, .. } => error.take(),
        }
    }

    /// Forwards `data` to the sink, or buffers it once the sink has failed.
    pub fn forward(&mut self, data: &[u8]) {
        let rest = match self.mode {
            ForwardMode::Forwarding => self.pass_through(data),
            ForwardMode::Buffering { .. } => data,
        };

        if let ForwardMode::Buffering { buffer, .. } = &mut self.mode {
            buffer.extend_from_slice(rest);
        }
    }

    /// Writes as much of `data` to the sink as it accepts.
    ///
    /// On failure switches to buffering mode and returns the part of `data`
    /// the sink did not take.
    fn pass_through<'d>(&mut self, mut data: &'d [u8]) -> &'d [u8] {
        while !data.is_empty() {
            match self.sink.write(data) {
                Ok(0) => {
                    self.start_buffering(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no bytes",
                    ));
                    break;
                }
                Ok(n) => {
                    self.written += n as u64;
                    data = &data[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.start_buffering(e);
                    break;
                }
            }
        }
        data
    }

    fn start_buffering(&mut self, error: io::Error) {
        debug!(
            "Sink failed after {} bytes, buffering further output: {}",
            self.written, error
        );
        self.mode = ForwardMode::Buffering {
            buffer: Vec::new(),
            error: Some(error),
        };
    }

    /// Takes the buffered bytes and returns to forwarding mode.
    ///
    /// Used after the caller has dealt with the sink's error. An error not yet
    /// observed through `take_error` is dropped.
    pub fn take_buffered(&mut self) -> Vec<u8> {
        match mem::replace(&mut self.mode, ForwardMode::Forwarding) {
            ForwardMode::Forwarding => Vec::new(),
            ForwardMode::Buffering { buffer, .. } => buffer,
        }
    }
}

impl<W: Write> Write for PartialWriteForwarder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.forward(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let ForwardMode::Forwarding = self.mode {
            if let Err(e) = self.sink.flush() {
                self.start_buffering(e);
            }
        }
        Ok(())
    }
}
