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

//! Unbuffered chunk encoder.
//!
//! [`ChunkEncoder`] turns every call to [`ChunkEncoder::write_data`] into one
//! or more data chunks immediately. It is the building block for the
//! buffering [`FramedWriter`](crate::writer::FramedWriter), and can be used
//! directly when callers already write in block-sized pieces.

use std::io::{self, Write};
use std::mem;

use log::{debug, trace, warn};

use crate::chunks::{write_data_chunk_prefix, ChunkType, DATA_CHUNK_PREFIX_SIZE};
use crate::compression::{BlockCodec, SnappyCodec};
use crate::constants::{MAX_BLOCK_SIZE, STREAM_IDENTIFIER};
use crate::error::{FramedError, Result};
use crate::hash::block_checksum;

/// Configuration options shared by [`ChunkEncoder`] and
/// [`FramedWriter`](crate::writer::FramedWriter).
#[derive(Debug, Clone)]
pub struct FramedWriterConfig {
    /// Maximum number of raw bytes per data chunk (default: 64 KiB).
    ///
    /// NOTE: Real streams should always use `MAX_BLOCK_SIZE`; smaller sizes
    /// exist so tests can produce many chunks from little data.
    pub block_size: usize,
}

impl Default for FramedWriterConfig {
    fn default() -> Self {
        Self {
            block_size: MAX_BLOCK_SIZE,
        }
    }
}

impl FramedWriterConfig {
    /// Creates a new FramedWriterConfig with a custom block size.
    ///
    /// Returns an error unless `1 <= block_size <= MAX_BLOCK_SIZE`.
    pub fn with_block_size(block_size: usize) -> Result<Self> {
        let config = Self { block_size };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(FramedError::InvalidConfig(format!(
                "Block size ({}) must be between 1 and {}",
                self.block_size, MAX_BLOCK_SIZE
            )));
        }
        Ok(())
    }
}

/// Lifecycle of an encoder.
#[derive(Debug, Clone)]
pub(crate) enum EncoderState {
    /// Accepting data.
    Open,
    /// A sink or codec failure was latched; every call returns it until reset.
    Failed(FramedError),
    /// Closed by the caller; every call fails until reset.
    Closed,
}

/// Encoder producing a framed Snappy chunk stream.
///
/// Each call to [`write_data`](Self::write_data) splits its input into blocks
/// of at most `block_size` bytes and writes one data chunk per block. The
/// stream identifier is written before the first data chunk.
///
/// # Example
///
/// ```
/// use snapframe::encoder::ChunkEncoder;
///
/// let mut encoder = ChunkEncoder::new(Vec::new());
/// encoder.write_data(b"hello").unwrap();
///
/// let stream = encoder.into_inner();
/// assert_eq!(&stream[..4], &[0xff, 0x06, 0x00, 0x00]);
/// ```
pub struct ChunkEncoder<Sink: Write, C: BlockCodec = SnappyCodec> {
    /// The underlying sink.
    sink: Sink,

    /// Block compressor.
    codec: C,

    /// Configuration for the encoder.
    config: FramedWriterConfig,

    /// Scratch space for the chunk header and checksum.
    prefix: [u8; DATA_CHUNK_PREFIX_SIZE],

    /// Scratch space for compressed blocks, reused across chunks.
    encoded: Vec<u8>,

    /// Whether the stream identifier has been written since construction or reset.
    sent_stream_identifier: bool,

    /// Current state of the encoder.
    state: EncoderState,
}

impl<Sink: Write> ChunkEncoder<Sink> {
    /// Creates a new ChunkEncoder with the Snappy codec and default configuration.
    pub fn new(sink: Sink) -> Self {
        Self::build(sink, SnappyCodec::new(), FramedWriterConfig::default())
    }

    /// Creates a new ChunkEncoder with the Snappy codec and custom configuration.
    pub fn with_config(sink: Sink, config: FramedWriterConfig) -> Result<Self> {
        Self::with_codec(sink, SnappyCodec::new(), config)
    }
}

impl<Sink: Write, C: BlockCodec> ChunkEncoder<Sink, C> {
    /// Creates a new ChunkEncoder using the given block codec.
    pub fn with_codec(sink: Sink, codec: C, config: FramedWriterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(sink, codec, config))
    }

    fn build(sink: Sink, codec: C, config: FramedWriterConfig) -> Self {
        Self {
            sink,
            codec,
            config,
            prefix: [0u8; DATA_CHUNK_PREFIX_SIZE],
            encoded: Vec::new(),
            sent_stream_identifier: false,
            state: EncoderState::Open,
        }
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &FramedWriterConfig {
        &self.config
    }

    /// Fails with the latched error or the closed error unless the encoder is open.
    pub(crate) fn check_open(&self) -> Result<()> {
        match &self.state {
            EncoderState::Open => Ok(()),
            EncoderState::Failed(err) => Err(err.clone()),
            EncoderState::Closed => Err(FramedError::WritingClosedStream),
        }
    }

    /// Latches `err` so that every later call returns it.
    fn fail(&mut self, err: FramedError) -> FramedError {
        warn!("Encoder failed, latching error: {}", err);
        self.state = EncoderState::Failed(err.clone());
        err
    }

    /// Encodes `data` as a sequence of data chunks and writes them to the sink.
    ///
    /// Returns `data.len()` on success. On failure nothing is reported as
    /// written and the error is latched until [`reset`](Self::reset).
    pub fn write_data(&mut self, data: &[u8]) -> Result<usize> {
        self.check_open()?;

        for block in data.chunks(self.config.block_size) {
            if let Err(e) = self.write_block(block) {
                return Err(self.fail(e));
            }
        }

        Ok(data.len())
    }

    /// Writes a single block (at most `block_size` bytes) as one data chunk.
    fn write_block(&mut self, block: &[u8]) -> Result<()> {
        debug_assert!(block.len() <= self.config.block_size);

        let compressed_len = self.codec.compress(block, &mut self.encoded)?;

        // Data that does not shrink is stored as is.
        let (chunk_type, payload) = if compressed_len >= block.len() {
            (ChunkType::Uncompressed, block)
        } else {
            (ChunkType::Compressed, &self.encoded[..compressed_len])
        };

        // The checksum always covers the raw bytes.
        let checksum = block_checksum(block);
        write_data_chunk_prefix(chunk_type, payload.len(), checksum, &mut self.prefix)?;

        if !self.sent_stream_identifier {
            self.sink.write_all(&STREAM_IDENTIFIER)?;
            self.sent_stream_identifier = true;
            debug!("Wrote stream identifier");
        }

        self.sink.write_all(&self.prefix)?;
        self.sink.write_all(payload)?;

        trace!(
            "Wrote {:?} chunk: {} raw bytes as {} payload bytes",
            chunk_type,
            block.len(),
            payload.len()
        );

        Ok(())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;

        if let Err(e) = self.sink.flush() {
            return Err(self.fail(e.into()));
        }
        Ok(())
    }

    /// Flushes the sink and closes the encoder.
    ///
    /// After closing every call fails with
    /// [`FramedError::WritingClosedStream`], including a second `close`.
    /// The sink itself is left untouched.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.state = EncoderState::Closed;
        Ok(())
    }

    /// Discards all state and starts a new stream on `sink`.
    ///
    /// The encoder afterwards behaves exactly like a newly constructed one,
    /// but keeps its scratch allocations. Returns the previous sink.
    pub fn reset(&mut self, sink: Sink) -> Sink {
        debug!("Resetting encoder");
        self.state = EncoderState::Open;
        self.sent_stream_identifier = false;
        self.encoded.clear();
        mem::replace(&mut self.sink, sink)
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &Sink {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// Writing to the sink directly will corrupt the stream.
    pub fn get_mut(&mut self) -> &mut Sink {
        &mut self.sink
    }

    /// Returns the underlying sink, consuming self.
    pub fn into_inner(self) -> Sink {
        self.sink
    }
}

impl<Sink: Write, C: BlockCodec> Write for ChunkEncoder<Sink, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        ChunkEncoder::flush(self).map_err(io::Error::from)
    }
}

// Methods for testing only
#[cfg(test)]
impl<Sink: Write, C: BlockCodec> ChunkEncoder<Sink, C> {
    /// Get the current encoder state (testing only)
    pub(crate) fn get_state(&self) -> &EncoderState {
        &self.state
    }

    /// Capacity of the compression scratch buffer (testing only)
    pub(crate) fn scratch_capacity(&self) -> usize {
        self.encoded.capacity()
    }
}
