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

//! Reader for framed Snappy streams.
//!
//! [`FramedReader`] reads chunks from a source one header at a time and
//! dispatches on the chunk type. Decoded data is only ever handed out after
//! its checksum has been verified.
//!
//! Two ways of consuming a stream are supported:
//!
//! - *Pull*: the `Read` and `BufRead` implementations decode chunks into an
//!   internal buffer and serve reads from it.
//! - *Push*: [`FramedReader::write_to`] hands every verified block straight to
//!   a sink. If the sink fails, the undelivered bytes are kept and delivered
//!   by the next `write_to` or `read` call.

use std::cmp::min;
use std::io::{self, BufRead, Read, Write};
use std::mem;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Buf, BytesMut};
use log::{debug, trace, warn};

use crate::chunks::{parse_chunk_header, ChunkHeader, ChunkType, CHUNK_HEADER_SIZE};
use crate::compression::{BlockCodec, SnappyCodec};
use crate::constants::{
    CHECKSUM_SIZE, MAX_BLOCK_SIZE, MAX_DATA_CHUNK_LENGTH, STREAM_IDENTIFIER_PAYLOAD,
};
use crate::error::{FramedError, Result};
use crate::forwarder::PartialWriteForwarder;
use crate::hash::{crc32c, unmask_checksum};

/// Configuration options for a FramedReader.
#[derive(Debug, Clone)]
pub struct FramedReaderConfig {
    /// Initial capacity of the scratch buffers used for chunk payloads and
    /// decompressed blocks. They grow on demand up to the largest legal chunk.
    pub initial_buffer_capacity: usize,
}

impl Default for FramedReaderConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: 4096,
        }
    }
}

/// Lifecycle of a reader.
#[derive(Debug, Clone)]
pub(crate) enum ReaderState {
    /// More chunks may follow.
    Open,
    /// The source ended cleanly at a chunk boundary.
    Finished,
    /// A failure was latched; every call returns it until reset.
    Failed(FramedError),
}

/// Where the bytes of the most recently decoded block live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodedBlock {
    /// Literal data, inside the payload scratch buffer after the checksum.
    Literal,
    /// Decompressed data, in the decoded scratch buffer.
    Decompressed,
}

impl DecodedBlock {
    fn bytes<'a>(self, payload: &'a [u8], decoded: &'a [u8]) -> &'a [u8] {
        match self {
            DecodedBlock::Literal => &payload[CHECKSUM_SIZE..],
            DecodedBlock::Decompressed => decoded,
        }
    }
}

/// Reads `buf.len()` bytes, treating a premature end of the source as truncation.
fn read_exact_or_truncated<R: Read + ?Sized>(
    source: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<()> {
    match source.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FramedError::UnexpectedEof(
            format!("{} truncated, expected {} bytes", what, buf.len()),
        )),
        Err(e) => Err(e.into()),
    }
}

/// A reader for framed Snappy streams.
///
/// # Example
///
/// ```
/// use std::io::{Read, Write};
/// use snapframe::reader::FramedReader;
/// use snapframe::writer::FramedWriter;
///
/// let mut writer = FramedWriter::new(Vec::new());
/// writer.write_all(b"hello framed world").unwrap();
/// writer.close().unwrap();
///
/// let stream = writer.get_ref().clone();
/// let mut reader = FramedReader::new(&stream[..]);
/// let mut decoded = String::new();
/// reader.read_to_string(&mut decoded).unwrap();
/// assert_eq!(decoded, "hello framed world");
/// ```
pub struct FramedReader<Source: Read, C: BlockCodec = SnappyCodec> {
    /// The underlying source.
    source: Source,

    /// Block decompressor.
    codec: C,

    /// Configuration for the reader.
    config: FramedReaderConfig,

    /// Scratch space for chunk headers.
    header: [u8; CHUNK_HEADER_SIZE],

    /// Payload of the current data chunk, checksum included.
    payload: Vec<u8>,

    /// Decompressed block data.
    decoded: Vec<u8>,

    /// Verified bytes not yet delivered to the caller.
    pending: BytesMut,

    /// Whether a stream identifier has been read since construction or reset.
    seen_stream_identifier: bool,

    /// Current state of the reader.
    state: ReaderState,
}

impl<Source: Read> FramedReader<Source> {
    /// Creates a new FramedReader with the Snappy codec and default configuration.
    pub fn new(source: Source) -> Self {
        Self::with_config(source, FramedReaderConfig::default())
    }

    /// Creates a new FramedReader with the Snappy codec and custom configuration.
    pub fn with_config(source: Source, config: FramedReaderConfig) -> Self {
        Self::with_codec(source, SnappyCodec::new(), config)
    }
}

impl<Source: Read, C: BlockCodec> FramedReader<Source, C> {
    /// Creates a new FramedReader using the given block codec.
    pub fn with_codec(source: Source, codec: C, config: FramedReaderConfig) -> Self {
        let capacity = config.initial_buffer_capacity;
        Self {
            source,
            codec,
            config,
            header: [0u8; CHUNK_HEADER_SIZE],
            payload: Vec::with_capacity(capacity),
            decoded: Vec::with_capacity(capacity),
            pending: BytesMut::with_capacity(capacity),
            seen_stream_identifier: false,
            state: ReaderState::Open,
        }
    }

    /// Returns the reader configuration.
    pub fn config(&self) -> &FramedReaderConfig {
        &self.config
    }

    /// Number of decoded bytes waiting to be delivered.
    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the stream has ended cleanly.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ReaderState::Finished)
    }

    /// Fails with the latched error, if any.
    fn check_state(&self) -> Result<()> {
        match &self.state {
            ReaderState::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Latches `err` so that every later call returns it.
    fn fail(&mut self, err: FramedError) -> FramedError {
        warn!("Reader failed, latching error: {}", err);
        self.state = ReaderState::Failed(err.clone());
        err
    }

    /// Reads a chunk header.
    ///
    /// Returns `None` if the source ends exactly at a chunk boundary.
    fn read_chunk_header(&mut self) -> Result<Option<ChunkHeader>> {
        let mut filled = 0;
        while filled < CHUNK_HEADER_SIZE {
            match self.source.read(&mut self.header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            CHUNK_HEADER_SIZE => Ok(Some(parse_chunk_header(&self.header))),
            n => Err(FramedError::UnexpectedEof(format!(
                "chunk header truncated after {} of {} bytes",
                n, CHUNK_HEADER_SIZE
            ))),
        }
    }

    /// Validates a stream identifier chunk whose header has been read.
    fn read_stream_identifier(&mut self, header: &ChunkHeader) -> Result<()> {
        if header.length != STREAM_IDENTIFIER_PAYLOAD.len() {
            return Err(FramedError::InvalidStreamIdentifier(format!(
                "length {} instead of {}",
                header.length,
                STREAM_IDENTIFIER_PAYLOAD.len()
            )));
        }

        let mut identifier = [0u8; STREAM_IDENTIFIER_PAYLOAD.len()];
        read_exact_or_truncated(&mut self.source, &mut identifier, "stream identifier")?;
        if identifier != STREAM_IDENTIFIER_PAYLOAD {
            return Err(FramedError::InvalidStreamIdentifier(format!(
                "unexpected payload {:02x?}",
                identifier
            )));
        }

        Ok(())
    }

    /// Reads and drops exactly `length` payload bytes.
    fn discard_payload(&mut self, length: usize) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.source).take(length as u64), &mut io::sink())?;
        if skipped < length as u64 {
            return Err(FramedError::UnexpectedEof(format!(
                "skipped chunk truncated after {} of {} bytes",
                skipped, length
            )));
        }
        Ok(())
    }

    /// Reads, decodes and verifies a data chunk whose header has been read.
    fn decode_block(&mut self, header: &ChunkHeader) -> Result<DecodedBlock> {
        if header.length > MAX_DATA_CHUNK_LENGTH {
            return Err(FramedError::ChunkTooLarge(header.length));
        }
        if header.length < CHECKSUM_SIZE {
            return Err(FramedError::InvalidChunkHeader(format!(
                "data chunk of {} bytes cannot hold a checksum",
                header.length
            )));
        }

        self.payload.resize(header.length, 0);
        read_exact_or_truncated(&mut self.source, &mut self.payload, "data chunk")?;

        let stored = unmask_checksum(LittleEndian::read_u32(&self.payload[..CHECKSUM_SIZE]));
        let block = &self.payload[CHECKSUM_SIZE..];

        let location = match header.chunk_type {
            ChunkType::Compressed => {
                // Bound the decoded size before allocating for it.
                let decoded_len = self.codec.decompressed_len(block)?;
                if decoded_len > MAX_BLOCK_SIZE {
                    return Err(FramedError::DecodedBlockTooLarge(decoded_len));
                }
                self.codec.decompress(block, &mut self.decoded)?;
                DecodedBlock::Decompressed
            }
            _ => {
                if block.len() > MAX_BLOCK_SIZE {
                    return Err(FramedError::DecodedBlockTooLarge(block.len()));
                }
                DecodedBlock::Literal
            }
        };

        let actual = crc32c(location.bytes(&self.payload, &self.decoded));
        if actual != stored {
            return Err(FramedError::ChecksumMismatch {
                expected: stored,
                actual,
            });
        }

        Ok(location)
    }

    /// Advances to the next data block, consuming any non-data chunks before it.
    ///
    /// Returns `None` at a clean end of stream.
    fn next_block(&mut self) -> Result<Option<DecodedBlock>> {
        loop {
            let header = match self.read_chunk_header()? {
                Some(header) => header,
                None => return Ok(None),
            };
            trace!("Read {:?} chunk of {} bytes", header.chunk_type, header.length);

            match header.chunk_type {
                // A stream identifier may repeat, e.g. in concatenated streams.
                ChunkType::StreamIdentifier => {
                    self.read_stream_identifier(&header)?;
                    if !self.seen_stream_identifier {
                        debug!("Read stream identifier");
                    }
                    self.seen_stream_identifier = true;
                }
                _ if !self.seen_stream_identifier => {
                    return Err(FramedError::MissingStreamIdentifier);
                }
                ChunkType::Compressed | ChunkType::Uncompressed => {
                    return self.decode_block(&header).map(Some);
                }
                chunk_type if chunk_type.is_skippable() => {
                    self.discard_payload(header.length)?;
                    debug!("Skipped {:?} chunk of {} bytes", chunk_type, header.length);
                }
                chunk_type => {
                    // Consume the payload so the source stays at a chunk boundary.
                    self.discard_payload(header.length)?;
                    return Err(FramedError::UnsupportedChunkType(chunk_type.tag()));
                }
            }
        }
    }

    /// Decodes blocks until the pending buffer is non-empty or the stream ends.
    fn fill_pending(&mut self) -> Result<()> {
        while self.pending.is_empty() {
            if !matches!(self.state, ReaderState::Open) {
                break;
            }

            match self.next_block() {
                Ok(Some(block)) => {
                    let bytes = block.bytes(&self.payload, &self.decoded);
                    self.pending.extend_from_slice(bytes);
                }
                Ok(None) => {
                    debug!("Reached end of stream");
                    self.state = ReaderState::Finished;
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
        Ok(())
    }

    /// Reads decoded data into `buf`.
    ///
    /// At most one block is decoded per call, so bytes decoded before a
    /// damaged chunk are always delivered before its error. Returns `Ok(0)`
    /// once the stream has ended and every decoded byte has been delivered.
    /// Any failure is latched until [`reset`](Self::reset).
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_state()?;
        if buf.is_empty() {
            return Ok(0);
        }

        self.fill_pending()?;

        let n = min(buf.len(), self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }

    /// Decodes the rest of the stream into `sink`, block by block.
    ///
    /// Bytes already buffered by earlier reads are delivered first. Returns
    /// the number of bytes `sink` accepted.
    ///
    /// If `sink` fails, the decoded bytes it did not accept are kept and
    /// [`FramedError::SinkFailed`] is returned without being latched. It
    /// carries the sink's error and the number of bytes the sink accepted
    /// during this call. The reader stays usable and the next `write_to` (or
    /// `read`) continues where delivery stopped.
    /// The source is never re-read. Every other failure is latched.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        self.check_state()?;

        let mut forwarder = PartialWriteForwarder::new(sink);

        if !self.pending.is_empty() {
            forwarder.forward(&self.pending);
            self.pending.clear();
            if let Some(err) = forwarder.take_error() {
                return Err(self.keep_undelivered(&mut forwarder, err));
            }
        }

        while matches!(self.state, ReaderState::Open) {
            match self.next_block() {
                Ok(Some(block)) => {
                    forwarder.forward(block.bytes(&self.payload, &self.decoded));
                    if let Some(err) = forwarder.take_error() {
                        return Err(self.keep_undelivered(&mut forwarder, err));
                    }
                }
                Ok(None) => {
                    debug!("Reached end of stream");
                    self.state = ReaderState::Finished;
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        Ok(forwarder.written())
    }

    /// Moves bytes the sink refused back into the pending buffer.
    fn keep_undelivered<W: Write>(
        &mut self,
        forwarder: &mut PartialWriteForwarder<W>,
        err: io::Error,
    ) -> FramedError {
        debug_assert!(forwarder.is_buffering());

        let written = forwarder.written();
        debug!(
            "Sink failed after {} bytes, keeping {} undelivered bytes",
            written,
            forwarder.buffered().len()
        );
        self.pending.extend_from_slice(&forwarder.take_buffered());
        FramedError::SinkFailed {
            written,
            source: Arc::new(err),
        }
    }

    /// Discards all state and starts reading a new stream from `source`.
    ///
    /// The new stream must begin with its own stream identifier. Allocated
    /// buffers are kept. Returns the previous source.
    pub fn reset(&mut self, source: Source) -> Source {
        debug!("Resetting reader");
        self.state = ReaderState::Open;
        self.seen_stream_identifier = false;
        self.pending.clear();
        mem::replace(&mut self.source, source)
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &Source {
        &self.source
    }

    /// Returns a mutable reference to the underlying source.
    ///
    /// Reading from the source directly will desynchronize the reader.
    pub fn get_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    /// Returns the underlying source, consuming self.
    ///
    /// Decoded bytes that were not yet read are lost.
    pub fn into_inner(self) -> Source {
        self.source
    }
}

impl<Source: Read, C: BlockCodec> Read for FramedReader<Source, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_data(buf).map_err(io::Error::from)
    }
}

impl<Source: Read, C: BlockCodec> BufRead for FramedReader<Source, C> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.check_state()?;
        self.fill_pending()?;
        Ok(&self.pending[..])
    }

    fn consume(&mut self, amt: usize) {
        let amt = min(amt, self.pending.len());
        self.pending.advance(amt);
    }
}

// Methods for testing only
#[cfg(test)]
impl<Source: Read, C: BlockCodec> FramedReader<Source, C> {
    /// Get the current reader state (testing only)
    pub(crate) fn get_state(&self) -> &ReaderState {
        &self.state
    }

    /// Capacities of the payload and decoded scratch buffers (testing only)
    pub(crate) fn scratch_capacity(&self) -> (usize, usize) {
        (self.payload.capacity(), self.decoded.capacity())
    }
}
