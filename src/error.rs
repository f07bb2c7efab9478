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

//! Error types for framed Snappy streams.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Coarse classification of a [`FramedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed stream identifier, or an invalid chunk header.
    Format,
    /// Checksum mismatch, oversized block, or undecodable block data.
    Corruption,
    /// A chunk in the reserved unskippable tag range.
    UnsupportedChunk,
    /// The stream ended inside a chunk header or payload.
    Truncated,
    /// The encoder was used after being closed.
    Closed,
    /// Failure reported by the underlying channel or block codec.
    Io,
    /// An invalid argument when constructing a writer or reader.
    Config,
}

/// The main error type for snapframe operations.
///
/// Errors are cheap to clone so that a failed encoder or decoder can hand
/// back the same latched error on every later call.
#[derive(Debug, Clone, Error)]
pub enum FramedError {
    /// An I/O error occurred on the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// The sink passed to `FramedReader::write_to` failed.
    ///
    /// `written` counts the bytes that sink accepted during the failed call.
    /// The bytes it refused stay in the reader for the next call.
    #[error("Sink failed after accepting {written} bytes: {source}")]
    SinkFailed {
        written: u64,
        #[source]
        source: Arc<io::Error>,
    },

    /// A chunk other than the stream identifier came before any stream identifier.
    #[error("Missing stream identifier")]
    MissingStreamIdentifier,

    /// The stream identifier chunk had the wrong length or payload.
    #[error("Invalid stream identifier: {0}")]
    InvalidStreamIdentifier(String),

    /// A chunk header is malformed.
    #[error("Invalid chunk header: {0}")]
    InvalidChunkHeader(String),

    /// The stored checksum does not match the decoded data.
    #[error("Checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// A block decodes to more than `MAX_BLOCK_SIZE` bytes.
    #[error("Decoded block too large: {0} bytes, limit is 65536")]
    DecodedBlockTooLarge(usize),

    /// A data chunk declares a payload longer than any legal encoded block.
    #[error("Encoded chunk too large: {0} bytes, limit is 76494")]
    ChunkTooLarge(usize),

    /// The block codec rejected compressed block data.
    #[error("Block decode failed: {0}")]
    BlockDecode(String),

    /// The block codec failed to compress a block.
    #[error("Block encode failed: {0}")]
    BlockEncode(String),

    /// A chunk from the reserved unskippable range was found.
    #[error("Unsupported chunk type: {0:#04x}")]
    UnsupportedChunkType(u8),

    /// The stream ended in the middle of a chunk.
    #[error("Unexpected end of stream: {0}")]
    UnexpectedEof(String),

    /// Attempted to use a closed writer.
    #[error("Writing a closed stream")]
    WritingClosedStream,

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FramedError {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FramedError::MissingStreamIdentifier
            | FramedError::InvalidStreamIdentifier(_)
            | FramedError::InvalidChunkHeader(_) => ErrorCategory::Format,
            FramedError::ChecksumMismatch { .. }
            | FramedError::DecodedBlockTooLarge(_)
            | FramedError::ChunkTooLarge(_)
            | FramedError::BlockDecode(_) => ErrorCategory::Corruption,
            FramedError::UnsupportedChunkType(_) => ErrorCategory::UnsupportedChunk,
            FramedError::UnexpectedEof(_) => ErrorCategory::Truncated,
            FramedError::WritingClosedStream => ErrorCategory::Closed,
            FramedError::Io(_) | FramedError::SinkFailed { .. } | FramedError::BlockEncode(_) => {
                ErrorCategory::Io
            }
            FramedError::InvalidConfig(_) => ErrorCategory::Config,
        }
    }

    /// Extracts a `FramedError` from an `io::Error` produced by this crate's
    /// `Read`/`Write` implementations.
    ///
    /// Errors that did not originate here are wrapped as [`FramedError::Io`].
    /// This is also what the `From<io::Error>` conversion does, so `?` never
    /// nests one framed error inside another.
    pub fn from_io(err: io::Error) -> Self {
        if let Some(framed) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<FramedError>())
        {
            return framed.clone();
        }
        FramedError::Io(Arc::new(err))
    }
}

impl From<io::Error> for FramedError {
    fn from(err: io::Error) -> Self {
        FramedError::from_io(err)
    }
}

impl From<FramedError> for io::Error {
    fn from(err: FramedError) -> Self {
        let kind = match &err {
            FramedError::Io(inner) | FramedError::SinkFailed { source: inner, .. } => inner.kind(),
            other => match other.category() {
                ErrorCategory::Truncated => io::ErrorKind::UnexpectedEof,
                ErrorCategory::Closed => io::ErrorKind::BrokenPipe,
                ErrorCategory::Config => io::ErrorKind::InvalidInput,
                ErrorCategory::Io => io::ErrorKind::Other,
                _ => io::ErrorKind::InvalidData,
            },
        };
        io::Error::new(kind, err)
    }
}

/// A specialized Result type for snapframe operations.
pub type Result<T> = std::result::Result<T, FramedError>;
