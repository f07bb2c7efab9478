//! Chunk-level definitions for framed Snappy streams.
//!
//! A stream is a sequence of chunks. Each chunk is a 4 byte header (tag and
//! 24-bit little-endian length) followed by `length` payload bytes:
//!
//! ```text
//! +-------+------------------+---------------------------+
//! |  tag  |   length (LE)    |          payload          |
//! | 1 byte|     3 bytes      |       length bytes        |
//! +-------+------------------+---------------------------+
//! ```
//!
//! Data chunks start their payload with a 4 byte masked CRC-32C of the
//! decoded block.

pub mod header;
pub mod header_parser;
pub mod header_writer;

pub use header::{ChunkHeader, ChunkType, CHUNK_HEADER_SIZE};
pub use header_parser::parse_chunk_header;
pub use header_writer::{write_chunk_header, write_data_chunk_prefix, DATA_CHUNK_PREFIX_SIZE};
