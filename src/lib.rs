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

//! Snapframe is a Rust implementation of the Snappy framing format.
//!
//! The framing format wraps raw Snappy blocks in typed, length-prefixed
//! chunks so that data of any length can be streamed and verified. Each data
//! chunk carries a masked CRC-32C of its decoded bytes.
//!
//! - [`FramedWriter`] buffers writes into full blocks and emits one chunk per block.
//! - [`ChunkEncoder`] emits chunks immediately for every write.
//! - [`FramedReader`] reads a stream back, either pulled through `Read`/`BufRead`
//!   or pushed into a sink with [`FramedReader::write_to`].

pub mod chunks;
pub mod compression;
pub mod constants;
pub mod encoder;
pub mod error;
pub mod forwarder;
pub mod hash;
pub mod reader;
pub mod writer;


// Re-exports for a cleaner API
pub use constants::{MAX_BLOCK_SIZE, MEDIA_TYPE};
pub use encoder::{ChunkEncoder, FramedWriterConfig};
pub use error::{ErrorCategory, FramedError, Result};
pub use reader::{FramedReader, FramedReaderConfig};
pub use writer::FramedWriter;
