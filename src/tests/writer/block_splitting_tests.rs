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

//! Tests for how input is split into data chunks.

use crate::chunks::ChunkType;
use crate::constants::{MAX_BLOCK_SIZE, STREAM_IDENTIFIER};
use crate::hash::block_checksum;
use crate::tests::utils::{chunk_headers, decode_all, encode_all, random_data, text_data};

fn data_chunk_types(stream: &[u8]) -> Vec<ChunkType> {
    let headers = chunk_headers(stream);
    assert_eq!(headers[0].chunk_type, ChunkType::StreamIdentifier);
    headers[1..].iter().map(|h| h.chunk_type).collect()
}

#[test]
fn test_small_literal_chunk_layout() {
    // Five bytes never shrink under Snappy, so they are stored literally.
    let stream = encode_all(b"hello");

    let mut expected = STREAM_IDENTIFIER.to_vec();
    expected.extend_from_slice(&[0x01, 0x09, 0x00, 0x00]);
    expected.extend_from_slice(&block_checksum(b"hello").to_le_bytes());
    expected.extend_from_slice(b"hello");

    assert_eq!(stream, expected);
}

#[test]
fn test_128000_bytes_make_two_chunks() {
    let data = vec![0u8; 128_000];
    let stream = encode_all(&data);

    assert!(stream.starts_with(&STREAM_IDENTIFIER));
    assert_eq!(
        data_chunk_types(&stream),
        vec![ChunkType::Compressed, ChunkType::Compressed]
    );
    assert_eq!(decode_all(&stream).unwrap(), data);
}

#[test]
fn test_zeros_are_compressed() {
    let data = vec![0u8; 1000];
    let stream = encode_all(&data);

    assert_eq!(data_chunk_types(&stream), vec![ChunkType::Compressed]);
    assert!(stream.len() < data.len());
}

#[test]
fn test_random_data_is_stored_uncompressed() {
    let data = random_data(1000, 7);
    let stream = encode_all(&data);

    let headers = chunk_headers(&stream);
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[1].chunk_type, ChunkType::Uncompressed);
    assert_eq!(headers[1].length, data.len() + 4);
    assert_eq!(decode_all(&stream).unwrap(), data);
}

#[test]
fn test_exactly_one_block() {
    let data = text_data(MAX_BLOCK_SIZE);
    let stream = encode_all(&data);

    assert_eq!(data_chunk_types(&stream).len(), 1);
    assert_eq!(decode_all(&stream).unwrap(), data);
}

#[test]
fn test_one_byte_over_a_block() {
    let data = text_data(MAX_BLOCK_SIZE + 1);
    let stream = encode_all(&data);

    // The trailing single byte cannot shrink.
    assert_eq!(
        data_chunk_types(&stream),
        vec![ChunkType::Compressed, ChunkType::Uncompressed]
    );
    assert_eq!(decode_all(&stream).unwrap(), data);
}

#[test]
fn test_random_block_at_max_size() {
    let data = random_data(MAX_BLOCK_SIZE, 11);
    let stream = encode_all(&data);

    let headers = chunk_headers(&stream);
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[1].chunk_type, ChunkType::Uncompressed);
    assert_eq!(headers[1].length, MAX_BLOCK_SIZE + 4);
    assert_eq!(decode_all(&stream).unwrap(), data);
}

#[test]
fn test_stream_identifier_written_once() {
    let data = text_data(5 * MAX_BLOCK_SIZE);
    let stream = encode_all(&data);

    let identifiers = chunk_headers(&stream)
        .iter()
        .filter(|h| h.chunk_type == ChunkType::StreamIdentifier)
        .count();
    assert_eq!(identifiers, 1);
}
