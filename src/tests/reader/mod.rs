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

//! Tests for the FramedReader implementation.

pub mod push_mode_tests;

use std::io::{BufRead, Read};

use crate::error::FramedError;
use crate::reader::{FramedReader, FramedReaderConfig, ReaderState};
use crate::tests::utils::{
    decode_all, encode_all, init_logging, literal_chunk, random_data, stream_of, text_data,
};

#[test]
fn test_round_trip_small() {
    let stream = encode_all(b"test");
    assert_eq!(decode_all(&stream).unwrap(), b"test");
}

#[test]
fn test_round_trip_constant_and_random() {
    let constant = vec![0u8; 1 << 20];
    assert_eq!(decode_all(&encode_all(&constant)).unwrap(), constant);

    let random = random_data(1 << 20, 3);
    assert_eq!(decode_all(&encode_all(&random)).unwrap(), random);
}

#[test]
fn test_empty_stream_is_empty() {
    let mut reader = FramedReader::new(&b""[..]);
    let mut buf = [0u8; 16];
    assert_eq!(reader.read_data(&mut buf).unwrap(), 0);
    assert!(reader.is_finished());

    // Finished readers keep reporting end of stream.
    assert_eq!(reader.read_data(&mut buf).unwrap(), 0);
}

#[test]
fn test_identifier_only_stream_is_empty() {
    let stream = stream_of(&[]);
    assert!(decode_all(&stream).unwrap().is_empty());
}

#[test]
fn test_small_reads_see_every_byte() {
    let data = text_data(100_000);
    let stream = encode_all(&data);

    let mut reader = FramedReader::new(&stream[..]);
    let mut decoded = Vec::new();
    let mut buf = [0u8; 7];
    loop {
        let n = reader.read_data(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        decoded.extend_from_slice(&buf[..n]);
    }
    assert_eq!(decoded, data);
}

#[test]
fn test_read_serves_one_block_at_a_time() {
    let stream = stream_of(&[literal_chunk(b"first"), literal_chunk(b"second")]);
    let mut reader = FramedReader::new(&stream[..]);

    let mut buf = [0u8; 64];
    assert_eq!(reader.read_data(&mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"first");
    assert_eq!(reader.read_data(&mut buf).unwrap(), 6);
    assert_eq!(&buf[..6], b"second");
    assert_eq!(reader.read_data(&mut buf).unwrap(), 0);
}

#[test]
fn test_empty_data_chunks_are_skipped() {
    let stream = stream_of(&[literal_chunk(b""), literal_chunk(b""), literal_chunk(b"x")]);
    assert_eq!(decode_all(&stream).unwrap(), b"x");
}

#[test]
fn test_buf_read_lines() {
    let data = text_data(50_000);
    let stream = encode_all(&data);

    let reader = FramedReader::new(&stream[..]);
    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();

    let expected: Vec<&str> = std::str::from_utf8(&data).unwrap().lines().collect();
    assert_eq!(lines, expected);
}

#[test]
fn test_buf_read_fill_and_consume() {
    let stream = stream_of(&[literal_chunk(b"abcdef")]);
    let mut reader = FramedReader::new(&stream[..]);

    assert_eq!(reader.fill_buf().unwrap(), b"abcdef");
    reader.consume(4);
    assert_eq!(reader.buffered_len(), 2);
    assert_eq!(reader.fill_buf().unwrap(), b"ef");
    reader.consume(100);
    assert!(reader.fill_buf().unwrap().is_empty());
}

#[test]
fn test_error_is_latched() {
    init_logging();

    let mut stream = encode_all(b"some data that will be damaged");
    let last = stream.len() - 1;
    stream[last] ^= 0x01;

    let mut reader = FramedReader::new(&stream[..]);
    let mut buf = [0u8; 64];
    assert!(matches!(
        reader.read_data(&mut buf),
        Err(FramedError::ChecksumMismatch { .. })
    ));
    assert!(matches!(reader.get_state(), ReaderState::Failed(_)));

    // Every later call reports the same failure.
    assert!(matches!(
        reader.read_data(&mut buf),
        Err(FramedError::ChecksumMismatch { .. })
    ));
    assert!(matches!(
        reader.write_to(&mut Vec::<u8>::new()),
        Err(FramedError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_data_before_damage_is_delivered() {
    let mut bad = literal_chunk(b"bad");
    let last = bad.len() - 1;
    bad[last] ^= 0xff;
    let stream = stream_of(&[literal_chunk(b"good"), bad]);

    let mut reader = FramedReader::new(&stream[..]);
    let mut buf = [0u8; 64];
    assert_eq!(reader.read_data(&mut buf).unwrap(), 4);
    assert_eq!(&buf[..4], b"good");
    assert!(reader.read_data(&mut buf).is_err());
}

#[test]
fn test_reset_recovers_from_failure() {
    let good = encode_all(&text_data(20_000));
    let mut bad = good.clone();
    bad.truncate(bad.len() - 3);

    let mut reader = FramedReader::new(&bad[..]);
    let mut sink = Vec::new();
    assert!(matches!(
        reader.read_to_end(&mut sink).map_err(FramedError::from),
        Err(FramedError::UnexpectedEof(_))
    ));

    let capacity = reader.scratch_capacity();
    reader.reset(&good[..]);
    assert!(matches!(reader.get_state(), ReaderState::Open));
    assert_eq!(reader.scratch_capacity(), capacity);

    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, text_data(20_000));
}

#[test]
fn test_reset_requires_new_identifier() {
    let stream = encode_all(b"first stream");
    let mut reader = FramedReader::new(&stream[..]);
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();

    // A stream without its own identifier is rejected after reset.
    let headless = literal_chunk(b"no identifier");
    reader.reset(&headless[..]);
    assert!(matches!(
        reader.read_data(&mut [0u8; 16]),
        Err(FramedError::MissingStreamIdentifier)
    ));
}

#[test]
fn test_reset_drops_pending_bytes() {
    let stream = stream_of(&[literal_chunk(b"abcdef")]);
    let mut reader = FramedReader::new(&stream[..]);
    let mut buf = [0u8; 2];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(reader.buffered_len(), 4);

    let other = stream_of(&[literal_chunk(b"xyz")]);
    reader.reset(&other[..]);
    assert_eq!(reader.buffered_len(), 0);

    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, b"xyz");
}

#[test]
fn test_small_initial_capacity_grows() {
    let data = text_data(300_000);
    let stream = encode_all(&data);

    let config = FramedReaderConfig {
        initial_buffer_capacity: 0,
    };
    let mut reader = FramedReader::with_config(&stream[..], config);
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, data);
}
