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

//! Tests for pushing decoded data into a sink with `write_to`.

use std::io::Read;

use crate::error::FramedError;
use crate::reader::{FramedReader, ReaderState};
use crate::tests::utils::{
    encode_all, init_logging, literal_chunk, stream_of, text_data, FailingSink,
};

#[test]
fn test_write_to_round_trip() {
    let data = text_data(300_000);
    let stream = encode_all(&data);

    let mut reader = FramedReader::new(&stream[..]);
    let mut sink = Vec::new();
    assert_eq!(reader.write_to(&mut sink).unwrap(), data.len() as u64);
    assert_eq!(sink, data);
    assert!(reader.is_finished());

    // Nothing more to deliver.
    assert_eq!(reader.write_to(&mut sink).unwrap(), 0);
}

#[test]
fn test_write_to_delivers_pending_bytes_first() {
    let stream = stream_of(&[literal_chunk(b"abcdef"), literal_chunk(b"ghi")]);
    let mut reader = FramedReader::new(&stream[..]);

    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ab");

    let mut sink = Vec::new();
    assert_eq!(reader.write_to(&mut sink).unwrap(), 7);
    assert_eq!(sink, b"cdefghi");
}

#[test]
fn test_failing_sink_loses_nothing() {
    init_logging();

    let data = text_data(200_000);
    let stream = encode_all(&data);
    let mut reader = FramedReader::new(&stream[..]);

    // First sink fails part way through the first block.
    let mut first = FailingSink::with_capacity(1_000);
    let err = reader.write_to(&mut first).unwrap_err();
    assert!(matches!(err, FramedError::SinkFailed { written: 1_000, .. }));
    assert!(matches!(reader.get_state(), ReaderState::Open));
    assert!(reader.buffered_len() > 0);

    // Second sink fails part way through the kept bytes.
    let mut second = FailingSink::with_capacity(10);
    assert!(matches!(
        reader.write_to(&mut second),
        Err(FramedError::SinkFailed { written: 10, .. })
    ));

    // The third sink takes everything that is left.
    let mut third = Vec::new();
    let written = reader.write_to(&mut third).unwrap();
    assert_eq!(written, third.len() as u64);

    let mut delivered = first.data;
    delivered.extend_from_slice(&second.data);
    delivered.extend_from_slice(&third);
    assert_eq!(delivered, data);
}

#[test]
fn test_read_after_failed_push() {
    let data = text_data(150_000);
    let stream = encode_all(&data);
    let mut reader = FramedReader::new(&stream[..]);

    let mut sink = FailingSink::with_capacity(70_000);
    match reader.write_to(&mut sink) {
        Err(FramedError::SinkFailed { written, source }) => {
            assert_eq!(written, 70_000);
            assert_eq!(source.to_string(), "sink is full");
        }
        other => panic!("Expected SinkFailed, got {:?}", other),
    }
    assert_eq!(sink.data.len(), 70_000);

    // Pull mode picks up exactly where the push stopped.
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();

    let mut delivered = sink.data;
    delivered.extend_from_slice(&rest);
    assert_eq!(delivered, data);
}

#[test]
fn test_stream_error_during_push_is_latched() {
    let mut bad = literal_chunk(b"bad");
    let last = bad.len() - 1;
    bad[last] ^= 0xff;
    let stream = stream_of(&[literal_chunk(b"good"), bad]);

    let mut reader = FramedReader::new(&stream[..]);
    let mut sink = Vec::new();
    assert!(matches!(
        reader.write_to(&mut sink),
        Err(FramedError::ChecksumMismatch { .. })
    ));
    assert_eq!(sink, b"good");
    assert!(matches!(reader.get_state(), ReaderState::Failed(_)));
}

#[test]
fn test_write_to_dyn_sink() {
    let stream = encode_all(b"through a trait object");
    let mut reader = FramedReader::new(&stream[..]);

    let mut out = Vec::new();
    {
        let sink: &mut dyn std::io::Write = &mut out;
        reader.write_to(sink).unwrap();
    }
    assert_eq!(out, b"through a trait object");
}
