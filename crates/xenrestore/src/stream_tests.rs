use std::io::Cursor;

use xenrestore_core::RestoreError;

use crate::StreamReader;

#[test]
fn words_are_little_endian() {
    let mut reader = StreamReader::new(Cursor::new(0x1122_3344_5566_7788u64.to_le_bytes()));
    assert_eq!(reader.read_word().unwrap(), 0x1122_3344_5566_7788);
}

#[test]
fn counts_and_batch_headers() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xdead_beefu32.to_le_bytes());
    bytes.extend_from_slice(&(-1i32).to_le_bytes());

    let mut reader = StreamReader::new(Cursor::new(bytes));
    assert_eq!(reader.read_u32().unwrap(), 0xdead_beef);
    assert_eq!(reader.read_i32().unwrap(), -1);
}

#[test]
fn short_reads_are_truncation() {
    let mut reader = StreamReader::new(Cursor::new(vec![1, 2, 3]));
    let err = reader.read_word().unwrap_err();
    assert!(matches!(err, RestoreError::StreamTruncated));
}

#[test]
fn empty_stream_is_truncation() {
    let mut reader = StreamReader::new(Cursor::new(Vec::new()));
    assert!(matches!(reader.read_u32().unwrap_err(), RestoreError::StreamTruncated));
}

#[test]
fn read_words_returns_all_or_fails() {
    let mut bytes = Vec::new();
    for word in [5u64, 6, 7] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }

    let mut reader = StreamReader::new(Cursor::new(bytes.clone()));
    assert_eq!(reader.read_words(3).unwrap(), vec![5, 6, 7]);

    let mut reader = StreamReader::new(Cursor::new(bytes));
    assert!(matches!(reader.read_words(4).unwrap_err(), RestoreError::StreamTruncated));
}

#[test]
fn discard_skips_exactly() {
    let mut bytes = vec![0u8; 1000];
    bytes.extend_from_slice(&42u64.to_le_bytes());

    let mut reader = StreamReader::new(Cursor::new(bytes));
    reader.discard(1000).unwrap();
    assert_eq!(reader.read_word().unwrap(), 42);
}

#[test]
fn discard_past_the_end_is_truncation() {
    let mut reader = StreamReader::new(Cursor::new(vec![0u8; 10]));
    assert!(matches!(reader.discard(11).unwrap_err(), RestoreError::StreamTruncated));
}
