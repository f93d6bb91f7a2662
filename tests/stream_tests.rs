//! Batch-driver tests: document boundaries, window re-anchoring, and error
//! termination.

use tapedeck::{Error, Parser};

/// Collect every document in the stream as serialized JSON, stopping at the
/// first error like a real consumer would.
fn collect(input: &[u8], batch_size: usize) -> (Vec<String>, Option<Error>) {
    let mut parser = Parser::new();
    let mut stream = parser.parse_many(input, batch_size);
    let mut docs = Vec::new();
    let mut error = None;
    while let Some(result) = stream.next() {
        match result {
            Ok(doc) => docs.push(doc.to_string()),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }
    (docs, error)
}

#[test]
fn test_whitespace_separated_documents() {
    let (docs, error) = collect(b"{\"a\":1} [2,3] true null 4.5 \"s\"", 64);
    assert_eq!(error, None);
    assert_eq!(
        docs,
        [r#"{"a":1}"#, "[2,3]", "true", "null", "4.5", r#""s""#]
    );
}

#[test]
fn test_abutting_containers() {
    let (docs, error) = collect(b"{}{}[][1]{\"k\":2}", 64);
    assert_eq!(error, None);
    assert_eq!(docs, ["{}", "{}", "[]", "[1]", r#"{"k":2}"#]);
}

#[test]
fn test_newline_delimited_records() {
    let input = b"{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n";
    let (docs, error) = collect(input, 64);
    assert_eq!(error, None);
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[2], r#"{"id":3}"#);
}

#[test]
fn test_small_batches_force_rescans() {
    // several documents, each well under the batch size, but the stream as a
    // whole needs many windows
    let mut input = Vec::new();
    for i in 0..50 {
        input.extend_from_slice(format!("{{\"n\":{i}}} ").as_bytes());
    }
    let (docs, error) = collect(&input, 32);
    assert_eq!(error, None);
    assert_eq!(docs.len(), 50);
    assert_eq!(docs[49], r#"{"n":49}"#);
}

#[test]
fn test_document_larger_than_batch_is_capacity_error() {
    let big = format!("[{}]", "1,".repeat(40) + "1");
    let (docs, error) = collect(big.as_bytes(), 16);
    assert_eq!(docs.len(), 0);
    assert_eq!(error, Some(Error::Capacity));
}

#[test]
fn test_error_stops_iteration() {
    let (docs, error) = collect(b"{\"ok\":1} [1,] {\"never\":2}", 64);
    assert_eq!(docs, [r#"{"ok":1}"#]);
    assert_eq!(error, Some(Error::TapeError));
}

#[test]
fn test_truncated_final_document() {
    let (docs, error) = collect(b"[1,2] {\"a\":", 64);
    assert_eq!(docs, ["[1,2]"]);
    assert_eq!(error, Some(Error::TapeError));
}

#[test]
fn test_empty_input_yields_no_documents() {
    let (docs, error) = collect(b"", 64);
    assert!(docs.is_empty());
    assert_eq!(error, None);

    let (docs, error) = collect(b"   \n\t  ", 64);
    assert!(docs.is_empty());
    assert_eq!(error, None);
}

#[test]
fn test_invalid_utf8_is_first_item() {
    let (docs, error) = collect(&[b'{', b'}', b' ', 0xFF], 64);
    assert!(docs.is_empty());
    assert_eq!(error, Some(Error::Utf8Error));
}

#[test]
fn test_zero_batch_size_rejected() {
    let (docs, error) = collect(b"{}", 0);
    assert!(docs.is_empty());
    assert_eq!(error, Some(Error::Capacity));
}

#[test]
fn test_batch_larger_than_input() {
    let (docs, error) = collect(b"1 2 3", 1_000_000);
    assert_eq!(error, None);
    assert_eq!(docs, ["1", "2", "3"]);
}

#[test]
fn test_preallocated_parser_must_cover_batch() {
    let mut parser = Parser::with_capacity(8).unwrap();
    let input = [b' '; 64];
    let mut stream = parser.parse_many(&input, 32);
    match stream.next() {
        Some(Err(Error::Capacity)) => {}
        other => panic!("expected capacity error, got {:?}", other.map(|r| r.map(|d| d.to_string()))),
    }
}

#[test]
fn test_documents_share_parser_buffers() {
    // each yielded document overwrites the previous tape
    let mut parser = Parser::new();
    let mut stream = parser.parse_many(b"[1] [2]", 64);

    let first = stream.next().unwrap().unwrap();
    assert_eq!(first.to_string(), "[1]");
    // first is dropped here; the next call reuses the buffers
    let second = stream.next().unwrap().unwrap();
    assert_eq!(second.to_string(), "[2]");
    assert!(stream.next().is_none());
}

#[test]
fn test_primitive_at_window_edge_is_rescanned() {
    // the number 1234567 straddles the first 8-byte window boundary; the
    // driver must not yield a truncated prefix of it
    let input = b"12345678 9";
    let (docs, error) = collect(input, 9);
    assert_eq!(error, None);
    assert_eq!(docs, ["12345678", "9"]);
}

#[test]
fn test_strings_with_structural_chars_across_documents() {
    let (docs, error) = collect(br#"{"a":"}{"} ["[1,2]"]"#, 64);
    assert_eq!(error, None);
    assert_eq!(docs, [r#"{"a":"}{"}"#, r#"["[1,2]"]"#]);
}

#[test]
fn test_mixed_sizes_with_tight_batch() {
    let input = br#"{"k":"a longer string value"} 1 [2,3,4] {"x":{"y":"z"}} null"#;
    // batch just big enough for the largest document
    let (docs, error) = collect(input, 30);
    assert_eq!(error, None);
    assert_eq!(docs.len(), 5);
    assert_eq!(docs[0], r#"{"k":"a longer string value"}"#);
    assert_eq!(docs[4], "null");
}
