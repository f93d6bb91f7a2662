//! # tapedeck
//!
//! A two-stage vectorized JSON parser that validates and materializes whole
//! documents onto a flat tape of 64-bit words.
//!
//! The design follows Langdale & Lemire,
//! ["Parsing Gigabytes of JSON per Second"](https://arxiv.org/abs/1902.08318) (2019):
//!
//! - **Stage 1** scans the input in 64-byte blocks, classifying every byte
//!   with SIMD compares and deriving bitmasks for escaped characters, string
//!   interiors, and structural characters. The output is an ordered list of
//!   byte offsets covering `{ } [ ] , :`, opening quotes, and the first byte
//!   of every primitive token. UTF-8 is validated in the same pass.
//! - **Stage 2** drives a pushdown automaton over the structural offsets,
//!   parses numbers, strings, and literals in place, and writes the tape.
//!
//! ## Quick Start
//!
//! ```
//! let doc = tapedeck::parse(br#"{"name":"Alice","age":30}"#).unwrap();
//! let root = doc.root();
//!
//! assert_eq!(root.get("name").unwrap().as_str().unwrap(), "Alice");
//! assert_eq!(root.get("age").unwrap().as_i64().unwrap(), 30);
//! ```
//!
//! To parse more than one document, hold a [`Parser`] and reuse its buffers:
//!
//! ```
//! let mut parser = tapedeck::Parser::with_capacity(4096).unwrap();
//! let doc = parser.parse(b"[1,2,3]").unwrap();
//! assert!(doc.root().is_array());
//! ```
//!
//! ## Features
//!
//! - `std` (default): runtime CPU feature dispatch and `PaddedBytes::load`
//! - `cli`: dependencies of the `tapedeck` statistics binary
//! - `serde`: `Serialize`/`Deserialize` derives on [`Error`] and [`ElementType`]

// Use no_std unless std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// When using no_std, we need to explicitly link the alloc crate
#[cfg(not(any(test, feature = "std")))]
extern crate alloc;

// When using std, re-export alloc types from std for compatibility
#[cfg(any(test, feature = "std"))]
extern crate std as alloc;

mod document;
mod error;
mod padded;
mod parser;
pub mod stage1;
mod stage2;
mod stream;
mod tape;

pub use document::{Array, ArrayIter, Document, DocumentRef, Element, ElementType, Object, ObjectIter};
pub use error::Error;
pub use padded::{PaddedBytes, PADDING};
pub use parser::{Parser, DEFAULT_MAX_DEPTH};
pub use stream::{DocumentStream, DEFAULT_BATCH_SIZE};

/// Parse a single JSON document into an owned [`Document`].
///
/// Convenience wrapper that builds a throwaway [`Parser`] sized to the input.
/// Use [`Parser`] directly to amortize allocations over many parses.
pub fn parse(json: &[u8]) -> Result<Document, Error> {
    Parser::new().parse_owned(json)
}
