//! Multi-document batch parsing.
//!
//! [`DocumentStream`] parses a buffer holding a concatenation of whole JSON
//! documents: objects and arrays may abut, primitives must be separated by
//! whitespace. Stage 1 runs over a sliding window of at most `batch_size`
//! bytes; document boundaries inside the window are found by tracking
//! container depth over the structural tokens, and stage 2 then builds one
//! tape per document on demand.
//!
//! A document that begins in a window but may continue past it is never
//! parsed from that window: the next window is re-anchored at its first
//! byte, so truncated containers and split primitives are always rescanned
//! whole. A document larger than `batch_size` itself is a
//! [`Error::Capacity`] failure.

use crate::document::DocumentRef;
use crate::error::Error;
use crate::parser::Parser;
use crate::stage1::{self, utf8};
use crate::stage2;

/// Default `batch_size` for callers without a better estimate.
///
/// Large enough for typical documents, small enough to stay cache-friendly.
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// A lazy sequence of documents parsed out of one buffer.
///
/// This is a lending iterator: each document borrows the parser's buffers,
/// so it is consumed with `while let` rather than a `for` loop:
///
/// ```
/// let mut parser = tapedeck::Parser::new();
/// let mut stream = parser.parse_many(b"{\"a\":1} [2,3] 4", 64);
/// let mut count = 0;
/// while let Some(result) = stream.next() {
///     result.unwrap();
///     count += 1;
/// }
/// assert_eq!(count, 3);
/// ```
pub struct DocumentStream<'p> {
    parser: &'p mut Parser,
    input: &'p [u8],
    batch_size: usize,
    /// Byte offset the current window was scanned from.
    cursor: usize,
    /// Exclusive end of the current window; 0 before the first scan.
    batch_end: usize,
    /// Next unconsumed index into the parser's structural array.
    token_pos: usize,
    /// String parity at the end of the current window.
    window_open_string: bool,
    started: bool,
    finished: bool,
}

/// Where the document starting at the current token ends.
enum Boundary {
    /// Inclusive index of its last token.
    EndsAt(usize),
    /// Its tokens run past the window.
    Unterminated,
}

impl<'p> DocumentStream<'p> {
    pub(crate) fn new(parser: &'p mut Parser, input: &'p [u8], batch_size: usize) -> Self {
        DocumentStream {
            parser,
            input,
            batch_size,
            cursor: 0,
            batch_end: 0,
            token_pos: 0,
            window_open_string: false,
            started: false,
            finished: false,
        }
    }

    /// The next document, or `None` when the buffer is exhausted.
    ///
    /// The first item carries any setup failure (allocation, batch size
    /// exceeding capacity, invalid UTF-8). Iteration stops after the first
    /// error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<DocumentRef<'_>, Error>> {
        if self.finished {
            return None;
        }
        if !self.started {
            if let Err(error) = self.setup() {
                self.finished = true;
                return Some(Err(error));
            }
            self.started = true;
        }

        loop {
            if self.token_pos >= self.parser.structurals.len() {
                if self.batch_end >= self.input.len() {
                    self.finished = true;
                    return None;
                }
                self.cursor = self.batch_end;
                if let Err(error) = self.load_batch() {
                    self.finished = true;
                    return Some(Err(error));
                }
                continue;
            }

            let final_window = self.batch_end >= self.input.len();
            match self.find_boundary() {
                Boundary::EndsAt(end_token) => {
                    let last_in_window = end_token + 1 >= self.parser.structurals.len();
                    let primitive = end_token == self.token_pos
                        && !matches!(self.document_first_byte(), b'{' | b'[');
                    // a primitive ending the window may continue past it
                    if primitive && last_in_window && !final_window && self.primitive_may_continue()
                    {
                        if let Err(error) = self.rescan_from_current_document() {
                            self.finished = true;
                            return Some(Err(error));
                        }
                        continue;
                    }
                    return Some(self.emit(end_token));
                }
                Boundary::Unterminated => {
                    if final_window {
                        // genuinely truncated: let stage 2 report it
                        let last = self.parser.structurals.len() - 1;
                        return Some(self.emit(last));
                    }
                    if let Err(error) = self.rescan_from_current_document() {
                        self.finished = true;
                        return Some(Err(error));
                    }
                }
            }
        }
    }

    fn setup(&mut self) -> Result<(), Error> {
        if self.batch_size == 0 {
            return Err(Error::Capacity);
        }
        let window = self.batch_size.min(self.input.len());
        // grows an auto-sized parser; a fixed capacity smaller than the
        // window is an error
        self.parser.ensure_capacity(window)?;
        // windows may split multi-byte characters, so validate the whole
        // input up front instead of per batch
        utf8::validate(self.input)?;
        self.parser.input.set(self.input);
        // leftovers from an earlier parse are not part of this stream
        self.parser.structurals.clear();
        Ok(())
    }

    fn load_batch(&mut self) -> Result<(), Error> {
        let to = (self.cursor + self.batch_size).min(self.input.len());
        self.parser.structurals.clear();
        let parser = &mut *self.parser;
        self.window_open_string =
            stage1::scan(&parser.input, self.cursor, to, &mut parser.structurals, false)?;
        self.batch_end = to;
        self.token_pos = 0;
        Ok(())
    }

    /// Whether the trailing primitive of this window might extend past it.
    ///
    /// A string is complete once the window's quote parity closed again; any
    /// other primitive is complete once a terminator byte follows it inside
    /// the window.
    fn primitive_may_continue(&self) -> bool {
        let start = self.parser.structurals[self.token_pos] as usize;
        let storage = self.parser.input.storage();
        if storage[start] == b'"' {
            self.window_open_string
        } else {
            !storage[start + 1..self.batch_end]
                .iter()
                .any(|&byte| stage2::number::is_terminator(byte))
        }
    }

    /// Re-anchor the window at the first byte of the current document.
    fn rescan_from_current_document(&mut self) -> Result<(), Error> {
        let doc_start = self.parser.structurals[self.token_pos] as usize;
        if doc_start == self.cursor {
            // the document alone fills a whole window
            return Err(Error::Capacity);
        }
        self.cursor = doc_start;
        self.load_batch()
    }

    fn document_first_byte(&self) -> u8 {
        let offset = self.parser.structurals[self.token_pos] as usize;
        self.parser.input.storage()[offset]
    }

    /// Find where the document starting at `token_pos` ends.
    fn find_boundary(&self) -> Boundary {
        let tokens = &self.parser.structurals[self.token_pos..];
        let storage = self.parser.input.storage();
        match storage[tokens[0] as usize] {
            b'{' | b'[' => {
                let mut depth = 0i64;
                for (i, &token) in tokens.iter().enumerate() {
                    match storage[token as usize] {
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth <= 0 {
                                return Boundary::EndsAt(self.token_pos + i);
                            }
                        }
                        _ => {}
                    }
                }
                Boundary::Unterminated
            }
            // a primitive document is a single token
            _ => Boundary::EndsAt(self.token_pos),
        }
    }

    /// Run stage 2 over one document's tokens and yield the result.
    fn emit(&mut self, end_token: usize) -> Result<DocumentRef<'_>, Error> {
        let parser = &mut *self.parser;
        let max_depth = parser.max_depth();
        let tokens = &parser.structurals[self.token_pos..=end_token];
        let result = stage2::build(
            parser.input.storage(),
            self.batch_end,
            tokens,
            &mut parser.tape,
            &mut parser.strings,
            &mut parser.stack,
            max_depth,
        );
        self.token_pos = end_token + 1;
        match result {
            Ok(()) => Ok(DocumentRef {
                tape: &self.parser.tape,
                strings: &self.parser.strings,
            }),
            Err(error) => {
                self.finished = true;
                Err(error)
            }
        }
    }
}
