//! Parser state and lifecycle.
//!
//! A [`Parser`] owns every buffer the two stages write into: the padded
//! input copy, the structural index array, the tape, the string buffer, and
//! the scope stack. `allocate` sizes them all for a given capacity, after
//! which parses of documents up to that capacity perform no allocation.
//! Each parse overwrites the previous document; the result is a borrowed
//! [`DocumentRef`], so the borrow checker rules out reading a document after
//! its parser has moved on.

#[cfg(not(test))]
use alloc::vec::Vec;

use core::mem;

use crate::document::{Document, DocumentRef};
use crate::error::Error;
use crate::padded::{PaddedBytes, PADDING};
use crate::stage1;
use crate::stage2::{self, Scope};
use crate::stream::DocumentStream;

/// Default maximum nesting depth.
///
/// A JSON document nested deeper than this is de facto invalid.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// A reusable JSON parser.
pub struct Parser {
    pub(crate) input: PaddedBytes,
    pub(crate) structurals: Vec<u32>,
    pub(crate) tape: Vec<u64>,
    pub(crate) strings: Vec<u8>,
    pub(crate) stack: Vec<Scope>,
    capacity: usize,
    max_depth: usize,
    /// Capacity was fixed by an explicit `allocate`; oversized input is then
    /// an error instead of a reallocation.
    fixed_capacity: bool,
    valid: bool,
    error: Option<Error>,
}

fn reserve_total<T>(buf: &mut Vec<T>, total: usize) -> Result<(), Error> {
    if buf.capacity() < total {
        buf.try_reserve_exact(total - buf.len())
            .map_err(|_| Error::MemAlloc)?;
    }
    Ok(())
}

impl Parser {
    /// Create a parser with zero capacity.
    ///
    /// The first parse sizes the buffers to its input; call [`allocate`] up
    /// front to fix the capacity instead.
    ///
    /// [`allocate`]: Parser::allocate
    pub fn new() -> Self {
        Parser {
            input: PaddedBytes::new(),
            structurals: Vec::new(),
            tape: Vec::new(),
            strings: Vec::new(),
            stack: Vec::new(),
            capacity: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            fixed_capacity: false,
            valid: false,
            error: Some(Error::Uninitialized),
        }
    }

    /// Create a parser sized for documents up to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut parser = Parser::new();
        parser.allocate(capacity, DEFAULT_MAX_DEPTH)?;
        Ok(parser)
    }

    /// Size every internal buffer for documents up to `capacity` bytes and
    /// `max_depth` levels of nesting.
    ///
    /// Parses of conforming documents after a successful `allocate` perform
    /// zero allocation. Fails with [`Error::MemAlloc`] if the system refuses
    /// the reservation.
    pub fn allocate(&mut self, capacity: usize, max_depth: usize) -> Result<(), Error> {
        self.reserve_buffers(capacity, max_depth)?;
        self.fixed_capacity = true;
        Ok(())
    }

    fn reserve_buffers(&mut self, capacity: usize, max_depth: usize) -> Result<(), Error> {
        self.input.try_reserve(capacity)?;
        // one structural per input byte at worst
        reserve_total(&mut self.structurals, capacity)?;
        // densest tape: alternating one-byte scalars and commas, plus sentinels
        reserve_total(&mut self.tape, capacity + 4)?;
        // every decoded string costs its bytes plus a 4-byte prefix
        reserve_total(&mut self.strings, 5 * capacity / 3 + PADDING)?;
        reserve_total(&mut self.stack, max_depth)?;

        self.capacity = capacity;
        self.max_depth = max_depth;
        Ok(())
    }

    /// Grow to at least `capacity` unless the capacity was fixed, and
    /// re-acquire any buffers handed out by `parse_owned`.
    pub(crate) fn ensure_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        if capacity > self.capacity {
            if self.fixed_capacity {
                return Err(Error::Capacity);
            }
            self.reserve_buffers(capacity, self.max_depth)
        } else {
            self.reserve_buffers(self.capacity, self.max_depth)
        }
    }

    /// The largest document this parser can handle without reallocating.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The deepest legal nesting of objects and arrays.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether the last parse produced a valid document.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The sticky error from the last parse.
    ///
    /// `Some(Error::Uninitialized)` before the first parse, `None` after a
    /// successful one.
    pub fn last_error(&self) -> Option<Error> {
        self.error
    }

    /// Number of structural indexes stage 1 found in the last input.
    pub fn n_structural_indexes(&self) -> usize {
        self.structurals.len()
    }

    /// The document from the last successful parse.
    ///
    /// Borrows the parser immutably, so it can be combined with the other
    /// accessors. Fails with the sticky error while the parser is invalid.
    pub fn document(&self) -> Result<DocumentRef<'_>, Error> {
        if self.valid {
            Ok(DocumentRef {
                tape: &self.tape,
                strings: &self.strings,
            })
        } else {
            Err(self.error.unwrap_or(Error::Uninitialized))
        }
    }

    /// Parse one JSON document, copying it into the internal padded buffer.
    ///
    /// The returned view borrows the parser and is invalidated by the next
    /// parse.
    pub fn parse(&mut self, json: &[u8]) -> Result<DocumentRef<'_>, Error> {
        match self.parse_inner(json) {
            Ok(()) => {
                self.valid = true;
                self.error = None;
                Ok(DocumentRef {
                    tape: &self.tape,
                    strings: &self.strings,
                })
            }
            Err(error) => {
                self.valid = false;
                self.error = Some(error);
                Err(error)
            }
        }
    }

    /// Parse a document that is already padded, without copying it.
    pub fn parse_padded(&mut self, json: &PaddedBytes) -> Result<DocumentRef<'_>, Error> {
        match self.parse_padded_inner(json) {
            Ok(()) => {
                self.valid = true;
                self.error = None;
                Ok(DocumentRef {
                    tape: &self.tape,
                    strings: &self.strings,
                })
            }
            Err(error) => {
                self.valid = false;
                self.error = Some(error);
                Err(error)
            }
        }
    }

    /// Parse one document and transfer its buffers into an owned
    /// [`Document`].
    ///
    /// The parser re-acquires tape and string storage on its next parse.
    pub fn parse_owned(&mut self, json: &[u8]) -> Result<Document, Error> {
        self.parse(json)?;
        self.valid = false;
        Ok(Document {
            tape: mem::take(&mut self.tape),
            strings: mem::take(&mut self.strings),
        })
    }

    /// Parse a buffer holding a whitespace-separated sequence of documents.
    ///
    /// `batch_size` must exceed the largest single document. Documents are
    /// yielded lazily, in buffer order; iteration stops after the first
    /// error.
    pub fn parse_many<'p>(&'p mut self, json: &'p [u8], batch_size: usize) -> DocumentStream<'p> {
        DocumentStream::new(self, json, batch_size)
    }

    fn parse_inner(&mut self, json: &[u8]) -> Result<(), Error> {
        self.init_parse(json.len())?;
        self.input.set(json);
        let limit = self.input.len();
        Self::run_stages(
            &self.input,
            limit,
            &mut self.structurals,
            &mut self.tape,
            &mut self.strings,
            &mut self.stack,
            self.max_depth,
        )
    }

    fn parse_padded_inner(&mut self, json: &PaddedBytes) -> Result<(), Error> {
        self.init_parse(json.len())?;
        Self::run_stages(
            json,
            json.len(),
            &mut self.structurals,
            &mut self.tape,
            &mut self.strings,
            &mut self.stack,
            self.max_depth,
        )
    }

    /// Pre-parse checks shared by every entry point.
    fn init_parse(&mut self, len: usize) -> Result<(), Error> {
        if len > u32::MAX as usize {
            // structural offsets are 32-bit
            return Err(Error::Capacity);
        }
        self.ensure_capacity(len)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_stages(
        input: &PaddedBytes,
        limit: usize,
        structurals: &mut Vec<u32>,
        tape: &mut Vec<u64>,
        strings: &mut Vec<u8>,
        stack: &mut Vec<Scope>,
        max_depth: usize,
    ) -> Result<(), Error> {
        structurals.clear();
        let open_string = stage1::scan(input, 0, limit, structurals, true)?;
        if open_string {
            return Err(Error::UnclosedString);
        }
        stage2::build(
            input.storage(),
            limit,
            structurals,
            tape,
            strings,
            stack,
            max_depth,
        )
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}
