//! Stage 2: the tape builder.
//!
//! Consumes the structural offsets from stage 1 left to right, drives a
//! grammar-validating pushdown automaton, parses each scalar at its offset,
//! and writes the tape. The stack records, for every open container, the
//! tape index of its opening word; that word is back-patched with the index
//! of the matching close when the container ends.

pub(crate) mod number;
pub(crate) mod string;

#[cfg(not(test))]
use alloc::vec::Vec;

use crate::error::Error;
use crate::tape::{new_word, TapeType};

use self::number::ParsedNumber;

/// The kind of an open container on the scope stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// One open container: what it is and where its opening word sits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    open_index: u32,
    container: Container,
}

/// Automaton states, keyed on the first byte at each structural offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartRoot,
    ExpectValue,
    ExpectValueOrEndArray,
    ExpectKey,
    ExpectKeyOrEndObject,
    ExpectColon,
    ExpectCommaOrEndArray,
    ExpectCommaOrEndObject,
    Done,
}

struct TapeBuilder<'a> {
    buf: &'a [u8],
    limit: usize,
    tape: &'a mut Vec<u64>,
    strings: &'a mut Vec<u8>,
    stack: &'a mut Vec<Scope>,
    max_depth: usize,
}

/// Build the tape for the document whose structural offsets are `structurals`.
///
/// `buf` is the padded backing storage and `limit` the logical end of the
/// document (string scans must not cross it). The output buffers are cleared
/// first; on error their contents are unspecified and the caller must not
/// expose them.
pub(crate) fn build(
    buf: &[u8],
    limit: usize,
    structurals: &[u32],
    tape: &mut Vec<u64>,
    strings: &mut Vec<u8>,
    stack: &mut Vec<Scope>,
    max_depth: usize,
) -> Result<(), Error> {
    tape.clear();
    strings.clear();
    stack.clear();

    if structurals.is_empty() {
        return Err(Error::Empty);
    }

    let mut builder = TapeBuilder {
        buf,
        limit,
        tape,
        strings,
        stack,
        max_depth,
    };
    builder.run(structurals)
}

impl<'a> TapeBuilder<'a> {
    fn run(&mut self, structurals: &[u32]) -> Result<(), Error> {
        // root sentinel, patched when the document closes
        self.tape.push(new_word(TapeType::Root, 0));

        let mut state = State::StartRoot;
        for &structural in structurals {
            let offset = structural as usize;
            let byte = self.buf[offset];
            state = match state {
                State::StartRoot | State::ExpectValue => self.on_value(byte, offset)?,
                State::ExpectValueOrEndArray => {
                    if byte == b']' {
                        self.close(Container::Array)?
                    } else {
                        self.on_value(byte, offset)?
                    }
                }
                State::ExpectKey => match byte {
                    b'"' => {
                        self.push_string(offset)?;
                        State::ExpectColon
                    }
                    _ => return Err(Error::TapeError),
                },
                State::ExpectKeyOrEndObject => match byte {
                    b'"' => {
                        self.push_string(offset)?;
                        State::ExpectColon
                    }
                    b'}' => self.close(Container::Object)?,
                    _ => return Err(Error::TapeError),
                },
                State::ExpectColon => match byte {
                    b':' => State::ExpectValue,
                    _ => return Err(Error::TapeError),
                },
                State::ExpectCommaOrEndArray => match byte {
                    b',' => State::ExpectValue,
                    b']' => self.close(Container::Array)?,
                    _ => return Err(Error::TapeError),
                },
                State::ExpectCommaOrEndObject => match byte {
                    b',' => State::ExpectKey,
                    b'}' => self.close(Container::Object)?,
                    _ => return Err(Error::TapeError),
                },
                // trailing content after the root value
                State::Done => return Err(Error::TapeError),
            };
        }

        if state != State::Done {
            return Err(Error::TapeError);
        }

        let close_index = self.tape.len() as u64;
        self.tape[0] = new_word(TapeType::Root, close_index);
        self.tape.push(new_word(TapeType::Root, 0));
        Ok(())
    }

    /// Handle one value token and return the state that follows it.
    fn on_value(&mut self, byte: u8, offset: usize) -> Result<State, Error> {
        match byte {
            b'{' => {
                self.open(Container::Object)?;
                return Ok(State::ExpectKeyOrEndObject);
            }
            b'[' => {
                self.open(Container::Array)?;
                return Ok(State::ExpectValueOrEndArray);
            }
            b'"' => self.push_string(offset)?,
            b'-' | b'+' | b'0'..=b'9' => {
                match number::parse_number(self.buf, offset)? {
                    ParsedNumber::Int64(value) => {
                        self.tape.push(new_word(TapeType::Int64, 0));
                        self.tape.push(value as u64);
                    }
                    ParsedNumber::UInt64(value) => {
                        self.tape.push(new_word(TapeType::UInt64, 0));
                        self.tape.push(value);
                    }
                    ParsedNumber::Double(value) => {
                        self.tape.push(new_word(TapeType::Double, 0));
                        self.tape.push(value.to_bits());
                    }
                }
            }
            b't' => {
                self.check_atom(offset, b"true", Error::TrueAtomError)?;
                self.tape.push(new_word(TapeType::True, 0));
            }
            b'f' => {
                self.check_atom(offset, b"false", Error::FalseAtomError)?;
                self.tape.push(new_word(TapeType::False, 0));
            }
            b'n' => {
                self.check_atom(offset, b"null", Error::NullAtomError)?;
                self.tape.push(new_word(TapeType::Null, 0));
            }
            _ => return Err(Error::TapeError),
        }
        Ok(self.post_value_state())
    }

    fn post_value_state(&self) -> State {
        match self.stack.last() {
            None => State::Done,
            Some(scope) if scope.container == Container::Array => State::ExpectCommaOrEndArray,
            Some(_) => State::ExpectCommaOrEndObject,
        }
    }

    fn open(&mut self, container: Container) -> Result<(), Error> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::DepthError);
        }
        let tag = match container {
            Container::Object => TapeType::StartObject,
            Container::Array => TapeType::StartArray,
        };
        self.stack.push(Scope {
            open_index: self.tape.len() as u32,
            container,
        });
        self.tape.push(new_word(tag, 0));
        Ok(())
    }

    fn close(&mut self, container: Container) -> Result<State, Error> {
        let scope = self.stack.pop().ok_or(Error::TapeError)?;
        debug_assert_eq!(scope.container, container);
        let (open_tag, close_tag) = match container {
            Container::Object => (TapeType::StartObject, TapeType::EndObject),
            Container::Array => (TapeType::StartArray, TapeType::EndArray),
        };
        let close_index = self.tape.len() as u64;
        self.tape[scope.open_index as usize] = new_word(open_tag, close_index);
        self.tape.push(new_word(close_tag, scope.open_index as u64));
        Ok(self.post_value_state())
    }

    fn push_string(&mut self, offset: usize) -> Result<(), Error> {
        let payload = string::parse_string(self.buf, offset, self.limit, self.strings)?;
        self.tape.push(new_word(TapeType::String, payload));
        Ok(())
    }

    fn check_atom(&self, offset: usize, atom: &'static [u8], error: Error) -> Result<(), Error> {
        if &self.buf[offset..offset + atom.len()] != atom {
            return Err(error);
        }
        if !number::is_terminator(self.buf[offset + atom.len()]) {
            return Err(error);
        }
        Ok(())
    }
}
