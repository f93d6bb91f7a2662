//! Streaming UTF-8 validation.
//!
//! An explicit DFA over the UTF-8 byte grammar of RFC 3629. The state fits
//! in one byte and carries across stage-1 blocks, so multi-byte sequences
//! that straddle a block boundary validate correctly. Overlong encodings,
//! surrogate code points, values above U+10FFFF, and truncated sequences are
//! all rejected.

use crate::error::Error;

/// DFA states: how many continuation bytes remain, plus the constrained
/// second-byte states for the boundary lead bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At a character boundary.
    Accept,
    /// One continuation byte (0x80..=0xBF) remains.
    One,
    /// Two generic continuation bytes remain.
    Two,
    /// After 0xE0: next byte must be 0xA0..=0xBF (rejects overlong 3-byte).
    TwoE0,
    /// After 0xED: next byte must be 0x80..=0x9F (rejects surrogates).
    TwoEd,
    /// Three generic continuation bytes remain.
    Three,
    /// After 0xF0: next byte must be 0x90..=0xBF (rejects overlong 4-byte).
    ThreeF0,
    /// After 0xF4: next byte must be 0x80..=0x8F (rejects > U+10FFFF).
    ThreeF4,
}

#[inline]
fn step(state: State, byte: u8) -> Option<State> {
    match state {
        State::Accept => match byte {
            0x00..=0x7F => Some(State::Accept),
            0xC2..=0xDF => Some(State::One),
            0xE0 => Some(State::TwoE0),
            0xE1..=0xEC | 0xEE..=0xEF => Some(State::Two),
            0xED => Some(State::TwoEd),
            0xF0 => Some(State::ThreeF0),
            0xF1..=0xF3 => Some(State::Three),
            0xF4 => Some(State::ThreeF4),
            _ => None,
        },
        State::One => match byte {
            0x80..=0xBF => Some(State::Accept),
            _ => None,
        },
        State::Two => match byte {
            0x80..=0xBF => Some(State::One),
            _ => None,
        },
        State::TwoE0 => match byte {
            0xA0..=0xBF => Some(State::One),
            _ => None,
        },
        State::TwoEd => match byte {
            0x80..=0x9F => Some(State::One),
            _ => None,
        },
        State::Three => match byte {
            0x80..=0xBF => Some(State::Two),
            _ => None,
        },
        State::ThreeF0 => match byte {
            0x90..=0xBF => Some(State::Two),
            _ => None,
        },
        State::ThreeF4 => match byte {
            0x80..=0x8F => Some(State::Two),
            _ => None,
        },
    }
}

/// Incremental UTF-8 validator.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    state: State,
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            state: State::Accept,
        }
    }

    /// Whether the validator is at a character boundary.
    ///
    /// All-ASCII input keeps an accepting validator accepting, which is what
    /// lets stage 1 skip clean blocks.
    #[inline]
    pub fn is_accept(&self) -> bool {
        self.state == State::Accept
    }

    /// Feed a run of bytes.
    pub fn update(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            match step(self.state, byte) {
                Some(next) => self.state = next,
                None => return Err(Error::Utf8Error),
            }
        }
        Ok(())
    }

    /// Check that the input did not end in the middle of a sequence.
    pub fn finish(&self) -> Result<(), Error> {
        if self.is_accept() {
            Ok(())
        } else {
            Err(Error::Utf8Error)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new()
    }
}

/// Validate a whole buffer in one call.
pub fn validate(bytes: &[u8]) -> Result<(), Error> {
    let mut validator = Validator::new();
    validator.update(bytes)?;
    validator.finish()
}
