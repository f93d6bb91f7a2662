//! Over-allocated input buffers.
//!
//! Stage 1 consumes the input in fixed 64-byte blocks and stage 2 reads
//! literals and numbers with small fixed-width lookaheads. Both are allowed
//! to read past the logical end of the document, so input is kept in a
//! [`PaddedBytes`] buffer whose storage always extends [`PADDING`] bytes past
//! its logical length. The padding bytes are zero, which every scanner in the
//! crate treats as a token terminator.

#[cfg(not(test))]
use alloc::vec::Vec;

use core::fmt;
use core::ops::Deref;

/// Readable bytes guaranteed past the logical end of a padded buffer.
///
/// At least one full stage-1 block, so block loads never touch unowned
/// memory.
pub const PADDING: usize = 64;

/// A byte buffer with `PADDING` addressable zero bytes after its contents.
#[derive(Clone, Default)]
pub struct PaddedBytes {
    buf: Vec<u8>,
    len: usize,
}

impl PaddedBytes {
    /// Create an empty padded buffer.
    pub fn new() -> Self {
        PaddedBytes {
            buf: Vec::new(),
            len: 0,
        }
    }

    /// Copy `json` into a fresh padded buffer.
    pub fn from_slice(json: &[u8]) -> Self {
        let mut padded = PaddedBytes::new();
        padded.set(json);
        padded
    }

    /// Take ownership of `json`, extending it in place with padding.
    pub fn from_vec(mut json: Vec<u8>) -> Self {
        let len = json.len();
        json.resize(len + PADDING, 0);
        PaddedBytes { buf: json, len }
    }

    /// Read a file into a padded buffer.
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        Ok(PaddedBytes::from_vec(std::fs::read(path)?))
    }

    /// Logical length in bytes, excluding padding.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the logical contents are empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replace the contents, reusing the existing allocation when possible.
    pub(crate) fn set(&mut self, json: &[u8]) {
        self.buf.clear();
        self.buf.reserve(json.len() + PADDING);
        self.buf.extend_from_slice(json);
        self.buf.resize(json.len() + PADDING, 0);
        self.len = json.len();
    }

    /// Grow the backing allocation to hold `capacity` content bytes.
    pub(crate) fn try_reserve(&mut self, capacity: usize) -> Result<(), crate::Error> {
        let total = capacity + PADDING;
        if total > self.buf.capacity() {
            self.buf
                .try_reserve_exact(total - self.buf.len())
                .map_err(|_| crate::Error::MemAlloc)?;
        }
        Ok(())
    }

    /// The full backing storage: `len() + PADDING` readable bytes.
    pub(crate) fn storage(&self) -> &[u8] {
        &self.buf
    }
}

impl Deref for PaddedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl From<&[u8]> for PaddedBytes {
    fn from(json: &[u8]) -> Self {
        PaddedBytes::from_slice(json)
    }
}

impl From<&str> for PaddedBytes {
    fn from(json: &str) -> Self {
        PaddedBytes::from_slice(json.as_bytes())
    }
}

impl From<Vec<u8>> for PaddedBytes {
    fn from(json: Vec<u8>) -> Self {
        PaddedBytes::from_vec(json)
    }
}

impl fmt::Debug for PaddedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaddedBytes").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_is_addressable_and_zero() {
        let padded = PaddedBytes::from_slice(b"{}");
        assert_eq!(padded.len(), 2);
        assert_eq!(padded.storage().len(), 2 + PADDING);
        assert!(padded.storage()[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_deref_excludes_padding() {
        let padded = PaddedBytes::from("[1,2]");
        assert_eq!(&*padded, b"[1,2]");
    }

    #[test]
    fn test_from_vec_keeps_contents() {
        let padded = PaddedBytes::from_vec(b"null".to_vec());
        assert_eq!(&*padded, b"null");
        assert_eq!(padded.storage().len(), 4 + PADDING);
    }

    #[test]
    fn test_set_reuses_allocation() {
        let mut padded = PaddedBytes::from_slice(&[b'x'; 256]);
        let ptr = padded.storage().as_ptr();
        padded.set(b"{}");
        assert_eq!(&*padded, b"{}");
        assert_eq!(padded.storage().as_ptr(), ptr);
    }

    #[test]
    fn test_empty_buffer_still_padded() {
        let padded = PaddedBytes::from_slice(b"");
        assert!(padded.is_empty());
        assert_eq!(padded.storage().len(), PADDING);
    }
}
