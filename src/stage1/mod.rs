//! Stage 1: structural indexing.
//!
//! The input is consumed in 64-byte blocks. An architecture-specific
//! classifier turns each block into a set of 64-bit character-class masks
//! (one bit per byte), and a branch-free mask pipeline derives from those:
//!
//! 1. the escaped-character mask, from odd-length backslash runs (one bit of
//!    carry between blocks),
//! 2. the string-interior mask, as a prefix XOR over unescaped quotes (one
//!    bit of carry: the open/closed parity),
//! 3. structural characters outside strings, plus opening quotes, plus the
//!    first byte of every primitive token.
//!
//! Set bits are flattened into a stream of 32-bit byte offsets. UTF-8 is
//! validated in the same pass with a one-byte state carried between blocks;
//! all-ASCII blocks skip the validator entirely.
//!
//! The vectorized character classification is influenced by:
//! - Langdale & Lemire, ["Parsing Gigabytes of JSON per Second"](https://arxiv.org/abs/1902.08318) (2019)
//!
//! ## Instruction set levels
//!
//! - x86_64: SSE2 (baseline, 4×16 bytes per block) or AVX2 (2×32 bytes per
//!   block), selected at runtime when `std` is available
//! - aarch64: NEON (4×16 bytes per block), mandatory on all aarch64
//! - elsewhere: a portable scalar classifier producing the same masks

#[cfg(not(test))]
use alloc::vec::Vec;

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "aarch64")]
pub mod neon;
pub mod scalar;
#[cfg(target_arch = "x86_64")]
pub mod sse2;
pub mod utf8;

use crate::error::Error;
use crate::padded::PaddedBytes;

/// Width of one classification block in bytes.
pub const BLOCK: usize = 64;

/// Character-class bitmasks for one 64-byte block; bit `i` describes byte `i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockClass {
    /// Bytes equal to `\`.
    pub backslash: u64,
    /// Bytes equal to `"`.
    pub quote: u64,
    /// Bytes in `{ } [ ] , :`.
    pub op: u64,
    /// JSON whitespace: space, tab, line feed, carriage return.
    pub ws: u64,
    /// Bytes with the high bit set.
    pub non_ascii: u64,
}

// ============================================================================
// Runtime dispatch (requires std); static baseline otherwise
// ============================================================================

// Priority: AVX2 > SSE2
#[cfg(all(target_arch = "x86_64", any(test, feature = "std")))]
fn classifier() -> fn(&[u8]) -> BlockClass {
    if is_x86_feature_detected!("avx2") {
        avx2::classify_block
    } else {
        sse2::classify_block
    }
}

// Without std, default to SSE2 (universally available on x86_64)
#[cfg(all(target_arch = "x86_64", not(any(test, feature = "std"))))]
fn classifier() -> fn(&[u8]) -> BlockClass {
    sse2::classify_block
}

#[cfg(target_arch = "aarch64")]
fn classifier() -> fn(&[u8]) -> BlockClass {
    neon::classify_block
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn classifier() -> fn(&[u8]) -> BlockClass {
    scalar::classify_block
}

// ============================================================================
// Mask pipeline
// ============================================================================

const EVEN_BITS: u64 = 0x5555_5555_5555_5555;
const ODD_BITS: u64 = !EVEN_BITS;

/// Mask of characters escaped by an odd-length run of backslashes.
///
/// `prev_ends_odd` carries whether the previous block ended inside an
/// odd-length backslash run; it is 0 or 1.
#[inline]
fn odd_backslash_sequences(backslash: u64, prev_ends_odd: &mut u64) -> u64 {
    let start_edges = backslash & !(backslash << 1);
    // a run continuing from the previous block flips the parity of a start
    // at bit 0
    let even_start_mask = EVEN_BITS ^ *prev_ends_odd;
    let even_starts = start_edges & even_start_mask;
    let odd_starts = start_edges & !even_start_mask;

    let even_carries = backslash.wrapping_add(even_starts);
    let (odd_carries, ends_odd) = backslash.overflowing_add(odd_starts);
    let odd_carries = odd_carries | *prev_ends_odd;
    *prev_ends_odd = ends_odd as u64;

    let even_carry_ends = even_carries & !backslash;
    let odd_carry_ends = odd_carries & !backslash;
    let even_start_odd_end = even_carry_ends & ODD_BITS;
    let odd_start_even_end = odd_carry_ends & EVEN_BITS;
    even_start_odd_end | odd_start_even_end
}

/// Cumulative XOR: bit `i` of the result is the parity of bits `0..=i`.
#[inline]
fn prefix_xor(bitmask: u64) -> u64 {
    let mut x = bitmask;
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x ^= x << 16;
    x ^= x << 32;
    x
}

/// Scan `input[from..to]`, appending the absolute byte offset of every
/// structural character to `out`.
///
/// Returns whether a string is still open at `to` (the string parity carry).
/// When `check_utf8` is set the same pass validates that `input[from..to]` is
/// well-formed UTF-8; a sequence truncated at `to` is an error, so callers
/// scanning a window that may split a document should validate the whole
/// input separately instead.
pub fn scan(
    input: &PaddedBytes,
    from: usize,
    to: usize,
    out: &mut Vec<u32>,
    check_utf8: bool,
) -> Result<bool, Error> {
    let storage = input.storage();
    let classify = classifier();

    let mut prev_ends_odd_backslash = 0u64;
    let mut prev_in_string = 0u64; // all ones while inside a string
    let mut prev_follows_pred = 1u64; // start of input behaves like whitespace
    let mut utf8 = utf8::Validator::new();

    let mut block_start = from;
    while block_start < to {
        let block = &storage[block_start..];
        let mut class = classify(block);

        // drop bits past `to` in the final block
        let valid = (to - block_start).min(BLOCK);
        let keep = if valid < BLOCK {
            (1u64 << valid) - 1
        } else {
            u64::MAX
        };
        class.backslash &= keep;
        class.quote &= keep;
        class.op &= keep;
        class.ws &= keep;
        class.non_ascii &= keep;

        if check_utf8 && (class.non_ascii != 0 || !utf8.is_accept()) {
            utf8.update(&block[..valid])?;
        }

        let odd_ends = odd_backslash_sequences(class.backslash, &mut prev_ends_odd_backslash);
        let quote = class.quote & !odd_ends;
        let in_string = prefix_xor(quote) ^ prev_in_string;
        prev_in_string = ((in_string as i64) >> 63) as u64;

        let mut structurals = class.op & !in_string;
        structurals |= quote;

        // the first byte of every primitive follows whitespace or a structural
        let pred = structurals | class.ws;
        let follows = (pred << 1) | prev_follows_pred;
        prev_follows_pred = pred >> 63;
        structurals |= follows & !class.ws & !in_string;

        // closing quotes are not structural
        structurals &= !(quote & !in_string);

        let mut bits = structurals & keep;
        while bits != 0 {
            out.push((block_start + bits.trailing_zeros() as usize) as u32);
            bits &= bits - 1;
        }

        block_start += BLOCK;
    }

    if check_utf8 {
        utf8.finish()?;
    }

    Ok(prev_in_string != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(json: &str) -> Vec<u32> {
        let padded = PaddedBytes::from(json);
        let mut out = Vec::new();
        scan(&padded, 0, padded.len(), &mut out, true).unwrap();
        out
    }

    fn tokens(json: &str) -> Vec<u8> {
        offsets(json)
            .into_iter()
            .map(|i| json.as_bytes()[i as usize])
            .collect()
    }

    #[test]
    fn test_prefix_xor() {
        assert_eq!(prefix_xor(0), 0);
        // quote at bit 1 and bit 4: bits 1..=3 are inside the string
        assert_eq!(prefix_xor(0b10010), 0b01110);
    }

    #[test]
    fn test_odd_backslash_sequences() {
        let mut carry = 0;
        // `\"` at bits 0,1: the quote at bit 1 is escaped
        let escaped = odd_backslash_sequences(0b01, &mut carry);
        assert_eq!(escaped, 0b10);
        assert_eq!(carry, 0);

        // `\\"`: even run, the quote at bit 2 is not escaped
        let mut carry = 0;
        let escaped = odd_backslash_sequences(0b011, &mut carry);
        assert_eq!(escaped, 0);

        // `\\\"`: odd run, the quote at bit 3 is escaped
        let mut carry = 0;
        let escaped = odd_backslash_sequences(0b0111, &mut carry);
        assert_eq!(escaped, 0b1000);
    }

    #[test]
    fn test_odd_backslash_carry_across_blocks() {
        // block ends with a single backslash at bit 63
        let mut carry = 0;
        odd_backslash_sequences(1u64 << 63, &mut carry);
        assert_eq!(carry, 1);
        // the first byte of the next block is escaped
        let escaped = odd_backslash_sequences(0, &mut carry);
        assert_eq!(escaped & 1, 1);
        assert_eq!(carry, 0);
    }

    #[test]
    fn test_simple_object() {
        // pos:  0123456
        //       {"a":1}
        assert_eq!(offsets(r#"{"a":1}"#), vec![0, 1, 4, 5, 6]);
        assert_eq!(tokens(r#"{"a":1}"#), b"{\":1}");
    }

    #[test]
    fn test_array_of_numbers() {
        assert_eq!(offsets("[1,2,3]"), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_closing_quotes_not_structural() {
        // only the opening quote of each string is emitted
        assert_eq!(tokens(r#"["ab","cd"]"#), b"[\",\"]");
    }

    #[test]
    fn test_structural_chars_inside_strings_ignored() {
        assert_eq!(tokens(r#"["a{b}:,c"]"#), b"[\"]");
    }

    #[test]
    fn test_escaped_quote_does_not_close_string() {
        assert_eq!(tokens(r#"["a\"b"]"#), b"[\"]");
    }

    #[test]
    fn test_even_backslash_run_closes_string() {
        // "a\\" is a complete string: the quote after the run is real
        let json = r#"["a\\",1]"#;
        assert_eq!(tokens(json), b"[\",1]");
    }

    #[test]
    fn test_primitive_starts_marked() {
        assert_eq!(tokens("[true,false,null,-1,2.5]"), b"[t,f,n,-,2]");
    }

    #[test]
    fn test_top_level_primitive_marked() {
        assert_eq!(offsets("123"), vec![0]);
        assert_eq!(offsets("  123"), vec![2]);
    }

    #[test]
    fn test_open_string_parity() {
        let padded = PaddedBytes::from(r#"["abc"#);
        let mut out = Vec::new();
        let open = scan(&padded, 0, padded.len(), &mut out, true).unwrap();
        assert!(open);

        let padded = PaddedBytes::from(r#"["abc"]"#);
        let mut out = Vec::new();
        let open = scan(&padded, 0, padded.len(), &mut out, true).unwrap();
        assert!(!open);
    }

    #[test]
    fn test_string_spanning_blocks() {
        // a string crossing the 64-byte block boundary keeps its interior
        // masked in the second block
        let mut json = String::from("[\"");
        json.push_str(&"x".repeat(90));
        json.push_str("\",{}]");
        let toks = tokens(&json);
        assert_eq!(toks, b"[\",{}]");
    }

    #[test]
    fn test_whitespace_only_input() {
        assert_eq!(offsets("  \t\n  "), Vec::<u32>::new());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let padded = PaddedBytes::from_slice(&[b'"', 0xFF, b'"']);
        let mut out = Vec::new();
        let err = scan(&padded, 0, padded.len(), &mut out, true).unwrap_err();
        assert_eq!(err, Error::Utf8Error);
    }

    #[test]
    fn test_utf8_skipped_when_disabled() {
        let padded = PaddedBytes::from_slice(&[b'"', 0xFF, b'"']);
        let mut out = Vec::new();
        assert!(scan(&padded, 0, padded.len(), &mut out, false).is_ok());
    }

    #[test]
    fn test_scan_window_with_offset() {
        // scanning a sub-window emits absolute offsets
        let padded = PaddedBytes::from("{}  []");
        let mut out = Vec::new();
        scan(&padded, 4, 6, &mut out, false).unwrap();
        assert_eq!(out, vec![4, 5]);
    }

    #[test]
    fn test_spec_example_structural_count() {
        // 9 delimiters + 2 opening quotes + 4 primitive starts
        assert_eq!(offsets(r#"{"a":1,"b":[true,null,2.5]}"#).len(), 15);
    }
}
