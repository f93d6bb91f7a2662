//! AVX2 block classification for x86_64.
//!
//! Processes a 64-byte block as two 32-byte chunks. AVX2 is available on
//! Intel Haswell (2013+) and AMD Excavator (2015+); callers select it at
//! runtime.

use core::arch::x86_64::*;

use super::{BlockClass, BLOCK};

/// ASCII byte constants
const DOUBLE_QUOTE: i8 = b'"' as i8;
const BACKSLASH: i8 = b'\\' as i8;
const OPEN_BRACE: i8 = b'{' as i8;
const CLOSE_BRACE: i8 = b'}' as i8;
const OPEN_BRACKET: i8 = b'[' as i8;
const CLOSE_BRACKET: i8 = b']' as i8;
const COMMA: i8 = b',' as i8;
const COLON: i8 = b':' as i8;
const SPACE: i8 = b' ' as i8;
const TAB: i8 = b'\t' as i8;
const LINE_FEED: i8 = b'\n' as i8;
const CARRIAGE_RETURN: i8 = b'\r' as i8;

/// Character-class masks for a 32-byte chunk.
#[derive(Debug, Clone, Copy)]
struct ChunkClass {
    quote: u32,
    backslash: u32,
    op: u32,
    ws: u32,
    non_ascii: u32,
}

/// Classify 32 bytes at once using AVX2.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn classify_chunk(chunk: __m256i) -> ChunkClass {
    unsafe {
        let v_quote = _mm256_set1_epi8(DOUBLE_QUOTE);
        let v_backslash = _mm256_set1_epi8(BACKSLASH);
        let v_open_brace = _mm256_set1_epi8(OPEN_BRACE);
        let v_close_brace = _mm256_set1_epi8(CLOSE_BRACE);
        let v_open_bracket = _mm256_set1_epi8(OPEN_BRACKET);
        let v_close_bracket = _mm256_set1_epi8(CLOSE_BRACKET);
        let v_comma = _mm256_set1_epi8(COMMA);
        let v_colon = _mm256_set1_epi8(COLON);
        let v_space = _mm256_set1_epi8(SPACE);
        let v_tab = _mm256_set1_epi8(TAB);
        let v_line_feed = _mm256_set1_epi8(LINE_FEED);
        let v_carriage_return = _mm256_set1_epi8(CARRIAGE_RETURN);

        let eq_quote = _mm256_cmpeq_epi8(chunk, v_quote);
        let eq_backslash = _mm256_cmpeq_epi8(chunk, v_backslash);
        let eq_open_brace = _mm256_cmpeq_epi8(chunk, v_open_brace);
        let eq_close_brace = _mm256_cmpeq_epi8(chunk, v_close_brace);
        let eq_open_bracket = _mm256_cmpeq_epi8(chunk, v_open_bracket);
        let eq_close_bracket = _mm256_cmpeq_epi8(chunk, v_close_bracket);
        let eq_comma = _mm256_cmpeq_epi8(chunk, v_comma);
        let eq_colon = _mm256_cmpeq_epi8(chunk, v_colon);
        let eq_space = _mm256_cmpeq_epi8(chunk, v_space);
        let eq_tab = _mm256_cmpeq_epi8(chunk, v_tab);
        let eq_line_feed = _mm256_cmpeq_epi8(chunk, v_line_feed);
        let eq_carriage_return = _mm256_cmpeq_epi8(chunk, v_carriage_return);

        let braces = _mm256_or_si256(eq_open_brace, eq_close_brace);
        let brackets = _mm256_or_si256(eq_open_bracket, eq_close_bracket);
        let delims = _mm256_or_si256(eq_comma, eq_colon);
        let op = _mm256_or_si256(_mm256_or_si256(braces, brackets), delims);

        let blanks = _mm256_or_si256(eq_space, eq_tab);
        let breaks = _mm256_or_si256(eq_line_feed, eq_carriage_return);
        let ws = _mm256_or_si256(blanks, breaks);

        ChunkClass {
            quote: _mm256_movemask_epi8(eq_quote) as u32,
            backslash: _mm256_movemask_epi8(eq_backslash) as u32,
            op: _mm256_movemask_epi8(op) as u32,
            ws: _mm256_movemask_epi8(ws) as u32,
            // movemask reads the sign bit of each byte directly
            non_ascii: _mm256_movemask_epi8(chunk) as u32,
        }
    }
}

/// Classify the first 64 bytes of `block` using AVX2.
///
/// # Safety note
///
/// The caller must have verified that AVX2 is available; the dispatcher in
/// [`crate::stage1`] does this with `is_x86_feature_detected!`.
pub fn classify_block(block: &[u8]) -> BlockClass {
    debug_assert!(block.len() >= BLOCK);
    unsafe { classify_block_avx2(block) }
}

#[target_feature(enable = "avx2")]
unsafe fn classify_block_avx2(block: &[u8]) -> BlockClass {
    unsafe {
        let lo = _mm256_loadu_si256(block.as_ptr() as *const __m256i);
        let hi = _mm256_loadu_si256(block.as_ptr().add(32) as *const __m256i);
        let lo = classify_chunk(lo);
        let hi = classify_chunk(hi);
        BlockClass {
            quote: (lo.quote as u64) | ((hi.quote as u64) << 32),
            backslash: (lo.backslash as u64) | ((hi.backslash as u64) << 32),
            op: (lo.op as u64) | ((hi.op as u64) << 32),
            ws: (lo.ws as u64) | ((hi.ws as u64) << 32),
            non_ascii: (lo.non_ascii as u64) | ((hi.non_ascii as u64) << 32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage1::scalar;

    fn block_from(text: &[u8]) -> [u8; BLOCK] {
        let mut block = [b' '; BLOCK];
        block[..text.len()].copy_from_slice(text);
        block
    }

    fn avx2_available() -> bool {
        is_x86_feature_detected!("avx2")
    }

    #[test]
    fn test_avx2_matches_scalar_simple_object() {
        if !avx2_available() {
            return;
        }
        let block = block_from(br#"{"name":"value","items":[1,2,3],"ok":true}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_avx2_matches_scalar_cross_lane() {
        if !avx2_available() {
            return;
        }
        // structural characters on both sides of the 32-byte lane boundary
        let block = block_from(br#"{"aaaaaaaaaaaaaaaaaaaaaaaaaaa":"b\"c","d":[null]}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_avx2_matches_scalar_all_byte_values() {
        if !avx2_available() {
            return;
        }
        let mut block = [0u8; BLOCK];
        for start in (0..=255u8).step_by(BLOCK) {
            for (i, byte) in block.iter_mut().enumerate() {
                *byte = start.wrapping_add(i as u8);
            }
            assert_eq!(classify_block(&block), scalar::classify_block(&block));
        }
    }
}
