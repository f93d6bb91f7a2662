//! SSE2 block classification for x86_64.
//!
//! Processes a 64-byte block as four 16-byte chunks. SSE2 is universally
//! available on all x86_64 processors.

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

/// Character-class masks for a 16-byte chunk.
#[derive(Debug, Clone, Copy)]
struct ChunkClass {
    quote: u16,
    backslash: u16,
    op: u16,
    ws: u16,
    non_ascii: u16,
}

/// Classify 16 bytes at once using SSE2.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn classify_chunk(chunk: __m128i) -> ChunkClass {
    unsafe {
        let v_quote = _mm_set1_epi8(DOUBLE_QUOTE);
        let v_backslash = _mm_set1_epi8(BACKSLASH);
        let v_open_brace = _mm_set1_epi8(OPEN_BRACE);
        let v_close_brace = _mm_set1_epi8(CLOSE_BRACE);
        let v_open_bracket = _mm_set1_epi8(OPEN_BRACKET);
        let v_close_bracket = _mm_set1_epi8(CLOSE_BRACKET);
        let v_comma = _mm_set1_epi8(COMMA);
        let v_colon = _mm_set1_epi8(COLON);
        let v_space = _mm_set1_epi8(SPACE);
        let v_tab = _mm_set1_epi8(TAB);
        let v_line_feed = _mm_set1_epi8(LINE_FEED);
        let v_carriage_return = _mm_set1_epi8(CARRIAGE_RETURN);

        let eq_quote = _mm_cmpeq_epi8(chunk, v_quote);
        let eq_backslash = _mm_cmpeq_epi8(chunk, v_backslash);
        let eq_open_brace = _mm_cmpeq_epi8(chunk, v_open_brace);
        let eq_close_brace = _mm_cmpeq_epi8(chunk, v_close_brace);
        let eq_open_bracket = _mm_cmpeq_epi8(chunk, v_open_bracket);
        let eq_close_bracket = _mm_cmpeq_epi8(chunk, v_close_bracket);
        let eq_comma = _mm_cmpeq_epi8(chunk, v_comma);
        let eq_colon = _mm_cmpeq_epi8(chunk, v_colon);
        let eq_space = _mm_cmpeq_epi8(chunk, v_space);
        let eq_tab = _mm_cmpeq_epi8(chunk, v_tab);
        let eq_line_feed = _mm_cmpeq_epi8(chunk, v_line_feed);
        let eq_carriage_return = _mm_cmpeq_epi8(chunk, v_carriage_return);

        let braces = _mm_or_si128(eq_open_brace, eq_close_brace);
        let brackets = _mm_or_si128(eq_open_bracket, eq_close_bracket);
        let delims = _mm_or_si128(eq_comma, eq_colon);
        let op = _mm_or_si128(_mm_or_si128(braces, brackets), delims);

        let blanks = _mm_or_si128(eq_space, eq_tab);
        let breaks = _mm_or_si128(eq_line_feed, eq_carriage_return);
        let ws = _mm_or_si128(blanks, breaks);

        ChunkClass {
            quote: _mm_movemask_epi8(eq_quote) as u16,
            backslash: _mm_movemask_epi8(eq_backslash) as u16,
            op: _mm_movemask_epi8(op) as u16,
            ws: _mm_movemask_epi8(ws) as u16,
            // movemask reads the sign bit of each byte directly
            non_ascii: _mm_movemask_epi8(chunk) as u16,
        }
    }
}

/// Classify the first 64 bytes of `block` using SSE2.
pub fn classify_block(block: &[u8]) -> BlockClass {
    debug_assert!(block.len() >= BLOCK);
    // SAFETY: SSE2 is guaranteed to be available on all x86_64 processors
    unsafe { classify_block_sse2(block) }
}

#[target_feature(enable = "sse2")]
unsafe fn classify_block_sse2(block: &[u8]) -> BlockClass {
    unsafe {
        let mut class = BlockClass::default();
        for lane in 0..4 {
            let chunk = _mm_loadu_si128(block.as_ptr().add(lane * 16) as *const __m128i);
            let m = classify_chunk(chunk);
            let shift = lane * 16;
            class.quote |= (m.quote as u64) << shift;
            class.backslash |= (m.backslash as u64) << shift;
            class.op |= (m.op as u64) << shift;
            class.ws |= (m.ws as u64) << shift;
            class.non_ascii |= (m.non_ascii as u64) << shift;
        }
        class
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

    #[test]
    fn test_sse2_matches_scalar_simple_object() {
        let block = block_from(br#"{"name":"value","number":12345}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_sse2_matches_scalar_escapes() {
        let block = block_from(br#"{"a":"b\"c\\d","e":"f\ng"}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_sse2_matches_scalar_whitespace() {
        let block = block_from(b"{ \t\"a\"\r\n: 1 }");
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_sse2_matches_scalar_non_ascii() {
        let mut block = block_from(br#"{"k":"caf"}"#);
        block[9] = 0xC3;
        block[10] = 0xA9;
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_sse2_matches_scalar_all_byte_values() {
        let mut block = [0u8; BLOCK];
        for start in (0..=255u8).step_by(BLOCK) {
            for (i, byte) in block.iter_mut().enumerate() {
                *byte = start.wrapping_add(i as u8);
            }
            assert_eq!(classify_block(&block), scalar::classify_block(&block));
        }
    }
}
