//! NEON block classification for ARM64.
//!
//! Processes a 64-byte block as four 16-byte chunks. NEON is mandatory on
//! all aarch64 processors.

use core::arch::aarch64::*;

use super::{BlockClass, BLOCK};

/// ASCII byte constants
const DOUBLE_QUOTE: u8 = b'"';
const BACKSLASH: u8 = b'\\';
const OPEN_BRACE: u8 = b'{';
const CLOSE_BRACE: u8 = b'}';
const OPEN_BRACKET: u8 = b'[';
const CLOSE_BRACKET: u8 = b']';
const COMMA: u8 = b',';
const COLON: u8 = b':';
const SPACE: u8 = b' ';
const TAB: u8 = b'\t';
const LINE_FEED: u8 = b'\n';
const CARRIAGE_RETURN: u8 = b'\r';

/// Collapse a comparison mask (bytes 0x00 or 0xFF) into a u16 with bit i set
/// when lane i is set.
///
/// Keeps one distinct bit weight per lane within each half, then folds the
/// vector with three pairwise adds; the two surviving bytes are the low and
/// high halves of the mask. The weights sum to at most 0xFF per byte, so the
/// folds cannot carry.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn neon_movemask(v: uint8x16_t) -> u16 {
    unsafe {
        let bit_weights: [u8; 16] = [
            0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20,
            0x40, 0x80,
        ];
        let weighted = vandq_u8(v, vld1q_u8(bit_weights.as_ptr()));
        let sum = vpaddq_u8(weighted, weighted);
        let sum = vpaddq_u8(sum, sum);
        let sum = vpaddq_u8(sum, sum);
        vgetq_lane_u16::<0>(vreinterpretq_u16_u8(sum))
    }
}

/// Character-class masks for a 16-byte chunk.
#[derive(Debug, Clone, Copy)]
struct ChunkClass {
    quote: u16,
    backslash: u16,
    op: u16,
    ws: u16,
    non_ascii: u16,
}

/// Classify 16 bytes at once using NEON.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn classify_chunk(chunk: uint8x16_t) -> ChunkClass {
    unsafe {
        let v_quote = vdupq_n_u8(DOUBLE_QUOTE);
        let v_backslash = vdupq_n_u8(BACKSLASH);
        let v_high_bit = vdupq_n_u8(0x80);
        let v_open_brace = vdupq_n_u8(OPEN_BRACE);
        let v_close_brace = vdupq_n_u8(CLOSE_BRACE);
        let v_open_bracket = vdupq_n_u8(OPEN_BRACKET);
        let v_close_bracket = vdupq_n_u8(CLOSE_BRACKET);
        let v_comma = vdupq_n_u8(COMMA);
        let v_colon = vdupq_n_u8(COLON);
        let v_space = vdupq_n_u8(SPACE);
        let v_tab = vdupq_n_u8(TAB);
        let v_line_feed = vdupq_n_u8(LINE_FEED);
        let v_carriage_return = vdupq_n_u8(CARRIAGE_RETURN);

        let eq_quote = vceqq_u8(chunk, v_quote);
        let eq_backslash = vceqq_u8(chunk, v_backslash);
        let eq_open_brace = vceqq_u8(chunk, v_open_brace);
        let eq_close_brace = vceqq_u8(chunk, v_close_brace);
        let eq_open_bracket = vceqq_u8(chunk, v_open_bracket);
        let eq_close_bracket = vceqq_u8(chunk, v_close_bracket);
        let eq_comma = vceqq_u8(chunk, v_comma);
        let eq_colon = vceqq_u8(chunk, v_colon);
        let eq_space = vceqq_u8(chunk, v_space);
        let eq_tab = vceqq_u8(chunk, v_tab);
        let eq_line_feed = vceqq_u8(chunk, v_line_feed);
        let eq_carriage_return = vceqq_u8(chunk, v_carriage_return);

        let braces = vorrq_u8(eq_open_brace, eq_close_brace);
        let brackets = vorrq_u8(eq_open_bracket, eq_close_bracket);
        let delims = vorrq_u8(eq_comma, eq_colon);
        let op = vorrq_u8(vorrq_u8(braces, brackets), delims);

        let blanks = vorrq_u8(eq_space, eq_tab);
        let breaks = vorrq_u8(eq_line_feed, eq_carriage_return);
        let ws = vorrq_u8(blanks, breaks);

        // the movemask needs a full 0x00/0xFF mask, so test the high bit
        // rather than handing it the raw chunk
        let non_ascii = vtstq_u8(chunk, v_high_bit);

        ChunkClass {
            quote: neon_movemask(eq_quote),
            backslash: neon_movemask(eq_backslash),
            op: neon_movemask(op),
            ws: neon_movemask(ws),
            non_ascii: neon_movemask(non_ascii),
        }
    }
}

/// Classify the first 64 bytes of `block` using NEON.
pub fn classify_block(block: &[u8]) -> BlockClass {
    debug_assert!(block.len() >= BLOCK);
    // SAFETY: NEON is mandatory on all aarch64 processors
    unsafe { classify_block_neon(block) }
}

#[target_feature(enable = "neon")]
unsafe fn classify_block_neon(block: &[u8]) -> BlockClass {
    unsafe {
        let mut class = BlockClass::default();
        for lane in 0..4 {
            let chunk = vld1q_u8(block.as_ptr().add(lane * 16));
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
    fn test_neon_matches_scalar_simple_object() {
        let block = block_from(br#"{"name":"value","items":[1,2,3],"ok":true}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_neon_matches_scalar_escapes() {
        let block = block_from(br#"{"a":"b\"c\\d","e":"f\ng"}"#);
        assert_eq!(classify_block(&block), scalar::classify_block(&block));
    }

    #[test]
    fn test_neon_matches_scalar_all_byte_values() {
        let mut block = [0u8; BLOCK];
        for start in (0..=255u8).step_by(BLOCK) {
            for (i, byte) in block.iter_mut().enumerate() {
                *byte = start.wrapping_add(i as u8);
            }
            assert_eq!(classify_block(&block), scalar::classify_block(&block));
        }
    }
}
