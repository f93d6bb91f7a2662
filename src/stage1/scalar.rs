//! Portable block classification.
//!
//! Produces the same [`BlockClass`] masks as the SIMD kernels one byte at a
//! time. Used on targets without a vector kernel and as the reference
//! implementation the SIMD kernels are tested against.

use super::{BlockClass, BLOCK};

/// Classify the first 64 bytes of `block`.
pub fn classify_block(block: &[u8]) -> BlockClass {
    debug_assert!(block.len() >= BLOCK);
    let mut class = BlockClass::default();
    for (i, &byte) in block.iter().take(BLOCK).enumerate() {
        let bit = 1u64 << i;
        match byte {
            b'\\' => class.backslash |= bit,
            b'"' => class.quote |= bit,
            b'{' | b'}' | b'[' | b']' | b',' | b':' => class.op |= bit,
            b' ' | b'\t' | b'\n' | b'\r' => class.ws |= bit,
            _ => {}
        }
        if byte >= 0x80 {
            class.non_ascii |= bit;
        }
    }
    class
}
