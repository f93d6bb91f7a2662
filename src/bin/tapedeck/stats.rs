//! Per-document statistics gathered by walking the tape.

use tapedeck::{DocumentRef, Element, ElementType};

/// Node and byte counts for one parsed document.
#[derive(Debug, Default)]
pub struct Stats {
    pub integer_count: usize,
    pub float_count: usize,
    pub string_count: usize,
    pub backslash_count: usize,
    pub non_ascii_byte_count: usize,
    pub object_count: usize,
    pub array_count: usize,
    pub null_count: usize,
    pub true_count: usize,
    pub false_count: usize,
    pub byte_count: usize,
    pub structural_indexes_count: usize,
}

/// Count every node in `doc` plus byte-level statistics over the raw input.
pub fn compute(doc: DocumentRef<'_>, input: &[u8], structural_indexes: usize) -> Stats {
    let mut stats = Stats {
        byte_count: input.len(),
        backslash_count: input.iter().filter(|&&b| b == b'\\').count(),
        non_ascii_byte_count: input.iter().filter(|&&b| b >= 0x80).count(),
        structural_indexes_count: structural_indexes,
        ..Stats::default()
    };
    walk(doc.root(), &mut stats);
    stats
}

fn walk(element: Element<'_>, stats: &mut Stats) {
    match element.element_type() {
        ElementType::Null => stats.null_count += 1,
        ElementType::Bool => {
            if element.as_bool().unwrap_or(false) {
                stats.true_count += 1;
            } else {
                stats.false_count += 1;
            }
        }
        ElementType::Int64 | ElementType::UInt64 => stats.integer_count += 1,
        ElementType::Double => stats.float_count += 1,
        ElementType::String => stats.string_count += 1,
        ElementType::Array => {
            stats.array_count += 1;
            if let Ok(array) = element.as_array() {
                for child in array {
                    walk(child, stats);
                }
            }
        }
        ElementType::Object => {
            stats.object_count += 1;
            if let Ok(object) = element.as_object() {
                for (_key, value) in object {
                    // keys are string nodes on the tape
                    stats.string_count += 1;
                    walk(value, stats);
                }
            }
        }
    }
}

/// Print the counters in a fixed, script-friendly column order.
pub fn print(stats: &Stats) {
    println!(
        "# integer_count float_count string_count backslash_count \
         non_ascii_byte_count object_count array_count null_count true_count \
         false_count byte_count structural_indexes_count"
    );
    println!(
        "{} {} {} {} {} {} {} {} {} {} {} {}",
        stats.integer_count,
        stats.float_count,
        stats.string_count,
        stats.backslash_count,
        stats.non_ascii_byte_count,
        stats.object_count,
        stats.array_count,
        stats.null_count,
        stats.true_count,
        stats.false_count,
        stats.byte_count,
        stats.structural_indexes_count
    );
}
