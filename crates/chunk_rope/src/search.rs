use std::cmp::Ordering;
use std::ops::Range;

use crate::index::ChunkTree;

pub const HASH_BASE: u32 = 256;
/// Largest prime below 2^32.
pub const HASH_MODULUS: u32 = 4_294_967_291;

impl ChunkTree {
    pub(crate) fn contains_byte(&self, value: u8) -> bool {
        self.slices().any(|slice| slice.contains(&value))
    }

    /// Lexicographic comparison, advancing through both sides chunk by chunk.
    pub(crate) fn compare<I>(&self, other: I) -> Ordering
    where
        I: IntoIterator<Item = u8>,
    {
        self.bytes().cmp(other)
    }

    /// Whether `pattern` occurs at `index`.
    pub(crate) fn matches_at(&self, index: usize, pattern: &[u8]) -> bool {
        if index + pattern.len() > self.total_count {
            return false;
        }
        self.bytes_from(index)
            .zip(pattern)
            .all(|(have, &want)| have == want)
    }

    /// First position in `within` where `pattern` starts and also ends inside
    /// `within`. Naive scan; an empty pattern matches at the start.
    pub(crate) fn find_bytes(&self, pattern: &[u8], within: Range<usize>) -> Option<usize> {
        if pattern.len() > within.len() {
            return None;
        }
        let last_start = within.end - pattern.len();
        (within.start..=last_start).find(|&start| self.matches_at(start, pattern))
    }

    /// Polynomial hash over every byte: `h = (h * 256 + b) mod p` in wrapping
    /// 32-bit arithmetic.
    pub(crate) fn hash(&self) -> u32 {
        self.bytes().fold(0u32, |hash, b| {
            hash.wrapping_mul(HASH_BASE).wrapping_add(u32::from(b)) % HASH_MODULUS
        })
    }

    /// Spans of the non-empty runs between separator bytes.
    pub(crate) fn split_spans(&self, separators: &[u8]) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut run_start = 0;
        for (i, b) in self.bytes().enumerate() {
            if separators.contains(&b) {
                if run_start < i {
                    spans.push(run_start..i);
                }
                run_start = i + 1;
            }
        }
        if run_start < self.total_count {
            spans.push(run_start..self.total_count);
        }
        spans
    }
}
