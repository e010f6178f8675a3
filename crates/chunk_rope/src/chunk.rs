use std::cmp;

/// Key of a chunk inside the rope's arena.
pub type ChunkId = usize;

/// Per-chunk capacity used when none is given explicitly.
pub const DEFAULT_CHUNK_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// A run of at most `capacity` bytes, linked both into the red-black index
/// (parent/left/right) and into the ordered chain (prev/next).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub(crate) text: Vec<u8>,
    pub(crate) logical_index: usize,
    pub(crate) color: Color,
    pub(crate) parent: Option<ChunkId>,
    pub(crate) left: Option<ChunkId>,
    pub(crate) right: Option<ChunkId>,
    pub(crate) prev: Option<ChunkId>,
    pub(crate) next: Option<ChunkId>,
}

impl Chunk {
    /// Wrap an already filled buffer. The caller keeps `text.len()` within the
    /// rope's capacity.
    pub fn from_text(text: Vec<u8>) -> Self {
        Chunk {
            text,
            logical_index: 0,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    pub fn logical_index(&self) -> usize {
        self.logical_index
    }

    /// Free room left in this chunk for a rope with the given capacity.
    pub fn spare(&self, capacity: usize) -> usize {
        capacity.saturating_sub(self.text.len())
    }

    /// Whether logical index `index` falls inside this chunk. A zero-length
    /// chunk only exists as the sole chunk of an empty rope and matches any
    /// index.
    pub fn contains(&self, index: usize) -> bool {
        if self.text.is_empty() {
            return true;
        }
        self.logical_index <= index && index < self.logical_index + self.text.len()
    }

    /// Cut the chunk at `offset`, keeping the head and returning the tail as
    /// a new buffer sized for `capacity`.
    pub fn split_off(&mut self, offset: usize, capacity: usize) -> Vec<u8> {
        debug_assert!(offset <= self.text.len());
        let mut tail = Vec::with_capacity(capacity);
        tail.extend_from_slice(&self.text[offset..]);
        self.text.truncate(offset);
        tail
    }

    /// Move all of `other` onto the end of this chunk.
    pub fn absorb(&mut self, other: &mut Vec<u8>, capacity: usize) {
        debug_assert!(self.text.len() + other.len() <= capacity);
        self.text.append(other);
    }

    /// Insert `count` copies of `fill` at `offset`, staying within capacity.
    pub fn open_gap(&mut self, offset: usize, count: usize, fill: u8, capacity: usize) {
        debug_assert!(self.text.len() + count <= capacity);
        self.text
            .splice(offset..offset, std::iter::repeat_n(fill, count));
    }

    /// Drop the bytes in `start..end` (chunk-relative), shifting the rest left.
    pub fn remove(&mut self, start: usize, end: usize) {
        let end = cmp::min(end, self.text.len());
        if start < end {
            self.text.drain(start..end);
        }
    }

    pub fn put(&mut self, offset: usize, value: u8) {
        self.text[offset] = value;
    }

    /// Overwrite bytes starting at `offset` with as much of `data` as fits in
    /// the valid range, returning how many were written.
    pub fn overwrite(&mut self, offset: usize, data: &[u8]) -> usize {
        let n = cmp::min(data.len(), self.text.len() - offset);
        self.text[offset..offset + n].copy_from_slice(&data[..n]);
        n
    }

    /// Forget all tree and chain membership.
    pub(crate) fn unlink(&mut self) {
        self.parent = None;
        self.left = None;
        self.right = None;
        self.prev = None;
        self.next = None;
        self.color = Color::Red;
    }

    /// Split bytes into capacity-sized buffers.
    pub fn slice_text(bytes: &[u8], capacity: usize) -> Vec<Vec<u8>> {
        bytes
            .chunks(capacity)
            .map(|piece| {
                let mut text = Vec::with_capacity(capacity);
                text.extend_from_slice(piece);
                text
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chunk_matches_any_index() {
        let chunk = Chunk::from_text(Vec::with_capacity(4));
        assert!(chunk.contains(0));
        assert!(chunk.contains(17));
    }

    #[test]
    fn contains_uses_logical_range() {
        let mut chunk = Chunk::from_text(b"efgh".to_vec());
        chunk.logical_index = 4;
        assert!(!chunk.contains(3));
        assert!(chunk.contains(4));
        assert!(chunk.contains(7));
        assert!(!chunk.contains(8));
    }

    #[test]
    fn split_then_absorb_restores_text() {
        let mut chunk = Chunk::from_text(b"abcd".to_vec());
        let mut tail = chunk.split_off(1, 4);
        assert_eq!(chunk.as_bytes(), b"a");
        assert_eq!(tail, b"bcd");
        assert_eq!(tail.capacity(), 4);
        chunk.absorb(&mut tail, 4);
        assert_eq!(chunk.as_bytes(), b"abcd");
        assert!(tail.is_empty());
    }

    #[test]
    fn gap_and_remove() {
        let mut chunk = Chunk::from_text(b"ad".to_vec());
        chunk.open_gap(1, 2, b' ', 4);
        assert_eq!(chunk.as_bytes(), b"a  d");
        assert_eq!(chunk.overwrite(1, b"bcXYZ"), 3);
        assert_eq!(chunk.as_bytes(), b"abcX");
        chunk.remove(1, 3);
        assert_eq!(chunk.as_bytes(), b"aX");
        assert_eq!(chunk.spare(4), 2);
    }

    #[test]
    fn slice_text_respects_capacity() {
        let pieces = Chunk::slice_text(b"abcdefghij", 4);
        assert_eq!(pieces, vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ij".to_vec()]);
        assert!(Chunk::slice_text(b"", 4).is_empty());
    }
}
