use std::cmp;
use std::ops::{Bound, Range, RangeBounds};

use tracing::{debug, trace};

use crate::chunk::{Chunk, ChunkId};
use crate::error::{Result, RopeError};
use crate::index::ChunkTree;

/// Filler for room opened by `make_room` until it is overwritten.
pub(crate) const BLANK: u8 = b' ';

impl ChunkTree {
    /// Slice `bytes` into successive capacity-sized chunks.
    pub fn from_bytes(bytes: &[u8], capacity: usize) -> Self {
        let mut tree = ChunkTree::new(capacity);
        tree.extend_tail(bytes);
        tree.reindex();
        tree
    }

    /// Take ownership of already sized buffers, keeping their order.
    pub(crate) fn from_texts(texts: Vec<Vec<u8>>, capacity: usize) -> Self {
        let mut tree = ChunkTree::new(capacity);
        tree.splice_texts(0, texts);
        tree
    }

    pub(crate) fn ensure_index(&self, index: usize) -> Result<()> {
        if index < self.total_count {
            Ok(())
        } else {
            Err(RopeError::OutOfBounds {
                index,
                len: self.total_count,
            })
        }
    }

    /// Like `ensure_index`, but one past the end is a valid insert position.
    pub(crate) fn ensure_position(&self, index: usize) -> Result<()> {
        if index <= self.total_count {
            Ok(())
        } else {
            Err(RopeError::OutOfBounds {
                index,
                len: self.total_count,
            })
        }
    }

    /// Resolve a range against the current length.
    pub(crate) fn span(&self, range: impl RangeBounds<usize>) -> Result<Range<usize>> {
        let len = self.total_count;
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if start > end || end > len {
            return Err(RopeError::RangeOutOfBounds { start, end, len });
        }
        Ok(start..end)
    }

    /// Make sure a chunk boundary falls at `index` and return the chunk that
    /// ends there (`None` for the front of the rope).
    fn split_at(&mut self, index: usize) -> Option<ChunkId> {
        if index == 0 {
            return None;
        }
        let Some((id, offset)) = self.locate(index) else {
            return self.tail;
        };
        if offset == 0 {
            return self.chunks[id].prev;
        }
        let tail = self.chunks[id].split_off(offset, self.capacity);
        let logical_index = self.chunks[id].logical_index + offset;
        let new_id = self.attach_after(Some(id), tail);
        self.chunks[new_id].logical_index = logical_index;
        trace!(chunk = id, offset, new_chunk = new_id, "split chunk");
        Some(id)
    }

    /// Open `count` blank bytes at `index`. Uses spare room in the chunk at
    /// `index` when it fits, otherwise splits there and threads new chunks.
    pub(crate) fn make_room(&mut self, index: usize, count: usize) {
        debug_assert!(index <= self.total_count);
        if count == 0 {
            return;
        }

        let (id, offset) = match self.locate(index) {
            Some(found) => found,
            None => {
                let tail = self.tail.expect("a rope always holds a chunk");
                (tail, self.chunks[tail].len())
            }
        };
        if self.chunks[id].spare(self.capacity) >= count {
            self.chunks[id].open_gap(offset, count, BLANK, self.capacity);
            self.reindex();
            return;
        }

        let anchor = self.split_at(index);
        let mut remaining = count;
        if let Some(a) = anchor {
            let room = cmp::min(self.chunks[a].spare(self.capacity), remaining);
            let end = self.chunks[a].len();
            self.chunks[a].open_gap(end, room, BLANK, self.capacity);
            remaining -= room;
        }

        let mut after = anchor;
        while remaining > 0 {
            let n = cmp::min(self.capacity, remaining);
            let mut text = Vec::with_capacity(self.capacity);
            text.resize(n, BLANK);
            after = Some(self.attach_after(after, text));
            remaining -= n;
        }
        trace!(index, count, "threaded new chunks");

        self.drop_empty();
        self.reindex();
    }

    /// Overwrite existing bytes starting at `index`.
    pub(crate) fn write_at(&mut self, index: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let (mut id, mut offset) = self.locate(index).expect("write starts inside the rope");
        let mut written = 0;
        loop {
            written += self.chunks[id].overwrite(offset, &data[written..]);
            if written == data.len() {
                break;
            }
            id = self.chunks[id].next.expect("write stays inside the rope");
            offset = 0;
        }
    }

    pub(crate) fn insert_bytes(&mut self, index: usize, data: &[u8]) {
        self.make_room(index, data.len());
        self.write_at(index, data);
    }

    pub(crate) fn put(&mut self, index: usize, value: u8) {
        let (id, offset) = self.locate(index).expect("put inside the rope");
        self.chunks[id].put(offset, value);
    }

    pub(crate) fn remove_span(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let (first, first_offset) = self.locate(range.start).expect("start inside the rope");
        let (last, last_offset) = self.locate(range.end - 1).expect("end inside the rope");

        if first == last {
            self.chunks[first].remove(first_offset, last_offset + 1);
        } else {
            // every chunk strictly between the two edges is fully covered
            let mut cur = self.chunks[first].next;
            while let Some(id) = cur {
                if id == last {
                    break;
                }
                cur = self.chunks[id].next;
                self.detach(id);
                trace!(chunk = id, "removed covered chunk");
            }
            self.chunks[first].text.truncate(first_offset);
            self.chunks[last].remove(0, last_offset + 1);
        }

        self.drop_empty();
        self.reindex();
    }

    /// Delete zero-length chunks unless the rope would be left with none.
    fn drop_empty(&mut self) {
        let mut cur = self.head;
        while let Some(id) = cur {
            cur = self.chunks[id].next;
            if self.chunks[id].is_empty() && self.chunks.len() > 1 {
                self.detach(id);
                trace!(chunk = id, "dropped empty chunk");
            }
        }
    }

    /// Apply `f` to every byte in `range` in place.
    pub(crate) fn map_span(&mut self, range: Range<usize>, f: impl Fn(u8) -> u8) {
        if range.is_empty() {
            return;
        }
        let (mut id, mut offset) = self.locate(range.start).expect("start inside the rope");
        let mut remaining = range.len();
        loop {
            let text = &mut self.chunks[id].text;
            let n = cmp::min(text.len() - offset, remaining);
            for b in &mut text[offset..offset + n] {
                *b = f(*b);
            }
            remaining -= n;
            if remaining == 0 {
                break;
            }
            id = self.chunks[id].next.expect("range stays inside the rope");
            offset = 0;
        }
    }

    /// Overwrite `range` with `with`, first growing or shrinking the range so
    /// the lengths match.
    pub(crate) fn replace_span(&mut self, range: Range<usize>, with: &[u8]) {
        let old_len = range.len();
        match with.len().cmp(&old_len) {
            cmp::Ordering::Greater => self.make_room(range.end, with.len() - old_len),
            cmp::Ordering::Less => self.remove_span(range.start + with.len()..range.end),
            cmp::Ordering::Equal => {}
        }
        self.write_at(range.start, with);
    }

    /// Copy `range` into a new rope whose chunks have `capacity` bytes.
    pub(crate) fn copy_span(&self, range: Range<usize>, capacity: usize) -> ChunkTree {
        let mut out = ChunkTree::new(capacity);
        if range.is_empty() {
            return out;
        }
        let (first, mut offset) = self.locate(range.start).expect("start inside the rope");
        let mut remaining = range.len();
        let mut cur = Some(first);
        while let Some(id) = cur {
            let text = self.chunks[id].as_bytes();
            let n = cmp::min(text.len() - offset, remaining);
            out.extend_tail(&text[offset..offset + n]);
            remaining -= n;
            if remaining == 0 {
                break;
            }
            offset = 0;
            cur = self.chunks[id].next;
        }
        out.reindex();
        out
    }

    /// Thread the given buffers in at `index`, moving them without copying.
    pub(crate) fn splice_texts(&mut self, index: usize, texts: Vec<Vec<u8>>) {
        let mut anchor = self.split_at(index);
        for text in texts.into_iter().filter(|t| !t.is_empty()) {
            anchor = Some(self.attach_after(anchor, text));
        }
        self.drop_empty();
        self.reindex();
    }

    /// Tear the rope down, handing back its chunk buffers in order.
    pub(crate) fn into_texts(mut self) -> Vec<Vec<u8>> {
        let ids: Vec<ChunkId> = self.chain().collect();
        ids.into_iter()
            .map(|id| self.chunks.remove(id).text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Copies of every chunk's content, re-sliced for `capacity`.
    pub(crate) fn copy_texts(&self, capacity: usize) -> Vec<Vec<u8>> {
        self.slices()
            .flat_map(|slice| Chunk::slice_text(slice, capacity))
            .collect()
    }

    /// Merge each chunk into its predecessor while their combined length fits
    /// one chunk. Returns how many chunks were absorbed.
    pub(crate) fn reclaim(&mut self) -> usize {
        let before = self.chunks.len();
        let mut cur = self.head;
        while let Some(id) = cur {
            let next = self.chunks[id].next;
            match next {
                Some(n) if self.chunks[id].len() + self.chunks[n].len() <= self.capacity => {
                    let mut text = self.detach(n);
                    self.chunks[id].absorb(&mut text, self.capacity);
                    trace!(chunk = id, absorbed = n, "merged chunks");
                }
                _ => cur = next,
            }
        }
        self.drop_empty();
        self.reindex();

        let after = self.chunks.len();
        debug!(before, after, "reclaimed chunks");
        before - after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(tree: &ChunkTree) -> Vec<usize> {
        tree.slices().map(<[u8]>::len).collect()
    }

    #[test]
    fn make_room_uses_spare_space() {
        let mut tree = ChunkTree::from_bytes(b"abcdef", 4);
        assert_eq!(sizes(&tree), vec![4, 2]);
        tree.insert_bytes(5, b"XY");
        assert_eq!(tree.flatten(), b"abcdeXYf");
        assert_eq!(sizes(&tree), vec![4, 4]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn make_room_splits_full_chunk() {
        let mut tree = ChunkTree::from_bytes(b"abcdefghij", 4);
        tree.insert_bytes(2, b"123456");
        assert_eq!(tree.flatten(), b"ab123456cdefghij");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn make_room_at_front_and_end() {
        let mut tree = ChunkTree::from_bytes(b"abcd", 4);
        tree.insert_bytes(0, b"xyz");
        tree.insert_bytes(7, b"!!!!!");
        assert_eq!(tree.flatten(), b"xyzabcd!!!!!");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_inside_one_chunk() {
        let mut tree = ChunkTree::from_bytes(b"abcdefgh", 4);
        tree.remove_span(1..3);
        assert_eq!(tree.flatten(), b"adefgh");
        assert_eq!(sizes(&tree), vec![2, 4]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_across_adjacent_chunks() {
        let mut tree = ChunkTree::from_bytes(b"abcdefgh", 4);
        tree.remove_span(3..5);
        assert_eq!(tree.flatten(), b"abcfgh");
        assert_eq!(sizes(&tree), vec![3, 3]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_spanning_chunks_drops_covered_and_empty() {
        let mut tree = ChunkTree::from_bytes(b"abcdefghijklmnop", 4);
        tree.remove_span(0..13);
        assert_eq!(tree.flatten(), b"nop");
        assert_eq!(tree.chunk_count(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_everything_leaves_one_empty_chunk() {
        let mut tree = ChunkTree::from_bytes(b"abcdefghij", 3);
        tree.remove_span(0..10);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.chunk_count(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn reclaim_merges_underfull_neighbors() {
        let mut tree = ChunkTree::from_bytes(b"abcdefghijkl", 4);
        tree.remove_span(1..3);
        tree.remove_span(3..5);
        assert_eq!(tree.flatten(), b"adehijkl");
        let merged = tree.reclaim();
        assert!(merged >= 1);
        assert_eq!(tree.flatten(), b"adehijkl");
        assert!(tree.slices().all(|s| s.len() <= 4));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn replace_span_grows_and_shrinks() {
        let mut tree = ChunkTree::from_bytes(b"hello world", 4);
        tree.replace_span(0..5, b"goodbye");
        assert_eq!(tree.flatten(), b"goodbye world");
        tree.replace_span(8..13, b"all");
        assert_eq!(tree.flatten(), b"goodbye all");
        tree.replace_span(0..0, b"");
        assert_eq!(tree.flatten(), b"goodbye all");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn splice_moves_buffers() {
        let mut tree = ChunkTree::from_bytes(b"abcdef", 4);
        let donor = ChunkTree::from_bytes(b"123", 4);
        tree.splice_texts(3, donor.into_texts());
        assert_eq!(tree.flatten(), b"abc123def");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn span_resolves_bounds() {
        let tree = ChunkTree::from_bytes(b"abcdef", 4);
        assert_eq!(tree.span(..), Ok(0..6));
        assert_eq!(tree.span(2..=3), Ok(2..4));
        assert_eq!(
            tree.span(4..8),
            Err(RopeError::RangeOutOfBounds {
                start: 4,
                end: 8,
                len: 6
            })
        );
        assert!(tree.span(usize::MAX..).is_err());
    }
}
