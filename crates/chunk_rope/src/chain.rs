use std::iter;

use crate::chunk::{Chunk, ChunkId};
use crate::index::ChunkTree;

impl ChunkTree {
    /// Allocate a chunk holding `text` and thread it right after `anchor`
    /// (or at the front when `anchor` is `None`) in both the index and the
    /// chain. Logical indices are stale until the next [`reindex`].
    ///
    /// [`reindex`]: ChunkTree::reindex
    pub(crate) fn attach_after(&mut self, anchor: Option<ChunkId>, text: Vec<u8>) -> ChunkId {
        debug_assert!(text.len() <= self.capacity);
        let id = self.chunks.insert(Chunk::from_text(text));
        self.index_insert_after(anchor, id);
        self.chain_link_after(anchor, id);
        id
    }

    /// Remove a chunk from both structures and free it, handing back its text.
    pub(crate) fn detach(&mut self, id: ChunkId) -> Vec<u8> {
        self.index_remove(id);
        self.chain_unlink(id);
        let mut chunk = self.chunks.remove(id);
        chunk.unlink();
        chunk.text
    }

    fn chain_link_after(&mut self, anchor: Option<ChunkId>, id: ChunkId) {
        let next = match anchor {
            Some(a) => self.chunks[a].next,
            None => self.head,
        };
        self.chunks[id].prev = anchor;
        self.chunks[id].next = next;
        match anchor {
            Some(a) => self.chunks[a].next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.chunks[n].prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    fn chain_unlink(&mut self, id: ChunkId) {
        let (prev, next) = (self.chunks[id].prev, self.chunks[id].next);
        match prev {
            Some(p) => self.chunks[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.chunks[n].prev = prev,
            None => self.tail = prev,
        }
    }

    /// Chunk ids from head to tail.
    pub(crate) fn chain(&self) -> impl Iterator<Item = ChunkId> + '_ {
        iter::successors(self.head, move |&id| self.chunks[id].next)
    }

    /// Valid slices of every chunk from head to tail.
    pub(crate) fn slices(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.chain().map(move |id| self.chunks[id].as_bytes())
    }

    /// Recompute every chunk's logical index as the running sum of the counts
    /// before it, and the total length.
    pub(crate) fn reindex(&mut self) {
        let mut running = 0;
        let mut cur = self.head;
        while let Some(id) = cur {
            let chunk = &mut self.chunks[id];
            chunk.logical_index = running;
            running += chunk.len();
            cur = chunk.next;
        }
        self.total_count = running;
    }

    pub(crate) fn flatten(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.total_count);
        for slice in self.slices() {
            buf.extend_from_slice(slice);
        }
        buf
    }

    /// Chunk holding `index` and the offset inside it; `None` past the end.
    pub(crate) fn locate(&self, index: usize) -> Option<(ChunkId, usize)> {
        if index >= self.total_count {
            return None;
        }
        let id = self.find(index)?;
        Some((id, index - self.chunks[id].logical_index))
    }

    pub(crate) fn byte_at(&self, index: usize) -> Option<u8> {
        self.locate(index)
            .map(|(id, offset)| self.chunks[id].as_bytes()[offset])
    }

    /// Bytes from logical index `index` to the end, crossing chunk boundaries.
    pub(crate) fn bytes_from(&self, index: usize) -> Bytes<'_> {
        match self.locate(index) {
            Some((chunk, offset)) => Bytes {
                tree: self,
                chunk: Some(chunk),
                offset,
            },
            None => Bytes {
                tree: self,
                chunk: None,
                offset: 0,
            },
        }
    }

    pub(crate) fn bytes(&self) -> Bytes<'_> {
        Bytes {
            tree: self,
            chunk: self.head,
            offset: 0,
        }
    }

    /// Append bytes at the tail, topping up the last chunk before threading
    /// new ones. Leaves logical indices stale.
    pub(crate) fn extend_tail(&mut self, mut bytes: &[u8]) {
        if let Some(tail) = self.tail {
            let room = self.chunks[tail].spare(self.capacity).min(bytes.len());
            self.chunks[tail].text.extend_from_slice(&bytes[..room]);
            bytes = &bytes[room..];
        }
        for text in Chunk::slice_text(bytes, self.capacity) {
            let tail = self.tail;
            self.attach_after(tail, text);
        }
    }

    /// Verify that chain and tree agree and that the stored counters match
    /// the content.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.check_index()?;

        let chain: Vec<ChunkId> = self.chain().collect();
        if chain.len() != self.chunks.len() {
            return Err(format!(
                "chain reaches {} chunks, arena holds {}",
                chain.len(),
                self.chunks.len()
            ));
        }
        if chain != self.inorder() {
            return Err("chain order differs from tree order".to_string());
        }
        if chain.is_empty() {
            return Err("rope has no chunks".to_string());
        }

        let mut prev = None;
        let mut running = 0;
        for &id in &chain {
            let chunk = &self.chunks[id];
            if chunk.prev != prev {
                return Err(format!("chunk {id} has a stale prev link"));
            }
            if chunk.logical_index != running {
                return Err(format!(
                    "chunk {id} starts at {}, expected {running}",
                    chunk.logical_index
                ));
            }
            if chunk.len() > self.capacity {
                return Err(format!(
                    "chunk {id} holds {} bytes, capacity is {}",
                    chunk.len(),
                    self.capacity
                ));
            }
            if chunk.is_empty() && chain.len() > 1 {
                return Err(format!("zero-length chunk {id} in a multi-chunk rope"));
            }
            running += chunk.len();
            prev = Some(id);
        }
        if self.tail != prev {
            return Err("tail does not point at the last chunk".to_string());
        }
        if running != self.total_count {
            return Err(format!(
                "total count {} differs from content length {running}",
                self.total_count
            ));
        }
        Ok(())
    }
}

/// Iterator over the bytes of a rope starting at some logical index.
#[derive(Debug, Clone)]
pub(crate) struct Bytes<'a> {
    tree: &'a ChunkTree,
    chunk: Option<ChunkId>,
    offset: usize,
}

impl Iterator for Bytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            let chunk = self.tree.chunk(self.chunk?);
            if let Some(&b) = chunk.as_bytes().get(self.offset) {
                self.offset += 1;
                return Some(b);
            }
            self.chunk = chunk.next;
            self.offset = 0;
        }
    }
}
