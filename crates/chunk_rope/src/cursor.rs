use std::sync::MutexGuard;

use crate::chunk::ChunkId;
use crate::index::ChunkTree;

/// A position over the chunks of one rope, stepping in tree order.
///
/// The cursor holds the rope's lock for as long as it lives, so the rope
/// cannot change underneath it. Calling other methods on the same rope from
/// the thread that owns the cursor blocks forever; drop the cursor first.
///
/// A fresh cursor is off. `start` and `finish` position it on the first or
/// last chunk; stepping past either end turns it off again.
#[derive(Debug)]
pub struct Cursor<'a> {
    tree: MutexGuard<'a, ChunkTree>,
    position: Option<ChunkId>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tree: MutexGuard<'a, ChunkTree>) -> Self {
        Cursor {
            tree,
            position: None,
        }
    }

    /// Move to the leftmost chunk. Stays off on an empty rope.
    pub fn start(&mut self) {
        self.position = self.tree.first().filter(|_| !self.tree.is_empty());
    }

    /// Move to the rightmost chunk. Stays off on an empty rope.
    pub fn finish(&mut self) {
        self.position = self.tree.last().filter(|_| !self.tree.is_empty());
    }

    /// Step to the in-order successor.
    pub fn forth(&mut self) {
        if let Some(id) = self.position {
            self.position = self.tree.successor(id);
        }
    }

    /// Step to the in-order predecessor.
    pub fn back(&mut self) {
        if let Some(id) = self.position {
            self.position = self.tree.predecessor(id);
        }
    }

    pub fn is_off(&self) -> bool {
        self.position.is_none()
    }

    /// Valid bytes of the current chunk.
    pub fn chunk(&self) -> Option<&[u8]> {
        self.position.map(|id| self.tree.chunk(id).as_bytes())
    }

    /// Logical index of the first byte of the current chunk.
    pub fn logical_index(&self) -> Option<usize> {
        self.position.map(|id| self.tree.chunk(id).logical_index())
    }
}
