use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use tracing::debug;

use crate::Rope;
use crate::chunk::DEFAULT_CHUNK_CAPACITY;
use crate::index::ChunkTree;

const READ_BLOCK: usize = 64 * 1024;

/// Accumulates text piece by piece and produces a [`Rope`].
#[derive(Debug)]
pub struct RopeBuilder {
    tree: ChunkTree,
}

impl Default for RopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RopeBuilder {
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_chunk_capacity(capacity: usize) -> Self {
        RopeBuilder {
            tree: ChunkTree::new(capacity),
        }
    }

    /// Accept a chunk of text. It may span any number of rope chunks.
    pub fn accept_chunk(&mut self, chunk: &str) {
        self.accept_bytes(chunk.as_bytes());
    }

    pub fn accept_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.tree.extend_tail(bytes);
    }

    /// Finish building and return the rope.
    pub fn finish(mut self) -> Rope {
        self.tree.reindex();
        debug!(
            len = self.tree.len(),
            chunks = self.tree.chunk_count(),
            "built rope"
        );
        Rope::from_tree(self.tree)
    }

    /// Read everything from `reader` in fixed-size blocks.
    pub fn read_from<R: Read>(mut self, mut reader: R) -> io::Result<Rope> {
        let mut buf = vec![0u8; READ_BLOCK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.accept_bytes(&buf[..n]);
        }
        Ok(self.finish())
    }

    pub fn load_from_path<P: AsRef<Path>>(self, path: P) -> io::Result<Rope> {
        let file = File::open(path)?;
        self.read_from(BufReader::new(file))
    }
}
