use slab::Slab;

use crate::chunk::{Chunk, ChunkId, Color};

/// Arena of chunks threaded through a red-black tree ordered by logical index
/// and through a doubly linked chain in the same order.
#[derive(Debug, Clone)]
pub struct ChunkTree {
    pub(crate) chunks: Slab<Chunk>,
    pub(crate) root: Option<ChunkId>,
    pub(crate) head: Option<ChunkId>,
    pub(crate) tail: Option<ChunkId>,
    pub(crate) total_count: usize,
    pub(crate) capacity: usize,
}

impl ChunkTree {
    /// An empty rope: a single zero-length chunk.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be at least 1");
        let mut tree = ChunkTree {
            chunks: Slab::new(),
            root: None,
            head: None,
            tail: None,
            total_count: 0,
            capacity,
        };
        tree.attach_after(None, Vec::with_capacity(capacity));
        tree
    }

    pub fn len(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id]
    }

    fn color_of(&self, node: Option<ChunkId>) -> Color {
        match node {
            None => Color::Black,
            Some(id) => self.chunks[id].color,
        }
    }

    fn set_color(&mut self, node: ChunkId, color: Color) {
        self.chunks[node].color = color;
    }

    fn leftmost(&self, mut x: ChunkId) -> ChunkId {
        while let Some(left) = self.chunks[x].left {
            x = left;
        }
        x
    }

    fn rightmost(&self, mut x: ChunkId) -> ChunkId {
        while let Some(right) = self.chunks[x].right {
            x = right;
        }
        x
    }

    pub fn first(&self) -> Option<ChunkId> {
        self.root.map(|root| self.leftmost(root))
    }

    pub fn last(&self) -> Option<ChunkId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor, computed from tree links only.
    pub fn successor(&self, mut x: ChunkId) -> Option<ChunkId> {
        if let Some(right) = self.chunks[x].right {
            return Some(self.leftmost(right));
        }
        let mut parent = self.chunks[x].parent;
        while let Some(p) = parent {
            if self.chunks[p].right != Some(x) {
                break;
            }
            x = p;
            parent = self.chunks[p].parent;
        }
        parent
    }

    /// In-order predecessor, computed from tree links only.
    pub fn predecessor(&self, mut x: ChunkId) -> Option<ChunkId> {
        if let Some(left) = self.chunks[x].left {
            return Some(self.rightmost(left));
        }
        let mut parent = self.chunks[x].parent;
        while let Some(p) = parent {
            if self.chunks[p].left != Some(x) {
                break;
            }
            x = p;
            parent = self.chunks[p].parent;
        }
        parent
    }

    /// The chunk holding logical index `index`, walking left when the index
    /// lies before a chunk and right otherwise.
    pub fn find(&self, index: usize) -> Option<ChunkId> {
        let mut node = self.root;
        while let Some(id) = node {
            let chunk = &self.chunks[id];
            if chunk.contains(index) {
                return Some(id);
            }
            node = if index < chunk.logical_index {
                chunk.left
            } else {
                chunk.right
            };
        }
        None
    }

    // point `parent`'s link that used to hold `old` at `new` instead
    fn replace_child(&mut self, parent: Option<ChunkId>, old: ChunkId, new: Option<ChunkId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.chunks[p].left == Some(old) {
                    self.chunks[p].left = new;
                } else {
                    self.chunks[p].right = new;
                }
            }
        }
    }

    fn left_rotate(&mut self, x: ChunkId) {
        let y = self.chunks[x]
            .right
            .expect("left rotation needs a right child");

        // x.right = y.left
        let y_left = self.chunks[y].left;
        self.chunks[x].right = y_left;
        if let Some(yl) = y_left {
            self.chunks[yl].parent = Some(x);
        }

        // y.parent = x.parent; attach y to x.parent
        let x_parent = self.chunks[x].parent;
        self.chunks[y].parent = x_parent;
        self.replace_child(x_parent, x, Some(y));

        self.chunks[y].left = Some(x);
        self.chunks[x].parent = Some(y);
    }

    fn right_rotate(&mut self, y: ChunkId) {
        let x = self.chunks[y]
            .left
            .expect("right rotation needs a left child");

        // y.left = x.right
        let x_right = self.chunks[x].right;
        self.chunks[y].left = x_right;
        if let Some(xr) = x_right {
            self.chunks[xr].parent = Some(y);
        }

        // x.parent = y.parent
        let y_parent = self.chunks[y].parent;
        self.chunks[x].parent = y_parent;
        self.replace_child(y_parent, y, Some(x));

        self.chunks[x].right = Some(y);
        self.chunks[y].parent = Some(x);
    }

    /// Insert `z` directly after `anchor` in tree order, or before every
    /// other chunk when `anchor` is `None`.
    pub(crate) fn index_insert_after(&mut self, anchor: Option<ChunkId>, z: ChunkId) {
        {
            let chunk = &mut self.chunks[z];
            chunk.left = None;
            chunk.right = None;
            chunk.parent = None;
            chunk.color = Color::Red;
        }

        let Some(root) = self.root else {
            self.chunks[z].color = Color::Black;
            self.root = Some(z);
            return;
        };

        match anchor {
            // attach to the anchor's right if empty, otherwise as the left
            // child of the leftmost chunk in anchor.right
            Some(a) => match self.chunks[a].right {
                None => {
                    self.chunks[a].right = Some(z);
                    self.chunks[z].parent = Some(a);
                }
                Some(right) => {
                    let next = self.leftmost(right);
                    self.chunks[next].left = Some(z);
                    self.chunks[z].parent = Some(next);
                }
            },
            None => {
                let first = self.leftmost(root);
                self.chunks[first].left = Some(z);
                self.chunks[z].parent = Some(first);
            }
        }

        self.fix_insert(z);
    }

    fn fix_insert(&mut self, mut x: ChunkId) {
        while let Some(parent) = self.chunks[x].parent {
            if self.chunks[parent].color != Color::Red {
                break;
            }
            // a red parent is never the root
            let Some(grand) = self.chunks[parent].parent else {
                break;
            };

            if self.chunks[grand].left == Some(parent) {
                let uncle = self.chunks[grand].right;
                if let Some(u) = uncle.filter(|&u| self.chunks[u].color == Color::Red) {
                    // Case 1
                    self.set_color(parent, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(grand, Color::Red);
                    x = grand;
                } else {
                    // Case 2/3
                    if self.chunks[parent].right == Some(x) {
                        x = parent;
                        self.left_rotate(x);
                    }
                    let parent2 = self.chunks[x].parent.expect("parent after rotate");
                    let grand2 = self.chunks[parent2]
                        .parent
                        .expect("grandparent after rotate");
                    self.set_color(parent2, Color::Black);
                    self.set_color(grand2, Color::Red);
                    self.right_rotate(grand2);
                }
            } else {
                // Mirror cases
                let uncle = self.chunks[grand].left;
                if let Some(u) = uncle.filter(|&u| self.chunks[u].color == Color::Red) {
                    self.set_color(parent, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(grand, Color::Red);
                    x = grand;
                } else {
                    if self.chunks[parent].left == Some(x) {
                        x = parent;
                        self.right_rotate(x);
                    }
                    let parent2 = self.chunks[x].parent.expect("parent after rotate");
                    let grand2 = self.chunks[parent2]
                        .parent
                        .expect("grandparent after rotate");
                    self.set_color(parent2, Color::Black);
                    self.set_color(grand2, Color::Red);
                    self.left_rotate(grand2);
                }
            }
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Unlink `z` from the tree. The chunk stays in the arena.
    pub(crate) fn index_remove(&mut self, z: ChunkId) {
        if let (Some(left), Some(_)) = (self.chunks[z].left, self.chunks[z].right) {
            let pred = self.rightmost(left);
            self.swap_with_predecessor(z, pred);
        }

        // z now has at most one child
        let child = self.chunks[z].left.or(self.chunks[z].right);
        let parent = self.chunks[z].parent;
        if let Some(c) = child {
            self.chunks[c].parent = parent;
        }
        self.replace_child(parent, z, child);

        if self.chunks[z].color == Color::Black {
            self.fix_remove(child, parent);
        }

        let chunk = &mut self.chunks[z];
        chunk.parent = None;
        chunk.left = None;
        chunk.right = None;
    }

    // Exchange the tree positions (and colors) of `z` and its in-order
    // predecessor `y`. Ids stay attached to their chunks, so chain links are
    // untouched.
    fn swap_with_predecessor(&mut self, z: ChunkId, y: ChunkId) {
        let (z_parent, z_left, z_right, z_color) = {
            let c = &self.chunks[z];
            (c.parent, c.left, c.right, c.color)
        };
        let (y_parent, y_left, y_color) = {
            let c = &self.chunks[y];
            debug_assert!(c.right.is_none());
            (c.parent, c.left, c.color)
        };

        // y takes z's slot
        self.replace_child(z_parent, z, Some(y));
        self.chunks[y].parent = z_parent;
        self.chunks[y].right = z_right;
        if let Some(r) = z_right {
            self.chunks[r].parent = Some(y);
        }
        self.chunks[y].color = z_color;

        // z takes y's slot
        self.chunks[z].color = y_color;
        self.chunks[z].right = None;
        self.chunks[z].left = y_left;
        if let Some(l) = y_left {
            self.chunks[l].parent = Some(z);
        }

        if y_parent == Some(z) {
            self.chunks[y].left = Some(z);
            self.chunks[z].parent = Some(y);
        } else {
            self.chunks[y].left = z_left;
            if let Some(l) = z_left {
                self.chunks[l].parent = Some(y);
            }
            self.chunks[z].parent = y_parent;
            if let Some(p) = y_parent {
                self.chunks[p].right = Some(z);
            }
        }
    }

    // `x` carries an extra black; `parent` is tracked separately because `x`
    // may be absent.
    fn fix_remove(&mut self, mut x: Option<ChunkId>, mut parent: Option<ChunkId>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };

            if self.chunks[p].left == x {
                let mut w = self.chunks[p].right.expect("double black node has a sibling");
                if self.chunks[w].color == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.left_rotate(p);
                    w = self.chunks[p].right.expect("sibling after rotate");
                }
                if self.color_of(self.chunks[w].left) == Color::Black
                    && self.color_of(self.chunks[w].right) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    parent = self.chunks[p].parent;
                } else {
                    if self.color_of(self.chunks[w].right) == Color::Black {
                        if let Some(wl) = self.chunks[w].left {
                            self.set_color(wl, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.right_rotate(w);
                        w = self.chunks[p].right.expect("sibling after rotate");
                    }
                    let p_color = self.chunks[p].color;
                    self.set_color(w, p_color);
                    self.set_color(p, Color::Black);
                    if let Some(wr) = self.chunks[w].right {
                        self.set_color(wr, Color::Black);
                    }
                    self.left_rotate(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                // Mirror cases
                let mut w = self.chunks[p].left.expect("double black node has a sibling");
                if self.chunks[w].color == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.right_rotate(p);
                    w = self.chunks[p].left.expect("sibling after rotate");
                }
                if self.color_of(self.chunks[w].right) == Color::Black
                    && self.color_of(self.chunks[w].left) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    parent = self.chunks[p].parent;
                } else {
                    if self.color_of(self.chunks[w].left) == Color::Black {
                        if let Some(wr) = self.chunks[w].right {
                            self.set_color(wr, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.left_rotate(w);
                        w = self.chunks[p].left.expect("sibling after rotate");
                    }
                    let p_color = self.chunks[p].color;
                    self.set_color(w, p_color);
                    self.set_color(p, Color::Black);
                    if let Some(wl) = self.chunks[w].left {
                        self.set_color(wl, Color::Black);
                    }
                    self.right_rotate(p);
                    x = self.root;
                    parent = None;
                }
            }
        }

        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// Chunks in tree order, collected without using the chain.
    pub(crate) fn inorder(&self) -> Vec<ChunkId> {
        let mut out = Vec::with_capacity(self.chunks.len());
        let mut stack: Vec<ChunkId> = Vec::new();
        let mut cur = self.root;

        while cur.is_some() || !stack.is_empty() {
            while let Some(c) = cur {
                stack.push(c);
                cur = self.chunks[c].left;
            }
            if let Some(node) = stack.pop() {
                out.push(node);
                cur = self.chunks[node].right;
            }
        }
        out
    }

    /// Check parent links and the red-black rules, returning the black height.
    pub(crate) fn check_index(&self) -> Result<usize, String> {
        let Some(root) = self.root else {
            return Ok(0);
        };
        if self.chunks[root].color != Color::Black {
            return Err(format!("root chunk {root} is red"));
        }
        if self.chunks[root].parent.is_some() {
            return Err(format!("root chunk {root} has a parent"));
        }
        self.check_subtree(Some(root))
    }

    fn check_subtree(&self, node: Option<ChunkId>) -> Result<usize, String> {
        let Some(id) = node else {
            return Ok(1);
        };
        let chunk = &self.chunks[id];
        for child in [chunk.left, chunk.right].into_iter().flatten() {
            if self.chunks[child].parent != Some(id) {
                return Err(format!("chunk {child} does not point back to parent {id}"));
            }
            if chunk.color == Color::Red && self.chunks[child].color == Color::Red {
                return Err(format!("red chunk {id} has red child {child}"));
            }
        }
        let left = self.check_subtree(chunk.left)?;
        let right = self.check_subtree(chunk.right)?;
        if left != right {
            return Err(format!(
                "black height mismatch under chunk {id}: left={left}, right={right}"
            ));
        }
        Ok(left + usize::from(chunk.color == Color::Black))
    }
}
