//! A mutable byte rope stored as fixed-capacity chunks.
//!
//! Chunks are indexed by a red-black tree keyed on their starting offset and
//! linked into a chain in the same order. Edits split, thread, trim and merge
//! chunks, then reindex the chain. Every [`Rope`] guards its chunks with its
//! own mutex, so a rope can be shared between threads behind an `Arc`.
//!
//! ```
//! use chunk_rope::Rope;
//!
//! let rope = Rope::from_str_with_capacity("abcdefghij", 4);
//! rope.insert_str(4, "xyz").unwrap();
//! assert_eq!(rope.flatten(), "abcdxyzefghij");
//! ```

mod builder;
mod chain;
mod chunk;
mod cursor;
mod edit;
mod error;
mod index;
mod search;

pub use builder::RopeBuilder;
pub use chunk::DEFAULT_CHUNK_CAPACITY;
pub use cursor::Cursor;
pub use error::{Result, RopeError};
pub use search::{HASH_BASE, HASH_MODULUS};

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Range, RangeBounds};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use index::ChunkTree;
use tracing::debug;

#[derive(Debug)]
pub struct Rope {
    tree: Mutex<ChunkTree>,
}

/// Where incoming text lands relative to the receiving rope.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Front,
    Back,
    At(usize),
}

impl Placement {
    fn resolve(self, tree: &ChunkTree) -> Result<usize> {
        match self {
            Placement::Front => Ok(0),
            Placement::Back => Ok(tree.len()),
            Placement::At(index) => tree.ensure_position(index).map(|()| index),
        }
    }
}

impl Rope {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// An empty rope whose chunks hold `capacity` bytes each.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_tree(ChunkTree::new(capacity))
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn from_str_with_capacity(text: &str, capacity: usize) -> Self {
        Self::from_bytes_with_capacity(text.as_bytes(), capacity)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn from_bytes_with_capacity(bytes: &[u8], capacity: usize) -> Self {
        if bytes.len() >= 1 << 20 {
            debug!(len = bytes.len(), capacity, "building large rope");
        }
        Self::from_tree(ChunkTree::from_bytes(bytes, capacity))
    }

    pub(crate) fn from_tree(tree: ChunkTree) -> Self {
        Rope {
            tree: Mutex::new(tree),
        }
    }

    fn into_tree(self) -> ChunkTree {
        self.tree.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, ChunkTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Lock two distinct ropes, always in address order.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Rope,
    ) -> (MutexGuard<'a, ChunkTree>, MutexGuard<'a, ChunkTree>) {
        debug_assert!(!ptr::eq(self, other));
        if ptr::from_ref(self) < ptr::from_ref(other) {
            let mine = self.lock();
            let theirs = other.lock();
            (mine, theirs)
        } else {
            let theirs = other.lock();
            let mine = self.lock();
            (mine, theirs)
        }
    }

    fn edit<T>(&self, f: impl FnOnce(&mut ChunkTree) -> T) -> T {
        let mut tree = self.lock();
        let out = f(&mut tree);
        debug_assert_eq!(tree.check_invariants(), Ok(()));
        out
    }

    // Mutate this rope while reading `donor`. A rope combined with itself
    // reads from a snapshot taken under the single lock.
    fn edit_with<T>(&self, donor: &Rope, f: impl FnOnce(&mut ChunkTree, &ChunkTree) -> T) -> T {
        let out;
        if ptr::eq(self, donor) {
            let mut tree = self.lock();
            let snapshot = tree.clone();
            out = f(&mut tree, &snapshot);
            debug_assert_eq!(tree.check_invariants(), Ok(()));
        } else {
            let (mut tree, donor) = self.lock_pair(donor);
            out = f(&mut tree, &donor);
            debug_assert_eq!(tree.check_invariants(), Ok(()));
        }
        out
    }

    fn read_with<T>(&self, other: &Rope, f: impl FnOnce(&ChunkTree, &ChunkTree) -> T) -> T {
        if ptr::eq(self, other) {
            let tree = self.lock();
            return f(&tree, &tree);
        }
        let (tree, other) = self.lock_pair(other);
        f(&tree, &other)
    }

    /// Deep copy: every chunk's content lands in a fresh chunk of the same
    /// capacity.
    pub fn copy(&self) -> Rope {
        let tree = self.lock();
        let capacity = tree.capacity();
        Rope::from_tree(ChunkTree::from_texts(tree.copy_texts(capacity), capacity))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn chunk_capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn chunk_count(&self) -> usize {
        self.lock().chunk_count()
    }

    pub fn valid_index(&self, index: usize) -> bool {
        index < self.len()
    }

    pub fn item(&self, index: usize) -> Result<u8> {
        let tree = self.lock();
        tree.ensure_index(index)?;
        Ok(tree.byte_at(index).expect("index checked against length"))
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.lock().byte_at(index)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.lock().flatten()
    }

    /// The whole content as a string; bytes that are not valid UTF-8 are
    /// replaced.
    pub fn flatten(&self) -> String {
        match String::from_utf8(self.to_bytes()) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Positioned over this rope's chunks; holds the rope's lock while alive.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.lock())
    }

    /// Verify chain/tree agreement, logical indices, counts and the
    /// red-black rules.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.lock().check_invariants()
    }

    // ---------- search and comparison ----------

    pub fn contains_char(&self, value: u8) -> bool {
        self.lock().contains_byte(value)
    }

    /// Polynomial hash of the content, base [`HASH_BASE`], modulo
    /// [`HASH_MODULUS`].
    pub fn hash(&self) -> u32 {
        self.lock().hash()
    }

    pub fn cmp_rope(&self, other: &Rope) -> Ordering {
        self.read_with(other, |tree, other| tree.compare(other.bytes()))
    }

    pub fn cmp_str(&self, other: &str) -> Ordering {
        self.lock().compare(other.bytes())
    }

    pub fn is_equal(&self, other: &Rope) -> bool {
        self.cmp_rope(other) == Ordering::Equal
    }

    pub fn is_less(&self, other: &Rope) -> bool {
        self.cmp_rope(other) == Ordering::Less
    }

    pub fn is_greater(&self, other: &Rope) -> bool {
        self.cmp_rope(other) == Ordering::Greater
    }

    pub fn is_equal_str(&self, other: &str) -> bool {
        self.cmp_str(other) == Ordering::Equal
    }

    pub fn is_less_str(&self, other: &str) -> bool {
        self.cmp_str(other) == Ordering::Less
    }

    pub fn is_greater_str(&self, other: &str) -> bool {
        self.cmp_str(other) == Ordering::Greater
    }

    pub fn substring_index(&self, pattern: &Rope) -> Option<usize> {
        self.read_with(pattern, |tree, pattern| {
            tree.find_bytes(&pattern.flatten(), 0..tree.len())
        })
    }

    pub fn substring_index_str(&self, pattern: &str) -> Option<usize> {
        let tree = self.lock();
        tree.find_bytes(pattern.as_bytes(), 0..tree.len())
    }

    /// First match lying entirely inside `range`.
    pub fn substring_index_in(
        &self,
        pattern: &Rope,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<usize>> {
        self.read_with(pattern, |tree, pattern| {
            let span = tree.span(range)?;
            Ok(tree.find_bytes(&pattern.flatten(), span))
        })
    }

    pub fn substring_index_in_str(
        &self,
        pattern: &str,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<usize>> {
        let tree = self.lock();
        let span = tree.span(range)?;
        Ok(tree.find_bytes(pattern.as_bytes(), span))
    }

    pub fn contains(&self, pattern: &Rope) -> bool {
        self.substring_index(pattern).is_some()
    }

    pub fn contains_str(&self, pattern: &str) -> bool {
        self.substring_index_str(pattern).is_some()
    }

    pub fn starts_with(&self, pattern: &Rope) -> bool {
        self.read_with(pattern, |tree, pattern| {
            tree.matches_at(0, &pattern.flatten())
        })
    }

    pub fn starts_with_str(&self, pattern: &str) -> bool {
        self.lock().matches_at(0, pattern.as_bytes())
    }

    pub fn ends_with(&self, pattern: &Rope) -> bool {
        self.read_with(pattern, |tree, pattern| {
            ends_with_bytes(tree, &pattern.flatten())
        })
    }

    pub fn ends_with_str(&self, pattern: &str) -> bool {
        ends_with_bytes(&self.lock(), pattern.as_bytes())
    }

    /// One rope per non-empty run between any of the `separators`.
    pub fn split(&self, separators: &[u8]) -> Vec<Rope> {
        let tree = self.lock();
        let spans = tree.split_spans(separators);
        let mut parts = Vec::with_capacity(spans.len());
        for span in spans {
            parts.push(Rope::from_tree(tree.copy_span(span, tree.capacity())));
        }
        parts
    }

    // ---------- copies ----------

    pub fn substring(&self, range: impl RangeBounds<usize>) -> Result<Rope> {
        let tree = self.lock();
        let span = tree.span(range)?;
        Ok(Rope::from_tree(tree.copy_span(span, tree.capacity())))
    }

    pub fn as_lower(&self, range: impl RangeBounds<usize>) -> Result<Rope> {
        let copy = self.substring(range)?;
        copy.to_lower(..)?;
        Ok(copy)
    }

    pub fn as_upper(&self, range: impl RangeBounds<usize>) -> Result<Rope> {
        let copy = self.substring(range)?;
        copy.to_upper(..)?;
        Ok(copy)
    }

    // ---------- in-place edits ----------

    pub fn to_lower(&self, range: impl RangeBounds<usize>) -> Result<()> {
        self.edit(|tree| {
            let span = tree.span(range)?;
            tree.map_span(span, |b| b.to_ascii_lowercase());
            Ok(())
        })
    }

    pub fn to_upper(&self, range: impl RangeBounds<usize>) -> Result<()> {
        self.edit(|tree| {
            let span = tree.span(range)?;
            tree.map_span(span, |b| b.to_ascii_uppercase());
            Ok(())
        })
    }

    /// Overwrite the byte at `index`.
    pub fn put(&self, index: usize, value: u8) -> Result<()> {
        self.edit(|tree| {
            tree.ensure_index(index)?;
            tree.put(index, value);
            Ok(())
        })
    }

    /// Open `count` blank bytes at `index`.
    pub fn insert_blank(&self, index: usize, count: usize) -> Result<()> {
        self.edit(|tree| {
            tree.ensure_position(index)?;
            tree.make_room(index, count);
            Ok(())
        })
    }

    fn place_bytes(&self, at: Placement, bytes: &[u8]) -> Result<()> {
        self.edit(|tree| {
            let index = at.resolve(tree)?;
            tree.insert_bytes(index, bytes);
            Ok(())
        })
    }

    pub fn insert_char(&self, index: usize, value: u8) -> Result<()> {
        self.place_bytes(Placement::At(index), &[value])
    }

    pub fn append_char(&self, value: u8) {
        self.place_bytes(Placement::Back, &[value])
            .expect("the end is always a valid position");
    }

    pub fn prepend_char(&self, value: u8) {
        self.place_bytes(Placement::Front, &[value])
            .expect("the front is always a valid position");
    }

    pub fn insert_str(&self, index: usize, text: &str) -> Result<()> {
        self.place_bytes(Placement::At(index), text.as_bytes())
    }

    pub fn append_str(&self, text: &str) {
        self.place_bytes(Placement::Back, text.as_bytes())
            .expect("the end is always a valid position");
    }

    pub fn prepend_str(&self, text: &str) {
        self.place_bytes(Placement::Front, text.as_bytes())
            .expect("the front is always a valid position");
    }

    // Copy every donor chunk into fresh chunks owned by this rope.
    fn place_copy(&self, at: Placement, donor: &Rope) -> Result<()> {
        self.edit_with(donor, |tree, donor| {
            let index = at.resolve(tree)?;
            let texts = donor.copy_texts(tree.capacity());
            tree.splice_texts(index, texts);
            Ok(())
        })
    }

    /// Insert a copy of `other` at `index`; `other` is left untouched.
    pub fn insert(&self, index: usize, other: &Rope) -> Result<()> {
        self.place_copy(Placement::At(index), other)
    }

    pub fn append(&self, other: &Rope) {
        self.place_copy(Placement::Back, other)
            .expect("the end is always a valid position");
    }

    pub fn prepend(&self, other: &Rope) {
        self.place_copy(Placement::Front, other)
            .expect("the front is always a valid position");
    }

    // Relink the donor's chunk buffers into this rope without copying them.
    fn place_moved(&self, at: Placement, donor: Rope) -> Result<()> {
        let donor = donor.into_tree();
        self.edit(|tree| {
            if donor.capacity() != tree.capacity() {
                return Err(RopeError::CapacityMismatch {
                    expected: tree.capacity(),
                    found: donor.capacity(),
                });
            }
            let index = at.resolve(tree)?;
            let moved = donor.chunk_count();
            tree.splice_texts(index, donor.into_texts());
            debug!(index, chunks = moved, "moved donor chunks");
            Ok(())
        })
    }

    /// Move the chunks of `donor` into this rope at `index`, consuming the
    /// donor. Both ropes must share a chunk capacity. On error the donor is
    /// dropped.
    pub fn insert_destructive(&self, index: usize, donor: Rope) -> Result<()> {
        self.place_moved(Placement::At(index), donor)
    }

    pub fn append_destructive(&self, donor: Rope) -> Result<()> {
        self.place_moved(Placement::Back, donor)
    }

    pub fn prepend_destructive(&self, donor: Rope) -> Result<()> {
        self.place_moved(Placement::Front, donor)
    }

    /// Replace `range` with the content of `other`.
    pub fn replace(&self, range: impl RangeBounds<usize>, other: &Rope) -> Result<()> {
        self.edit_with(other, |tree, other| {
            let span = tree.span(range)?;
            tree.replace_span(span, &other.flatten());
            Ok(())
        })
    }

    pub fn replace_str(&self, range: impl RangeBounds<usize>, text: &str) -> Result<()> {
        self.edit(|tree| {
            let span = tree.span(range)?;
            tree.replace_span(span, text.as_bytes());
            Ok(())
        })
    }

    /// Replace every occurrence of `pattern`, returning how many were
    /// replaced. Pattern and replacement are read before this rope is locked.
    pub fn replace_all(&self, pattern: &Rope, replacement: &Rope) -> usize {
        let pattern = pattern.to_bytes();
        let replacement = replacement.to_bytes();
        self.edit(|tree| replace_all_bytes(tree, &pattern, &replacement))
    }

    pub fn replace_all_str(&self, pattern: &str, replacement: &str) -> usize {
        self.edit(|tree| replace_all_bytes(tree, pattern.as_bytes(), replacement.as_bytes()))
    }

    fn trim(&self, span: impl FnOnce(usize) -> Result<Range<usize>>) -> Result<()> {
        self.edit(|tree| {
            let span = span(tree.len())?;
            tree.remove_span(span);
            Ok(())
        })
    }

    pub fn remove_char(&self, index: usize) -> Result<()> {
        self.edit(|tree| {
            tree.ensure_index(index)?;
            tree.remove_span(index..index + 1);
            Ok(())
        })
    }

    pub fn remove_range(&self, range: impl RangeBounds<usize>) -> Result<()> {
        self.edit(|tree| {
            let span = tree.span(range)?;
            tree.remove_span(span);
            Ok(())
        })
    }

    /// Keep only the first `count` bytes.
    pub fn keep_head(&self, count: usize) -> Result<()> {
        self.trim(|len| within_len(count, len).map(|n| n..len))
    }

    /// Keep only the last `count` bytes.
    pub fn keep_tail(&self, count: usize) -> Result<()> {
        self.trim(|len| within_len(count, len).map(|n| 0..len - n))
    }

    /// Drop the first `count` bytes.
    pub fn remove_head(&self, count: usize) -> Result<()> {
        self.trim(|len| within_len(count, len).map(|n| 0..n))
    }

    /// Drop the last `count` bytes.
    pub fn remove_tail(&self, count: usize) -> Result<()> {
        self.trim(|len| within_len(count, len).map(|n| len - n..len))
    }

    pub fn clear(&self) {
        self.edit(|tree| {
            let len = tree.len();
            tree.remove_span(0..len);
        });
    }

    /// Merge neighbouring chunks whose combined length fits one chunk.
    /// Returns the number of chunks freed.
    pub fn reclaim(&self) -> usize {
        self.edit(ChunkTree::reclaim)
    }
}

fn within_len(count: usize, len: usize) -> Result<usize> {
    if count <= len {
        Ok(count)
    } else {
        Err(RopeError::OutOfBounds { index: count, len })
    }
}

fn ends_with_bytes(tree: &ChunkTree, pattern: &[u8]) -> bool {
    match tree.len().checked_sub(pattern.len()) {
        Some(start) => tree.matches_at(start, pattern),
        None => false,
    }
}

// The scan resumes after each inserted replacement, so replacement text is
// never matched again.
fn replace_all_bytes(tree: &mut ChunkTree, pattern: &[u8], replacement: &[u8]) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    let mut replaced = 0;
    let mut position = 0;
    while let Some(found) = tree.find_bytes(pattern, position..tree.len()) {
        tree.replace_span(found..found + pattern.len(), replacement);
        position = found + replacement.len();
        replaced += 1;
    }
    debug!(replaced, "replaced all occurrences");
    replaced
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Rope {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Rope::from_str_with_capacity(text, DEFAULT_CHUNK_CAPACITY)
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Rope::from(text.as_str())
    }
}

impl From<&[u8]> for Rope {
    fn from(bytes: &[u8]) -> Self {
        Rope::from_bytes_with_capacity(bytes, DEFAULT_CHUNK_CAPACITY)
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten())
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Rope) -> bool {
        self.is_equal(other)
    }
}

impl Eq for Rope {}

impl PartialEq<str> for Rope {
    fn eq(&self, other: &str) -> bool {
        self.is_equal_str(other)
    }
}

impl PartialEq<&str> for Rope {
    fn eq(&self, other: &&str) -> bool {
        self.is_equal_str(other)
    }
}

impl PartialOrd for Rope {
    fn partial_cmp(&self, other: &Rope) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rope {
    fn cmp(&self, other: &Rope) -> Ordering {
        self.cmp_rope(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world() {
        let hello_rope = Rope::from("Hello world!");
        let hello_string = String::from("Hello world!");
        assert_eq!(hello_rope.to_string(), hello_string);
    }

    #[test]
    fn hello_not_the_same() {
        let hello_rope = Rope::from("Hello rope!");
        assert_ne!(hello_rope, "Hello word!");
    }

    #[test]
    fn insert_at_beginning() {
        let rope = Rope::from_str_with_capacity("world!", 4);
        rope.insert_str(0, "Hello ").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_at_end() {
        let rope = Rope::from_str_with_capacity("Hello", 4);
        rope.insert_str(5, " world!").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_in_middle() {
        let rope = Rope::from_str_with_capacity("Helloworld!", 4);
        rope.insert_str(5, " ").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let rope = Rope::from("Hello");
        assert_eq!(
            rope.insert_str(6, "!"),
            Err(RopeError::OutOfBounds { index: 6, len: 5 })
        );
        assert_eq!(rope.to_string(), "Hello");
    }

    #[test]
    fn delete_at_beginning() {
        let rope = Rope::from_str_with_capacity("Hello world!", 4);
        rope.remove_range(0..6).unwrap();
        assert_eq!(rope.to_string(), "world!");
    }

    #[test]
    fn delete_at_end() {
        let rope = Rope::from_str_with_capacity("Hello world!", 4);
        rope.remove_range(5..12).unwrap();
        assert_eq!(rope.to_string(), "Hello");
    }

    #[test]
    fn delete_in_middle() {
        let rope = Rope::from_str_with_capacity("Hello beautiful world!", 4);
        rope.remove_range(6..16).unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn delete_then_insert() {
        let rope = Rope::from_str_with_capacity("Hello beautiful world!", 4);
        rope.remove_range(6..21).unwrap();
        rope.insert_str(6, "world").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_and_delete() {
        let rope = Rope::from_str_with_capacity("Hello", 4);
        rope.insert_str(5, " world!").unwrap();
        rope.remove_range(5..11).unwrap();
        assert_eq!(rope.to_string(), "Hello!");
    }

    #[test]
    fn item_and_put() {
        let rope = Rope::from_str_with_capacity("abcdefghij", 4);
        assert_eq!(rope.item(5), Ok(b'f'));
        assert_eq!(rope.item(10), Err(RopeError::OutOfBounds { index: 10, len: 10 }));
        rope.put(5, b'F').unwrap();
        assert_eq!(rope.flatten(), "abcdeFghij");
        assert!(rope.valid_index(9));
        assert!(!rope.valid_index(10));
    }

    #[test]
    fn single_char_edits() {
        let rope = Rope::with_capacity(2);
        rope.append_char(b'b');
        rope.prepend_char(b'a');
        rope.append_char(b'd');
        rope.insert_char(2, b'c').unwrap();
        assert_eq!(rope.flatten(), "abcd");
        rope.remove_char(0).unwrap();
        assert_eq!(rope.flatten(), "bcd");
        assert!(rope.remove_char(3).is_err());
    }

    #[test]
    fn blank_room_is_spaces() {
        let rope = Rope::from_str_with_capacity("ab", 2);
        rope.insert_blank(1, 5).unwrap();
        assert_eq!(rope.flatten(), "a     b");
        assert!(rope.insert_blank(9, 1).is_err());
    }

    #[test]
    fn head_and_tail_trimming() {
        let rope = Rope::from_str_with_capacity("0123456789", 3);
        rope.keep_head(8).unwrap();
        assert_eq!(rope.flatten(), "01234567");
        rope.keep_tail(6).unwrap();
        assert_eq!(rope.flatten(), "234567");
        rope.remove_head(2).unwrap();
        assert_eq!(rope.flatten(), "4567");
        rope.remove_tail(3).unwrap();
        assert_eq!(rope.flatten(), "4");
        assert!(rope.remove_tail(2).is_err());
        rope.clear();
        assert!(rope.is_empty());
        assert_eq!(rope.chunk_count(), 1);
    }

    #[test]
    fn comparisons() {
        let a = Rope::from_str_with_capacity("apple", 2);
        let b = Rope::from_str_with_capacity("apricot", 3);
        assert!(a.is_less(&b));
        assert!(b.is_greater(&a));
        assert!(a.is_equal(&a));
        assert!(a.is_equal_str("apple"));
        assert!(a.is_less_str("apples"));
        assert!(a.is_greater_str("app"));
        assert!(a < b);
    }

    #[test]
    fn searching() {
        let rope = Rope::from_str_with_capacity("the cat sat on the mat", 4);
        assert!(rope.contains_char(b'm'));
        assert!(!rope.contains_char(b'z'));
        assert_eq!(rope.substring_index_str("the"), Some(0));
        assert_eq!(rope.substring_index_in_str("the", 1..), Ok(Some(15)));
        assert_eq!(rope.substring_index_in_str("the", 1..17), Ok(None));
        assert!(rope.starts_with_str("the c"));
        assert!(rope.ends_with_str("mat"));
        assert!(!rope.ends_with_str("a longer pattern than the rope itself"));
        let pattern = Rope::from("sat");
        assert_eq!(rope.substring_index(&pattern), Some(8));
        assert!(rope.contains(&pattern));
        assert!(rope.starts_with(&Rope::from("the")));
        assert!(rope.ends_with(&Rope::from("the mat")));
    }

    #[test]
    fn case_conversion() {
        let rope = Rope::from_str_with_capacity("Hello World", 3);
        assert_eq!(rope.as_upper(0..5).unwrap().flatten(), "HELLO");
        assert_eq!(rope.as_lower(6..).unwrap().flatten(), "world");
        rope.to_upper(6..).unwrap();
        rope.to_lower(..1).unwrap();
        assert_eq!(rope.flatten(), "hello WORLD");
    }

    #[test]
    fn split_on_separators() {
        let rope = Rope::from_str_with_capacity("a,b;;c,", 2);
        let parts: Vec<String> = rope.split(b",;").iter().map(Rope::flatten).collect();
        assert_eq!(parts, vec!["a", "b", "c"]);
        assert!(Rope::from(",,,").split(b",").is_empty());
    }

    #[test]
    fn replace_with_rope_and_self() {
        let rope = Rope::from_str_with_capacity("abcdef", 4);
        rope.replace(1..3, &Rope::from("XYZW")).unwrap();
        assert_eq!(rope.flatten(), "aXYZWdef");
        rope.replace(0..8, &rope).unwrap();
        assert_eq!(rope.flatten(), "aXYZWdef");
        rope.replace_str(1..5, "").unwrap();
        assert_eq!(rope.flatten(), "adef");
    }

    #[test]
    fn copy_variants_leave_donor_alone() {
        let a = Rope::from_str_with_capacity("abc", 4);
        let b = Rope::from_str_with_capacity("defgh", 2);
        a.append(&b);
        a.prepend(&b);
        a.insert(5, &b).unwrap();
        assert_eq!(a.flatten(), "defghdefghabcdefgh");
        assert_eq!(b.flatten(), "defgh");
        assert_eq!(a.chunk_capacity(), 4);
        a.check_invariants().unwrap();
    }

    #[test]
    fn append_to_itself() {
        let rope = Rope::from_str_with_capacity("ab", 4);
        rope.append(&rope);
        assert_eq!(rope.flatten(), "abab");
    }

    #[test]
    fn destructive_variants_move_chunks() {
        let a = Rope::from_str_with_capacity("abc", 4);
        a.append_destructive(Rope::from_str_with_capacity("xyz", 4))
            .unwrap();
        a.prepend_destructive(Rope::from_str_with_capacity("01", 4))
            .unwrap();
        a.insert_destructive(2, Rope::from_str_with_capacity("--", 4))
            .unwrap();
        assert_eq!(a.flatten(), "01--abcxyz");
        a.check_invariants().unwrap();
    }

    #[test]
    fn destructive_requires_matching_capacity() {
        let a = Rope::from_str_with_capacity("abc", 4);
        let result = a.append_destructive(Rope::from_str_with_capacity("xyz", 8));
        assert_eq!(
            result,
            Err(RopeError::CapacityMismatch {
                expected: 4,
                found: 8
            })
        );
        assert_eq!(a.flatten(), "abc");
    }

    #[test]
    fn clone_is_deep() {
        let a = Rope::from_str_with_capacity("shared", 2);
        let b = a.clone();
        b.put(0, b'S').unwrap();
        assert_eq!(a.flatten(), "shared");
        assert_eq!(b.flatten(), "Shared");
        assert_eq!(b.chunk_capacity(), 2);
    }

    #[test]
    fn reclaim_after_fragmenting_edits() {
        let rope = Rope::from_str_with_capacity(&"abcdefgh".repeat(8), 8);
        for i in (0..8).rev() {
            rope.remove_range(i * 8 + 1..i * 8 + 6).unwrap();
        }
        let before = rope.chunk_count();
        let freed = rope.reclaim();
        assert_eq!(rope.chunk_count(), before - freed);
        assert!(freed > 0);
        assert_eq!(rope.flatten(), "agh".repeat(8));
    }
}
