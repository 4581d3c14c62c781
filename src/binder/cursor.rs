//! Forward traversal over a binder's notes.
//!
//! Two flavours are provided:
//!
//! - [`Cursor`]: an owning, read-only forward cursor in the style of a
//!   begin/end iterator pair. It holds its own reference to the block it was
//!   drawn from, so the block stays alive (and, because it is now shared,
//!   the next mutation of the originating handle copies instead of editing
//!   in place). A cursor therefore never dangles; after the handle is
//!   mutated it keeps enumerating the block as it was.
//! - [`Iter`], [`Entries`] and [`Keys`]: ordinary borrowing iterators tied
//!   to the lifetime of a `&Binder`.

use std::fmt;
use std::iter::FusedIterator;

use super::ReferenceCounter;
use super::block::{Block, Note, SlotId};

// =============================================================================
// Cursor
// =============================================================================

/// A read-only forward cursor over a binder's note sequence.
///
/// Obtained from [`Binder::begin`](super::Binder::begin) and
/// [`Binder::end`](super::Binder::end). Two cursors compare equal if both
/// come from a binder without a block, or if both point at the same position
/// of the same block.
///
/// # Examples
///
/// ```rust
/// use cow_binder::Binder;
///
/// let mut binder = Binder::new();
/// binder.insert_front("b", 2).unwrap();
/// binder.insert_front("a", 1).unwrap();
///
/// let mut cursor = binder.begin();
/// let end = binder.end();
/// let mut seen = Vec::new();
/// while cursor != end {
///     seen.push(*cursor.get().unwrap());
///     cursor.advance();
/// }
/// assert_eq!(seen, vec![1, 2]);
/// ```
pub struct Cursor<K, V> {
    block: Option<ReferenceCounter<Block<K, V>>>,
    position: Option<SlotId>,
}

impl<K, V> Cursor<K, V> {
    pub(crate) const fn detached() -> Self {
        Self {
            block: None,
            position: None,
        }
    }

    pub(crate) fn at_head(block: &ReferenceCounter<Block<K, V>>) -> Self {
        Self {
            position: block.head(),
            block: Some(ReferenceCounter::clone(block)),
        }
    }

    pub(crate) fn past_end(block: &ReferenceCounter<Block<K, V>>) -> Self {
        Self {
            block: Some(ReferenceCounter::clone(block)),
            position: None,
        }
    }

    fn note(&self) -> Option<&Note<K, V>> {
        let block = self.block.as_ref()?;
        block.note(self.position?)
    }

    /// Returns the value at the current position, or `None` at the end.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&V> {
        self.note().map(|note| &note.value)
    }

    /// Returns the key at the current position, or `None` at the end.
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.note().map(|note| &note.key)
    }

    /// Returns `true` once the cursor has moved past the last note.
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// Moves to the next note. Advancing an end cursor does nothing.
    pub fn advance(&mut self) {
        if let (Some(block), Some(position)) = (&self.block, self.position) {
            self.position = block.next(position);
        }
    }
}

impl<K, V> Clone for Cursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            block: self.block.clone(),
            position: self.position,
        }
    }
}

impl<K, V> PartialEq for Cursor<K, V> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.block, &other.block) {
            (None, None) => true,
            (Some(left), Some(right)) => {
                ReferenceCounter::ptr_eq(left, right) && self.position == other.position
            }
            _ => false,
        }
    }
}

impl<K, V> Eq for Cursor<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.note() {
            Some(note) => formatter
                .debug_struct("Cursor")
                .field("key", &note.key)
                .field("value", &note.value)
                .finish(),
            None => formatter.write_str("Cursor(end)"),
        }
    }
}

/// Yields owned copies of the remaining values.
impl<K, V: Clone> Iterator for Cursor<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.get().cloned()?;
        self.advance();
        Some(value)
    }
}

impl<K, V: Clone> FusedIterator for Cursor<K, V> {}

// =============================================================================
// Borrowing iterators
// =============================================================================

/// Shared state of the borrowing iterators.
struct Walk<'a, K, V> {
    block: Option<&'a Block<K, V>>,
    position: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V> Walk<'a, K, V> {
    fn new(block: Option<&'a Block<K, V>>) -> Self {
        Self {
            position: block.and_then(Block::head),
            remaining: block.map_or(0, Block::len),
            block,
        }
    }

    fn step(&mut self) -> Option<&'a Note<K, V>> {
        let block = self.block?;
        let position = self.position?;
        self.position = block.next(position);
        self.remaining = self.remaining.saturating_sub(1);
        block.note(position)
    }
}

impl<K, V> Clone for Walk<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            block: self.block,
            position: self.position,
            remaining: self.remaining,
        }
    }
}

/// An iterator over the values of a [`Binder`](super::Binder) in sequence order.
pub struct Iter<'a, K, V> {
    walk: Walk<'a, K, V>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(block: Option<&'a Block<K, V>>) -> Self {
        Self {
            walk: Walk::new(block),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.walk.step().map(|note| &note.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.walk.remaining, Some(self.walk.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
        }
    }
}

/// An iterator over the key/value pairs of a [`Binder`](super::Binder) in sequence order.
pub struct Entries<'a, K, V> {
    walk: Walk<'a, K, V>,
}

impl<'a, K, V> Entries<'a, K, V> {
    pub(crate) fn new(block: Option<&'a Block<K, V>>) -> Self {
        Self {
            walk: Walk::new(block),
        }
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.walk.step().map(|note| (&note.key, &note.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.walk.remaining, Some(self.walk.remaining))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}

impl<K, V> FusedIterator for Entries<'_, K, V> {}

/// An iterator over the keys of a [`Binder`](super::Binder) in sequence order.
pub struct Keys<'a, K, V> {
    walk: Walk<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(block: Option<&'a Block<K, V>>) -> Self {
        Self {
            walk: Walk::new(block),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.walk.step().map(|note| &note.key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.walk.remaining, Some(self.walk.remaining))
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::block::Position;
    use rstest::rstest;

    fn shared_block(keys: &[&'static str]) -> ReferenceCounter<Block<&'static str, usize>> {
        let mut block = Block::new();
        for (value, key) in keys.iter().enumerate().rev() {
            block
                .insert_note::<&str>(Position::Front, *key, value)
                .unwrap();
        }
        ReferenceCounter::new(block)
    }

    #[rstest]
    fn test_detached_cursors_are_equal() {
        let begin: Cursor<&str, usize> = Cursor::detached();
        let end = Cursor::detached();
        assert_eq!(begin, end);
        assert!(begin.get().is_none());
    }

    #[rstest]
    fn test_detached_cursor_differs_from_block_cursor() {
        let block = shared_block(&[]);
        assert_ne!(Cursor::detached(), Cursor::past_end(&block));
    }

    #[rstest]
    fn test_empty_block_begin_equals_end() {
        let block = shared_block(&[]);
        assert_eq!(Cursor::at_head(&block), Cursor::past_end(&block));
    }

    #[rstest]
    fn test_cursor_walks_in_sequence_order() {
        let block = shared_block(&["a", "b", "c"]);
        let mut cursor = Cursor::at_head(&block);
        let mut keys = Vec::new();
        while !cursor.is_end() {
            keys.push(*cursor.key().unwrap());
            cursor.advance();
        }
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(cursor, Cursor::past_end(&block));

        cursor.advance();
        assert!(cursor.is_end());
    }

    #[rstest]
    fn test_cursors_on_different_blocks_differ() {
        let first = shared_block(&["a"]);
        let second = shared_block(&["a"]);
        assert_ne!(Cursor::at_head(&first), Cursor::at_head(&second));
        assert_ne!(Cursor::past_end(&first), Cursor::past_end(&second));
    }

    #[rstest]
    fn test_cursor_keeps_block_alive() {
        let block = shared_block(&["a", "b"]);
        let cursor = Cursor::at_head(&block);
        assert_eq!(ReferenceCounter::strong_count(&block), 2);
        drop(block);
        assert_eq!(cursor.get(), Some(&0));
    }

    #[rstest]
    fn test_cursor_iterator_clones_values() {
        let block = shared_block(&["a", "b", "c"]);
        let values: Vec<usize> = Cursor::at_head(&block).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[rstest]
    fn test_borrowing_iterators_report_exact_size() {
        let block = shared_block(&["a", "b", "c"]);
        let mut entries = Entries::new(Some(&*block));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.next(), Some((&"a", &0)));
        assert_eq!(entries.len(), 2);
        assert_eq!(Keys::new(Some(&*block)).collect::<Vec<_>>(), vec![&"a", &"b", &"c"]);
        assert_eq!(Iter::new(None::<&Block<&str, usize>>).next(), None);
    }
}
