//! Copy-on-write ordered associative container.
//!
//! A [`Binder`] is a handle to a sequence of keyed notes kept in explicit
//! insertion-position order (front, or right after another key). Copies of
//! a binder share one underlying block until one of them is mutated; only
//! then does the mutating copy take a private clone.
//!
//! # Sharing
//!
//! ```rust
//! use cow_binder::Binder;
//!
//! let mut first = Binder::new();
//! first.insert_front("a", 1).unwrap();
//!
//! let mut second = first.clone();
//! assert!(first.is_shared());
//!
//! second.insert_front("b", 2).unwrap();
//! assert!(!first.is_shared());
//!
//! assert_eq!(first.len(), 1);
//! assert_eq!(second.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
//! ```
//!
//! # Failure Atomicity
//!
//! Every fallible operation either completes or leaves the binder (and all
//! of its copies) exactly as it was. This also holds when a `Clone` or
//! `Ord` implementation of the key or value panics part way through.
//!
//! # Time Complexity
//!
//! | Operation         | Unshared block | Shared block |
//! |-------------------|----------------|--------------|
//! | `insert_front`    | O(log n)       | O(n)         |
//! | `insert_after`    | O(log n)       | O(n)         |
//! | `remove`          | O(log n)       | O(n)         |
//! | `remove_front`    | O(log n)       | O(n)         |
//! | `read_mut`        | O(log n)       | O(n)         |
//! | `read`            | O(log n)       | O(log n)     |
//! | `len`             | O(1)           | O(1)         |
//! | `clone`           | O(1)           | O(1)         |

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, which lets
/// binders move between threads when `K` and `V` allow it.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod block;
mod controller;
mod cursor;
mod error;

pub use cursor::{Cursor, Entries, Iter, Keys};
pub use error::{BinderError, Result};

use std::borrow::Borrow;
use std::fmt;

use block::{Block, Position};
use controller::Edit;

/// A copy-on-write handle to an ordered sequence of keyed notes.
///
/// Cloning a binder is O(1): both handles point at the same block. The
/// first mutation through either handle copies the block for that handle
/// alone. A binder that has never been inserted into owns no block at all.
///
/// # Type Parameters
///
/// * `K` - The key type. Must implement `Ord` (for the index) and `Clone`
///   (it is stored both in the sequence and in the index).
/// * `V` - The value type. Must implement `Clone` so shared blocks can be copied.
///
/// # Examples
///
/// ```rust
/// use cow_binder::{Binder, BinderError};
///
/// let mut binder = Binder::new();
/// binder.insert_front("intro", "hello").unwrap();
/// binder.insert_after("intro", "body", "world").unwrap();
///
/// assert_eq!(binder.read("body"), Ok(&"world"));
/// assert_eq!(binder.insert_front("intro", "again"), Err(BinderError::DuplicateKey));
/// assert_eq!(binder.keys().copied().collect::<Vec<_>>(), vec!["intro", "body"]);
/// ```
pub struct Binder<K, V> {
    data: Option<ReferenceCounter<Block<K, V>>>,
    unsharable: bool,
}

impl<K, V> Binder<K, V> {
    /// Creates an empty binder. No block is allocated until the first insertion.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: None,
            unsharable: false,
        }
    }

    /// Returns the number of notes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |block| block.len())
    }

    /// Returns `true` if the binder holds no notes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detaches the binder from its block. Other copies are unaffected.
    pub fn clear(&mut self) {
        self.data = None;
        self.unsharable = false;
    }

    /// Returns `true` if the binder currently owns a block.
    ///
    /// A new or cleared binder has no block. Removing the last note keeps
    /// the (now empty) block.
    #[inline]
    #[must_use]
    pub const fn has_block(&self) -> bool {
        self.data.is_some()
    }

    /// Returns `true` if another binder or a [`Cursor`] refers to the same block.
    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|block| ReferenceCounter::strong_count(block) > 1)
    }

    /// Returns `true` if a mutable reference was handed out by [`Binder::read_mut`]
    /// and no insertion or removal has happened since.
    ///
    /// While set, cloning the binder copies the block instead of sharing it.
    #[inline]
    #[must_use]
    pub const fn is_unsharable(&self) -> bool {
        self.unsharable
    }

    /// Returns the first note's key and value.
    #[must_use]
    pub fn front(&self) -> Option<(&K, &V)> {
        let block = self.data.as_ref()?;
        block
            .note(block.head()?)
            .map(|note| (&note.key, &note.value))
    }

    /// Returns an iterator over the values in sequence order.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.data.as_deref())
    }

    /// Returns an iterator over the key/value pairs in sequence order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> Entries<'_, K, V> {
        Entries::new(self.data.as_deref())
    }

    /// Returns an iterator over the keys in sequence order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.data.as_deref())
    }

    /// Returns a cursor at the first note.
    ///
    /// The cursor keeps the current block alive. While it exists the block
    /// counts as shared, so mutating this binder copies the block and the
    /// cursor goes on reading the notes as they were when it was created.
    #[must_use]
    pub fn begin(&self) -> Cursor<K, V> {
        self.data
            .as_ref()
            .map_or_else(Cursor::detached, Cursor::at_head)
    }

    /// Returns a cursor one past the last note.
    #[must_use]
    pub fn end(&self) -> Cursor<K, V> {
        self.data
            .as_ref()
            .map_or_else(Cursor::detached, Cursor::past_end)
    }
}

impl<K: Ord, V> Binder<K, V> {
    /// Returns `true` if a note with `key` exists.
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.data.as_ref().is_some_and(|block| block.contains(key))
    }

    /// Returns the value stored under `key` without touching sharing state.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::KeyNotFound`] if no note has that key.
    pub fn read<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let block = self.data.as_ref().ok_or(BinderError::KeyNotFound)?;
        block
            .find(key)
            .and_then(|id| block.note(id))
            .map(|note| &note.value)
            .ok_or(BinderError::KeyNotFound)
    }
}

impl<K: Ord + Clone, V: Clone> Binder<K, V> {
    /// Inserts a note at the front of the sequence.
    ///
    /// # Errors
    ///
    /// - [`BinderError::DuplicateKey`] if `key` is already present.
    /// - [`BinderError::AllocationFailure`] if storage could not be reserved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_binder::Binder;
    ///
    /// let mut binder = Binder::new();
    /// binder.insert_front(2, "two").unwrap();
    /// binder.insert_front(1, "one").unwrap();
    /// assert_eq!(binder.iter().copied().collect::<Vec<_>>(), vec!["one", "two"]);
    /// ```
    pub fn insert_front(&mut self, key: K, value: V) -> Result<()> {
        if self.contains_key(&key) {
            return Err(BinderError::DuplicateKey);
        }
        let mut edit = Edit::begin(&mut self.data, &mut self.unsharable)?;
        edit.block_mut().insert_note::<K>(Position::Front, key, value)?;
        edit.commit();
        Ok(())
    }

    /// Inserts a note immediately after the note keyed `previous`.
    ///
    /// # Errors
    ///
    /// - [`BinderError::KeyNotFound`] if `previous` is absent (checked first).
    /// - [`BinderError::DuplicateKey`] if `key` is already present.
    /// - [`BinderError::AllocationFailure`] if storage could not be reserved.
    pub fn insert_after<Q>(&mut self, previous: &Q, key: K, value: V) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains_key(previous) {
            return Err(BinderError::KeyNotFound);
        }
        if self.contains_key::<K>(&key) {
            return Err(BinderError::DuplicateKey);
        }
        let mut edit = Edit::begin(&mut self.data, &mut self.unsharable)?;
        edit.block_mut()
            .insert_note(Position::After(previous), key, value)?;
        edit.commit();
        Ok(())
    }

    /// Removes the first note.
    ///
    /// # Errors
    ///
    /// - [`BinderError::EmptyContainer`] if the binder holds no notes.
    /// - [`BinderError::AllocationFailure`] if a shared block could not be copied.
    pub fn remove_front(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(BinderError::EmptyContainer);
        }
        let mut edit = Edit::begin(&mut self.data, &mut self.unsharable)?;
        edit.block_mut().erase_front();
        edit.commit();
        Ok(())
    }

    /// Removes the note keyed `key`.
    ///
    /// # Errors
    ///
    /// - [`BinderError::KeyNotFound`] if `key` is absent.
    /// - [`BinderError::AllocationFailure`] if a shared block could not be copied.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains_key(key) {
            return Err(BinderError::KeyNotFound);
        }
        let mut edit = Edit::begin(&mut self.data, &mut self.unsharable)?;
        edit.block_mut().erase_note(key);
        edit.commit();
        Ok(())
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// If the block is shared it is copied first, so writes through the
    /// returned reference never reach other binders. Afterwards the binder
    /// is marked unsharable: its next clone copies the block rather than
    /// sharing it.
    ///
    /// # Errors
    ///
    /// - [`BinderError::KeyNotFound`] if `key` is absent.
    /// - [`BinderError::AllocationFailure`] if a shared block could not be copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_binder::Binder;
    ///
    /// let mut original = Binder::new();
    /// original.insert_front("k", 1).unwrap();
    /// let snapshot = original.clone();
    ///
    /// *original.read_mut("k").unwrap() = 10;
    /// assert_eq!(original.read("k"), Ok(&10));
    /// assert_eq!(snapshot.read("k"), Ok(&1));
    /// ```
    pub fn read_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains_key(key) {
            return Err(BinderError::KeyNotFound);
        }
        Edit::begin(&mut self.data, &mut self.unsharable)?.commit();
        self.unsharable = true;
        self.data
            .as_mut()
            .and_then(ReferenceCounter::get_mut)
            .and_then(|block| block.value_mut(key))
            .ok_or(BinderError::KeyNotFound)
    }

    /// Copies the binder, reporting allocation failure instead of aborting.
    ///
    /// Behaves like [`Clone::clone`]: the block is shared unless this binder
    /// is unsharable, in which case it is deep-copied.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::AllocationFailure`] if a deep copy was needed
    /// and storage could not be reserved.
    pub fn try_clone(&self) -> Result<Self> {
        let data = match &self.data {
            Some(block) if self.unsharable => {
                tracing::debug!(notes = block.len(), "unsharable binder copied eagerly");
                Some(ReferenceCounter::new(block.try_clone()?))
            }
            data => data.clone(),
        };
        Ok(Self {
            data,
            unsharable: false,
        })
    }
}

// Handles are confined to one thread unless blocks are shared through `Arc`.
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(Binder<i32, i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(Cursor<i32, i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(Binder<i32, String>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(Cursor<i32, String>: Send, Sync);

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K: Clone, V: Clone> Clone for Binder<K, V> {
    /// Shares the block with the new binder, or deep-copies it when this
    /// binder has handed out a mutable reference since its last edit.
    fn clone(&self) -> Self {
        let data = match &self.data {
            Some(block) if self.unsharable => {
                tracing::debug!(notes = block.len(), "unsharable binder copied eagerly");
                Some(ReferenceCounter::new(Block::clone(&**block)))
            }
            data => data.clone(),
        };
        Self {
            data,
            unsharable: false,
        }
    }
}

impl<K, V> Default for Binder<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a Binder<K, V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Binder<K, V> {
    /// Two binders are equal when they hold the same notes in the same order.
    fn eq(&self, other: &Self) -> bool {
        let same_block = match (&self.data, &other.data) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            _ => false,
        };
        same_block || (self.len() == other.len() && self.entries().eq(other.entries()))
    }
}

impl<K: Eq, V: Eq> Eq for Binder<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Binder<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.entries()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Binder<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (position, (key, value)) in self.entries().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Tests
// =============================================================================
