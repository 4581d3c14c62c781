//! The shared data block: an ordered note sequence and its key index.
//!
//! The sequence is a doubly-linked list threaded through a slot arena, so a
//! note's position is a plain [`SlotId`] that survives relocation of the
//! backing storage. The index maps every key to the slot holding its note.
//!
//! # Invariants
//!
//! 1. Keys are unique in the index.
//! 2. Every occupied slot is reachable from `head` exactly once, and every
//!    occupied slot has exactly one index entry pointing at it.
//! 3. `vacant` lists exactly the unoccupied slots, and its capacity always
//!    covers `slots.len()`, so erasing never allocates.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use super::error::{BinderError, Result};

/// Stable identifier of a note's position within one block.
pub(crate) type SlotId = usize;

/// One key/value entry of the sequence.
#[derive(Clone)]
pub(crate) struct Note<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

#[derive(Clone)]
struct Slot<K, V> {
    note: Note<K, V>,
    previous: Option<SlotId>,
    next: Option<SlotId>,
}

/// Where a new note goes in the sequence.
pub(crate) enum Position<'a, Q: ?Sized> {
    Front,
    After(&'a Q),
}

// Derived impls would demand `Q: Copy`, which rules out `str` anchors.
impl<Q: ?Sized> Clone for Position<'_, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ?Sized> Copy for Position<'_, Q> {}

/// The unit of sharing between binder handles.
pub(crate) struct Block<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    vacant: Vec<SlotId>,
    head: Option<SlotId>,
    index: BTreeMap<K, SlotId>,
}

impl<K, V> Block<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            head: None,
            index: BTreeMap::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub(crate) const fn head(&self) -> Option<SlotId> {
        self.head
    }

    #[inline]
    pub(crate) fn note(&self, id: SlotId) -> Option<&Note<K, V>> {
        self.slot(id).map(|slot| &slot.note)
    }

    #[inline]
    pub(crate) fn next(&self, id: SlotId) -> Option<SlotId> {
        self.slot(id).and_then(|slot| slot.next)
    }

    fn slot(&self, id: SlotId) -> Option<&Slot<K, V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot<K, V>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    /// Returns the id the next inserted note will occupy, growing storage
    /// beforehand so that placing the note cannot fail.
    fn reserve_slot(&mut self) -> Result<SlotId> {
        if let Some(&id) = self.vacant.last() {
            return Ok(id);
        }
        self.slots.try_reserve(1)?;
        self.vacant
            .try_reserve(self.slots.len() + 1 - self.vacant.len())?;
        Ok(self.slots.len())
    }

    fn place(&mut self, id: SlotId, slot: Slot<K, V>) {
        if id == self.slots.len() {
            self.slots.push(Some(slot));
        } else {
            self.vacant.pop();
            self.slots[id] = Some(slot);
        }
    }

    fn link(&mut self, id: SlotId, previous: Option<SlotId>, next: Option<SlotId>) {
        match previous.and_then(|previous| self.slot_mut(previous)) {
            Some(slot) => slot.next = Some(id),
            None => self.head = Some(id),
        }
        if let Some(slot) = next.and_then(|next| self.slot_mut(next)) {
            slot.previous = Some(id);
        }
    }

    fn unlink(&mut self, previous: Option<SlotId>, next: Option<SlotId>) {
        match previous.and_then(|previous| self.slot_mut(previous)) {
            Some(slot) => slot.next = next,
            None => self.head = next,
        }
        if let Some(slot) = next.and_then(|next| self.slot_mut(next)) {
            slot.previous = previous;
        }
    }
}

impl<K: Ord, V> Block<K, V> {
    /// Looks up the slot holding `key`. O(log n).
    #[inline]
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<SlotId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.get(key).copied()
    }

    #[inline]
    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub(crate) fn value_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key)?;
        self.slot_mut(id).map(|slot| &mut slot.note.value)
    }

    /// Removes the note and its index entry together.
    pub(crate) fn erase_note<Q>(&mut self, key: &Q) -> Option<Note<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key)?;
        self.erase_slot(id)
    }

    /// Removes the first note of the sequence.
    pub(crate) fn erase_front(&mut self) -> Option<Note<K, V>> {
        let id = self.head?;
        self.erase_slot(id)
    }

    fn erase_slot(&mut self, id: SlotId) -> Option<Note<K, V>> {
        let slot = self.slots.get_mut(id)?.take()?;
        self.index.remove(&slot.note.key);
        self.unlink(slot.previous, slot.next);
        self.vacant.push(id);
        Some(slot.note)
    }
}

impl<K: Ord + Clone, V> Block<K, V> {
    /// Inserts a note and its index entry as one step.
    ///
    /// Storage is reserved and the key is copied for the index before the
    /// sequence is touched, so any failure (an allocation error, or a panic
    /// from `K::clone`) leaves the block exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`BinderError::DuplicateKey`] if `key` is already present.
    /// - [`BinderError::KeyNotFound`] if the anchor of [`Position::After`] is absent.
    /// - [`BinderError::AllocationFailure`] if the arena cannot grow.
    pub(crate) fn insert_note<Q>(
        &mut self,
        position: Position<'_, Q>,
        key: K,
        value: V,
    ) -> Result<SlotId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.index.contains_key::<K>(&key) {
            return Err(BinderError::DuplicateKey);
        }
        let previous = match position {
            Position::Front => None,
            Position::After(anchor) => Some(self.find(anchor).ok_or(BinderError::KeyNotFound)?),
        };
        let next = match previous {
            Some(previous) => self.next(previous),
            None => self.head,
        };

        let id = self.reserve_slot()?;
        self.index.insert(key.clone(), id);
        self.place(
            id,
            Slot {
                note: Note { key, value },
                previous,
                next,
            },
        );
        self.link(id, previous, next);
        Ok(id)
    }
}

impl<K: Ord + Clone, V: Clone> Block<K, V> {
    /// Deep-copies the block, reporting allocation failure instead of aborting.
    ///
    /// The copy is assembled in locals; if reserving storage fails or a
    /// `Clone` implementation panics part way, the partial copy is dropped
    /// and `self` is untouched.
    pub(crate) fn try_clone(&self) -> Result<Self> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(self.slots.len())?;
        let mut vacant = Vec::new();
        vacant.try_reserve_exact(self.slots.len())?;

        slots.extend(self.slots.iter().cloned());
        vacant.extend_from_slice(&self.vacant);
        let index = self.index.clone();

        Ok(Self {
            slots,
            vacant,
            head: self.head,
            index,
        })
    }
}

impl<K: Clone, V: Clone> Clone for Block<K, V> {
    fn clone(&self) -> Self {
        let mut vacant = Vec::with_capacity(self.slots.len());
        vacant.extend_from_slice(&self.vacant);
        Self {
            slots: self.slots.clone(),
            vacant,
            head: self.head,
            index: self.index.clone(),
        }
    }
}

#[cfg(test)]
impl<K: Ord, V> Block<K, V> {
    /// Walks the sequence and checks it against the index.
    pub(crate) fn is_consistent(&self) -> bool {
        let mut visited = 0;
        let mut previous = None;
        let mut current = self.head;
        while let Some(id) = current {
            let Some(slot) = self.slot(id) else {
                return false;
            };
            if slot.previous != previous || self.find(&slot.note.key) != Some(id) {
                return false;
            }
            visited += 1;
            previous = current;
            current = slot.next;
        }
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        visited == self.index.len()
            && occupied == visited
            && occupied + self.vacant.len() == self.slots.len()
            && self.vacant.capacity() >= self.slots.len()
    }
}
