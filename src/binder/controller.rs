//! The ownership controller every structural mutation passes through.
//!
//! [`Edit::begin`] decides whether the handle may edit its block in place or
//! must work on a private copy, and hands out the target block. The caller
//! applies its edit and then calls [`Edit::commit`]. An `Edit` dropped
//! without committing (because the edit returned an error, or unwound)
//! leaves the handle pointing at exactly the block it had before.
//!
//! ```text
//!   handle block        count   target
//!   ----------------------------------------------
//!   none                  -     fresh empty block
//!   some                  1     the block itself (in place)
//!   some                 >1     deep copy (clone on write)
//! ```
//!
//! The in-place path relies on the block's own operations being atomic:
//! they either succeed or leave the block unchanged.

use super::ReferenceCounter;
use super::block::Block;
use super::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EditPath {
    Allocated,
    InPlace,
    Cloned,
}

/// A pending edit on one handle's block.
pub(crate) struct Edit<'a, K, V> {
    data: &'a mut Option<ReferenceCounter<Block<K, V>>>,
    unsharable: &'a mut bool,
    target: Option<ReferenceCounter<Block<K, V>>>,
    path: EditPath,
}

impl<'a, K: Ord + Clone, V: Clone> Edit<'a, K, V> {
    /// Picks the block the edit will be applied to.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::AllocationFailure`](super::BinderError::AllocationFailure)
    /// if a shared block could not be copied. The handle is untouched.
    pub(crate) fn begin(
        data: &'a mut Option<ReferenceCounter<Block<K, V>>>,
        unsharable: &'a mut bool,
    ) -> Result<Self> {
        // The shared block stays in the handle while it is copied, so a
        // failed or unwinding copy cannot detach it.
        if let Some(block) = data
            .as_ref()
            .filter(|block| ReferenceCounter::strong_count(block) > 1)
        {
            let target = ReferenceCounter::new(block.try_clone()?);
            return Ok(Self::with_target(data, unsharable, target, EditPath::Cloned));
        }
        let (target, path) = data.take().map_or_else(
            || (ReferenceCounter::new(Block::new()), EditPath::Allocated),
            |block| (block, EditPath::InPlace),
        );
        Ok(Self::with_target(data, unsharable, target, path))
    }

    fn with_target(
        data: &'a mut Option<ReferenceCounter<Block<K, V>>>,
        unsharable: &'a mut bool,
        target: ReferenceCounter<Block<K, V>>,
        path: EditPath,
    ) -> Self {
        tracing::trace!(path = ?path, notes = target.len(), "binder edit begins");
        Self {
            data,
            unsharable,
            target: Some(target),
            path,
        }
    }

    /// Returns the block to edit. It is never aliased by another handle.
    pub(crate) fn block_mut(&mut self) -> &mut Block<K, V> {
        let target = self
            .target
            .get_or_insert_with(|| ReferenceCounter::new(Block::new()));
        // `target` is unique here, so `make_mut` never copies.
        ReferenceCounter::make_mut(target)
    }

    #[cfg(test)]
    pub(crate) const fn path(&self) -> EditPath {
        self.path
    }

    /// Points the handle at the edited block and clears `unsharable`.
    pub(crate) fn commit(mut self) {
        if let Some(target) = self.target.take() {
            tracing::trace!(path = ?self.path, notes = target.len(), "binder edit committed");
            *self.data = Some(target);
        }
        *self.unsharable = false;
    }
}

impl<K, V> Drop for Edit<'_, K, V> {
    fn drop(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        // A block edited in place has already rolled itself back; a fresh
        // or copied block is simply discarded.
        if self.path == EditPath::InPlace {
            *self.data = Some(target);
        } else {
            tracing::trace!(path = ?self.path, "binder edit discarded");
        }
    }
}
