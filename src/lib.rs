//! # cow-binder
//!
//! A copy-on-write ordered associative container.
//!
//! ## Overview
//!
//! [`Binder`](binder::Binder) keeps keyed notes in an explicit positional
//! order and lets any number of copies share one underlying block until a
//! copy is mutated. It provides:
//!
//! - **Cheap copies**: cloning a binder is O(1) and allocation free
//! - **Clone on write**: the first mutation of a shared copy clones the
//!   block for that copy alone
//! - **Failure atomicity**: a failed insertion, removal or mutable read
//!   never leaves any copy half-edited
//! - **Stable cursors**: a [`Cursor`](binder::Cursor) keeps the block it
//!   reads alive, so it never dangles
//!
//! ## Feature Flags
//!
//! - `binder`: The container (enabled by default)
//! - `arc`: Share blocks through `Arc` instead of `Rc`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use cow_binder::prelude::*;
//!
//! let mut notes = Binder::new();
//! notes.insert_front("a", 1).unwrap();
//!
//! let mut copy = notes.clone();
//! copy.insert_front("b", 2).unwrap();
//!
//! assert_eq!(notes.len(), 1);
//! assert_eq!(copy.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use cow_binder::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "binder")]
    pub use crate::binder::{Binder, BinderError, Cursor};
}

#[cfg(feature = "binder")]
pub mod binder;

#[cfg(feature = "binder")]
pub use binder::{Binder, BinderError, Cursor};
