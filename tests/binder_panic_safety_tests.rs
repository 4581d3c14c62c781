//! Failure-atomicity tests for Binder.
//!
//! Keys and values that panic when cloned on demand stand in for resource
//! exhaustion in the middle of a copy or an insertion. After the panic is
//! caught, every binder involved must still hold exactly its old notes.

#![cfg(feature = "binder")]

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};

use cow_binder::Binder;
use rstest::rstest;

thread_local! {
    /// Number of clones still allowed before the next one panics.
    static CLONE_BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

fn arm(budget: usize) {
    CLONE_BUDGET.with(|cell| cell.set(Some(budget)));
}

fn disarm() {
    CLONE_BUDGET.with(|cell| cell.set(None));
}

fn charge_clone() {
    CLONE_BUDGET.with(|cell| match cell.get() {
        Some(0) => {
            cell.set(None);
            panic!("clone budget exhausted");
        }
        Some(remaining) => cell.set(Some(remaining - 1)),
        None => {}
    });
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Fragile(u32);

impl Clone for Fragile {
    fn clone(&self) -> Self {
        charge_clone();
        Self(self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct FragileValue(u32);

impl Clone for FragileValue {
    fn clone(&self) -> Self {
        charge_clone();
        Self(self.0)
    }
}

fn snapshot(binder: &Binder<Fragile, FragileValue>) -> Vec<(u32, u32)> {
    binder
        .entries()
        .map(|(key, value)| (key.0, value.0))
        .collect()
}

fn binder_of(size: u32) -> Binder<Fragile, FragileValue> {
    disarm();
    let mut binder = Binder::new();
    for key in (0..size).rev() {
        binder
            .insert_front(Fragile(key), FragileValue(key * 10))
            .unwrap();
    }
    binder
}

fn quietly<T>(operation: impl FnOnce() -> T) -> std::thread::Result<T> {
    let result = catch_unwind(AssertUnwindSafe(operation));
    disarm();
    result
}

// =============================================================================
// Clone path
// =============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(9)]
fn test_panic_while_copying_shared_block(#[case] budget: usize) {
    let original = binder_of(5);
    let mut copy = original.clone();
    let expected = snapshot(&original);

    arm(budget);
    let result = quietly(|| copy.insert_front(Fragile(100), FragileValue(0)));
    assert!(result.is_err());

    assert_eq!(snapshot(&original), expected);
    assert_eq!(snapshot(&copy), expected);
    assert!(original.is_shared());

    copy.insert_front(Fragile(100), FragileValue(0)).unwrap();
    assert_eq!(copy.len(), 6);
    assert_eq!(snapshot(&original), expected);
}

#[rstest]
fn test_panic_while_copying_for_removal() {
    let original = binder_of(4);
    let mut copy = original.clone();
    let expected = snapshot(&original);

    arm(2);
    let result = quietly(|| copy.remove(&Fragile(1)));
    assert!(result.is_err());
    assert_eq!(snapshot(&copy), expected);

    copy.remove(&Fragile(1)).unwrap();
    assert_eq!(copy.len(), 3);
    assert_eq!(original.len(), 4);
}

#[rstest]
fn test_panic_while_copying_for_read_mut() {
    let original = binder_of(3);
    let mut copy = original.clone();

    arm(0);
    let result = quietly(|| copy.read_mut(&Fragile(0)).map(|value| value.0 = 999));
    assert!(result.is_err());
    assert!(!copy.is_unsharable());
    assert_eq!(copy.read(&Fragile(0)), Ok(&FragileValue(0)));
    assert!(original.is_shared());
}

#[rstest]
fn test_panic_during_eager_copy_of_unsharable_binder() {
    let mut binder = binder_of(3);
    binder.read_mut(&Fragile(2)).unwrap().0 = 77;
    let expected = snapshot(&binder);

    arm(1);
    let result = quietly(|| binder.clone());
    assert!(result.is_err());
    assert_eq!(snapshot(&binder), expected);
    assert!(binder.is_unsharable());
}

// =============================================================================
// In-place path
// =============================================================================

#[rstest]
fn test_panic_while_indexing_new_key_in_place() {
    let mut binder = binder_of(3);
    let expected = snapshot(&binder);

    arm(0);
    let result = quietly(|| binder.insert_after(&Fragile(1), Fragile(50), FragileValue(5)));
    assert!(result.is_err());
    assert_eq!(snapshot(&binder), expected);
    assert!(!binder.contains_key(&Fragile(50)));

    binder
        .insert_after(&Fragile(1), Fragile(50), FragileValue(5))
        .unwrap();
    assert_eq!(
        snapshot(&binder),
        vec![(0, 0), (1, 10), (50, 5), (2, 20)]
    );
}

#[rstest]
fn test_panic_on_first_insert_leaves_no_block() {
    disarm();
    let mut binder: Binder<Fragile, FragileValue> = Binder::new();

    arm(0);
    let result = quietly(|| binder.insert_front(Fragile(1), FragileValue(1)));
    assert!(result.is_err());
    assert!(!binder.has_block());
    assert!(binder.is_empty());
}
