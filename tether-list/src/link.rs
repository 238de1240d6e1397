//! Link traits and ready-made link records.
//!
//! A host record takes part in a list by embedding link indices and
//! exposing them through one of the traits below. Each list discipline
//! asks for the narrowest shape it needs:
//!
//! | Discipline | Trait | Fields |
//! |------------|-------|--------|
//! | [`ShslList`](crate::ShslList), [`DhslList`](crate::DhslList) | [`SinglyLinked`] | `next` |
//! | [`DhdlList`](crate::DhdlList), [`SortList`](crate::SortList) | [`DoublyLinked`] | `prev`, `next` |
//! | [`AuList`](crate::AuList) | [`AtomicLinked`] | atomic `prev` |
//!
//! A record can sit on several lists at once by embedding several links,
//! but one link belongs to at most one list at a time.

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::{AtomicIndex, Index, Storage};

/// A record with a forward (`next`) link.
///
/// # Example
///
/// ```
/// use tether_list::{Index, SinglyLinked};
///
/// struct Job {
///     id: u64,
///     next: u32,
/// }
///
/// impl SinglyLinked<u32> for Job {
///     fn next(&self) -> u32 { self.next }
///     fn set_next(&mut self, idx: u32) { self.next = idx; }
/// }
/// ```
pub trait SinglyLinked<Idx: Index> {
    /// Returns the next record's index, or `Idx::NONE` at the end.
    fn next(&self) -> Idx;

    /// Sets the next record's index.
    fn set_next(&mut self, idx: Idx);
}

/// A record with both backward (`prev`) and forward (`next`) links.
pub trait DoublyLinked<Idx: Index>: SinglyLinked<Idx> {
    /// Returns the previous record's index, or `Idx::NONE` at the start.
    fn prev(&self) -> Idx;

    /// Sets the previous record's index.
    fn set_prev(&mut self, idx: Idx);
}

/// A record that can be pushed onto an [`AuList`](crate::AuList).
///
/// The link is reached through a shared reference because producers on
/// different threads link records while the storage is shared.
pub trait AtomicLinked<Idx: Index> {
    /// Returns the embedded atomic link.
    fn atomic_link(&self) -> &AtomicLink<Idx>;
}

/// Ordering capability used by [`SortList`](crate::SortList).
///
/// The default treats every pair as equal, so sorting a list of records
/// that do not override it leaves the list unchanged.
pub trait Sortable {
    /// Compares this record with `other`.
    fn compare(&self, other: &Self) -> Ordering {
        let _ = other;
        Ordering::Equal
    }
}

/// A bare forward link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<Idx: Index = u32> {
    next: Idx,
}

impl<Idx: Index> Link<Idx> {
    /// Creates an unlinked link.
    #[inline]
    pub const fn new() -> Self {
        Self { next: Idx::NONE }
    }
}

impl<Idx: Index> Default for Link<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> SinglyLinked<Idx> for Link<Idx> {
    #[inline]
    fn next(&self) -> Idx {
        self.next
    }

    #[inline]
    fn set_next(&mut self, idx: Idx) {
        self.next = idx;
    }
}

/// A bare bidirectional link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleLink<Idx: Index = u32> {
    prev: Idx,
    next: Idx,
}

impl<Idx: Index> DoubleLink<Idx> {
    /// Creates an unlinked link.
    #[inline]
    pub const fn new() -> Self {
        Self {
            prev: Idx::NONE,
            next: Idx::NONE,
        }
    }
}

impl<Idx: Index> Default for DoubleLink<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> SinglyLinked<Idx> for DoubleLink<Idx> {
    #[inline]
    fn next(&self) -> Idx {
        self.next
    }

    #[inline]
    fn set_next(&mut self, idx: Idx) {
        self.next = idx;
    }
}

impl<Idx: Index> DoublyLinked<Idx> for DoubleLink<Idx> {
    #[inline]
    fn prev(&self) -> Idx {
        self.prev
    }

    #[inline]
    fn set_prev(&mut self, idx: Idx) {
        self.prev = idx;
    }
}

impl<Idx: Index> Sortable for DoubleLink<Idx> {}

/// A backward link updated atomically.
///
/// `prev` points at the next-older record on an [`AuList`](crate::AuList).
/// It is written by the producer before the record is published and
/// afterwards only by the list's single consumer.
#[derive(Debug)]
pub struct AtomicLink<Idx: Index = u32> {
    prev: AtomicIndex<Idx>,
}

impl<Idx: Index> Default for AtomicLink<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> AtomicLink<Idx> {
    /// Creates an unlinked link.
    #[inline]
    pub fn new() -> Self {
        Self {
            prev: AtomicIndex::none(),
        }
    }

    /// Returns the next-older record's index, or `Idx::NONE`.
    #[inline]
    pub fn prev(&self) -> Idx {
        self.prev.load()
    }

    /// Sets the next-older record's index.
    #[inline]
    pub fn set_prev(&self, idx: Idx) {
        self.prev.store(idx);
    }
}

impl<Idx: Index> AtomicLinked<Idx> for AtomicLink<Idx> {
    #[inline]
    fn atomic_link(&self) -> &AtomicLink<Idx> {
        self
    }
}

// =============================================================================
// Storage lookups shared by the list implementations
// =============================================================================

#[inline]
#[track_caller]
pub(crate) fn node<T, S: Storage<T>>(storage: &S, idx: S::Index) -> &T {
    storage.get(idx).expect("invalid index")
}

#[inline]
#[track_caller]
pub(crate) fn node_mut<T, S: Storage<T>>(storage: &mut S, idx: S::Index) -> &mut T {
    storage.get_mut(idx).expect("invalid index")
}

/// Iterator over the indices of a forward (`next`) chain.
///
/// Returned by the `iter` methods of the singly-linked lists.
pub struct Keys<'a, T, S, Idx: Index> {
    storage: &'a S,
    next: Idx,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, S, Idx: Index> Keys<'a, T, S, Idx> {
    #[inline]
    pub(crate) fn new(storage: &'a S, head: Idx) -> Self {
        Self {
            storage,
            next: head,
            _marker: PhantomData,
        }
    }
}

impl<T, S, Idx> Iterator for Keys<'_, T, S, Idx>
where
    Idx: Index,
    T: SinglyLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    type Item = Idx;

    #[inline]
    fn next(&mut self) -> Option<Idx> {
        let idx = self.next.into_option()?;
        self.next = node(self.storage, idx).next();
        Some(idx)
    }
}
