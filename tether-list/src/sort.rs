//! Sortable doubly-linked list.
//!
//! [`SortList`] is a [`DhdlList`] that can order itself by the records'
//! [`Sortable::compare`]. Every other operation is the underlying list's,
//! reached through `Deref`.

use std::ops::{Deref, DerefMut};

use crate::{DhdlList, DoublyLinked, Index, Sortable, Storage};

/// A [`DhdlList`] whose records know how to compare themselves.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
///
/// use tether_list::{BoxedStorage, DoublyLinked, Index, SinglyLinked, SortList, Sortable, Storage};
///
/// #[derive(Debug)]
/// struct Task {
///     priority: u8,
///     prev: u32,
///     next: u32,
/// }
///
/// impl SinglyLinked<u32> for Task {
///     fn next(&self) -> u32 { self.next }
///     fn set_next(&mut self, idx: u32) { self.next = idx; }
/// }
///
/// impl DoublyLinked<u32> for Task {
///     fn prev(&self) -> u32 { self.prev }
///     fn set_prev(&mut self, idx: u32) { self.prev = idx; }
/// }
///
/// impl Sortable for Task {
///     fn compare(&self, other: &Self) -> Ordering {
///         self.priority.cmp(&other.priority)
///     }
/// }
///
/// let mut storage: BoxedStorage<Task> = BoxedStorage::with_capacity(3);
/// let mut list: SortList = SortList::new();
/// for priority in [3, 1, 2] {
///     let idx = storage
///         .try_insert(Task { priority, prev: u32::NONE, next: u32::NONE })
///         .unwrap();
///     list.fifo(&mut storage, idx);
/// }
///
/// list.sort(&mut storage);
///
/// let order: Vec<u8> = list
///     .iter(&storage)
///     .map(|idx| storage.get(idx).unwrap().priority)
///     .collect();
/// assert_eq!(order, vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortList<Idx: Index = u32> {
    list: DhdlList<Idx>,
}

impl<Idx: Index> Default for SortList<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> SortList<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            list: DhdlList::new(),
        }
    }

    /// Sorts the list into ascending [`Sortable::compare`] order.
    ///
    /// Stable; O(n²) comparisons.
    pub fn sort<T, S>(&mut self, storage: &mut S)
    where
        T: DoublyLinked<Idx> + Sortable,
        S: Storage<T, Index = Idx>,
    {
        self.list.sort_by(storage, |a: &T, b: &T| a.compare(b));
    }

    /// Unwraps the underlying list.
    #[inline]
    pub fn into_inner(self) -> DhdlList<Idx> {
        self.list
    }
}

impl<Idx: Index> From<DhdlList<Idx>> for SortList<Idx> {
    fn from(list: DhdlList<Idx>) -> Self {
        Self { list }
    }
}

impl<Idx: Index> Deref for SortList<Idx> {
    type Target = DhdlList<Idx>;

    #[inline]
    fn deref(&self) -> &DhdlList<Idx> {
        &self.list
    }
}

impl<Idx: Index> DerefMut for SortList<Idx> {
    #[inline]
    fn deref_mut(&mut self) -> &mut DhdlList<Idx> {
        &mut self.list
    }
}
