//! Doubly-headed, doubly-linked list.
//!
//! The list records its head and tail; every link carries both `prev` and
//! `next`. That makes insertion at either end, chain splicing after any
//! link, and chain removal all O(1): no operation ever has to search.
//!
//! # Example
//!
//! ```
//! use tether_list::{BoxedStorage, DhdlList, DoubleLink, Storage};
//!
//! let mut storage: BoxedStorage<DoubleLink> = BoxedStorage::with_capacity(8);
//! let mut list: DhdlList = DhdlList::new();
//!
//! let a = storage.try_insert(DoubleLink::new()).unwrap();
//! let b = storage.try_insert(DoubleLink::new()).unwrap();
//! let c = storage.try_insert(DoubleLink::new()).unwrap();
//!
//! list.fifo(&mut storage, a);
//! list.fifo(&mut storage, b);
//! list.lifo(&mut storage, c);
//!
//! assert_eq!(list.iter(&storage).collect::<Vec<_>>(), vec![c, a, b]);
//!
//! // Remove the chain [a..=b] in O(1)
//! list.remove(&mut storage, a, b);
//! assert_eq!(list.remq(&mut storage), Some(c));
//! assert!(list.is_empty());
//! ```

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::coherence::{self, Incoherence, MAX_COHERENT};
use crate::link::{node, node_mut};
use crate::{DoublyLinked, Index, Storage};

/// A doubly-headed, doubly-linked list over external storage.
///
/// Holds only the head and tail indices. Records live in caller-provided
/// storage and embed their own links via [`DoublyLinked`]. A list must
/// always be used with the same storage instance.
///
/// Contract violations (linking a record that is already on a list,
/// removing a chain that is not on this list) leave the list in an
/// unspecified state; [`DhdlList::is_coherent`] can detect most of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhdlList<Idx: Index = u32> {
    head: Idx,
    tail: Idx,
}

impl<Idx: Index> Default for DhdlList<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> DhdlList<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: Idx::NONE,
            tail: Idx::NONE,
        }
    }

    /// Returns the oldest (head) record's index.
    #[inline]
    pub fn head(&self) -> Option<Idx> {
        self.head.into_option()
    }

    /// Returns the newest (tail) record's index.
    #[inline]
    pub fn tail(&self) -> Option<Idx> {
        self.tail.into_option()
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends a record at the tail.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not occupied in storage.
    #[inline]
    pub fn fifo<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let link = node_mut(storage, idx);
        link.set_next(Idx::NONE);
        link.set_prev(self.tail);

        if self.head.is_none() {
            self.head = idx;
        } else {
            node_mut(storage, self.tail).set_next(idx);
        }

        self.tail = idx;
    }

    /// Prepends a record at the head.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not occupied in storage.
    #[inline]
    pub fn lifo<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let link = node_mut(storage, idx);
        link.set_next(self.head);
        link.set_prev(Idx::NONE);

        if self.head.is_none() {
            self.tail = idx;
        } else {
            node_mut(storage, self.head).set_prev(idx);
        }

        self.head = idx;
    }

    /// Splices the chain `[head..=tail]` into the list.
    ///
    /// With `after == None` the chain becomes the new front of the list,
    /// otherwise it is placed immediately after `after`. The chain must
    /// already be linked internally (`next`/`prev` between its members);
    /// only its two boundary links are rewritten.
    ///
    /// # Panics
    ///
    /// Panics if `after`, `head` or `tail` is not occupied in storage.
    pub fn insert<T, S>(&mut self, storage: &mut S, after: Option<Idx>, head: Idx, tail: Idx)
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        match after {
            None => {
                node_mut(storage, head).set_prev(Idx::NONE);
                node_mut(storage, tail).set_next(self.head);
                if self.head.is_none() {
                    self.tail = tail;
                } else {
                    node_mut(storage, self.head).set_prev(tail);
                }
                self.head = head;
            }
            Some(after) => {
                let next = node(storage, after).next();
                node_mut(storage, tail).set_next(next);
                node_mut(storage, head).set_prev(after);
                node_mut(storage, after).set_next(head);

                if next.is_none() {
                    self.tail = tail;
                } else {
                    node_mut(storage, next).set_prev(tail);
                }
            }
        }
    }

    /// Detaches the chain `[head..=tail]` from the list in O(1).
    ///
    /// The removed chain keeps its internal links, so it can be spliced
    /// elsewhere with [`insert`](Self::insert) as a unit.
    ///
    /// # Panics
    ///
    /// Panics if `head` or `tail` is not occupied in storage.
    pub fn remove<T, S>(&mut self, storage: &mut S, head: Idx, tail: Idx)
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let prev = node(storage, head).prev();
        let next = node(storage, tail).next();

        if prev.is_none() {
            self.head = next;
            if next.is_some() {
                node_mut(storage, next).set_prev(Idx::NONE);
            }
        } else {
            node_mut(storage, prev).set_next(next);
        }

        if next.is_none() {
            self.tail = prev;
            if prev.is_some() {
                node_mut(storage, prev).set_next(Idx::NONE);
            }
        } else {
            node_mut(storage, next).set_prev(prev);
        }
    }

    /// Removes and returns the oldest (head) record.
    ///
    /// The removed record's links are cleared.
    #[inline]
    pub fn remq<T, S>(&mut self, storage: &mut S) -> Option<Idx>
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let idx = self.head.into_option()?;

        let link = node_mut(storage, idx);
        self.head = link.next();
        link.set_next(Idx::NONE);

        if self.head.is_none() {
            self.tail = Idx::NONE;
        } else {
            node_mut(storage, self.head).set_prev(Idx::NONE);
        }

        Some(idx)
    }

    /// Empties the list, returning the head of the detached chain.
    ///
    /// The records stay linked to each other; walk the result through
    /// `next` to visit them in order.
    #[inline]
    pub fn reset(&mut self) -> Option<Idx> {
        let head = self.head.into_option();
        self.head = Idx::NONE;
        self.tail = Idx::NONE;
        head
    }

    /// Returns `true` if `idx` is on this list.
    pub fn is_on_list<T, S>(&self, storage: &S, idx: Idx) -> bool
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        idx.is_some() && self.iter(storage).any(|k| k == idx)
    }

    /// Returns `true` if the list passes [`check_coherence`](Self::check_coherence)
    /// with the default [`MAX_COHERENT`] cap.
    pub fn is_coherent<T, S>(&self, storage: &S) -> bool
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.check_coherence(storage, MAX_COHERENT).is_ok()
    }

    /// Walks head to tail checking `prev`/`next` symmetry and the tail.
    ///
    /// At most `limit` links are visited; a longer (or cyclic) chain is
    /// reported as incoherent.
    pub fn check_coherence<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        coherence::report("dhdl", self.walk(storage, limit))
    }

    fn walk<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.head.is_none() || self.tail.is_none() {
            return if self.head == self.tail {
                Ok(())
            } else {
                Err(Incoherence::HeadTailMismatch)
            };
        }

        let mut link = self.head;
        let mut prev = Idx::NONE;
        for position in 0..limit {
            let record = storage
                .get(link)
                .ok_or(Incoherence::InvalidIndex { position })?;
            if record.prev() != prev {
                return Err(Incoherence::BrokenBackLink { position });
            }

            let next = record.next();
            if next.is_none() {
                return if link == self.tail {
                    Ok(())
                } else {
                    Err(Incoherence::TailMismatch { position })
                };
            }
            if link == self.tail {
                return Err(Incoherence::ChainPastTail { position });
            }

            prev = link;
            link = next;
        }

        Err(Incoherence::LimitExceeded { limit })
    }

    /// Returns an iterator over the indices on the list, head to tail.
    ///
    /// The iterator is double-ended; `.rev()` walks tail to head.
    #[inline]
    pub fn iter<'a, T, S>(&self, storage: &'a S) -> Keys<'a, T, S, Idx>
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Keys {
            storage,
            front: self.head,
            back: self.tail,
            _marker: PhantomData,
        }
    }

    /// Sorts the list in place using `cmp`.
    ///
    /// Selection sort over the existing splice primitives: the list is
    /// detached, and the smallest remaining record is repeatedly unlinked
    /// from the detached chain and appended with [`fifo`](Self::fifo).
    /// The first of several equal records is taken first, so the sort is
    /// stable. O(n²) comparisons.
    pub fn sort_by<T, S, F>(&mut self, storage: &mut S, mut cmp: F)
    where
        T: DoublyLinked<Idx>,
        S: Storage<T, Index = Idx>,
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut head = Idx::from_option(self.reset());

        while head.is_some() {
            let mut low = head;
            let mut next = node(storage, low).next();
            while next.is_some() {
                let candidate = node(storage, next);
                if cmp(node(storage, low), candidate) == Ordering::Greater {
                    low = next;
                }
                next = candidate.next();
            }

            if low == head {
                head = node(storage, head).next();
            } else {
                let link = node(storage, low);
                let (prev, next) = (link.prev(), link.next());
                if next.is_some() {
                    node_mut(storage, next).set_prev(prev);
                }
                node_mut(storage, prev).set_next(next);
            }

            self.fifo(storage, low);
        }
    }
}

/// Iterator over the indices of a [`DhdlList`].
pub struct Keys<'a, T, S, Idx: Index> {
    storage: &'a S,
    front: Idx,
    back: Idx,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S, Idx> Keys<'_, T, S, Idx>
where
    Idx: Index,
    T: DoublyLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    #[inline]
    fn finish_if_met(&mut self, idx: Idx) {
        if idx == self.back && idx == self.front {
            self.front = Idx::NONE;
            self.back = Idx::NONE;
        }
    }
}

impl<T, S, Idx> Iterator for Keys<'_, T, S, Idx>
where
    Idx: Index,
    T: DoublyLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    type Item = Idx;

    #[inline]
    fn next(&mut self) -> Option<Idx> {
        let idx = self.front.into_option()?;
        self.finish_if_met(idx);
        if self.front.is_some() {
            self.front = node(self.storage, idx).next();
        }
        Some(idx)
    }
}

impl<T, S, Idx> DoubleEndedIterator for Keys<'_, T, S, Idx>
where
    Idx: Index,
    T: DoublyLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Idx> {
        let idx = self.back.into_option()?;
        self.finish_if_met(idx);
        if self.back.is_some() {
            self.back = node(self.storage, idx).prev();
        }
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxedStorage, SinglyLinked};

    #[derive(Debug)]
    struct Node {
        value: u64,
        prev: u32,
        next: u32,
    }

    impl Node {
        fn new(value: u64) -> Self {
            Self {
                value,
                prev: u32::NONE,
                next: u32::NONE,
            }
        }
    }

    impl SinglyLinked<u32> for Node {
        fn next(&self) -> u32 {
            self.next
        }
        fn set_next(&mut self, idx: u32) {
            self.next = idx;
        }
    }

    impl DoublyLinked<u32> for Node {
        fn prev(&self) -> u32 {
            self.prev
        }
        fn set_prev(&mut self, idx: u32) {
            self.prev = idx;
        }
    }

    fn values(list: &DhdlList, storage: &BoxedStorage<Node>) -> Vec<u64> {
        list.iter(storage)
            .map(|idx| storage.get(idx).unwrap().value)
            .collect()
    }

    fn filled(storage: &mut BoxedStorage<Node>, values: &[u64]) -> (DhdlList, Vec<u32>) {
        let mut list = DhdlList::new();
        let keys: Vec<u32> = values
            .iter()
            .map(|&v| storage.try_insert(Node::new(v)).unwrap())
            .collect();
        for &k in &keys {
            list.fifo(storage, k);
        }
        (list, keys)
    }

    #[test]
    fn new_list_is_empty() {
        let list: DhdlList = DhdlList::new();
        assert!(list.is_empty());
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn fifo_links_both_directions() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, k) = filled(&mut storage, &[1, 2, 3]);

        assert_eq!(list.head(), Some(k[0]));
        assert_eq!(list.tail(), Some(k[2]));

        assert_eq!(storage.get(k[0]).unwrap().next, k[1]);
        assert_eq!(storage.get(k[1]).unwrap().next, k[2]);
        assert!(storage.get(k[2]).unwrap().next.is_none());

        assert!(storage.get(k[0]).unwrap().prev.is_none());
        assert_eq!(storage.get(k[1]).unwrap().prev, k[0]);
        assert_eq!(storage.get(k[2]).unwrap().prev, k[1]);

        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn lifo_prepends() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let mut list: DhdlList = DhdlList::new();

        for v in 1..=3 {
            let k = storage.try_insert(Node::new(v)).unwrap();
            list.lifo(&mut storage, k);
        }

        assert_eq!(values(&list, &storage), vec![3, 2, 1]);
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn remq_is_fifo_order() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, k) = filled(&mut storage, &[1, 2, 3, 4]);

        for &expected in &k {
            assert_eq!(list.remq(&mut storage), Some(expected));
            assert!(storage.get(expected).unwrap().next.is_none());
            assert!(list.is_coherent(&storage));
        }

        assert_eq!(list.remq(&mut storage), None);
        assert!(list.is_empty());
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn insert_chain_at_head_of_empty_list() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut chain, k) = filled(&mut storage, &[7, 8]);
        chain.reset();

        let mut list: DhdlList = DhdlList::new();
        list.insert(&mut storage, None, k[0], k[1]);

        assert_eq!(values(&list, &storage), vec![7, 8]);
        assert_eq!(list.tail(), Some(k[1]));
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn insert_chain_at_head_of_populated_list() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, _) = filled(&mut storage, &[1, 2]);
        let (mut chain, k) = filled(&mut storage, &[7, 8]);
        chain.reset();

        list.insert(&mut storage, None, k[0], k[1]);

        assert_eq!(values(&list, &storage), vec![7, 8, 1, 2]);
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn insert_chain_after_tail_moves_tail() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, l) = filled(&mut storage, &[1, 2]);
        let (mut chain, k) = filled(&mut storage, &[7, 8]);
        chain.reset();

        list.insert(&mut storage, Some(l[1]), k[0], k[1]);

        assert_eq!(values(&list, &storage), vec![1, 2, 7, 8]);
        assert_eq!(list.tail(), Some(k[1]));
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn chain_splice_round_trip() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, l) = filled(&mut storage, &[1, 2, 3]);
        let (mut chain, k) = filled(&mut storage, &[7, 8]);
        chain.reset();

        let m = l[1];
        list.insert(&mut storage, Some(m), k[0], k[1]);
        assert_eq!(values(&list, &storage), vec![1, 2, 7, 8, 3]);
        assert!(list.is_coherent(&storage));

        list.remove(&mut storage, k[0], k[1]);
        assert_eq!(values(&list, &storage), vec![1, 2, 3]);
        assert!(list.is_coherent(&storage));

        // Chain is still linked internally
        assert_eq!(storage.get(k[0]).unwrap().next, k[1]);
        assert_eq!(storage.get(k[1]).unwrap().prev, k[0]);
    }

    #[test]
    fn remove_whole_list() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, k) = filled(&mut storage, &[1, 2, 3]);

        list.remove(&mut storage, k[0], k[2]);

        assert!(list.is_empty());
        assert_eq!(list.tail(), None);
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn remove_head_and_tail_singletons() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, k) = filled(&mut storage, &[1, 2, 3]);

        list.remove(&mut storage, k[0], k[0]);
        assert_eq!(values(&list, &storage), vec![2, 3]);
        assert!(list.is_coherent(&storage));

        list.remove(&mut storage, k[2], k[2]);
        assert_eq!(values(&list, &storage), vec![2]);
        assert_eq!(list.head(), list.tail());
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn reset_detaches_chain() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, k) = filled(&mut storage, &[1, 2]);

        assert_eq!(list.reset(), Some(k[0]));
        assert!(list.is_empty());
        assert_eq!(list.reset(), None);
        assert_eq!(storage.get(k[0]).unwrap().next, k[1]);
    }

    #[test]
    fn is_on_list() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, k) = filled(&mut storage, &[1, 2]);
        let stray = storage.try_insert(Node::new(9)).unwrap();

        assert!(list.is_on_list(&storage, k[0]));
        assert!(list.is_on_list(&storage, k[1]));
        assert!(!list.is_on_list(&storage, stray));
        assert!(!list.is_on_list(&storage, u32::NONE));
    }

    #[test]
    fn iter_double_ended() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, k) = filled(&mut storage, &[1, 2, 3, 4]);

        let rev: Vec<u32> = list.iter(&storage).rev().collect();
        assert_eq!(rev, vec![k[3], k[2], k[1], k[0]]);

        let mut iter = list.iter(&storage);
        assert_eq!(iter.next(), Some(k[0]));
        assert_eq!(iter.next_back(), Some(k[3]));
        assert_eq!(iter.next(), Some(k[1]));
        assert_eq!(iter.next_back(), Some(k[2]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn forced_cycle_is_incoherent() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, k) = filled(&mut storage, &[1, 2, 3]);

        storage.get_mut(k[2]).unwrap().next = k[0];

        assert!(!list.is_coherent(&storage));
        assert_eq!(
            list.check_coherence(&storage, MAX_COHERENT),
            Err(Incoherence::ChainPastTail { position: 2 })
        );
    }

    #[test]
    fn limit_caps_the_walk() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, _) = filled(&mut storage, &[1, 2, 3]);

        assert_eq!(
            list.check_coherence(&storage, 2),
            Err(Incoherence::LimitExceeded { limit: 2 })
        );
        assert_eq!(list.check_coherence(&storage, 3), Ok(()));
    }

    #[test]
    fn broken_back_link_detected() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (list, k) = filled(&mut storage, &[1, 2, 3]);

        storage.get_mut(k[2]).unwrap().prev = k[0];

        assert_eq!(
            list.check_coherence(&storage, MAX_COHERENT),
            Err(Incoherence::BrokenBackLink { position: 2 })
        );
    }

    #[test]
    fn head_tail_mismatch_detected() {
        let storage: BoxedStorage<Node> = BoxedStorage::with_capacity(4);
        let list = DhdlList {
            head: u32::NONE,
            tail: 0,
        };
        assert_eq!(
            list.check_coherence(&storage, MAX_COHERENT),
            Err(Incoherence::HeadTailMismatch)
        );
    }

    #[test]
    fn sort_by_value() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, _) = filled(&mut storage, &[5, 3, 9, 1, 3, 7]);

        list.sort_by(&mut storage, |a, b| a.value.cmp(&b.value));

        assert_eq!(values(&list, &storage), vec![1, 3, 3, 5, 7, 9]);
        assert!(list.is_coherent(&storage));
    }

    #[test]
    fn sort_is_stable() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(16);
        let (mut list, k) = filled(&mut storage, &[2, 1, 2, 1]);

        list.sort_by(&mut storage, |a, b| a.value.cmp(&b.value));

        let order: Vec<u32> = list.iter(&storage).collect();
        assert_eq!(order, vec![k[1], k[3], k[0], k[2]]);
    }

    #[test]
    fn sort_empty_and_single() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(4);
        let mut list: DhdlList = DhdlList::new();
        list.sort_by(&mut storage, |a, b| a.value.cmp(&b.value));
        assert!(list.is_empty());

        let (mut list, k) = filled(&mut storage, &[4]);
        list.sort_by(&mut storage, |a, b| a.value.cmp(&b.value));
        assert_eq!(list.head(), Some(k[0]));
        assert!(list.is_coherent(&storage));
    }

    #[test]
    #[should_panic(expected = "invalid index")]
    fn fifo_of_vacant_index_panics() {
        let mut storage: BoxedStorage<Node> = BoxedStorage::with_capacity(4);
        let mut list: DhdlList = DhdlList::new();
        list.fifo(&mut storage, 2);
    }
}
