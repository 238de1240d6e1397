//! Singly-headed, singly-linked list.
//!
//! The smallest discipline: one anchor index and a forward link per
//! record. Pushing and popping at the head are O(1); appending at the far
//! end walks the whole chain.

use crate::coherence::{self, Incoherence, MAX_COHERENT};
use crate::link::{Keys, node, node_mut};
use crate::{Index, SinglyLinked, Storage};

/// A singly-headed, singly-linked list over external storage.
///
/// Natural use is as a stack: [`lifo`](Self::lifo) and
/// [`remq`](Self::remq) both work at the head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShslList<Idx: Index = u32> {
    head: Idx,
}

impl<Idx: Index> Default for ShslList<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> ShslList<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self { head: Idx::NONE }
    }

    /// Returns the head record's index.
    #[inline]
    pub fn head(&self) -> Option<Idx> {
        self.head.into_option()
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends a record at the far end. O(n).
    pub fn fifo<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        node_mut(storage, idx).set_next(Idx::NONE);

        if self.head.is_none() {
            self.head = idx;
            return;
        }

        let mut last = self.head;
        loop {
            let next = node(storage, last).next();
            if next.is_none() {
                break;
            }
            last = next;
        }

        node_mut(storage, last).set_next(idx);
    }

    /// Pushes a record at the head.
    #[inline]
    pub fn lifo<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        node_mut(storage, idx).set_next(self.head);
        self.head = idx;
    }

    /// Splices the chain `[head..=tail]` at the front (`after == None`) or
    /// immediately after `after`.
    pub fn insert<T, S>(&mut self, storage: &mut S, after: Option<Idx>, head: Idx, tail: Idx)
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        match after {
            None => {
                node_mut(storage, tail).set_next(self.head);
                self.head = head;
            }
            Some(after) => {
                let next = node(storage, after).next();
                node_mut(storage, tail).set_next(next);
                node_mut(storage, after).set_next(head);
            }
        }
    }

    /// Detaches the chain `[head..=tail]`.
    ///
    /// Searches for the predecessor of `head`; does nothing if `head` is
    /// not on the list.
    pub fn remove<T, S>(&mut self, storage: &mut S, head: Idx, tail: Idx)
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.head.is_none() {
            return;
        }

        if self.head == head {
            self.head = node(storage, tail).next();
            return;
        }

        let mut link = self.head;
        loop {
            let next = node(storage, link).next();
            if next == head {
                break;
            }
            if next.is_none() {
                return;
            }
            link = next;
        }

        let next = node(storage, tail).next();
        node_mut(storage, link).set_next(next);
    }

    /// Pops the head record, clearing its `next`.
    #[inline]
    pub fn remq<T, S>(&mut self, storage: &mut S) -> Option<Idx>
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let idx = self.head.into_option()?;
        let link = node_mut(storage, idx);
        self.head = link.next();
        link.set_next(Idx::NONE);
        Some(idx)
    }

    /// Empties the list, returning the head of the detached chain.
    #[inline]
    pub fn reset(&mut self) -> Option<Idx> {
        let head = self.head.into_option();
        self.head = Idx::NONE;
        head
    }

    /// Returns `true` if `idx` is on this list.
    pub fn is_on_list<T, S>(&self, storage: &S, idx: Idx) -> bool
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        idx.is_some() && self.iter(storage).any(|k| k == idx)
    }

    /// Returns `true` if the chain ends within [`MAX_COHERENT`] links.
    pub fn is_coherent<T, S>(&self, storage: &S) -> bool
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.check_coherence(storage, MAX_COHERENT).is_ok()
    }

    /// Checks that the chain ends within `limit` links.
    ///
    /// With no tail to compare against, termination is the only
    /// structural property this discipline has.
    pub fn check_coherence<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut link = self.head;
        let mut position = 0;
        let result = loop {
            if link.is_none() {
                break Ok(());
            }
            if position == limit {
                break Err(Incoherence::LimitExceeded { limit });
            }
            match storage.get(link) {
                Some(record) => link = record.next(),
                None => break Err(Incoherence::InvalidIndex { position }),
            }
            position += 1;
        };

        coherence::report("shsl", result)
    }

    /// Returns an iterator over the indices on the list, head first.
    #[inline]
    pub fn iter<'a, T, S>(&self, storage: &'a S) -> Keys<'a, T, S, Idx>
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Keys::new(storage, self.head)
    }
}
