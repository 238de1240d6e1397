//! Doubly-headed, singly-linked list.
//!
//! Tracks head and tail but links only forward. Both ends accept inserts
//! in O(1); removing a chain from anywhere but the head has to search for
//! its predecessor.

use crate::coherence::{self, Incoherence, MAX_COHERENT};
use crate::link::{Keys, node, node_mut};
use crate::{Index, SinglyLinked, Storage};

/// A doubly-headed, singly-linked list over external storage.
///
/// Records implement [`SinglyLinked`]. Consumption is head first, so
/// [`fifo`](Self::fifo) followed by [`remq`](Self::remq) is a queue and
/// [`lifo`](Self::lifo) followed by `remq` is a stack.
///
/// # Example
///
/// ```
/// use tether_list::{BoxedStorage, DhslList, Link, Storage};
///
/// let mut storage: BoxedStorage<Link> = BoxedStorage::with_capacity(4);
/// let mut list: DhslList = DhslList::new();
///
/// let a = storage.try_insert(Link::new()).unwrap();
/// let b = storage.try_insert(Link::new()).unwrap();
/// list.fifo(&mut storage, a);
/// list.fifo(&mut storage, b);
///
/// assert_eq!(list.remq(&mut storage), Some(a));
/// assert_eq!(list.remq(&mut storage), Some(b));
/// assert_eq!(list.remq(&mut storage), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhslList<Idx: Index = u32> {
    head: Idx,
    tail: Idx,
}

impl<Idx: Index> Default for DhslList<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> DhslList<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: Idx::NONE,
            tail: Idx::NONE,
        }
    }

    /// Returns the head record's index.
    #[inline]
    pub fn head(&self) -> Option<Idx> {
        self.head.into_option()
    }

    /// Returns the tail record's index.
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
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        node_mut(storage, idx).set_next(Idx::NONE);

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
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        node_mut(storage, idx).set_next(self.head);

        if self.head.is_none() {
            self.tail = idx;
        }

        self.head = idx;
    }

    /// Splices the chain `[head..=tail]` at the front (`after == None`) or
    /// immediately after `after`.
    ///
    /// # Panics
    ///
    /// Panics if `after` or `tail` is not occupied in storage.
    pub fn insert<T, S>(&mut self, storage: &mut S, after: Option<Idx>, head: Idx, tail: Idx)
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        match after {
            None => {
                node_mut(storage, tail).set_next(self.head);
                if self.head.is_none() {
                    self.tail = tail;
                }
                self.head = head;
            }
            Some(after) => {
                let next = node(storage, after).next();
                node_mut(storage, tail).set_next(next);
                node_mut(storage, after).set_next(head);
                if next.is_none() {
                    self.tail = tail;
                }
            }
        }
    }

    /// Detaches the chain `[head..=tail]`.
    ///
    /// O(1) when `head` is the list head, otherwise a linear search for its
    /// predecessor. Does nothing if `head` is not on the list. The removed
    /// chain keeps its internal links.
    ///
    /// # Panics
    ///
    /// Panics if `tail` is not occupied in storage.
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
            if self.head.is_none() {
                self.tail = Idx::NONE;
            }
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
        if next.is_none() {
            self.tail = link;
        }
    }

    /// Removes and returns the head record.
    ///
    /// The removed record's `next` is cleared.
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

        if self.head.is_none() {
            self.tail = Idx::NONE;
        }

        Some(idx)
    }

    /// Empties the list, returning the head of the detached chain.
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
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        idx.is_some() && self.iter(storage).any(|k| k == idx)
    }

    /// Returns `true` if the list passes [`check_coherence`](Self::check_coherence)
    /// with the default [`MAX_COHERENT`] cap.
    pub fn is_coherent<T, S>(&self, storage: &S) -> bool
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.check_coherence(storage, MAX_COHERENT).is_ok()
    }

    /// Walks head to tail checking that the chain ends exactly at the
    /// recorded tail, visiting at most `limit` links.
    pub fn check_coherence<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        coherence::report("dhsl", self.walk(storage, limit))
    }

    fn walk<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: SinglyLinked<Idx>,
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
        for position in 0..limit {
            let next = storage
                .get(link)
                .ok_or(Incoherence::InvalidIndex { position })?
                .next();

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

            link = next;
        }

        Err(Incoherence::LimitExceeded { limit })
    }

    /// Returns an iterator over the indices on the list, head to tail.
    #[inline]
    pub fn iter<'a, T, S>(&self, storage: &'a S) -> Keys<'a, T, S, Idx>
    where
        T: SinglyLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Keys::new(storage, self.head)
    }
}
