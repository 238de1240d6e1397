//! Atomic-update list: a lock-free multi-producer, single-consumer chain.
//!
//! The list is a single cache-line padded atomic holding the newest
//! record's index. Every record links to the next-older record through an
//! atomic `prev`, so the chain reads newest to oldest. Producers push with a
//! compare-and-swap on the tail (a Treiber push); one consumer at a time
//! removes records, detaches the whole chain, or drains it in FIFO order.
//!
//! ```text
//!   tail ──► [newest] ──prev──► [ ... ] ──prev──► [oldest] ──prev──► NONE
//! ```
//!
//! # Roles
//!
//! - **Producers** call [`AuList::fifo`]. Any number of threads, lock-free.
//! - **The consumer** calls everything else. Consumer operations may run
//!   concurrently with producers but never with each other. Debug builds
//!   assert this.
//!
//! The list holds indices only. Records live in a [`Storage`] shared by
//! reference between producers and the consumer; a record's `prev` is
//! written by its producer before publication and afterwards only by the
//! consumer.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use tether_list::{AtomicLink, AuList, BoxedStorage, Storage};
//!
//! let mut storage: BoxedStorage<AtomicLink> = BoxedStorage::with_capacity(4);
//! let keys: Vec<u32> = (0..4)
//!     .map(|_| storage.try_insert(AtomicLink::new()).unwrap())
//!     .collect();
//!
//! let storage = Arc::new(storage);
//! let list = Arc::new(AuList::<u32>::new());
//!
//! let handles: Vec<_> = keys
//!     .iter()
//!     .map(|&key| {
//!         let (storage, list) = (Arc::clone(&storage), Arc::clone(&list));
//!         thread::spawn(move || {
//!             list.fifo(&*storage, key);
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! let mut drained = Vec::new();
//! while let Some(key) = list.remq(&*storage) {
//!     drained.push(key);
//! }
//! drained.sort();
//! assert_eq!(drained, keys);
//! ```

use std::fmt;
use std::marker::PhantomData;
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::coherence::{self, Incoherence, MAX_COHERENT};
use crate::link::node;
use crate::trace::{debug, trace};
use crate::{AtomicIndex, AtomicLink, AtomicLinked, Index, Storage};

/// A lock-free MPSC intrusive list.
///
/// See the [module documentation](self) for the producer/consumer split.
pub struct AuList<Idx: Index = u32> {
    tail: CachePadded<AtomicIndex<Idx>>,
    #[cfg(debug_assertions)]
    consumer: AtomicBool,
}

impl<Idx: Index> Default for AuList<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> fmt::Debug for AuList<Idx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuList")
            .field("tail", &self.tail())
            .finish()
    }
}

// =============================================================================
// Consumer exclusivity (checked in debug builds only)
// =============================================================================

#[cfg(debug_assertions)]
struct ConsumerGuard<'a>(&'a AtomicBool);

#[cfg(debug_assertions)]
impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(not(debug_assertions))]
struct ConsumerGuard<'a>(PhantomData<&'a ()>);

impl<Idx: Index> AuList<Idx> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            tail: CachePadded::new(AtomicIndex::none()),
            #[cfg(debug_assertions)]
            consumer: AtomicBool::new(false),
        }
    }

    #[cfg(debug_assertions)]
    #[track_caller]
    fn consumer(&self) -> ConsumerGuard<'_> {
        let overlapped = self.consumer.swap(true, Ordering::Acquire);
        assert!(!overlapped, "overlapping AuList consumer operations");
        ConsumerGuard(&self.consumer)
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn consumer(&self) -> ConsumerGuard<'_> {
        ConsumerGuard(PhantomData)
    }

    /// Returns the newest record's index.
    ///
    /// A snapshot: producers may push immediately afterwards.
    #[inline]
    pub fn tail(&self) -> Option<Idx> {
        self.tail.load().into_option()
    }

    /// Returns `true` if the list is empty at this instant.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail.load().is_none()
    }

    // =========================================================================
    // Producer
    // =========================================================================

    /// Pushes a record as the newest element. Lock-free; callable from any
    /// number of threads.
    ///
    /// Returns the previous tail. `None` means the list went from empty to
    /// non-empty, which a dispatcher can use to schedule its consumer.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not occupied in storage.
    #[inline]
    pub fn fifo<T, S>(&self, storage: &S, idx: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let link = node(storage, idx).atomic_link();
        let tail = self.tail.load();
        link.set_prev(tail);

        match self.tail.compare_exchange(tail, idx) {
            Ok(prev) => prev.into_option(),
            Err(current) => self.fifo_contended(link, idx, current),
        }
    }

    #[cold]
    #[cfg_attr(not(feature = "tracing"), allow(unused_assignments, unused_variables))]
    fn fifo_contended(&self, link: &AtomicLink<Idx>, idx: Idx, mut tail: Idx) -> Option<Idx> {
        let backoff = Backoff::new();
        let mut retries: u32 = 1;

        loop {
            link.set_prev(tail);
            match self.tail.compare_exchange(tail, idx) {
                Ok(prev) => {
                    trace!(retries, "fifo contended");
                    return prev.into_option();
                }
                Err(current) => {
                    tail = current;
                    retries += 1;
                    backoff.spin();
                }
            }
        }
    }

    // =========================================================================
    // Consumer
    // =========================================================================

    /// Removes a specific record.
    ///
    /// Returns `Some(item)` if it was on the list, `None` if it was not (or
    /// the list is empty). The removed record's `prev` is cleared.
    ///
    /// Consumer only.
    pub fn remove<T, S>(&self, storage: &S, item: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();
        self.unlink(storage, item)
    }

    fn unlink<T, S>(&self, storage: &S, item: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let backoff = Backoff::new();
        let mut tail = self.tail.load();
        loop {
            if tail.is_none() {
                return None;
            }
            if tail != item {
                break;
            }

            let link = node(storage, tail).atomic_link();
            match self.tail.compare_exchange(tail, link.prev()) {
                Ok(_) => {
                    link.set_prev(Idx::NONE);
                    return Some(item);
                }
                Err(current) => {
                    tail = current;
                    backoff.spin();
                }
            }
        }

        // Not the tail: every link below the tail is consumer-owned.
        let mut newer = node(storage, tail).atomic_link();
        let mut link = newer.prev();
        while link.is_some() {
            let current = node(storage, link).atomic_link();
            if link == item {
                newer.set_prev(current.prev());
                current.set_prev(Idx::NONE);
                return Some(item);
            }
            newer = current;
            link = current.prev();
        }

        None
    }

    /// Removes and returns the oldest record (FIFO order).
    ///
    /// Consumer only.
    pub fn remq<T, S>(&self, storage: &S) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();
        self.take_oldest(storage).map(|(idx, _)| idx)
    }

    /// Removes the oldest record, reporting a full to empty transition.
    ///
    /// The oldest record is removed in every case. `None` means the list was
    /// empty, or that `last` was the only record and its removal emptied the
    /// list. A consumer parks a marker record with [`fifo`](Self::fifo) and
    /// keeps calling this with the marker as `last`: the first `None` says
    /// no producer pushed after the marker, and the next `fifo` will report
    /// the list empty.
    ///
    /// Consumer only.
    pub fn remq_last<T, S>(&self, storage: &S, last: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();
        match self.take_oldest(storage)? {
            (idx, true) if idx == last => None,
            (idx, _) => Some(idx),
        }
    }

    /// Cuts off the oldest record. The flag is set when the record was the
    /// only one and the tail CAS emptied the list.
    fn take_oldest<T, S>(&self, storage: &S) -> Option<(Idx, bool)>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let backoff = Backoff::new();
        let mut tail = self.tail.load();
        loop {
            if tail.is_none() {
                return None;
            }
            if node(storage, tail).atomic_link().prev().is_some() {
                break;
            }

            match self.tail.compare_exchange(tail, Idx::NONE) {
                Ok(_) => return Some((tail, true)),
                Err(current) => {
                    tail = current;
                    backoff.spin();
                }
            }
        }

        // At least two records: walk to the oldest and cut it off.
        let mut newer = node(storage, tail).atomic_link();
        let mut link = newer.prev();
        loop {
            let current = node(storage, link).atomic_link();
            let older = current.prev();
            if older.is_none() {
                break;
            }
            newer = current;
            link = older;
        }

        newer.set_prev(Idx::NONE);
        Some((link, false))
    }

    /// Detaches the entire chain, returning its newest record.
    ///
    /// The records keep their `prev` links; walk them with [`Chain`].
    ///
    /// Consumer only.
    pub fn reset(&self) -> Option<Idx> {
        let _guard = self.consumer();

        let backoff = Backoff::new();
        let mut tail = self.tail.load();
        loop {
            if tail.is_none() {
                return None;
            }
            match self.tail.compare_exchange(tail, Idx::NONE) {
                Ok(_) => return Some(tail),
                Err(current) => {
                    tail = current;
                    backoff.spin();
                }
            }
        }
    }

    /// Atomically replaces the chain with `sentinel`.
    ///
    /// - Empty list: returns `None`, the list is left empty.
    /// - The list holds only `sentinel`: returns `None` and empties the
    ///   list. This is how a drain finishes.
    /// - Otherwise: returns the detached chain's newest record. The chain
    ///   runs newest to oldest and ends at `NONE`, or at `sentinel` when the
    ///   sentinel was its oldest element. `sentinel` becomes the only
    ///   record on the list, so producers keep seeing a non-empty list and
    ///   do not report an empty to non-empty transition.
    ///
    /// Consumer only.
    ///
    /// # Panics
    ///
    /// Panics if `sentinel` is not occupied in storage.
    pub fn swap<T, S>(&self, storage: &S, sentinel: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();
        self.exchange(storage, sentinel)
    }

    fn exchange<T, S>(&self, storage: &S, sentinel: Idx) -> Option<Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut tail = self.tail.load();
        if tail.is_none() {
            return None;
        }

        while tail == sentinel {
            match self.tail.compare_exchange(sentinel, Idx::NONE) {
                Ok(_) => return None,
                Err(current) => tail = current,
            }
        }

        node(storage, sentinel).atomic_link().set_prev(Idx::NONE);

        let backoff = Backoff::new();
        loop {
            match self.tail.compare_exchange(tail, sentinel) {
                Ok(_) => return Some(tail),
                Err(current) => {
                    tail = current;
                    backoff.spin();
                }
            }
        }
    }

    /// Returns a consuming iterator that yields records oldest first.
    ///
    /// Each refill [`swap`](Self::swap)s `sentinel` in and reverses the
    /// detached chain. Records pushed while iterating are picked up by the
    /// next refill. Iteration ends when only the sentinel is left, at which
    /// point the list is empty again.
    ///
    /// The iterator holds the consumer role until dropped. Dropping it
    /// early puts every record not yet yielded back on the list, oldest
    /// end, in order, and unlinks the sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `sentinel` is not occupied in storage.
    pub fn drain<'a, T, S>(&'a self, storage: &'a S, sentinel: Idx) -> Drain<'a, T, S, Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Drain {
            _guard: self.consumer(),
            list: self,
            storage,
            sentinel,
            pending: Idx::NONE,
            armed: false,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over the chain, newest to oldest.
    ///
    /// Consumer only.
    #[inline]
    pub fn chain<'a, T, S>(&self, storage: &'a S) -> Chain<'a, T, S, Idx>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Chain::new(storage, self.tail())
    }

    /// Returns `true` if `idx` is on the list.
    ///
    /// Consumer only.
    pub fn is_on_list<T, S>(&self, storage: &S, idx: Idx) -> bool
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();
        idx.is_some() && self.chain(storage).any(|k| k == idx)
    }

    /// Returns `true` if the chain ends within [`MAX_COHERENT`] links.
    ///
    /// Consumer only.
    pub fn is_coherent<T, S>(&self, storage: &S) -> bool
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.check_coherence(storage, MAX_COHERENT).is_ok()
    }

    /// Walks tail to oldest, failing if the chain does not end within
    /// `limit` links or refers to a vacant slot.
    ///
    /// Consumer only.
    pub fn check_coherence<T, S>(&self, storage: &S, limit: usize) -> Result<(), Incoherence>
    where
        T: AtomicLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let _guard = self.consumer();

        let mut link = self.tail.load();
        let mut position = 0;
        let result = loop {
            if link.is_none() {
                break Ok(());
            }
            if position == limit {
                break Err(Incoherence::LimitExceeded { limit });
            }
            match storage.get(link) {
                Some(record) => link = record.atomic_link().prev(),
                None => break Err(Incoherence::InvalidIndex { position }),
            }
            position += 1;
        };

        coherence::report("au", result)
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over an atomic-update chain, newest to oldest.
///
/// Follows `prev` links until `NONE`. Works on a live list (through
/// [`AuList::chain`]) or on a chain returned by [`AuList::reset`] or
/// [`AuList::swap`].
pub struct Chain<'a, T, S, Idx: Index> {
    storage: &'a S,
    next: Idx,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, S, Idx: Index> Chain<'a, T, S, Idx> {
    /// Starts a walk at `newest`.
    #[inline]
    pub fn new(storage: &'a S, newest: Option<Idx>) -> Self {
        Self {
            storage,
            next: Idx::from_option(newest),
            _marker: PhantomData,
        }
    }
}

impl<T, S, Idx> Iterator for Chain<'_, T, S, Idx>
where
    Idx: Index,
    T: AtomicLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    type Item = Idx;

    #[inline]
    fn next(&mut self) -> Option<Idx> {
        let idx = self.next.into_option()?;
        self.next = node(self.storage, idx).atomic_link().prev();
        Some(idx)
    }
}

/// Consuming FIFO iterator returned by [`AuList::drain`].
///
/// While a batch is being yielded, the `prev` links of its records are
/// rewritten to point at the next-newer record.
pub struct Drain<'a, T, S, Idx>
where
    Idx: Index,
    T: AtomicLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    list: &'a AuList<Idx>,
    storage: &'a S,
    sentinel: Idx,
    /// Oldest record not yet yielded.
    pending: Idx,
    /// Set while the sentinel is linked on the list.
    armed: bool,
    _guard: ConsumerGuard<'a>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S, Idx> Drain<'_, T, S, Idx>
where
    Idx: Index,
    T: AtomicLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    /// Reverses `[link..stop)` in place, returning the new first record and
    /// the number of records moved.
    fn reverse(&self, mut link: Idx, stop: Idx) -> (Idx, usize) {
        let mut head = Idx::NONE;
        let mut count = 0;
        while link.is_some() && link != stop {
            let current = node(self.storage, link).atomic_link();
            let prev = current.prev();
            current.set_prev(head);
            head = link;
            link = prev;
            count += 1;
        }
        (head, count)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn refill(&mut self) {
        match self.list.exchange(self.storage, self.sentinel) {
            Some(tail) => {
                self.armed = true;
                let (head, count) = self.reverse(tail, self.sentinel);
                debug!(count, "drain refill");
                self.pending = head;
            }
            None => self.armed = false,
        }
    }
}

impl<T, S, Idx> Iterator for Drain<'_, T, S, Idx>
where
    Idx: Index,
    T: AtomicLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    type Item = Idx;

    fn next(&mut self) -> Option<Idx> {
        if self.pending.is_none() {
            self.refill();
        }

        let idx = self.pending.into_option()?;
        self.pending = node(self.storage, idx).atomic_link().prev();
        Some(idx)
    }
}

impl<T, S, Idx> Drop for Drain<'_, T, S, Idx>
where
    Idx: Index,
    T: AtomicLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        // Back into newest-to-oldest order, then hang the batch below the
        // sentinel and cut the sentinel out.
        let (newest, count) = self.reverse(self.pending, Idx::NONE);
        node(self.storage, self.sentinel)
            .atomic_link()
            .set_prev(newest);
        self.list.unlink(self.storage, self.sentinel);
        debug!(count, "drain dropped early");
    }
}
