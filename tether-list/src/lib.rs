//! Intrusive linked lists over external storage.
//!
//! The lists in this crate never allocate, copy or own the records they
//! chain together. A record embeds its own link (one or two indices) and
//! lives in a [`Storage`]; a list is nothing more than the head and tail
//! indices of a chain threaded through those links. Moving a record from
//! one list to another rewires a few indices and nothing else.
//!
//! # Disciplines
//!
//! | List | Anchors | Links | Strength |
//! |------|---------|-------|----------|
//! | [`AuList`] | atomic tail | atomic `prev` | Lock-free multi-producer, single-consumer |
//! | [`DhdlList`] | head + tail | `prev` + `next` | O(1) everywhere, chain splicing |
//! | [`DhslList`] | head + tail | `next` | O(1) at both ends, one index per record |
//! | [`ShslList`] | head | `next` | Smallest: a stack with an O(n) append |
//! | [`SortList`] | head + tail | `prev` + `next` | [`DhdlList`] plus in-place sort |
//!
//! Every list offers the same verbs: `fifo` (append), `lifo` (prepend,
//! deterministic lists only), `insert`/`remove` of a whole chain, `remq`
//! (take the oldest), `reset` (detach everything), `is_on_list` and
//! `is_coherent`. [`AuList`] adds `swap` and `drain` for batch consumers
//! and `remq_last` to detect the list emptying.
//!
//! # Quick Start
//!
//! ```
//! use tether_list::{BoxedStorage, DhdlList, DoubleLink, Storage};
//!
//! // Storage owns the records
//! let mut storage: BoxedStorage<DoubleLink> = BoxedStorage::with_capacity(16);
//!
//! // Two lists thread through the same records
//! let mut ready: DhdlList = DhdlList::new();
//! let mut parked: DhdlList = DhdlList::new();
//!
//! let a = storage.try_insert(DoubleLink::new()).unwrap();
//! let b = storage.try_insert(DoubleLink::new()).unwrap();
//! ready.fifo(&mut storage, a);
//! ready.fifo(&mut storage, b);
//!
//! // Move `a` without touching the allocator; its index stays valid
//! ready.remove(&mut storage, a, a);
//! parked.fifo(&mut storage, a);
//!
//! assert_eq!(ready.remq(&mut storage), Some(b));
//! assert!(parked.is_on_list(&storage, a));
//! ```
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a list must use the same storage instance, and a
//! link belongs to at most one list at a time. Breaking either rule
//! scrambles the list (never memory): an index that is no longer occupied
//! panics with "invalid index", and [`is_coherent`](DhdlList::is_coherent)
//! reports most other damage.
//!
//! # Coherency
//!
//! Every list can check its own structure. The walk is capped at
//! [`MAX_COHERENT`] links so a cycle is reported instead of hanging; the
//! `check_coherence` methods take an explicit cap and return an
//! [`Incoherence`] naming what broke.
//!
//! # Feature Flags
//!
//! - `slab` - Enable [`Storage`] impl for `slab::Slab`
//! - `tracing` - Emit diagnostics through `tracing`; see [`init_tracing`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod au;
pub mod coherence;
pub mod dhdl;
pub mod dhsl;
pub mod index;
pub mod link;
pub mod shsl;
pub mod sort;
pub mod storage;
mod trace;

pub use au::{AuList, Chain, Drain};
pub use coherence::{Incoherence, MAX_COHERENT};
pub use dhdl::DhdlList;
pub use dhsl::DhslList;
pub use index::{AtomicIndex, Index};
pub use link::{AtomicLink, AtomicLinked, DoubleLink, DoublyLinked, Link, SinglyLinked, Sortable};
pub use shsl::ShslList;
pub use sort::SortList;
pub use storage::{BoxedStorage, Full, Storage};
pub use trace::init_tracing;
