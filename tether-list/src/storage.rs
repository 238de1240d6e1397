//! Host-record storage with stable indices.
//!
//! Lists in this crate never own their nodes. The records that embed the
//! links live in a [`Storage`], and lists refer to them only by index. A
//! record's index stays valid until the record is removed from storage,
//! so a node can move between lists any number of times without its
//! handle changing.

use std::fmt;
use std::mem;

use crate::Index;

/// Slab-like storage with stable indices.
///
/// # Requirements
///
/// Implementations must provide:
/// - **Stable indices**: an index remains valid until explicitly removed
/// - **O(1)** insert, remove, get operations
/// - **Slot reuse**: removed slots can be reused by future inserts
///
/// Storage must never hand out [`Index::NONE`] for an occupied slot.
///
/// # Implementations
///
/// - [`BoxedStorage<T>`] - fixed capacity chosen at runtime
/// - `slab::Slab<T>` - growable (feature `slab`)
pub trait Storage<T> {
    /// Index type for this storage.
    type Index: Index;

    /// Error type for failed insertions.
    ///
    /// - [`Full<T>`] for fixed-capacity storage
    /// - `Infallible` for growable storage
    type Error;

    /// Inserts a record, returning its stable index.
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Self::Error>;

    /// Removes and returns the record at `index`, if present.
    ///
    /// The record must no longer be linked into any list.
    fn remove(&mut self, index: Self::Index) -> Option<T>;

    /// Returns a reference to the record at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the record at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;
}

/// Error returned when fixed-capacity storage is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

// =============================================================================
// BoxedStorage - runtime capacity, one boxed slot array, intrusive free list
// =============================================================================

#[derive(Debug)]
enum Slot<T, Idx> {
    Occupied(T),
    Vacant { next_free: Idx },
}

/// Fixed-capacity storage with runtime-determined size.
///
/// A single boxed slice of slots. Vacant slots are threaded into a free
/// list through their own index field, so insert and remove never touch
/// the allocator after construction.
///
/// # Example
///
/// ```
/// use tether_list::{BoxedStorage, Storage};
///
/// let mut storage: BoxedStorage<u64> = BoxedStorage::with_capacity(4);
/// assert_eq!(storage.capacity(), 4);
///
/// let idx = storage.try_insert(42).unwrap();
/// assert_eq!(storage.get(idx), Some(&42));
/// assert_eq!(storage.remove(idx), Some(42));
/// assert!(storage.is_empty());
/// ```
pub struct BoxedStorage<T, Idx: Index = u32> {
    slots: Box<[Slot<T, Idx>]>,
    /// Most recently freed slot, `NONE` when full.
    free_head: Idx,
    len: usize,
}

impl<T, Idx: Index> BoxedStorage<T, Idx> {
    /// Creates storage with exactly `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0, or if `capacity` would need the index
    /// type's `NONE` value as a slot index.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        assert!(
            capacity <= Idx::NONE.as_usize(),
            "capacity exceeds index type maximum"
        );

        let slots = (0..capacity)
            .map(|i| Slot::Vacant {
                next_free: if i + 1 < capacity {
                    Idx::from_usize(i + 1)
                } else {
                    Idx::NONE
                },
            })
            .collect();

        Self {
            slots,
            free_head: Idx::from_usize(0),
            len: 0,
        }
    }

    /// Returns the capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if all slots are occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Drops every record and makes all slots available again.
    ///
    /// # Warning
    ///
    /// Any list still threading records of this storage is left holding
    /// stale indices. Reset or drain those lists first.
    pub fn clear(&mut self) {
        let capacity = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = Slot::Vacant {
                next_free: if i + 1 < capacity {
                    Idx::from_usize(i + 1)
                } else {
                    Idx::NONE
                },
            };
        }
        self.free_head = Idx::from_usize(0);
        self.len = 0;
    }
}

impl<T, Idx: Index> Storage<T> for BoxedStorage<T, Idx> {
    type Index = Idx;
    type Error = Full<T>;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<Idx, Full<T>> {
        let idx = self.free_head;
        if idx.is_none() {
            return Err(Full(value));
        }

        let slot = &mut self.slots[idx.as_usize()];
        let Slot::Vacant { next_free } = *slot else {
            unreachable!("free list points at an occupied slot");
        };
        *slot = Slot::Occupied(value);
        self.free_head = next_free;
        self.len += 1;

        Ok(idx)
    }

    #[inline]
    fn remove(&mut self, index: Idx) -> Option<T> {
        let slot = self.slots.get_mut(index.as_usize())?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }

        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let Slot::Occupied(value) = mem::replace(slot, vacant) else {
            unreachable!();
        };
        self.free_head = index;
        self.len -= 1;

        Some(value)
    }

    #[inline]
    fn get(&self, index: Idx) -> Option<&T> {
        match self.slots.get(index.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    fn get_mut(&mut self, index: Idx) -> Option<&mut T> {
        match self.slots.get_mut(index.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }
}

impl<T: fmt::Debug, Idx: Index> fmt::Debug for BoxedStorage<T, Idx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedStorage")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// slab::Slab implementation
// =============================================================================

#[cfg(feature = "slab")]
impl<T> Storage<T> for slab::Slab<T> {
    type Index = usize;
    type Error = core::convert::Infallible;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<usize, Self::Error> {
        Ok(self.insert(value))
    }

    #[inline]
    fn remove(&mut self, index: usize) -> Option<T> {
        self.try_remove(index)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        slab::Slab::get(self, index)
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        slab::Slab::get_mut(self, index)
    }
}


#[cfg(all(test, feature = "slab"))]
mod tests_slab {
    use super::*;

    #[test]
    fn slab_storage_is_infallible() {
        let mut storage: slab::Slab<u64> = slab::Slab::with_capacity(1);
        let a = Storage::try_insert(&mut storage, 1).unwrap();
        let b = Storage::try_insert(&mut storage, 2).unwrap();
        assert_eq!(Storage::get(&storage, a), Some(&1));
        assert_eq!(Storage::remove(&mut storage, b), Some(2));
        assert_eq!(Storage::get(&storage, b), None);
    }
}
