//! Link indices with a sentinel "null" value.
//!
//! Lists never hold references to their nodes. A link points at another
//! node by its storage index, and the reserved [`Index::NONE`] value plays
//! the part of a null pointer. [`AtomicIndex`] is the same thing packed
//! into a single atomic word for the lock-free list.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A copyable storage index with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use tether_list::Index;
///
/// let idx: u32 = 5;
/// assert!(idx.is_some());
/// assert!(u32::NONE.is_none());
/// assert_eq!(idx.into_option(), Some(5));
/// assert_eq!(u32::NONE.into_option(), None);
/// ```
pub trait Index: Copy + Eq + fmt::Debug {
    /// Sentinel value representing "no index" / null.
    const NONE: Self;

    /// Returns the index as a `usize`.
    fn as_usize(self) -> usize;

    /// Creates an index from a `usize`.
    ///
    /// `Self::NONE.as_usize()` must map back to `Self::NONE`.
    fn from_usize(val: usize) -> Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts the sentinel encoding into an `Option`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }

    /// Converts an `Option` into the sentinel encoding.
    #[inline]
    fn from_option(opt: Option<Self>) -> Self {
        opt.unwrap_or(Self::NONE)
    }
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(val: usize) -> Self {
                    val as Self
                }
            }
        )*
    };
}

impl_index_for_unsigned!(u8, u16, u32, u64, usize);

/// An [`Index`] stored in one atomic machine word.
///
/// Every access is `SeqCst`. The index is widened to `usize` on store and
/// narrowed back on load. An index type wider than `usize` (`u64` on a
/// 32-bit target) would truncate `NONE`, so constructing one is a compile
/// error.
pub struct AtomicIndex<Idx: Index> {
    raw: AtomicUsize,
    _marker: PhantomData<Idx>,
}

impl<Idx: Index> AtomicIndex<Idx> {
    /// Creates a new atomic index.
    #[inline]
    pub fn new(idx: Idx) -> Self {
        const {
            assert!(
                size_of::<Idx>() <= size_of::<usize>(),
                "index type is wider than an atomic word"
            )
        };
        Self {
            raw: AtomicUsize::new(idx.as_usize()),
            _marker: PhantomData,
        }
    }

    /// Creates an atomic index holding `NONE`.
    #[inline]
    pub fn none() -> Self {
        Self::new(Idx::NONE)
    }

    /// Loads the current index.
    #[inline]
    pub fn load(&self) -> Idx {
        Idx::from_usize(self.raw.load(Ordering::SeqCst))
    }

    /// Stores a new index.
    #[inline]
    pub fn store(&self, idx: Idx) {
        self.raw.store(idx.as_usize(), Ordering::SeqCst);
    }

    /// Replaces the index only if it still equals `current`.
    ///
    /// On failure the index actually held is returned in `Err`.
    #[inline]
    pub fn compare_exchange(&self, current: Idx, new: Idx) -> Result<Idx, Idx> {
        self.raw
            .compare_exchange(
                current.as_usize(),
                new.as_usize(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(Idx::from_usize)
            .map_err(Idx::from_usize)
    }
}

impl<Idx: Index> Default for AtomicIndex<Idx> {
    fn default() -> Self {
        Self::none()
    }
}

impl<Idx: Index> fmt::Debug for AtomicIndex<Idx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load().into_option(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_index_sentinel {
        ($($ty:ty => $name:ident),*) => {
            $(
                #[test]
                fn $name() {
                    assert!(<$ty>::NONE.is_none());
                    assert!((0 as $ty).is_some());
                    assert!((<$ty>::MAX - 1).is_some());
                    assert_eq!(<$ty>::from_usize(<$ty>::NONE.as_usize()), <$ty>::NONE);
                }
            )*
        };
    }

    test_index_sentinel!(
        u8 => u8_sentinel,
        u16 => u16_sentinel,
        u32 => u32_sentinel,
        u64 => u64_sentinel,
        usize => usize_sentinel
    );

    #[test]
    fn option_conversions() {
        assert_eq!(u16::from_option(None), u16::NONE);
        assert_eq!(u16::from_option(Some(7)), 7);
        assert_eq!(7u16.into_option(), Some(7));
    }

    #[test]
    fn atomic_none_round_trips() {
        let cell: AtomicIndex<u32> = AtomicIndex::none();
        assert!(cell.load().is_none());

        cell.store(3);
        assert_eq!(cell.load(), 3);

        cell.store(u32::NONE);
        assert_eq!(cell.load(), u32::NONE);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn atomic_u64_none_round_trips() {
        let cell: AtomicIndex<u64> = AtomicIndex::new(u64::MAX - 1);
        assert_eq!(cell.load(), u64::MAX - 1);

        cell.store(u64::NONE);
        assert!(cell.load().is_none());
        assert_eq!(cell.compare_exchange(u64::NONE, 0), Ok(u64::NONE));
    }

    #[test]
    fn atomic_usize_none_round_trips() {
        let cell: AtomicIndex<usize> = AtomicIndex::none();
        assert!(cell.load().is_none());
        assert_eq!(cell.compare_exchange(usize::NONE, 4), Ok(usize::NONE));
        assert_eq!(cell.load(), 4);
    }

    #[test]
    fn atomic_compare_exchange() {
        let cell: AtomicIndex<u8> = AtomicIndex::new(1);

        assert_eq!(cell.compare_exchange(2, 5), Err(1));
        assert_eq!(cell.load(), 1);

        assert_eq!(cell.compare_exchange(1, u8::NONE), Ok(1));
        assert!(cell.load().is_none());
    }

    #[test]
    fn atomic_debug_shows_option() {
        let cell: AtomicIndex<u32> = AtomicIndex::new(9);
        assert_eq!(format!("{cell:?}"), "Some(9)");
        cell.store(u32::NONE);
        assert_eq!(format!("{cell:?}"), "None");
    }
}
