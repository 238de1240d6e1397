//! Bounded structural checks.
//!
//! Every list can verify its own shape. The walk is capped at a fixed
//! number of steps so a chain that loops back on itself reports
//! [`Incoherence::LimitExceeded`] (or a more specific fault) instead of
//! spinning forever. The cap guards against hangs; it is not a limit on
//! how long a list may legitimately grow.

use std::fmt;

use crate::trace::warn;

/// Default traversal cap used by every `is_coherent` method.
///
/// Lists longer than this are reported as incoherent. Use the
/// `check_coherence` methods to pick a different cap.
pub const MAX_COHERENT: usize = 1_000_000_000;

/// The structural invariant a coherency check found broken.
///
/// `position` counts links from the point the walk started (head for the
/// forward disciplines, tail for [`AuList`](crate::AuList)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoherence {
    /// Head is empty but tail is not, or the other way round.
    HeadTailMismatch,
    /// A link refers to an index that is not occupied in storage.
    InvalidIndex {
        /// Position of the dangling reference.
        position: usize,
    },
    /// A link's `prev` does not point at the link the walk came from.
    BrokenBackLink {
        /// Position of the offending link.
        position: usize,
    },
    /// The walk reached the recorded tail but the chain continues.
    ChainPastTail {
        /// Position of the tail link.
        position: usize,
    },
    /// The chain ended somewhere other than the recorded tail.
    TailMismatch {
        /// Position of the link that actually ended the chain.
        position: usize,
    },
    /// The walk did not terminate within the traversal cap.
    LimitExceeded {
        /// The cap that was hit.
        limit: usize,
    },
}

impl fmt::Display for Incoherence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadTailMismatch => write!(f, "head and tail disagree on emptiness"),
            Self::InvalidIndex { position } => {
                write!(f, "dangling index at position {position}")
            }
            Self::BrokenBackLink { position } => {
                write!(f, "prev link broken at position {position}")
            }
            Self::ChainPastTail { position } => {
                write!(f, "chain continues past tail at position {position}")
            }
            Self::TailMismatch { position } => {
                write!(f, "chain ends at position {position}, not at tail")
            }
            Self::LimitExceeded { limit } => {
                write!(f, "no end of chain within {limit} links")
            }
        }
    }
}

impl std::error::Error for Incoherence {}

/// Logs a failed check and passes the result through.
#[inline]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) fn report(list: &'static str, result: Result<(), Incoherence>) -> Result<(), Incoherence> {
    if let Err(fault) = &result {
        warn!(list, %fault, "coherency check failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_fault() {
        assert_eq!(
            Incoherence::BrokenBackLink { position: 3 }.to_string(),
            "prev link broken at position 3"
        );
        assert_eq!(
            Incoherence::LimitExceeded { limit: 10 }.to_string(),
            "no end of chain within 10 links"
        );
    }

    #[test]
    fn report_passes_result_through() {
        assert_eq!(report("test", Ok(())), Ok(()));
        assert_eq!(
            report("test", Err(Incoherence::HeadTailMismatch)),
            Err(Incoherence::HeadTailMismatch)
        );
    }
}
