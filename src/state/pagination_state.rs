/// Pagination state definitions for the interactive discovery strategy
///
/// The browser-driven walk over a listing is modeled as a small state
/// machine: `WaitListingLoaded → ExtractLinks → {Advance | Done}`, with
/// `Advance` looping back to `ExtractLinks` once the old page has gone stale.
use std::fmt;

/// Represents the current state of an interactive pagination walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationState {
    /// Waiting for the listing marker to appear in the rendered DOM
    WaitListingLoaded,

    /// Reading profile anchors from the current page
    ExtractLinks,

    /// Clicking "next" and waiting for the current page to go stale
    Advance,

    /// Discovery finished; no further transitions
    Done,
}

impl PaginationState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any state may jump to `Done` (timeouts, page cap, cancellation).
    pub fn can_transition_to(&self, next: PaginationState) -> bool {
        matches!(
            (*self, next),
            (Self::WaitListingLoaded, Self::ExtractLinks)
                | (Self::ExtractLinks, Self::Advance)
                | (Self::Advance, Self::ExtractLinks)
                | (Self::WaitListingLoaded | Self::ExtractLinks | Self::Advance, Self::Done)
        )
    }

    /// Short label used in log records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitListingLoaded => "wait_listing_loaded",
            Self::ExtractLinks => "extract_links",
            Self::Advance => "advance",
            Self::Done => "done",
        }
    }

    /// Returns all pagination states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::WaitListingLoaded,
            Self::ExtractLinks,
            Self::Advance,
            Self::Done,
        ]
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
