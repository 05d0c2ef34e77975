//! Values flowing between crawl stages

use crate::extract::Fields;
use crate::SweepError;

/// One page of a paginated directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPageRef {
    pub site: String,
    /// 1-based page number
    pub page: u32,
    pub url: String,
}

/// A discovered profile URL awaiting detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLink {
    /// Listing page the link was first seen on
    pub source_page: u32,

    /// Absolute, canonicalized URL
    pub url: String,

    /// Fields read from the listing card, used for whatever the profile page lacks
    pub seed: Fields,
}

impl ProfileLink {
    pub fn new(source_page: u32, url: impl Into<String>) -> Self {
        Self {
            source_page,
            url: url.into(),
            seed: Fields::default(),
        }
    }

    pub fn with_seed(mut self, seed: Fields) -> Self {
        self.seed = seed;
        self
    }
}

/// One contact record
///
/// Every field is always present; a field whose fallback chain found
/// nothing is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub source_page: u32,
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
    pub profile_url: String,
}

impl DetailRecord {
    /// Builds a record from extracted fields
    pub fn from_fields(source_page: u32, profile_url: impl Into<String>, fields: Fields) -> Self {
        Self {
            source_page,
            name: fields.name,
            role: fields.role,
            phone: fields.phone,
            email: fields.email,
            profile_url: profile_url.into(),
        }
    }
}

/// Everything a discoverer collected for one site
///
/// A discovery-fatal error does not discard what was collected before it;
/// it is carried in `halt_error` alongside the partial result.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Profile links in discovery order, deduplicated
    pub links: Vec<ProfileLink>,

    /// Records read directly from listing cards
    pub records: Vec<DetailRecord>,

    /// Listing pages read successfully
    pub pages_visited: u32,

    /// Why discovery stopped early, if it did
    pub halt_error: Option<SweepError>,

    /// Whether discovery stopped because the run was cancelled
    pub cancelled: bool,
}

impl Discovery {
    /// Returns true when discovery ran to its natural end
    pub fn is_complete(&self) -> bool {
        self.halt_error.is_none() && !self.cancelled
    }
}
