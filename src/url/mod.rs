//! URL handling module for Roster-Sweep
//!
//! This module provides link canonicalization against a site's base URL
//! and listing page URL templates.

mod normalize;
mod template;

// Re-export main functions
pub use normalize::canonicalize_link;
pub use template::{listing_page_url, page_url, PAGE_PLACEHOLDER};
