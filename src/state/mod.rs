//! State module for tracking discovery progress
//!
//! # Components
//!
//! - `PaginationState`: the states of the browser-driven pagination walk
//!   and the transitions allowed between them

mod pagination_state;

// Re-export main types
pub use pagination_state::PaginationState;
