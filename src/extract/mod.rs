//! Field extraction module
//!
//! Turns a parsed page (or a single listing card) into contact fields by
//! running per-site fallback chains:
//! - Structural selectors (text content or attribute, optional prefix strip)
//! - Regular-expression patterns over raw markup, as a last resort
//! - Phone normalization for pattern-derived numbers

mod engine;
mod phone;
mod rules;

pub use engine::{extract, extract_in, first_non_empty, Fields};
pub use phone::normalize_phone;
pub use rules::{parse_selector, ExtractionRule, FieldExtractors, Strategy};
