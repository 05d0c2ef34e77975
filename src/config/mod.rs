//! Configuration module for Roster-Sweep
//!
//! This module handles loading, parsing, and validating the TOML file that
//! declares every target site: its pagination strategy, its selectors and
//! its fallback patterns. Selectors and patterns are compiled during
//! validation, so a malformed rule fails before any network activity.
//!
//! # Example
//!
//! ```no_run
//! use roster_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sites.toml")).unwrap();
//! for site in &config.sites {
//!     println!("{} -> {}", site.name, site.base_url);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscoveryConfig, FieldRules, HttpConfig, InteractiveDiscovery, ListingMode,
    OutputConfig, RuleSpec, SiteConfig, TemplateDiscovery,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate_site, MAX_WORKERS};
