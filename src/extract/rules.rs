//! Compiled extraction rules
//!
//! Rule specs from the config file are compiled once, at load time, into
//! [`ExtractionRule`]s. A malformed selector or pattern is a configuration
//! error and never reaches the crawl.

use crate::config::{FieldRules, RuleSpec};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use scraper::Selector;

/// One strategy of a fallback chain
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Structural selector evaluated against a document or element
    Structural {
        selector: Selector,
        /// Attribute to read; text content when `None`
        attr: Option<String>,
        /// Required value prefix (e.g. `mailto:`), stripped on success
        prefix: Option<String>,
        /// Substring the value must contain
        contains: Option<String>,
        /// Collapse internal whitespace instead of only trimming
        collapse: bool,
    },
    /// Regular expression evaluated against raw markup
    Pattern {
        regex: Regex,
        group: usize,
        phone: bool,
    },
}

impl Strategy {
    /// Compiles a single rule spec
    pub fn compile(spec: &RuleSpec) -> ConfigResult<Self> {
        match spec {
            RuleSpec::Selector {
                selector,
                attr,
                prefix,
                contains,
                collapse,
            } => Ok(Self::Structural {
                selector: parse_selector(selector)?,
                attr: attr.clone(),
                prefix: prefix.clone(),
                contains: contains.clone(),
                collapse: *collapse,
            }),
            RuleSpec::Pattern {
                pattern,
                group,
                phone,
            } => {
                let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                let group = group.unwrap_or(0);
                if group >= regex.captures_len() {
                    return Err(ConfigError::Validation(format!(
                        "pattern '{}' has no capture group {}",
                        pattern, group
                    )));
                }
                Ok(Self::Pattern {
                    regex,
                    group,
                    phone: *phone,
                })
            }
        }
    }
}

/// An ordered fallback chain for one field
#[derive(Debug, Clone, Default)]
pub struct ExtractionRule {
    strategies: Vec<Strategy>,
}

impl ExtractionRule {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Compiles every spec of a chain, keeping declared order
    pub fn compile(specs: &[RuleSpec]) -> ConfigResult<Self> {
        let strategies = specs
            .iter()
            .map(Strategy::compile)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Compiled chains for every output field
#[derive(Debug, Clone, Default)]
pub struct FieldExtractors {
    pub name: ExtractionRule,
    pub role: ExtractionRule,
    pub phone: ExtractionRule,
    pub email: ExtractionRule,
}

impl FieldExtractors {
    pub fn compile(rules: &FieldRules) -> ConfigResult<Self> {
        Ok(Self {
            name: ExtractionRule::compile(&rules.name)?,
            role: ExtractionRule::compile(&rules.role)?,
            phone: ExtractionRule::compile(&rules.phone)?,
            email: ExtractionRule::compile(&rules.email)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.role.is_empty() && self.phone.is_empty() && self.email.is_empty()
    }
}

/// Parses a CSS selector, mapping the parser's error into a config error
pub fn parse_selector(selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
