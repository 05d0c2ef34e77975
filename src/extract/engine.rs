//! Fallback-chain evaluation
//!
//! A chain is tried strictly in declared order and stops at the first
//! strategy producing a non-empty, trimmed string. An exhausted chain yields
//! an empty string, never an error.

use crate::extract::phone::normalize_phone;
use crate::extract::rules::{ExtractionRule, FieldExtractors, Strategy};
use scraper::{ElementRef, Html, Selector};

/// Contact fields shared by listing cards and profile pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
}

impl Fields {
    /// Fills every empty field from `seed`, keeping non-empty values
    pub fn or_from(mut self, seed: &Fields) -> Self {
        fill(&mut self.name, &seed.name);
        fill(&mut self.role, &seed.role);
        fill(&mut self.phone, &seed.phone);
        fill(&mut self.email, &seed.email);
        self
    }
}

fn fill(target: &mut String, seed: &str) {
    if target.is_empty() && !seed.is_empty() {
        *target = seed.to_string();
    }
}

/// What a structural strategy is evaluated against
#[derive(Clone, Copy)]
enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> Scope<'a> {
    fn select<'s>(self, selector: &'s Selector) -> Box<dyn Iterator<Item = ElementRef<'a>> + 's>
    where
        'a: 's,
    {
        match self {
            Scope::Document(document) => Box::new(document.select(selector)),
            Scope::Element(element) => Box::new(element.select(selector)),
        }
    }
}

/// Runs `rule` against a whole parsed page
///
/// `raw` is the unparsed markup that pattern strategies search.
pub fn extract(document: &Html, raw: &str, rule: &ExtractionRule) -> String {
    run_chain(Scope::Document(document), raw, rule)
}

/// Runs `rule` against one already-located element (e.g. a listing card)
///
/// Pattern strategies search the element's own outer markup.
pub fn extract_in(element: ElementRef<'_>, rule: &ExtractionRule) -> String {
    let raw = element.html();
    run_chain(Scope::Element(element), &raw, rule)
}

fn run_chain(scope: Scope<'_>, raw: &str, rule: &ExtractionRule) -> String {
    first_non_empty(rule.strategies(), |strategy| {
        evaluate(scope, raw, strategy)
    })
}

/// Evaluates candidates in order and returns the first non-empty result
///
/// Later candidates are never evaluated once one succeeds.
pub fn first_non_empty<T, F>(candidates: impl IntoIterator<Item = T>, mut eval: F) -> String
where
    F: FnMut(T) -> Option<String>,
{
    candidates
        .into_iter()
        .find_map(|candidate| eval(candidate).filter(|value| !value.is_empty()))
        .unwrap_or_default()
}

fn evaluate(scope: Scope<'_>, raw: &str, strategy: &Strategy) -> Option<String> {
    match strategy {
        Strategy::Structural {
            selector,
            attr,
            prefix,
            contains,
            collapse,
        } => scope.select(selector).find_map(|element| {
            structural_value(
                element,
                attr.as_deref(),
                prefix.as_deref(),
                contains.as_deref(),
                *collapse,
            )
        }),
        Strategy::Pattern {
            regex,
            group,
            phone,
        } => {
            let haystack = raw.replace("&nbsp;", " ");
            let captures = regex.captures(&haystack)?;
            let value = captures.get(*group)?.as_str().trim();
            let value = if *phone {
                normalize_phone(value)
            } else {
                value.to_string()
            };
            Some(value).filter(|v| !v.is_empty())
        }
    }
}

fn structural_value(
    element: ElementRef<'_>,
    attr: Option<&str>,
    prefix: Option<&str>,
    contains: Option<&str>,
    collapse: bool,
) -> Option<String> {
    let value = match attr {
        Some(name) => element.value().attr(name)?.to_string(),
        None => element.text().collect::<String>(),
    };
    let value = if collapse {
        collapse_whitespace(&value)
    } else {
        value.trim().to_string()
    };

    let value = match prefix {
        Some(prefix) => strip_prefix_ignore_case(&value, prefix)?.trim().to_string(),
        None => value,
    };

    if value.is_empty() {
        return None;
    }
    if let Some(needle) = contains {
        if !value.contains(needle) {
            return None;
        }
    }
    Some(value)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

impl FieldExtractors {
    /// Extracts every field from a parsed profile page
    pub fn extract_page(&self, document: &Html, raw: &str) -> Fields {
        Fields {
            name: extract(document, raw, &self.name),
            role: extract(document, raw, &self.role),
            phone: extract(document, raw, &self.phone),
            email: extract(document, raw, &self.email),
        }
    }

    /// Extracts every field from a single listing card
    pub fn extract_card(&self, card: ElementRef<'_>) -> Fields {
        Fields {
            name: extract_in(card, &self.name),
            role: extract_in(card, &self.role),
            phone: extract_in(card, &self.phone),
            email: extract_in(card, &self.email),
        }
    }
}
