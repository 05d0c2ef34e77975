use crate::config::types::{
    Config, DiscoveryConfig, HttpConfig, InteractiveDiscovery, ListingMode, OutputConfig,
    SiteConfig, TemplateDiscovery,
};
use crate::extract::{parse_selector, FieldExtractors};
use crate::url::page_url;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on a site's fetch pool width
pub const MAX_WORKERS: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;

    if config.sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for site in &config.sites {
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }
        validate_site(site)?;
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (key, value) in [
        ("listing-timeout-secs", config.listing_timeout_secs),
        ("detail-timeout-secs", config.detail_timeout_secs),
        ("connect-timeout-secs", config.connect_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be >= 1", key)));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates one site, including compiling its selectors and patterns
pub fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    validate_site_name(&site.name)?;
    parse_http_url(&site.base_url, "base-url")?;

    if site.workers < 1 || site.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "site '{}': workers must be between 1 and {}, got {}",
            site.name, MAX_WORKERS, site.workers
        )));
    }

    let [min_delay, max_delay] = site.politeness_delay_ms;
    if min_delay > max_delay {
        return Err(ConfigError::Validation(format!(
            "site '{}': politeness-delay-ms minimum {} exceeds maximum {}",
            site.name, min_delay, max_delay
        )));
    }

    let card = FieldExtractors::compile(&site.card_fields)?;
    let detail = FieldExtractors::compile(&site.detail_fields)?;

    match &site.discovery {
        DiscoveryConfig::Template(template) => {
            validate_template(site, template)?;
            match template.mode {
                ListingMode::Profile if detail.is_empty() => {
                    return Err(ConfigError::Validation(format!(
                        "site '{}': profile mode requires detail-fields",
                        site.name
                    )));
                }
                ListingMode::Inline if card.is_empty() => {
                    return Err(ConfigError::Validation(format!(
                        "site '{}': inline mode requires card-fields",
                        site.name
                    )));
                }
                _ => {}
            }
        }
        DiscoveryConfig::Interactive(interactive) => {
            validate_interactive(site, interactive)?;
            if !card.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "site '{}': card-fields are not supported with interactive discovery",
                    site.name
                )));
            }
            if detail.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "site '{}': interactive discovery requires detail-fields",
                    site.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_template(site: &SiteConfig, template: &TemplateDiscovery) -> Result<(), ConfigError> {
    if !template.url_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "site '{}': url-template must contain a {{page}} placeholder",
            site.name
        )));
    }
    parse_http_url(&page_url(&template.url_template, template.start_page), "url-template")?;

    if let Some(first) = &template.first_page_url {
        parse_http_url(first, "first-page-url")?;
    }

    if template.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "site '{}': start-page must be >= 1",
            site.name
        )));
    }

    if template.max_pages < template.start_page {
        return Err(ConfigError::Validation(format!(
            "site '{}': max-pages {} is below start-page {}",
            site.name, template.max_pages, template.start_page
        )));
    }

    parse_selector(&template.card_selector)?;
    if let Some(link) = &template.link_selector {
        parse_selector(link)?;
    }

    Ok(())
}

fn validate_interactive(
    site: &SiteConfig,
    interactive: &InteractiveDiscovery,
) -> Result<(), ConfigError> {
    parse_http_url(&interactive.entry_url, "entry-url")?;

    // Browser-side selectors may use syntax scraper does not parse (`:has`),
    // so they get a structural check here and a full parse once the browser
    // is up, before the entry page is loaded.
    let required = [
        ("listing-marker", interactive.listing_marker.as_str()),
        ("next-selector", interactive.next_selector.as_str()),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}': {} cannot be empty",
                site.name, key
            )));
        }
    }

    if interactive.link_selectors.is_empty()
        || interactive.link_selectors.iter().any(|s| s.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "site '{}': link-selectors must list at least one non-empty selector",
            site.name
        )));
    }

    for selector in interactive.selectors() {
        check_selector_balance(selector)?;
    }

    if interactive.wait_timeout_secs == 0 || interactive.advance_timeout_secs == 0 {
        return Err(ConfigError::Validation(format!(
            "site '{}': wait and advance timeouts must be >= 1 second",
            site.name
        )));
    }

    if interactive.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "site '{}': max-pages must be >= 1",
            site.name
        )));
    }

    Ok(())
}

/// Rejects selectors with unbalanced brackets, parentheses or quotes
fn check_selector_balance(selector: &str) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: message.to_string(),
    };

    let mut open: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = selector.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' => open.push(c),
            ']' | ')' => {
                let expected = if c == ']' { '[' } else { '(' };
                if open.pop() != Some(expected) {
                    return Err(invalid(&format!("unexpected '{}'", c)));
                }
            }
            _ => {}
        }
    }

    if let Some(q) = quote {
        return Err(invalid(&format!("unterminated {} quote", q)));
    }
    if let Some(c) = open.pop() {
        return Err(invalid(&format!("unclosed '{}'", c)));
    }
    Ok(())
}

/// Site names end up in output file names
fn validate_site_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "site name must contain only ASCII letters, digits, '-' and '_', got '{}'",
            name
        )));
    }

    Ok(())
}

fn parse_http_url(value: &str, key: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            key, value
        )));
    }

    Ok(url)
}
