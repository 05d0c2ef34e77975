use crate::UrlError;
use url::Url;

/// Schemes that never lead to a profile page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Canonicalizes a discovered link against a site's base URL
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace; reject empty and fragment-only hrefs
/// 2. Reject `javascript:`, `mailto:`, `tel:` and `data:` links
/// 3. Resolve relative hrefs against the base URL
/// 4. Accept only HTTP and HTTPS results
/// 5. Remove the fragment (everything after #)
///
/// Host case is normalized by the URL parser; path, query and trailing
/// slashes are kept as written, since profile URLs on directory sites are
/// frequently case-sensitive.
///
/// # Arguments
///
/// * `href` - The raw href as found in the listing markup
/// * `base` - The site's base URL
///
/// # Returns
///
/// * `Ok(String)` - Absolute, canonical URL string
/// * `Err(UrlError)` - The link cannot point at a profile page
///
/// # Examples
///
/// ```
/// use roster_sweep::url::canonicalize_link;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com.tr").unwrap();
/// let url = canonicalize_link("/danismanlar/ayse-yilmaz#top", &base).unwrap();
/// assert_eq!(url, "https://www.example.com.tr/danismanlar/ayse-yilmaz");
/// ```
pub fn canonicalize_link(href: &str, base: &Url) -> Result<String, UrlError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Unusable(format!("'{}' has no target", href)));
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return Err(UrlError::InvalidScheme(href.to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    url.set_fragment(None);

    Ok(url.to_string())
}
