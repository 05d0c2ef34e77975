/// Placeholder replaced by the page number in listing URL templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Expands a listing URL template for one page number
///
/// ```
/// use roster_sweep::url::page_url;
///
/// assert_eq!(
///     page_url("https://example.com/agents?page={page}", 3),
///     "https://example.com/agents?page=3"
/// );
/// ```
pub fn page_url(template: &str, page: u32) -> String {
    template.replace(PAGE_PLACEHOLDER, &page.to_string())
}

/// Resolves the URL of a listing page, honoring a first-page override
///
/// Some directories serve page 1 at a different address than the rest
/// (`/ekibimiz` versus `/ekibimiz/2`).
pub fn listing_page_url(template: &str, first_page_url: Option<&str>, page: u32) -> String {
    match first_page_url {
        Some(first) if page == 1 => first.to_string(),
        _ => page_url(template, page),
    }
}
