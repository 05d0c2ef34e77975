use serde::Deserialize;

/// Main configuration structure for Roster-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site by its configured name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }
}

/// HTTP identity and timeouts shared by every site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional Accept-Language header
    #[serde(default)]
    pub accept_language: Option<String>,

    /// Timeout for a single listing page request (seconds)
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Timeout for a single profile page request (seconds)
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: None,
            listing_timeout_secs: default_listing_timeout(),
            detail_timeout_secs: default_detail_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Output sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory that receives one CSV file per site run
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Whether to prefix files with a UTF-8 byte order mark
    #[serde(default = "default_true")]
    pub bom: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            bom: true,
        }
    }
}

/// One target site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Short, file-name safe identifier (e.g. "remax")
    pub name: String,

    /// Base URL that relative links are resolved against
    pub base_url: String,

    /// Fetch pool width
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Randomized pause between listing pages, `[min, max]` milliseconds
    #[serde(default = "default_politeness_delay")]
    pub politeness_delay_ms: [u64; 2],

    /// How listing pages are walked
    pub discovery: DiscoveryConfig,

    /// Rules evaluated against each listing card
    #[serde(default)]
    pub card_fields: FieldRules,

    /// Rules evaluated against each profile page
    #[serde(default)]
    pub detail_fields: FieldRules,
}

/// Listing discovery strategy for a site
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum DiscoveryConfig {
    /// Static pages addressed by a page-number template
    Template(TemplateDiscovery),
    /// Pages reached by clicking "next" in an automated browser
    Interactive(InteractiveDiscovery),
}

/// Template-pagination settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateDiscovery {
    /// Listing URL containing a `{page}` placeholder
    pub url_template: String,

    /// URL used for page 1 when it differs from the template
    #[serde(default)]
    pub first_page_url: Option<String>,

    #[serde(default = "default_start_page")]
    pub start_page: u32,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Selector matching one listing entry
    pub card_selector: String,

    /// Selector (relative to the card) of the profile anchor; the card itself when absent
    #[serde(default)]
    pub link_selector: Option<String>,

    #[serde(default)]
    pub mode: ListingMode,
}

/// What a listing card yields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingMode {
    /// The card links to a profile page that must be fetched
    #[default]
    Profile,
    /// The card already carries every field
    Inline,
}

/// Interactive-pagination settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InteractiveDiscovery {
    pub entry_url: String,

    /// Element whose presence means the listing has rendered
    pub listing_marker: String,

    /// Ordered anchor selectors; the first one yielding links wins
    pub link_selectors: Vec<String>,

    /// Selector of the "next page" control
    pub next_selector: String,

    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    #[serde(default = "default_advance_timeout")]
    pub advance_timeout_secs: u64,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chromium executable; auto-detected when absent
    #[serde(default)]
    pub browser_path: Option<String>,
}

impl InteractiveDiscovery {
    /// Every selector the browser evaluates, marker first
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.listing_marker.as_str())
            .chain(self.link_selectors.iter().map(String::as_str))
            .chain(std::iter::once(self.next_selector.as_str()))
    }
}

/// Rule chains for each output field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub name: Vec<RuleSpec>,
    #[serde(default)]
    pub role: Vec<RuleSpec>,
    #[serde(default)]
    pub phone: Vec<RuleSpec>,
    #[serde(default)]
    pub email: Vec<RuleSpec>,
}

impl FieldRules {
    /// Returns true when no field has any rule
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.role.is_empty() && self.phone.is_empty() && self.email.is_empty()
    }
}

/// One extraction strategy as written in the config file
///
/// Unknown keys are rejected so a misspelled option never falls back to a
/// different strategy silently.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum RuleSpec {
    /// Structural selector against the document or card
    Selector {
        selector: String,
        /// Attribute to read instead of the text content
        #[serde(default)]
        attr: Option<String>,
        /// Required (case-insensitive) value prefix, stripped from the result
        #[serde(default)]
        prefix: Option<String>,
        /// Substring the value must contain
        #[serde(default)]
        contains: Option<String>,
        /// Collapse internal whitespace runs to one space instead of only trimming
        #[serde(default)]
        collapse: bool,
    },
    /// Regular expression against the raw markup
    Pattern {
        pattern: String,
        #[serde(default)]
        group: Option<usize>,
        /// Normalize the match as a phone number
        #[serde(default)]
        phone: bool,
    },
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_listing_timeout() -> u64 {
    30
}

fn default_detail_timeout() -> u64 {
    25
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_output_directory() -> String {
    "./outputs".to_string()
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    20
}

fn default_politeness_delay() -> [u64; 2] {
    [500, 1500]
}

fn default_start_page() -> u32 {
    1
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_wait_timeout() -> u64 {
    12
}

fn default_advance_timeout() -> u64 {
    8
}
