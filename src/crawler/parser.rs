//! Listing page parser
//!
//! Turns one listing page into its entries. Each card matched by the
//! site's card selector yields either a profile link (profile mode) or a
//! complete record (inline mode).

use crate::crawler::types::{DetailRecord, ProfileLink};
use crate::extract::FieldExtractors;
use crate::url::canonicalize_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled card-level settings for one template site
#[derive(Debug, Clone)]
pub struct ListingParser {
    card: Selector,
    link: Option<Selector>,
    fields: FieldExtractors,
    inline: bool,
}

/// Entries read from one listing page
#[derive(Debug, Default, Clone)]
pub struct ListingEntries {
    /// Profile links, in page order
    pub links: Vec<ProfileLink>,

    /// Records read directly from cards
    pub records: Vec<DetailRecord>,

    /// Number of cards matched, whether or not they produced an entry
    pub cards: usize,
}

impl ListingEntries {
    /// Number of usable entries on the page
    pub fn len(&self) -> usize {
        self.links.len() + self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ListingParser {
    pub fn new(card: Selector, link: Option<Selector>, fields: FieldExtractors, inline: bool) -> Self {
        Self {
            card,
            link,
            fields,
            inline,
        }
    }

    /// Parses one listing page
    ///
    /// # Arguments
    ///
    /// * `html` - The listing page markup
    /// * `base` - URL relative links are resolved against
    /// * `page` - The page number, recorded on every entry
    pub fn parse(&self, html: &str, base: &Url, page: u32) -> ListingEntries {
        let document = Html::parse_document(html);
        let mut entries = ListingEntries::default();

        for card in document.select(&self.card) {
            entries.cards += 1;
            let href = self.card_href(card);
            let url = href.and_then(|href| canonicalize_link(href, base).ok());

            if self.inline {
                let fields = self.fields.extract_card(card);
                let profile_url = url.unwrap_or_default();
                entries
                    .records
                    .push(DetailRecord::from_fields(page, profile_url, fields));
                continue;
            }

            match url {
                Some(url) => {
                    let seed = self.fields.extract_card(card);
                    entries.links.push(ProfileLink::new(page, url).with_seed(seed));
                }
                None => {
                    tracing::trace!(page, "Skipping card without a usable profile link");
                }
            }
        }

        entries
    }

    /// The card's profile href: the link selector's first match, or the card's own href
    fn card_href<'a>(&self, card: ElementRef<'a>) -> Option<&'a str> {
        match &self.link {
            Some(link) => card
                .select(link)
                .find_map(|anchor| anchor.value().attr("href")),
            None => card.value().attr("href"),
        }
    }
}
