use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::fetch;
use crate::model::{RawListing, SourceId};

use super::{detail, text_mentions_wbs, Extractor};

static ROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:Zimmer|Zi\.)").unwrap());
static AREA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:[.,]\d{1,3})?)\s*m²").unwrap());
static WARM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:warmmiete|gesamtmiete)\D{0,20}?(\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?|\d+(?:\.\d{1,2})?)\s*(?:€|EUR)").unwrap()
});
static COLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:nettokaltmiete|kaltmiete|grundmiete)\D{0,20}?(\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?|\d+(?:\.\d{1,2})?)\s*(?:€|EUR)").unwrap()
});
static ANY_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?|\d+(?:\.\d{1,2})?)\s*(?:€|EUR)").unwrap()
});
static AVAILABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:frei ab|verfügbar ab|bezugsfertig ab|bezug ab)\s*:?\s*(sofort|\d{1,2}\.\d{1,2}\.\d{2,4})").unwrap()
});

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static ADDRESS_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"address, [class*="address"], [class*="adresse"]"#).unwrap()
});

const CONTAINER_TAGS: &[&str] = &["article", "li", "section", "div"];
const MAX_CLIMB: usize = 6;
const MIN_CONTAINER_TEXT: usize = 40;

/// Generic extractor for the portals that only serve server-rendered HTML.
/// Candidate listings are located structurally: an anchor whose href looks
/// like a detail link, inside the nearest ancestor that reads like a card.
/// Field values are then pattern-matched out of the card's text.
///
/// The per-source markers below were written against saved copies of the
/// portals' result pages; they are heuristics, not contracts, and a redesign
/// on the portal side degrades to an empty result, never to a failed run.
pub struct MarkupExtractor {
    source: SourceId,
    search_url: &'static str,
    base_url: &'static str,
    detail_marker: &'static str,
    fetch_details: bool,
}

impl MarkupExtractor {
    pub fn gewobag() -> Self {
        MarkupExtractor {
            source: SourceId::Gewobag,
            search_url: "https://www.gewobag.de/fuer-mieter-und-mietinteressenten/mietangebote/",
            base_url: "https://www.gewobag.de",
            detail_marker: "/angebot/",
            fetch_details: false,
        }
    }

    pub fn howoge() -> Self {
        MarkupExtractor {
            source: SourceId::Howoge,
            search_url: "https://www.howoge.de/wohnungen-gewerbe/wohnungssuche.html",
            base_url: "https://www.howoge.de",
            detail_marker: "/wohnungssuche/detail",
            fetch_details: false,
        }
    }

    pub fn stadt_und_land() -> Self {
        MarkupExtractor {
            source: SourceId::StadtUndLand,
            search_url: "https://www.stadtundland.de/wohnungen/",
            base_url: "https://www.stadtundland.de",
            detail_marker: "/expose",
            fetch_details: true,
        }
    }

    pub fn wbm() -> Self {
        MarkupExtractor {
            source: SourceId::Wbm,
            search_url: "https://www.wbm.de/wohnungen-berlin/wohnungsangebote/",
            base_url: "https://www.wbm.de",
            detail_marker: "/angebote/",
            fetch_details: false,
        }
    }

    /// Parse one search-results page into raw bags. Unknown markup yields an
    /// empty list.
    pub fn parse_listing_page(&self, html: &str) -> Vec<RawListing> {
        let doc = Html::parse_document(html);
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut listings = Vec::new();

        for anchor in doc.select(&ANCHOR_SEL) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.contains(self.detail_marker) {
                continue;
            }
            let url = self.absolutize(href);
            if !seen_urls.insert(url.clone()) {
                continue;
            }

            let Some(container) = find_container(anchor) else {
                warn!("{}: detail link without a usable container, skipping", self.source);
                continue;
            };
            listings.push(self.extract_from_container(container, url));
        }

        listings
    }

    fn extract_from_container(&self, container: ElementRef<'_>, url: String) -> RawListing {
        let text = container.text().collect::<Vec<_>>().join(" ");

        let cold_rent = capture(&COLD_RE, &text);
        let warm_rent = capture(&WARM_RE, &text).or_else(|| {
            if cold_rent.is_some() {
                // Only a labeled cold rent present: an unlabeled number would
                // be a duplicate of it, not the warm rent.
                None
            } else {
                // Unlabeled price on a card is the advertised (warm) rent.
                capture(&ANY_PRICE_RE, &text)
            }
        });

        let address = container
            .select(&ADDRESS_SEL)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|s| !s.is_empty());

        RawListing {
            address,
            rooms: capture(&ROOMS_RE, &text),
            size: capture(&AREA_RE, &text),
            warm_rent,
            cold_rent,
            requires_wbs: text_mentions_wbs(&text),
            url: Some(url),
            available_from: capture(&AVAILABLE_RE, &text),
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

#[async_trait]
impl Extractor for MarkupExtractor {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn collect(&self, client: &Client) -> Result<Vec<RawListing>> {
        let body = fetch::fetch_document(client, self.search_url).await?;
        let mut listings = self.parse_listing_page(&body);

        if self.fetch_details {
            for listing in &mut listings {
                let Some(url) = listing.url.clone() else {
                    continue;
                };
                match fetch::fetch_document(client, &url).await {
                    Ok(page) => detail::enrich(listing, &page),
                    Err(e) => warn!("{}: detail fetch failed for {}: {}", self.source, url, e),
                }
            }
        }

        Ok(listings)
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

/// Climb from the detail anchor to the nearest ancestor that looks like a
/// listing card: a block element carrying enough text to hold the fields.
fn find_container(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    anchor
        .ancestors()
        .take(MAX_CLIMB)
        .filter_map(ElementRef::wrap)
        .find(|el| {
            CONTAINER_TAGS.contains(&el.value().name())
                && el.text().map(str::len).sum::<usize>() >= MIN_CONTAINER_TEXT
        })
}
