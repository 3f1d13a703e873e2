use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::model::RawListing;

use super::text_mentions_wbs;

static DT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl dt").unwrap());
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Detail-page enrichment: the expose pages carry a structured key/value
/// table (dt/dd or th/td) with the fields the result cards abbreviate. Fills
/// only fields the list extraction left absent — same output shape, richer
/// content.
pub fn enrich(listing: &mut RawListing, html: &str) {
    let doc = Html::parse_document(html);
    let pairs = key_value_pairs(&doc);

    for (key, value) in &pairs {
        let key = key.to_lowercase();
        let slot = if key.contains("zimmer") {
            &mut listing.rooms
        } else if key.contains("wohnfläche") || key.contains("größe") {
            &mut listing.size
        } else if key.contains("warmmiete") || key.contains("gesamtmiete") {
            &mut listing.warm_rent
        } else if key.contains("kaltmiete") || key.contains("grundmiete") {
            &mut listing.cold_rent
        } else if key.contains("frei ab") || key.contains("verfügbar") || key.contains("bezugsfertig") {
            &mut listing.available_from
        } else if key.contains("adresse") {
            &mut listing.address
        } else {
            continue;
        };
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.clone());
        }
    }

    if !listing.requires_wbs {
        let full_text = doc
            .select(&BODY_SEL)
            .next()
            .map(|b| b.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        listing.requires_wbs = text_mentions_wbs(&full_text);
    }
}

fn key_value_pairs(doc: &Html) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    // <dt>Label</dt><dd>Value</dd>
    for dt in doc.select(&DT_SEL) {
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "dd");
        if let Some(dd) = dd {
            pairs.push((clean_text(dt), clean_text(dd)));
        }
    }

    // <tr><th>Label</th><td>Value</td></tr>
    for tr in doc.select(&TR_SEL) {
        let th = tr.select(&TH_SEL).next();
        let td = tr.select(&TD_SEL).next();
        if let (Some(th), Some(td)) = (th, td) {
            pairs.push((clean_text(th), clean_text(td)));
        }
    }

    pairs
}

fn clean_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/stadtundland_detail.html").unwrap()
    }

    #[test]
    fn fills_absent_fields_from_detail_table() {
        let mut listing = RawListing {
            url: Some("https://www.stadtundland.de/expose/SUL.123".into()),
            rooms: Some("2".into()),
            ..Default::default()
        };
        enrich(&mut listing, &fixture());

        // Already-present field stays as the list page had it.
        assert_eq!(listing.rooms.as_deref(), Some("2"));
        // Absent fields get filled from the dt/dd and th/td tables.
        assert_eq!(listing.size.as_deref(), Some("61,3 m²"));
        assert_eq!(listing.warm_rent.as_deref(), Some("742,18 €"));
        assert_eq!(listing.cold_rent.as_deref(), Some("540,00 €"));
        assert_eq!(listing.available_from.as_deref(), Some("01.12.2026"));
        assert_eq!(
            listing.address.as_deref(),
            Some("Hanne-Nüte-Weg 7, 12359 Berlin")
        );
    }

    #[test]
    fn wbs_detected_from_page_text() {
        let mut listing = RawListing::default();
        enrich(&mut listing, &fixture());
        assert!(listing.requires_wbs);
    }

    #[test]
    fn page_without_tables_changes_nothing() {
        let mut listing = RawListing {
            rooms: Some("3".into()),
            ..Default::default()
        };
        enrich(&mut listing, "<html><body><p>Seite nicht gefunden</p></body></html>");
        assert_eq!(listing.rooms.as_deref(), Some("3"));
        assert!(listing.size.is_none());
        assert!(!listing.requires_wbs);
    }
}
