use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::fetch;
use crate::model::{RawListing, SourceId};

use super::Extractor;

const SEARCH_URL: &str = "https://immosuche.degewo.de/de/search/data";
const DETAILS_BASE: &str = "https://immosuche.degewo.de/de/search/details";

/// degewo exposes its search as a JSON endpoint: `{ "immos": [ ... ] }` with
/// one object per unit. Extraction is direct field lookup, tolerant per item.
pub struct DegewoExtractor;

impl DegewoExtractor {
    pub fn new() -> Self {
        DegewoExtractor
    }
}

#[async_trait]
impl Extractor for DegewoExtractor {
    fn source(&self) -> SourceId {
        SourceId::Degewo
    }

    async fn collect(&self, client: &Client) -> Result<Vec<RawListing>> {
        let body = fetch::fetch_document(client, SEARCH_URL).await?;
        Ok(parse_search_payload(&body))
    }
}

/// Parse the search payload. A malformed item is skipped with a warning and
/// never aborts its siblings; a payload without the expected structure yields
/// an empty list.
pub fn parse_search_payload(body: &str) -> Vec<RawListing> {
    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("degewo payload is not JSON: {}", e);
            return Vec::new();
        }
    };

    let Some(items) = root.get("immos").and_then(Value::as_array) else {
        warn!("degewo payload has no 'immos' array");
        return Vec::new();
    };

    items.iter().filter_map(parse_item).collect()
}

fn parse_item(item: &Value) -> Option<RawListing> {
    if !item.is_object() {
        warn!("degewo item is not an object, skipping");
        return None;
    }

    let street = text(item, "street");
    let house_number = text(item, "houseNumber");
    let district = text(item, "district");
    let address = match (street, house_number, district) {
        (Some(s), Some(n), Some(d)) => Some(format!("{} {}, {}", s, n, d)),
        (Some(s), None, Some(d)) => Some(format!("{}, {}", s, d)),
        (Some(s), _, None) => Some(s),
        _ => None,
    };

    let url = item
        .get("id")
        .and_then(id_as_string)
        .map(|id| format!("{}/{}", DETAILS_BASE, id));

    Some(RawListing {
        address,
        rooms: number_text(item, "rooms"),
        size: number_text(item, "area"),
        warm_rent: number_text(item, "rentTotal"),
        cold_rent: number_text(item, "rentBase"),
        requires_wbs: item
            .get("wbsRequired")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        url,
        available_from: text(item, "availableFrom"),
    })
}

fn text(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric fields arrive as JSON numbers or as preformatted strings
/// ("650,00"), depending on the portal's mood. Pass both through as text and
/// let the normalizer coerce.
fn number_text(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn id_as_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/degewo_search.json").unwrap()
    }

    #[test]
    fn parses_all_items() {
        let listings = parse_search_payload(&fixture());
        assert_eq!(listings.len(), 3);
    }

    #[test]
    fn first_item_fields() {
        let listings = parse_search_payload(&fixture());
        let first = &listings[0];
        assert_eq!(first.address.as_deref(), Some("Mehrower Allee 52, Marzahn"));
        assert_eq!(first.rooms.as_deref(), Some("2"));
        assert_eq!(first.size.as_deref(), Some("54.5"));
        assert_eq!(first.warm_rent.as_deref(), Some("689.0"));
        assert!(!first.requires_wbs);
        assert_eq!(
            first.url.as_deref(),
            Some("https://immosuche.degewo.de/de/search/details/4100-1234")
        );
        assert_eq!(first.available_from.as_deref(), Some("01.11.2026"));
    }

    #[test]
    fn wbs_flag_comes_from_structured_field() {
        let listings = parse_search_payload(&fixture());
        assert!(listings[1].requires_wbs);
    }

    #[test]
    fn malformed_sibling_is_skipped() {
        // A bare string wedged between two real items must not abort them.
        let body = r#"{"immos": [{"rooms": 2}, "garbage", {"rooms": 3}]}"#;
        let listings = parse_search_payload(body);
        assert_eq!(listings.len(), 2);
    }

    #[test]
    fn wrong_shape_is_empty_not_error() {
        assert!(parse_search_payload("not json at all").is_empty());
        assert!(parse_search_payload("{\"other\": []}").is_empty());
        assert!(parse_search_payload("{\"immos\": {}}").is_empty());
    }

    #[test]
    fn string_formatted_numbers_pass_through() {
        let body = r#"{"immos": [{"street": "A", "rooms": "2,5", "rentTotal": "1.234,56"}]}"#;
        let listings = parse_search_payload(body);
        assert_eq!(listings[0].rooms.as_deref(), Some("2,5"));
        assert_eq!(listings[0].warm_rent.as_deref(), Some("1.234,56"));
    }
}
