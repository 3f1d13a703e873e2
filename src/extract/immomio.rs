use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::fetch;
use crate::model::{RawListing, SourceId};

use super::Extractor;

/// GESOBAU lists through the Immomio platform, which serves a JSON offers
/// feed: `{ "objects": [ ... ] }`. Same direct-lookup contract as degewo,
/// different key names.
pub struct ImmomioExtractor {
    source: SourceId,
    feed_url: &'static str,
}

impl ImmomioExtractor {
    pub fn gesobau() -> Self {
        ImmomioExtractor {
            source: SourceId::Gesobau,
            feed_url: "https://www.gesobauwohnen.de/wohnungsangebote/feed.json",
        }
    }
}

#[async_trait]
impl Extractor for ImmomioExtractor {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn collect(&self, client: &Client) -> Result<Vec<RawListing>> {
        let body = fetch::fetch_document(client, self.feed_url).await?;
        Ok(parse_offers(&body))
    }
}

pub fn parse_offers(body: &str) -> Vec<RawListing> {
    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("immomio feed is not JSON: {}", e);
            return Vec::new();
        }
    };

    let Some(objects) = root.get("objects").and_then(Value::as_array) else {
        warn!("immomio feed has no 'objects' array");
        return Vec::new();
    };

    objects.iter().filter_map(parse_offer).collect()
}

fn parse_offer(offer: &Value) -> Option<RawListing> {
    if !offer.is_object() {
        warn!("immomio offer is not an object, skipping");
        return None;
    }

    // Address may be nested ({"street": ..., "city": ...}) or a flat string.
    let address = match offer.get("address") {
        Some(Value::Object(addr)) => {
            let street = addr.get("street").and_then(Value::as_str).unwrap_or("");
            let number = addr.get("houseNumber").and_then(Value::as_str).unwrap_or("");
            let city = addr.get("city").and_then(Value::as_str).unwrap_or("");
            let line = format!("{} {}, {}", street, number, city);
            let line = line.trim().trim_matches(',').trim().to_string();
            (!line.is_empty()).then_some(line)
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    // WBS: structured flag when present, keyword fallback over the title.
    let requires_wbs = offer
        .get("wbs")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| {
            offer
                .get("title")
                .and_then(Value::as_str)
                .is_some_and(super::text_mentions_wbs)
        });

    Some(RawListing {
        address,
        rooms: number_text(offer, "rooms"),
        size: number_text(offer, "livingSpace"),
        warm_rent: number_text(offer, "totalRentGross"),
        cold_rent: number_text(offer, "basicRent"),
        requires_wbs,
        url: offer
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
        available_from: offer
            .get("availableFrom")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn number_text(offer: &Value, key: &str) -> Option<String> {
    match offer.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
