use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, warn};

use crate::model::ListingRecord;

/// Narrow notification capability: the core only needs "deliver this text,
/// tell me if it worked". A failed send is logged by the caller and never
/// aborts the run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> bool;
}

/// Telegram bot sink (sendMessage API, HTML parse mode).
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        TelegramNotifier {
            token,
            chat_id,
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> bool {
        if !self.is_configured() {
            warn!("Telegram credentials not configured, dropping notification");
            return false;
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", message),
            ("parse_mode", "HTML"),
        ];

        match self.client.post(&url).form(&params).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("Telegram sendMessage returned {}", resp.status());
                false
            }
            Err(e) => {
                error!("Telegram sendMessage failed: {}", e);
                false
            }
        }
    }
}

/// Fixed message template for a qualifying listing.
pub fn format_message(record: &ListingRecord, reason: &str) -> String {
    let wbs = if record.requires_wbs {
        "WBS erforderlich"
    } else {
        "kein WBS"
    };
    format!(
        "🏠 <b>Neues Angebot – {source}</b>\n\n\
         📍 <b>Adresse:</b> {address}\n\
         🚪 <b>Zimmer:</b> {rooms}\n\
         📏 <b>Größe:</b> {size} m²\n\
         💰 <b>Warmmiete:</b> {warm} €\n\
         💵 <b>Kaltmiete:</b> {cold} €\n\
         📋 <b>WBS:</b> {wbs}\n\
         📅 <b>Verfügbar:</b> {available}\n\n\
         ✨ {reason}\n\n\
         🔗 {url}",
        source = record.source,
        address = record.address,
        rooms = fmt_opt(record.rooms),
        size = fmt_opt(record.size_sqm),
        warm = fmt_opt(record.warm_rent),
        cold = fmt_opt(record.cold_rent),
        wbs = wbs,
        available = record.available_from,
        reason = reason,
        url = record.url,
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(n) => format!("{}", n),
        None => "N/A".to_string(),
    }
}
