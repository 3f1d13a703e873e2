use std::fmt;

use sha2::{Digest, Sha256};

/// The fixed set of portals we poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Degewo,
    Gesobau,
    Gewobag,
    Howoge,
    StadtUndLand,
    Wbm,
}

impl SourceId {
    /// Display name as the company brands itself.
    pub fn name(&self) -> &'static str {
        match self {
            SourceId::Degewo => "degewo",
            SourceId::Gesobau => "GESOBAU",
            SourceId::Gewobag => "Gewobag",
            SourceId::Howoge => "HOWOGE",
            SourceId::StadtUndLand => "STADT UND LAND",
            SourceId::Wbm => "WBM",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Best-effort field bag as it comes out of an extractor. All values are
/// unparsed text; the normalizer owns locale/number coercion.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub address: Option<String>,
    pub rooms: Option<String>,
    pub size: Option<String>,
    pub warm_rent: Option<String>,
    pub cold_rent: Option<String>,
    pub requires_wbs: bool,
    pub url: Option<String>,
    pub available_from: Option<String>,
}

/// Canonical apartment record, immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub source: SourceId,
    pub address: String,
    pub rooms: Option<f64>,
    pub size_sqm: Option<f64>,
    pub warm_rent: Option<f64>,
    pub cold_rent: Option<f64>,
    pub requires_wbs: bool,
    pub url: String,
    pub available_from: String,
}

impl ListingRecord {
    /// Stable identity digest. Restricted to fields that survive cosmetic
    /// markup changes: source, address, rooms, size. Rents and availability
    /// get edited on the portals without the unit itself changing.
    pub fn fingerprint(&self) -> String {
        let key = format!(
            "{}|{}|{}|{}",
            self.source.name(),
            self.address,
            fmt_num(self.rooms),
            fmt_num(self.size_sqm),
        );
        let digest = Sha256::digest(key.as_bytes());
        hex::encode(digest)
    }
}

/// Minimal canonical float formatting so 2.0 and 2 fingerprint identically.
fn fmt_num(v: Option<f64>) -> String {
    match v {
        None => "-".to_string(),
        Some(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(n) => format!("{}", n),
    }
}
