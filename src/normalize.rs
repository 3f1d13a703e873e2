use crate::model::{ListingRecord, RawListing, SourceId};

/// Coerce a raw field bag into a canonical record, or decide to drop it.
///
/// A bag with none of rooms, size, warm rent carries nothing the evaluator
/// could ever act on, so it never reaches the dedup store.
pub fn normalize(source: SourceId, raw: &RawListing) -> Option<ListingRecord> {
    let rooms = opt_number(raw.rooms.as_deref()).filter(|v| *v > 0.0);
    let size_sqm = opt_number(raw.size.as_deref()).filter(|v| *v > 0.0);
    let warm_rent = opt_number(raw.warm_rent.as_deref()).filter(|v| *v >= 0.0);
    let cold_rent = opt_number(raw.cold_rent.as_deref()).filter(|v| *v >= 0.0);

    if rooms.is_none() && size_sqm.is_none() && warm_rent.is_none() {
        return None;
    }

    let address = raw
        .address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(collapse_whitespace)
        .unwrap_or_else(|| "N/A".to_string());

    let available_from = raw
        .available_from
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "ab sofort".to_string());

    Some(ListingRecord {
        source,
        address,
        rooms,
        size_sqm,
        warm_rent,
        cold_rent,
        requires_wbs: raw.requires_wbs,
        url: raw.url.clone().unwrap_or_default(),
        available_from,
    })
}

fn opt_number(text: Option<&str>) -> Option<f64> {
    text.and_then(parse_number)
}

/// Parse a number out of German or English formatted text, tolerating unit
/// and currency markers ("54,5 m²", "1.234,56 €", "700 EUR").
///
/// Separator rule:
/// - both `.` and `,` present: the rightmost one is the decimal point, the
///   other is a grouping separator;
/// - one separator kind only: decimal iff it occurs once with exactly 1-2
///   trailing digits, grouping otherwise.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let dot = cleaned.rfind('.');
    let comma = cleaned.rfind(',');

    let normalized = match (dot, comma) {
        (Some(d), Some(c)) => {
            let decimal = if d > c { '.' } else { ',' };
            decimalize(&cleaned, decimal)
        }
        (Some(_), None) => single_separator(&cleaned, '.'),
        (None, Some(_)) => single_separator(&cleaned, ','),
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok()
}

/// Keep `decimal` as the decimal point, strip every other separator.
fn decimalize(s: &str, decimal: char) -> String {
    let last = s.rfind(decimal).unwrap_or(s.len());
    s.char_indices()
        .filter_map(|(i, c)| match c {
            c if c.is_ascii_digit() => Some(c),
            c if c == decimal && i == last => Some('.'),
            _ => None,
        })
        .collect()
}

fn single_separator(s: &str, sep: char) -> String {
    let count = s.matches(sep).count();
    let trailing = s.rsplit(sep).next().unwrap_or("").len();
    if count == 1 && (1..=2).contains(&trailing) {
        // "54,5" / "700.50" — decimal
        s.replace(sep, ".")
    } else {
        // "1.234" / "1.234.567" — grouping
        s.chars().filter(|c| *c != sep).collect()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_decimal_comma() {
        assert_eq!(parse_number("54,5 m²"), Some(54.5));
        assert_eq!(parse_number("2,5"), Some(2.5));
    }

    #[test]
    fn german_grouping_plus_decimal() {
        assert_eq!(parse_number("1.234,56 €"), Some(1234.56));
        assert_eq!(parse_number("12.345,00 EUR"), Some(12345.0));
    }

    #[test]
    fn english_grouping_plus_decimal() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
    }

    #[test]
    fn lone_separator_with_three_digits_is_grouping() {
        assert_eq!(parse_number("1.234"), Some(1234.0));
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number("1.234.567"), Some(1234567.0));
    }

    #[test]
    fn lone_separator_with_short_tail_is_decimal() {
        assert_eq!(parse_number("54.5"), Some(54.5));
        assert_eq!(parse_number("700.50"), Some(700.5));
    }

    #[test]
    fn plain_integer() {
        assert_eq!(parse_number("700 €"), Some(700.0));
        assert_eq!(parse_number("3"), Some(3.0));
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("k.A."), None);
        assert_eq!(parse_number("auf Anfrage"), None);
    }

    fn bag() -> RawListing {
        RawListing {
            address: Some("  Wilhelmstraße 23,\n 10963 Berlin ".into()),
            rooms: Some("2 Zimmer".into()),
            size: Some("54,5 m²".into()),
            warm_rent: Some("689,00 €".into()),
            cold_rent: Some("512,34 €".into()),
            requires_wbs: false,
            url: Some("https://www.wbm.de/angebot/123".into()),
            available_from: None,
        }
    }

    #[test]
    fn full_bag_normalizes() {
        let rec = normalize(SourceId::Wbm, &bag()).unwrap();
        assert_eq!(rec.address, "Wilhelmstraße 23, 10963 Berlin");
        assert_eq!(rec.rooms, Some(2.0));
        assert_eq!(rec.size_sqm, Some(54.5));
        assert_eq!(rec.warm_rent, Some(689.0));
        assert_eq!(rec.cold_rent, Some(512.34));
        assert_eq!(rec.available_from, "ab sofort");
    }

    #[test]
    fn drop_rule_fires_when_all_decision_fields_absent() {
        let raw = RawListing {
            address: Some("Somewhere 1".into()),
            rooms: None,
            size: Some("".into()),
            warm_rent: Some("auf Anfrage".into()),
            ..Default::default()
        };
        assert!(normalize(SourceId::Gewobag, &raw).is_none());
    }

    #[test]
    fn one_decision_field_is_enough() {
        let raw = RawListing {
            warm_rent: Some("650 €".into()),
            ..Default::default()
        };
        let rec = normalize(SourceId::Howoge, &raw).unwrap();
        assert_eq!(rec.address, "N/A");
        assert_eq!(rec.warm_rent, Some(650.0));
        assert_eq!(rec.rooms, None);
    }

    #[test]
    fn non_positive_rooms_treated_as_absent() {
        let raw = RawListing {
            rooms: Some("0".into()),
            size: Some("40 m²".into()),
            ..Default::default()
        };
        let rec = normalize(SourceId::Degewo, &raw).unwrap();
        assert_eq!(rec.rooms, None);
        assert_eq!(rec.size_sqm, Some(40.0));
    }
}
