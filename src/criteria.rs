use crate::model::ListingRecord;

/// One constraint profile: min/max per attribute, `None` = unconstrained.
#[derive(Debug, Clone)]
pub struct Profile {
    pub rooms_min: Option<f64>,
    pub rooms_max: Option<f64>,
    pub size_max: Option<f64>,
    pub price_max: Option<f64>,
}

/// The two-branch policy: one profile for WBS (subsidized) units, one for
/// market-rate units.
#[derive(Debug, Clone)]
pub struct Criteria {
    pub subsidized: Profile,
    pub market_rate: Profile,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            subsidized: Profile {
                rooms_min: Some(1.0),
                rooms_max: Some(2.0),
                size_max: Some(50.0),
                price_max: None,
            },
            market_rate: Profile {
                rooms_min: None,
                rooms_max: None,
                size_max: None,
                price_max: Some(700.0),
            },
        }
    }
}

/// Outcome of one evaluation; `reason` names the decisive constraint so the
/// run log stays reviewable by a human.
#[derive(Debug, Clone)]
pub struct Decision {
    pub matches: bool,
    pub reason: String,
}

fn fail(reason: String) -> Decision {
    Decision {
        matches: false,
        reason,
    }
}

fn pass(reason: String) -> Decision {
    Decision {
        matches: true,
        reason,
    }
}

impl Criteria {
    /// Fixed evaluation order: the WBS branch first, price-only branch
    /// otherwise. Comparing against an absent value is a non-match, never a
    /// default of zero.
    pub fn evaluate(&self, record: &ListingRecord) -> Decision {
        if record.requires_wbs {
            return self.evaluate_subsidized(record);
        }
        self.evaluate_market_rate(record)
    }

    fn evaluate_subsidized(&self, record: &ListingRecord) -> Decision {
        let p = &self.subsidized;

        let Some(size) = record.size_sqm else {
            return fail("WBS-Angebot ohne Größenangabe".into());
        };
        if let Some(max) = p.size_max {
            if size > max {
                return fail(format!("Größe {}m² über Maximum {}m²", size, max));
            }
        }

        let Some(rooms) = record.rooms else {
            return fail("WBS-Angebot ohne Zimmerangabe".into());
        };
        let below = p.rooms_min.is_some_and(|min| rooms < min);
        let above = p.rooms_max.is_some_and(|max| rooms > max);
        if below || above {
            return fail(format!(
                "Zimmerzahl {} außerhalb {}-{}",
                rooms,
                p.rooms_min.unwrap_or(0.0),
                p.rooms_max.map(|m| m.to_string()).unwrap_or_else(|| "∞".into()),
            ));
        }

        // Price is never constrained for subsidized units.
        pass("erfüllt Kriterien (mit WBS)".into())
    }

    fn evaluate_market_rate(&self, record: &ListingRecord) -> Decision {
        let Some(warm) = record.warm_rent else {
            return fail("keine Warmmiete angegeben".into());
        };
        if let Some(max) = self.market_rate.price_max {
            if warm > max {
                return fail(format!("Warmmiete {}€ über Maximum {}€", warm, max));
            }
        }
        pass(format!("erfüllt Kriterien (ohne WBS, {}€ warm)", warm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceId;

    fn record(wbs: bool, rooms: Option<f64>, size: Option<f64>, warm: Option<f64>) -> ListingRecord {
        ListingRecord {
            source: SourceId::Gewobag,
            address: "Teststraße 1".into(),
            rooms,
            size_sqm: size,
            warm_rent: warm,
            cold_rent: None,
            requires_wbs: wbs,
            url: String::new(),
            available_from: "ab sofort".into(),
        }
    }

    #[test]
    fn subsidized_boundary() {
        let c = Criteria::default();
        assert!(c.evaluate(&record(true, Some(2.0), Some(50.0), None)).matches);
        assert!(!c.evaluate(&record(true, Some(2.0), Some(50.1), None)).matches);
        assert!(!c.evaluate(&record(true, Some(3.0), Some(45.0), None)).matches);
        assert!(!c.evaluate(&record(true, Some(0.5), Some(45.0), None)).matches);
    }

    #[test]
    fn subsidized_ignores_price() {
        let c = Criteria::default();
        let d = c.evaluate(&record(true, Some(1.0), Some(40.0), Some(1500.0)));
        assert!(d.matches);
    }

    #[test]
    fn subsidized_missing_fields_fail_with_reason() {
        let c = Criteria::default();
        let d = c.evaluate(&record(true, None, Some(45.0), None));
        assert!(!d.matches);
        assert!(d.reason.contains("Zimmer"));

        let d = c.evaluate(&record(true, Some(2.0), None, None));
        assert!(!d.matches);
        assert!(d.reason.contains("Größe"));
    }

    #[test]
    fn market_rate_boundary() {
        let c = Criteria::default();
        assert!(c.evaluate(&record(false, None, None, Some(700.0))).matches);
        assert!(!c.evaluate(&record(false, None, None, Some(700.01))).matches);
    }

    #[test]
    fn market_rate_missing_price_fails() {
        let c = Criteria::default();
        // Rooms/size are unconstrained on this branch and cannot substitute.
        let d = c.evaluate(&record(false, Some(5.0), Some(120.0), None));
        assert!(!d.matches);
        assert!(d.reason.contains("Warmmiete"));
    }

    #[test]
    fn failure_reasons_name_the_constraint() {
        let c = Criteria::default();
        let d = c.evaluate(&record(true, Some(2.0), Some(80.0), None));
        assert!(d.reason.contains("80") && d.reason.contains("50"));

        let d = c.evaluate(&record(false, None, None, Some(950.0)));
        assert!(d.reason.contains("950") && d.reason.contains("700"));
    }
}
