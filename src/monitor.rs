use tracing::{debug, error, info, warn};

use crate::criteria::Criteria;
use crate::extract::Extractor;
use crate::fetch;
use crate::normalize::normalize;
use crate::notify::{self, Notifier};
use crate::seen::SeenStore;

/// Counters reported after one run.
pub struct RunReport {
    pub checked: usize,
    pub new_matches: usize,
    pub notified: usize,
}

/// One full monitoring pass: every extractor in turn, normalize, dedup,
/// evaluate, notify, persist. A failing source contributes zero listings and
/// the run continues; a failing notification is logged and the record is
/// still marked seen; the seen-set save is attempted regardless.
///
/// With `dry_run` the pass evaluates and prints matches but neither notifies
/// nor mutates the seen-set.
pub async fn run(
    criteria: &Criteria,
    extractors: &[Box<dyn Extractor>],
    notifier: &dyn Notifier,
    store: &mut SeenStore,
    dry_run: bool,
) -> RunReport {
    let client = fetch::build_client();
    let mut checked = 0usize;
    let mut new_matches = 0usize;
    let mut notified = 0usize;

    for extractor in extractors {
        let source = extractor.source();
        let bags = match extractor.collect(&client).await {
            Ok(bags) => bags,
            Err(e) => {
                warn!("{}: source unavailable, zero listings ({})", source, e);
                continue;
            }
        };
        info!("{}: {} raw listings", source, bags.len());

        for bag in &bags {
            let Some(record) = normalize(source, bag) else {
                debug!("{}: dropped a bag without decision-relevant fields", source);
                continue;
            };
            checked += 1;

            let fingerprint = record.fingerprint();
            if store.contains(&fingerprint) {
                continue;
            }

            let decision = criteria.evaluate(&record);
            if decision.matches {
                new_matches += 1;
                info!("{}: match at {} ({})", source, record.address, decision.reason);
                if dry_run {
                    println!("[dry-run] {} — {} — {}", source, record.address, decision.reason);
                } else {
                    let message = notify::format_message(&record, &decision.reason);
                    if notifier.send(&message).await {
                        notified += 1;
                    } else {
                        warn!("{}: notification failed for {}", source, record.address);
                    }
                }
            } else {
                debug!("{}: no match at {} ({})", source, record.address, decision.reason);
            }

            // Marked regardless of outcome so the next run neither
            // re-evaluates nor re-notifies.
            if !dry_run {
                store.mark(&fingerprint);
            }
        }
    }

    if !dry_run {
        if let Err(e) = store.save() {
            error!("Failed to persist seen-set: {}", e);
        }
    }

    RunReport {
        checked,
        new_matches,
        notified,
    }
}
