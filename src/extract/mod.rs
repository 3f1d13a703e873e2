pub mod degewo;
pub mod detail;
pub mod immomio;
pub mod markup;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::model::{RawListing, SourceId};

/// One implementation per source/document shape. `collect` owns the fetch so
/// the orchestrator stays source-agnostic; parsing itself is synchronous and
/// separately testable against recorded fixtures.
///
/// Contract: extraction never raises past its own boundary per listing item.
/// A transport error may surface from `collect` (the orchestrator treats it
/// as zero listings); a malformed item inside a document is skipped.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn source(&self) -> SourceId;

    async fn collect(&self, client: &Client) -> Result<Vec<RawListing>>;
}

/// WBS requirement heuristic: case-insensitive keyword match against the
/// listing's full text. Absence of the keyword means `false`, never unknown.
///
/// Known false-positive risk: a page mentioning "WBS" in a footer or in an
/// unrelated sentence ("WBS nicht erforderlich") also trips this. The
/// portals' own structured flags are preferred where a source exposes one.
pub fn text_mentions_wbs(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("wbs") || lower.contains("wohnberechtigungsschein")
}

/// The production source registry. New sources are added here by implementing
/// `Extractor`, not by branching inside the orchestrator.
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(degewo::DegewoExtractor::new()),
        Box::new(immomio::ImmomioExtractor::gesobau()),
        Box::new(markup::MarkupExtractor::gewobag()),
        Box::new(markup::MarkupExtractor::howoge()),
        Box::new(markup::MarkupExtractor::stadt_und_land()),
        Box::new(markup::MarkupExtractor::wbm()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wbs_keyword_variants() {
        assert!(text_mentions_wbs("2 Zimmer, nur mit WBS"));
        assert!(text_mentions_wbs("Wohnberechtigungsschein erforderlich"));
        assert!(text_mentions_wbs("wbs mit besonderem Wohnbedarf"));
        assert!(!text_mentions_wbs("2 Zimmer, 54 m², 650 €"));
    }

    #[test]
    fn registry_covers_all_sources() {
        let sources: Vec<SourceId> = default_extractors().iter().map(|e| e.source()).collect();
        for s in [
            SourceId::Degewo,
            SourceId::Gesobau,
            SourceId::Gewobag,
            SourceId::Howoge,
            SourceId::StadtUndLand,
            SourceId::Wbm,
        ] {
            assert!(sources.contains(&s), "missing extractor for {}", s);
        }
    }
}
