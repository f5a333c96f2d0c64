//! Uniform result shape across search backends

use crate::models::ErrorRecord;
use crate::search::index::RawHit;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Which backend produced a hit list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultSource {
    Primary,
    Fallback,
}

/// A search result: the full record plus, for primary hits, its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: ErrorRecord,

    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Response of `search_errors`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// Convert backend hits to `SearchHit`s, preserving order and every record
/// field. Scores are kept only for primary hits.
pub fn normalize(hits: Vec<RawHit>, source: ResultSource) -> Vec<SearchHit> {
    hits.into_iter()
        .map(|hit| SearchHit {
            record: hit.source,
            score: match source {
                ResultSource::Primary => hit.score,
                ResultSource::Fallback => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits() -> Vec<RawHit> {
        vec![
            RawHit::scored(ErrorRecord::new("JS", "Runtime", "JS-2", "b"), 0.4),
            RawHit::scored(ErrorRecord::new("JS", "Runtime", "JS-1", "a"), 2.5),
        ]
    }

    #[test]
    fn test_primary_keeps_scores_and_order() {
        let normalized = normalize(hits(), ResultSource::Primary);
        let codes: Vec<&str> = normalized.iter().map(|h| h.record.code.as_str()).collect();
        assert_eq!(codes, vec!["JS-2", "JS-1"]);
        assert_eq!(normalized[0].score, Some(0.4));
        assert_eq!(normalized[1].score, Some(2.5));
    }

    #[test]
    fn test_fallback_drops_scores() {
        let normalized = normalize(hits(), ResultSource::Fallback);
        assert!(normalized.iter().all(|h| h.score.is_none()));
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        assert_eq!(
            normalize(hits(), ResultSource::Primary),
            normalize(hits(), ResultSource::Primary)
        );
    }

    #[test]
    fn test_hit_serializes_flat() {
        let hit = SearchHit {
            record: ErrorRecord::new("Java", "Runtime", "J-1", "NullPointerException"),
            score: None,
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["code"], "J-1");
        assert_eq!(value["type"], "Runtime");
        assert!(value.get("_score").is_none());

        let scored = SearchHit { score: Some(1.5), ..hit };
        assert_eq!(serde_json::to_value(&scored).unwrap()["_score"], 1.5);
    }
}
