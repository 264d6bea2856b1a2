use serde::{Deserialize, Serialize};

/// Per-signal breakdown, each value scaled to 0–100 and rounded to two
/// decimals. `keyword_overlap` keeps its historical wire name `bm25` even
/// though the measure has no term-frequency or length normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub tfidf: f64,
    pub embeddings: f64,
    #[serde(rename = "bm25")]
    pub keyword_overlap: f64,
    pub fuzzy: f64,
    pub rules: f64,
}

/// Final ensemble output for one resume/job pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0–100, two decimals.
    pub total_percent: f64,
    pub breakdown: ScoreBreakdown,
}

/// Rounds to two decimal places, the precision reported to callers.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
