//! RiskScore record: `spec.md` §3, §4.12. Grounded on
//! `risk-index/engine/normalizer.py` for band thresholds and the confidence
//! formula.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityBand {
    /// LOW [0,25), MODERATE [25,50), HIGH [50,75), CRITICAL [75,100]
    /// (`spec.md` §3, §4.12).
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            SeverityBand::Low
        } else if score < 50.0 {
            SeverityBand::Moderate
        } else if score < 75.0 {
            SeverityBand::High
        } else {
            SeverityBand::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score_id: String,
    pub identity_id: String,
    pub raw_components: BTreeMap<String, f64>,
    pub normalized_score: f64,
    pub severity_band: SeverityBand,
    pub confidence: f64,
    pub timestamp: String,
}
