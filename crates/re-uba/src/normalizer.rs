//! Normalizer (Risk): `spec.md` §4.12. Grounded on
//! `risk-index/engine/normalizer.py`'s clamp + band thresholds and the
//! exact `0.3*completeness + 0.7*mean(component_confidence)` formula.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use re_records::{Clock, IdSource, RiskScore, SeverityBand};

use crate::error::{Result, UbaError};

/// One raw risk component with its own confidence in [0,1] (how much the
/// signal source trusts its own contribution, not the final risk level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskComponent {
    pub name: String,
    pub raw_value: f64,
    pub confidence: f64,
}

pub struct Normalizer;

impl Normalizer {
    /// `completeness` is the fraction of expected components that were
    /// actually supplied (caller-computed, since only the caller knows the
    /// full expected set for a given identity/window).
    pub fn normalize(
        identity_id: impl Into<String>,
        components: &[RiskComponent],
        completeness: f64,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<RiskScore> {
        if components.is_empty() {
            return Err(UbaError::EmptyComponents);
        }

        let raw_sum: f64 = components.iter().map(|c| c.raw_value).sum();
        let normalized_score = raw_sum.clamp(0.0, 100.0);
        let severity_band = SeverityBand::from_score(normalized_score);

        let mean_component_confidence =
            components.iter().map(|c| c.confidence).sum::<f64>() / components.len() as f64;
        let confidence = 0.3 * completeness.clamp(0.0, 1.0) + 0.7 * mean_component_confidence.clamp(0.0, 1.0);

        let mut raw_components = BTreeMap::new();
        for component in components {
            raw_components.insert(component.name.clone(), component.raw_value);
        }

        Ok(RiskScore {
            score_id: ids.next_id().to_string(),
            identity_id: identity_id.into(),
            raw_components,
            normalized_score,
            severity_band,
            confidence,
            timestamp: clock.now_rfc3339(),
        })
    }
}
