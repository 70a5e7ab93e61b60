//! Ranking and deterministic risk assessment.

use crowdbreak_simulation_models::{Mode, RankedRegion, RiskAssessment, RiskLevel};

use crate::scenario::{ScenarioTable, render};

/// Number of most congested regions handed to the assessor.
pub const TOP_N: usize = 3;

/// Explanation published when no region had data for the scenario date.
pub const NO_DATA_EXPLANATION: &str =
    "No mobility data available for any region on the selected scenario date.";

/// Action published when no region had data for the scenario date.
pub const NO_DATA_ACTION: &str =
    "Verify that the mobility dataset covers the configured scenario dates.";

/// Sorts regions by descending density.
///
/// The sort is stable, so regions with equal density keep their incoming
/// (catalog) order.
pub fn rank(regions: &mut [RankedRegion]) {
    regions.sort_by(|a, b| b.density.cmp(&a.density));
}

/// The first [`TOP_N`] entries of an already ranked list.
#[must_use]
pub fn top(ranked: &[RankedRegion]) -> &[RankedRegion] {
    &ranked[..ranked.len().min(TOP_N)]
}

/// Assesses risk from the ranked top regions.
///
/// Only the first region's density reaches the text, and the narrative is
/// otherwise fixed per mode. The level depends on that density alone. With
/// no regions at all, a `Medium` "no data" assessment is returned.
#[must_use]
pub fn assess(top: &[RankedRegion], mode: Mode, table: &ScenarioTable) -> RiskAssessment {
    let Some(primary) = top.first() else {
        return RiskAssessment {
            level: RiskLevel::Medium,
            explanation: NO_DATA_EXPLANATION.to_owned(),
            action: NO_DATA_ACTION.to_owned(),
        };
    };

    let scenario = table.scenario(mode);
    RiskAssessment {
        level: RiskLevel::from_density(primary.density),
        explanation: render(&scenario.explanation, primary.density),
        action: render(&scenario.action, primary.density),
    }
}
