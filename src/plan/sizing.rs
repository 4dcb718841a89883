//! Deployment capacity sizing.
//!
//! Maps a severity tier and waterbody size onto treatment capacity. Capacity
//! is bought in quads of four 50 GPM units; every unit costs the same to run
//! for a year.

use serde::Serialize;
use tracing::debug;

use super::rollout::Phase;
use crate::logging::Stage;
use crate::model::PlanError;
use crate::severity::{SeverityLabel, SeverityResult};
use crate::site::validate_acreage;

pub const GPM_PER_UNIT: u32 = 50;
pub const UNITS_PER_QUAD: u32 = 4;
/// Annual operating cost of one unit, USD.
pub const UNIT_ANNUAL_COST: u64 = 200_000;

/// Waterbodies larger than this get one extra quad.
pub const LARGE_WATERBODY_ACRES: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    pub tier: SeverityLabel,
    pub total_quads: u32,
    pub total_units: u32,
    pub total_gpm: u32,
    /// Full-build annual cost, USD.
    pub annual_cost: u64,
    pub is_phased: bool,
    /// Empty until the rollout planner fills it.
    pub phases: Vec<Phase>,
}

impl DeploymentPlan {
    /// The "no action" plan reported for healthy sites.
    pub fn none() -> DeploymentPlan {
        DeploymentPlan::from_quads(SeverityLabel::Healthy, 0)
    }

    pub fn from_quads(tier: SeverityLabel, total_quads: u32) -> DeploymentPlan {
        let total_units = total_quads * UNITS_PER_QUAD;
        DeploymentPlan {
            tier,
            total_quads,
            total_units,
            total_gpm: total_units * GPM_PER_UNIT,
            annual_cost: unit_cost(total_units),
            is_phased: total_quads >= 2,
            phases: Vec::new(),
        }
    }

    pub fn requires_action(&self) -> bool {
        self.total_quads > 0
    }
}

pub fn unit_cost(units: u32) -> u64 {
    u64::from(units) * UNIT_ANNUAL_COST
}

/// Minimum quads for a tier, before the scale modifier.
pub fn tier_quads(tier: SeverityLabel) -> u32 {
    match tier {
        SeverityLabel::Critical => 3,
        SeverityLabel::Degraded => 2,
        SeverityLabel::Stressed => 1,
        SeverityLabel::Healthy => 0,
    }
}

/// Sizes capacity for a scored site. Healthy sites get the empty plan.
///
/// Fails fast on negative or non-finite acreage.
pub fn size_deployment(severity: &SeverityResult, acres: f64) -> Result<DeploymentPlan, PlanError> {
    validate_acreage(acres)?;

    let tier = severity.label;
    let base = tier_quads(tier);
    if base == 0 {
        return Ok(DeploymentPlan::none());
    }

    let scale = if acres > LARGE_WATERBODY_ACRES { 1 } else { 0 };
    let plan = DeploymentPlan::from_quads(tier, base + scale);
    debug!(
        stage = %Stage::Size,
        tier = %tier,
        acres,
        quads = plan.total_quads,
        units = plan.total_units,
        "deployment sized"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
