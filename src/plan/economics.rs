//! Deployment economics.
//!
//! Puts a full-build deployment next to what traditional compliance would
//! cost for the same waterbody, then estimates how much of the deployment is
//! offset by avoided compliance spend and grant funding. Every figure except
//! the unit cost is a `[low, high]` range; none of them is precise enough
//! for a point estimate.

use serde::Serialize;

use super::sizing::{DeploymentPlan, UNIT_ANNUAL_COST};

// Traditional compliance baseline, USD per quad-equivalent per year.
pub const MONITORING_BASELINE: (u64, u64) = (100_000, 200_000);
pub const BMP_BASELINE: (u64, u64) = (150_000, 400_000);
pub const CONSULTING_BASELINE: (u64, u64) = (75_000, 175_000);

// Share of each baseline the deployment displaces, percent.
pub const MONITORING_SAVINGS_PCT: (u64, u64) = (50, 75);
pub const CONSULTING_SAVINGS_PCT: (u64, u64) = (40, 60);
pub const BMP_SAVINGS_PCT: (u64, u64) = (5, 10);

/// Share of the full-build cost typically covered by grants, percent.
pub const GRANT_OFFSET_PCT: (u64, u64) = (40, 75);

/// Savings figures are reported to the nearest $10,000.
pub const SAVINGS_ROUNDING: u64 = 10_000;

/// An estimate band, USD per year. `low <= high` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CostRange {
    pub low: u64,
    pub high: u64,
}

impl CostRange {
    pub fn new(low: u64, high: u64) -> CostRange {
        debug_assert!(low <= high, "inverted cost range: {} > {}", low, high);
        CostRange { low, high }
    }

    fn scaled(bounds: (u64, u64), factor: u64) -> CostRange {
        CostRange::new(bounds.0 * factor, bounds.1 * factor)
    }

    fn percent(&self, pct: (u64, u64)) -> CostRange {
        CostRange::new(self.low * pct.0 / 100, self.high * pct.1 / 100)
    }

    fn plus(&self, other: &CostRange) -> CostRange {
        CostRange::new(self.low + other.low, self.high + other.high)
    }

    fn rounded(&self) -> CostRange {
        CostRange::new(round_to(self.low, SAVINGS_ROUNDING), round_to(self.high, SAVINGS_ROUNDING))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub unit_annual_cost: u64,
    pub full_build_annual_cost: u64,
    pub traditional_baseline_range: CostRange,
    /// Monitoring and consulting spend the deployment's sensors replace.
    pub monitoring_consulting_savings_range: CostRange,
    /// BMP execution spend the deployment replaces.
    pub bmp_savings_range: CostRange,
    pub compliance_savings_range: CostRange,
    pub grant_offset_range: CostRange,
    pub effective_net_cost_range: CostRange,
}

/// Rounds half-up to the nearest multiple of `step`.
pub fn round_to(value: u64, step: u64) -> u64 {
    (value + step / 2) / step * step
}

/// Estimates economics for a sized plan. A zero-quad plan estimates to zero
/// everywhere.
pub fn estimate_economics(plan: &DeploymentPlan) -> CostEstimate {
    let quads = u64::from(plan.total_quads);
    let full_build = plan.annual_cost;

    let monitoring = CostRange::scaled(MONITORING_BASELINE, quads);
    let bmp = CostRange::scaled(BMP_BASELINE, quads);
    let consulting = CostRange::scaled(CONSULTING_BASELINE, quads);
    let traditional = monitoring.plus(&bmp).plus(&consulting);

    let monitoring_consulting = monitoring
        .percent(MONITORING_SAVINGS_PCT)
        .plus(&consulting.percent(CONSULTING_SAVINGS_PCT));
    let bmp_savings = bmp.percent(BMP_SAVINGS_PCT);
    let savings = monitoring_consulting.plus(&bmp_savings).rounded();

    let grant = CostRange::new(
        full_build * GRANT_OFFSET_PCT.0 / 100,
        full_build * GRANT_OFFSET_PCT.1 / 100,
    );

    // Best case subtracts the high offsets, worst case the low ones.
    let net = CostRange::new(
        full_build.saturating_sub(savings.high + grant.high),
        full_build.saturating_sub(savings.low + grant.low),
    );

    CostEstimate {
        unit_annual_cost: UNIT_ANNUAL_COST,
        full_build_annual_cost: full_build,
        traditional_baseline_range: traditional,
        monitoring_consulting_savings_range: monitoring_consulting.rounded(),
        bmp_savings_range: bmp_savings.rounded(),
        compliance_savings_range: savings,
        grant_offset_range: grant,
        effective_net_cost_range: net,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
