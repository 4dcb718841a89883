//! Phased rollout sequencing.
//!
//! Multi-quad deployments are staged: Phase 1 goes in immediately at the
//! single highest-load inflow, Phase 2 follows once Phase 1 monitoring data
//! can inform placement, and Phase 3 picks up everything that remains. The
//! wording of each phase depends on which pollutant dominates the site.

use serde::Serialize;
use tracing::debug;

use super::sizing::{DeploymentPlan, GPM_PER_UNIT, UNITS_PER_QUAD, unit_cost};
use super::templates::{
    MONITORING_CONTINUITY_CLAUSE, MULTI_CAUSE_CLAUSE, phase_template, render, trigger_template,
};
use crate::assess::thresholds::{BloomBand, NutrientBand, ParameterBands, TurbidityBand};
use crate::logging::Stage;
use crate::severity::SeverityResult;
use crate::site::SiteAssessment;

/// Sites unsampled for longer than this get the monitoring-continuity clause.
pub const CONTINUITY_GAP_DAYS: u32 = 365;

/// Cause count at which Phase 3 is justified as multi-cause treatment.
pub const MULTI_CAUSE_COUNT: usize = 3;

const NUTRIENT_TERMS: &[&str] = &[
    "nutrient", "nitrogen", "phosphorus", "nitrate", "ammonia", "chlorophyll", "algae", "algal",
    "eutrophication",
];
const PATHOGEN_TERMS: &[&str] = &[
    "bacteria", "e. coli", "escherichia", "enterococc", "fecal", "coliform", "pathogen",
];
const SEDIMENT_TERMS: &[&str] = &[
    "sediment", "siltation", "turbidity", "suspended solids", "tss", "solids",
];

/// The pollutant family judged most responsible for a site's impairment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DominantDriver {
    Nutrient,
    Pathogen,
    Sediment,
    Generic,
}

/// Everything the planner needs to word and sequence phases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutDrivers {
    pub dominant: DominantDriver,
    pub region_name: String,
    pub causes: Vec<String>,
    pub data_age_days: Option<u32>,
    /// "thresholds: <source>" text for the Phase 1 audit trail.
    pub threshold_audit: String,
}

impl RolloutDrivers {
    pub fn from_assessment(site: &SiteAssessment, severity: &SeverityResult) -> RolloutDrivers {
        let causes = site.impairment.causes().to_vec();
        RolloutDrivers {
            dominant: dominant_driver(&severity.bands, &causes),
            region_name: site.region_name.clone(),
            causes,
            data_age_days: site.data_age_days,
            threshold_audit: severity.bands.audit_label(),
        }
    }

    fn needs_continuity_clause(&self) -> bool {
        self.data_age_days.is_none_or(|d| d > CONTINUITY_GAP_DAYS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// 1-based.
    pub index: u8,
    pub quad_count: u32,
    pub unit_count: u32,
    pub gpm: u32,
    pub annual_cost: u64,
    pub mission_label: String,
    pub placement_rationale: String,
    pub justification_text: String,
    pub trigger_condition: String,
    pub trigger_after_days: u32,
}

fn mentions_any(causes: &[String], terms: &[&str]) -> bool {
    causes.iter().any(|cause| {
        let lower = cause.to_lowercase();
        terms.iter().any(|term| lower.contains(term))
    })
}

/// Picks the dominant driver in priority order:
/// nutrient/bloom > pathogen > sediment/turbidity > generic.
pub fn dominant_driver(bands: &ParameterBands, causes: &[String]) -> DominantDriver {
    let nutrient_signal = bands.bloom >= BloomBand::Bloom
        || matches!(bands.nutrients, NutrientBand::Elevated | NutrientBand::Excessive)
        || mentions_any(causes, NUTRIENT_TERMS);
    if nutrient_signal {
        return DominantDriver::Nutrient;
    }

    if bands.bacteria_exceeded || mentions_any(causes, PATHOGEN_TERMS) {
        return DominantDriver::Pathogen;
    }

    let sediment_signal =
        matches!(bands.turbidity, TurbidityBand::Elevated | TurbidityBand::Impaired)
            || mentions_any(causes, SEDIMENT_TERMS);
    if sediment_signal {
        return DominantDriver::Sediment;
    }

    DominantDriver::Generic
}

/// Splits `total_quads` across phases: one quad each for Phases 1 and 2,
/// everything left over for Phase 3.
pub fn phase_quads(total_quads: u32) -> Vec<u32> {
    match total_quads {
        0 => Vec::new(),
        1 => vec![1],
        2 => vec![1, 1],
        n => vec![1, 1, n - 2],
    }
}

fn build_phase(index: u8, quads: u32, drivers: &RolloutDrivers) -> Phase {
    let units = quads * UNITS_PER_QUAD;
    let region = drivers.region_name.as_str();
    let causes = drivers.causes.as_slice();

    let (mission, placement, justification) = match phase_template(drivers.dominant, index) {
        Some(t) => (
            t.mission.to_string(),
            render(t.placement, region, causes),
            render(t.justification, region, causes),
        ),
        None => (
            format!("Phase {} Treatment", index),
            format!("Loading zone {} at {}.", index, region),
            String::new(),
        ),
    };

    let mut text = vec![justification];
    if index == 1 {
        text.push(format!("Severity basis: {}.", drivers.threshold_audit));
    }
    if index == 3 && causes.len() >= MULTI_CAUSE_COUNT {
        text.push(render(MULTI_CAUSE_CLAUSE, region, causes));
    }
    if drivers.needs_continuity_clause() {
        text.push(render(MONITORING_CONTINUITY_CLAUSE, region, causes));
    }

    let (trigger_condition, trigger_after_days) = trigger_template(index)
        .map(|t| (t.condition.to_string(), t.after_days))
        .unwrap_or_else(|| (format!("After Phase {} review.", index - 1), 180));

    Phase {
        index,
        quad_count: quads,
        unit_count: units,
        gpm: units * GPM_PER_UNIT,
        annual_cost: unit_cost(units),
        mission_label: mission,
        placement_rationale: placement,
        justification_text: text
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        trigger_condition,
        trigger_after_days,
    }
}

/// Fills `plan.phases` for a phased deployment. Single-quad plans deploy in
/// one shot and are returned unchanged.
pub fn plan_rollout(mut plan: DeploymentPlan, drivers: &RolloutDrivers) -> DeploymentPlan {
    if !plan.is_phased {
        return plan;
    }

    plan.phases = phase_quads(plan.total_quads)
        .into_iter()
        .enumerate()
        .map(|(i, quads)| build_phase(i as u8 + 1, quads, drivers))
        .collect();

    debug_assert_eq!(
        plan.phases.iter().map(|p| p.unit_count).sum::<u32>(),
        plan.total_units,
        "phase units must sum to the plan total"
    );
    debug!(
        stage = %Stage::Rollout,
        region = %drivers.region_name,
        driver = ?drivers.dominant,
        phases = plan.phases.len(),
        "rollout planned"
    );
    plan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
