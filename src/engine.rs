//! End-to-end restoration planning for one site.
//!
//! readings + records → classify / resolve / freshness → severity →
//! sizing → rollout → economics. Every stage is a pure function of the
//! previous stage's output; nothing here blocks, retries or caches.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::logging::{Stage, log_plan_summary, log_validation_failure};
use crate::model::PlanError;
use crate::plan::economics::{CostEstimate, estimate_economics};
use crate::plan::rollout::{RolloutDrivers, plan_rollout};
use crate::plan::sizing::{DeploymentPlan, size_deployment};
use crate::profiles::ProfileRegistry;
use crate::severity::{SeverityResult, score_severity};
use crate::site::{SiteAssessment, SiteInput};

/// A sized, sequenced and costed plan for a non-healthy site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorationPlan {
    pub severity: SeverityResult,
    pub drivers: RolloutDrivers,
    pub deployment: DeploymentPlan,
    pub economics: CostEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RestorationOutcome {
    /// Healthy sites skip sizing and rollout entirely.
    NoActionRequired { severity: SeverityResult },
    Planned(RestorationPlan),
}

impl RestorationOutcome {
    pub fn severity(&self) -> &SeverityResult {
        match self {
            RestorationOutcome::NoActionRequired { severity } => severity,
            RestorationOutcome::Planned(plan) => &plan.severity,
        }
    }

    /// The deployment, or the empty plan for a healthy site.
    pub fn deployment(&self) -> DeploymentPlan {
        match self {
            RestorationOutcome::NoActionRequired { .. } => DeploymentPlan::none(),
            RestorationOutcome::Planned(plan) => plan.deployment.clone(),
        }
    }

    pub fn plan(&self) -> Option<&RestorationPlan> {
        match self {
            RestorationOutcome::NoActionRequired { .. } => None,
            RestorationOutcome::Planned(plan) => Some(plan),
        }
    }
}

/// Runs the full pipeline for an already-built assessment.
pub fn compute_restoration_plan(site: &SiteAssessment) -> Result<RestorationOutcome, PlanError> {
    debug!(
        stage = %Stage::Impairment,
        region = %site.region_name,
        impaired = site.impairment.is_impaired(),
        cat5 = site.impairment.is_cat5(),
        causes = site.impairment.causes().len(),
        "impairment resolved"
    );

    let severity = score_severity(site)?;
    debug!(
        stage = %Stage::Freshness,
        region = %site.region_name,
        populated = severity.freshness.populated,
        coverage = severity.freshness.score,
        "freshness evaluated"
    );

    if severity.is_healthy() {
        return Ok(RestorationOutcome::NoActionRequired { severity });
    }

    let sized = size_deployment(&severity, site.estimated_acres)?;
    let drivers = RolloutDrivers::from_assessment(site, &severity);
    let deployment = plan_rollout(sized, &drivers);
    let economics = estimate_economics(&deployment);
    debug!(
        stage = %Stage::Economics,
        region = %site.region_name,
        net_low = economics.effective_net_cost_range.low,
        net_high = economics.effective_net_cost_range.high,
        "economics estimated"
    );

    Ok(RestorationOutcome::Planned(RestorationPlan {
        severity,
        drivers,
        deployment,
        economics,
    }))
}

/// Builds the assessment for `input` and plans it, logging the outcome.
pub fn plan_site(
    input: SiteInput,
    registry: &ProfileRegistry,
    parameter_slots: usize,
    now: DateTime<Utc>,
) -> Result<RestorationOutcome, PlanError> {
    let region = input.region_name.clone();
    let outcome = SiteAssessment::build_with_slots(input, registry, parameter_slots, now)
        .and_then(|site| compute_restoration_plan(&site));

    match &outcome {
        Ok(result) => log_plan_summary(&region, result),
        Err(err) => log_validation_failure(&region, err),
    }
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AlertLevel, ImpairmentRecord, PARAMETER_SLOTS, ParameterKey, ParameterReading, RecordState,
    };
    use crate::severity::SeverityLabel;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn input(category: &str, readings: Vec<ParameterReading>, acres: f64) -> SiteInput {
        SiteInput {
            region_name: "Patapsco River".to_string(),
            state_abbr: "MD".to_string(),
            water_type: Default::default(),
            per_site: RecordState::Resolved(ImpairmentRecord::with_category(category)),
            bulk: RecordState::Absent,
            alert_level: Some(AlertLevel::Low),
            readings,
            estimated_acres: acres,
            acreage_source: Default::default(),
        }
    }

    fn plan_builtin(site: SiteInput) -> Result<RestorationOutcome, PlanError> {
        plan_site(site, &ProfileRegistry::builtin(), PARAMETER_SLOTS, fixed_now())
    }

    fn clean_readings() -> Vec<ParameterReading> {
        ParameterKey::ALL
            .iter()
            .map(|k| {
                let value = match k {
                    ParameterKey::DissolvedOxygen => 8.0,
                    ParameterKey::Chlorophyll => 3.0,
                    ParameterKey::Turbidity => 2.0,
                    ParameterKey::TotalNitrogen => 0.3,
                    ParameterKey::TotalPhosphorus => 0.01,
                    ParameterKey::Bacteria => 20.0,
                    _ => 7.2,
                };
                ParameterReading::new(*k, value, "", "WQP")
                    .sampled_at(fixed_now() - Duration::days(2))
            })
            .collect()
    }

    #[test]
    fn test_healthy_site_short_circuits() {
        let outcome = plan_builtin(input("1", clean_readings(), 900.0)).expect("valid site");
        assert!(matches!(outcome, RestorationOutcome::NoActionRequired { .. }));
        assert!(outcome.plan().is_none());
        let deployment = outcome.deployment();
        assert_eq!(deployment.total_quads, 0);
        assert!(deployment.phases.is_empty());
    }

    #[test]
    fn test_invalid_input_returns_no_plan() {
        let result = plan_builtin(input("5", vec![], -10.0));
        assert_eq!(result, Err(PlanError::NegativeAcreage(-10.0)));
    }

    #[test]
    fn test_planned_outcome_carries_every_stage() {
        let readings = vec![
            ParameterReading::new(ParameterKey::DissolvedOxygen, 1.8, "mg/L", "WQP")
                .sampled_at(fixed_now() - Duration::days(5)),
        ];
        let outcome = plan_builtin(input("5", readings, 80.0)).expect("valid site");
        let plan = outcome.plan().expect("non-healthy site is planned");
        assert!(plan.severity.label >= SeverityLabel::Degraded);
        assert_eq!(plan.deployment.total_units, plan.deployment.total_quads * 4);
        assert_eq!(plan.economics.full_build_annual_cost, plan.deployment.annual_cost);
        assert_eq!(
            plan.deployment.phases.iter().map(|p| p.unit_count).sum::<u32>(),
            plan.deployment.total_units
        );
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = plan_builtin(input("1", clean_readings(), 10.0)).expect("valid site");
        let json = serde_json::to_value(&outcome).expect("serializable");
        assert_eq!(json["outcome"], "no-action-required");
        assert_eq!(json["severity"]["label"], "healthy");
    }
}
