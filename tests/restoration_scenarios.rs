// End-to-end restoration planning scenarios.
//
// Each test builds a SiteInput the way a dashboard caller would, runs the
// full pipeline against the built-in profiles and checks the resulting plan.

use chrono::{DateTime, Duration, TimeZone, Utc};

use pin_restoration::engine::{RestorationOutcome, compute_restoration_plan, plan_site};
use pin_restoration::model::{
    AlertLevel, BacteriaIndicator, ImpairmentRecord, PARAMETER_SLOTS, ParameterKey,
    ParameterReading, PlanError, RecordState,
};
use pin_restoration::plan::rollout::DominantDriver;
use pin_restoration::profiles::ProfileRegistry;
use pin_restoration::severity::{FloorRule, SeverityLabel};
use pin_restoration::site::{SiteAssessment, SiteInput};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 15, 12, 0, 0).unwrap()
}

fn reading(key: ParameterKey, value: f64, age_days: i64) -> ParameterReading {
    ParameterReading::new(key, value, "", "WQP").sampled_at(now() - Duration::days(age_days))
}

fn site(
    state: &str,
    category: &str,
    causes: &[&str],
    readings: Vec<ParameterReading>,
    acres: f64,
) -> SiteInput {
    SiteInput {
        region_name: "Test Creek".to_string(),
        state_abbr: state.to_string(),
        water_type: Default::default(),
        per_site: RecordState::Resolved(ImpairmentRecord::with_category(category).causes(causes)),
        bulk: RecordState::Absent,
        alert_level: None,
        readings,
        estimated_acres: acres,
        acreage_source: Default::default(),
    }
}

fn plan(input: SiteInput) -> RestorationOutcome {
    plan_site(input, &ProfileRegistry::builtin(), PARAMETER_SLOTS, now()).expect("valid input")
}

/// Category 1, nothing measured: stressed purely from missing data.
fn unmonitored(acres: f64) -> SiteInput {
    site("PA", "1", &[], vec![], acres)
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_critical_nutrient_site_gets_three_phase_plan() {
    let input = site(
        "PA",
        "5",
        &["Nutrients", "Bacteria"],
        vec![
            reading(ParameterKey::DissolvedOxygen, 2.1, 40),
            reading(ParameterKey::Chlorophyll, 55.0, 40),
        ],
        120.0,
    );

    let outcome = plan(input);
    let plan = outcome.plan().expect("critical site is planned");
    let severity = &plan.severity;

    assert_eq!(severity.subscores.dissolved_oxygen, 100.0);
    assert_eq!(severity.subscores.bloom, 100.0);
    assert_eq!(severity.subscores.turbidity, 30.0);
    assert_eq!(severity.subscores.impairment, 100.0);
    assert!(severity.subscores.monitoring_gap > 80.0);
    assert!(severity.score >= 75.0, "score {}", severity.score);
    assert_eq!(severity.label, SeverityLabel::Critical);
    assert_eq!(severity.floor_applied, None);

    let deployment = &plan.deployment;
    assert_eq!(deployment.total_quads, 3);
    assert_eq!(deployment.total_units, 12);
    assert_eq!(deployment.total_gpm, 600);
    assert_eq!(deployment.annual_cost, 2_400_000);
    assert_eq!(deployment.phases.len(), 3);
    assert_eq!(plan.drivers.dominant, DominantDriver::Nutrient);
    assert_eq!(deployment.phases[0].mission_label, "Primary Nutrient Interception");
    assert!(deployment.phases[0].justification_text.contains("thresholds:"));
    assert_eq!(deployment.phases[0].trigger_after_days, 0);
    assert_eq!(deployment.phases[1].trigger_after_days, 90);
    assert_eq!(deployment.phases[2].trigger_after_days, 180);
}

#[test]
fn test_unknown_parameters_are_not_neutral() {
    let outcome = plan(unmonitored(50.0));
    let severity = outcome.severity();

    assert_eq!(severity.subscores.impairment, 5.0);
    assert_eq!(severity.subscores.monitoring_gap, 100.0);
    assert!((30.0..=40.0).contains(&severity.subscores.dissolved_oxygen));
    assert!((30.0..=40.0).contains(&severity.subscores.bloom));
    assert!((30.0..=40.0).contains(&severity.subscores.turbidity));
    assert!(severity.score >= 25.0, "score {}", severity.score);
    assert_ne!(severity.label, SeverityLabel::Healthy);

    let plan = outcome.plan().expect("unmonitored site still needs a plan");
    assert_eq!(plan.deployment.total_quads, 1);
    assert!(!plan.deployment.is_phased);
    assert!(plan.deployment.phases.is_empty());
}

#[test]
fn test_large_stressed_waterbody_gets_scale_quad() {
    let outcome = plan(unmonitored(600.0));
    let plan = outcome.plan().expect("stressed site is planned");
    assert_eq!(plan.severity.label, SeverityLabel::Stressed);
    assert_eq!(plan.deployment.total_quads, 2);
    assert!(plan.deployment.is_phased);
    assert_eq!(plan.deployment.phases.len(), 2);
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

#[test]
fn test_stressed_tier_sizing_exact() {
    let plan = plan(unmonitored(500.0));
    let deployment = plan.deployment();
    assert_eq!(deployment.total_quads, 1);
    assert_eq!(deployment.total_units, 4);
    assert_eq!(deployment.total_gpm, 200);
    assert_eq!(deployment.annual_cost, 800_000);
}

#[test]
fn test_scale_modifier_adds_exactly_one_quad() {
    let small = site("PA", "5", &[], vec![reading(ParameterKey::DissolvedOxygen, 1.0, 3)], 499.0);
    let large = SiteInput { estimated_acres: 501.0, ..small.clone() };

    let small_plan = plan(small).deployment();
    let large_plan = plan(large).deployment();
    assert_eq!(large_plan.total_quads, small_plan.total_quads + 1);
}

// ---------------------------------------------------------------------------
// Floors and short-circuit
// ---------------------------------------------------------------------------

#[test]
fn test_stale_cat5_site_floors_at_seventy() {
    // Readings that look clean but are two years old.
    let readings = vec![
        reading(ParameterKey::DissolvedOxygen, 9.0, 700),
        reading(ParameterKey::Chlorophyll, 2.0, 700),
        reading(ParameterKey::Turbidity, 1.0, 700),
        reading(ParameterKey::TotalNitrogen, 0.2, 700),
    ];
    let outcome = plan(site("PA", "5", &["Mercury"], readings, 30.0));
    let severity = outcome.severity();
    assert!(severity.score >= 70.0, "score {}", severity.score);
    assert_eq!(severity.floor_applied, Some(FloorRule::Cat5MonitoringGap));
}

#[test]
fn test_stale_impaired_site_never_healthy() {
    let readings = vec![
        reading(ParameterKey::DissolvedOxygen, 9.0, 400),
        reading(ParameterKey::Chlorophyll, 2.0, 400),
    ];
    let outcome = plan(site("PA", "4a", &[], readings, 30.0));
    assert!(outcome.severity().score >= 50.0);
    assert!(outcome.plan().is_some());
}

#[test]
fn test_healthy_site_has_no_deployment() {
    let readings = ParameterKey::ALL
        .iter()
        .map(|k| {
            let value = match k {
                ParameterKey::DissolvedOxygen => 8.5,
                ParameterKey::Chlorophyll => 4.0,
                ParameterKey::Turbidity => 3.0,
                ParameterKey::TotalNitrogen => 0.4,
                ParameterKey::TotalPhosphorus => 0.02,
                ParameterKey::Bacteria => 15.0,
                _ => 7.0,
            };
            reading(*k, value, 1)
        })
        .collect();

    let outcome = plan(site("MD", "1", &[], readings, 800.0));
    assert!(outcome.severity().score < 25.0);
    assert!(matches!(outcome, RestorationOutcome::NoActionRequired { .. }));
    let deployment = outcome.deployment();
    assert_eq!(deployment.total_quads, 0);
    assert!(deployment.phases.is_empty());
}

// ---------------------------------------------------------------------------
// Impairment resolution through the pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_bulk_record_fills_missing_per_site_category() {
    let input = SiteInput {
        per_site: RecordState::Loading,
        bulk: RecordState::Resolved(
            ImpairmentRecord::with_category("Category 5").causes(&["Sedimentation/Siltation"]),
        ),
        ..site("PA", "1", &[], vec![reading(ParameterKey::Turbidity, 80.0, 10)], 40.0)
    };
    let assessment = SiteAssessment::build(input, &ProfileRegistry::builtin(), now()).unwrap();
    assert!(assessment.impairment.is_cat5());

    let outcome = compute_restoration_plan(&assessment).unwrap();
    let plan = outcome.plan().expect("cat 5 site is planned");
    assert_eq!(plan.drivers.dominant, DominantDriver::Sediment);
}

#[test]
fn test_legacy_alert_level_used_without_records() {
    let input = SiteInput {
        per_site: RecordState::Absent,
        alert_level: Some(AlertLevel::High),
        ..unmonitored(40.0)
    };
    let outcome = plan(input);
    assert_eq!(outcome.severity().subscores.impairment, 100.0);
}

#[test]
fn test_enterococcus_exceedance_makes_pathogen_the_driver() {
    let enterococcus = reading(ParameterKey::Bacteria, 200.0, 10)
        .with_indicator(BacteriaIndicator::Enterococcus);
    let outcome = plan(site("PA", "5", &[], vec![enterococcus], 900.0));
    let plan = outcome.plan().expect("cat 5 site is planned");
    assert!(plan.severity.bands.bacteria_exceeded);
    assert_eq!(plan.drivers.dominant, DominantDriver::Pathogen);
    assert_eq!(plan.deployment.phases[0].mission_label, "Primary Pathogen Treatment");
}

#[test]
fn test_many_causes_and_gap_shape_justifications() {
    let input = SiteInput {
        per_site: RecordState::Resolved(
            ImpairmentRecord::with_category("5")
                .causes(&["Escherichia coli", "Mercury", "PCBs", "Trash"]),
        ),
        ..unmonitored(900.0)
    };
    let outcome = plan(input);
    let plan = outcome.plan().expect("planned");
    assert_eq!(plan.drivers.dominant, DominantDriver::Pathogen);
    assert_eq!(plan.deployment.phases[0].mission_label, "Primary Pathogen Treatment");

    let phases = &plan.deployment.phases;
    assert!(phases.len() >= 3);
    assert!(phases[2].justification_text.contains("multiple listed"));
    for phase in phases {
        assert!(
            phase.justification_text.contains("monitoring continuity"),
            "phase {} lacks continuity clause",
            phase.index
        );
    }
}

// ---------------------------------------------------------------------------
// Validation and invariants
// ---------------------------------------------------------------------------

#[test]
fn test_negative_acreage_fails_fast() {
    let result = plan_site(unmonitored(-1.0), &ProfileRegistry::builtin(), PARAMETER_SLOTS, now());
    assert_eq!(result, Err(PlanError::NegativeAcreage(-1.0)));
}

#[test]
fn test_nan_reading_fails_fast() {
    let readings = vec![reading(ParameterKey::DissolvedOxygen, f64::NAN, 1)];
    let input = site("PA", "5", &[], readings, 10.0);
    let result = plan_site(input, &ProfileRegistry::builtin(), PARAMETER_SLOTS, now());
    assert!(matches!(result, Err(PlanError::NonFiniteReading { .. })));
}

#[test]
fn test_phase_units_and_ranges_hold_for_every_tier() {
    for acres in [10.0, 900.0] {
        for category in ["1", "3", "4a", "5"] {
            let readings = vec![reading(ParameterKey::DissolvedOxygen, 4.0, 20)];
            let outcome = plan(site("PA", category, &["Nutrients"], readings, acres));
            let Some(plan) = outcome.plan() else { continue };

            if plan.deployment.is_phased {
                let units: u32 = plan.deployment.phases.iter().map(|p| p.unit_count).sum();
                assert_eq!(units, plan.deployment.total_units);
                let cost: u64 = plan.deployment.phases.iter().map(|p| p.annual_cost).sum();
                assert_eq!(cost, plan.deployment.annual_cost);
            }

            let econ = &plan.economics;
            for range in [
                econ.traditional_baseline_range,
                econ.compliance_savings_range,
                econ.grant_offset_range,
                econ.effective_net_cost_range,
            ] {
                assert!(range.low <= range.high);
            }
        }
    }
}

#[test]
fn test_outcome_json_shape() {
    let outcome = plan(unmonitored(600.0));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "planned");
    assert_eq!(json["deployment"]["totalQuads"], 2);
    assert_eq!(json["severity"]["label"], "stressed");
    assert!(json["economics"]["effectiveNetCostRange"]["low"].is_u64());
}
