//! Composite site severity scoring.
//!
//! Fuses the classified parameter bands, resolved impairment and data
//! freshness into one 0–100 severity score (higher is worse), then applies
//! floor overrides so an impaired site with a long monitoring gap can never
//! present as healthy.
//!
//! # Weights
//! - 25% dissolved oxygen
//! - 25% bloom / nutrients (worse of the two)
//! - 15% turbidity
//! - 20% regulatory impairment
//! - 15% monitoring gap
//!
//! Unknown bands score above "good": missing data counts as risk.

use serde::Serialize;
use tracing::{debug, warn};

use crate::assess::freshness::{FreshnessResult, evaluate_freshness};
use crate::assess::impairment::ImpairmentStatus;
use crate::assess::thresholds::{
    BloomBand, DoBand, NutrientBand, ParameterBands, TurbidityBand, classify_parameters,
};
use crate::logging::Stage;
use crate::model::PlanError;
use crate::site::SiteAssessment;

pub const WEIGHT_DO: f64 = 0.25;
pub const WEIGHT_BLOOM: f64 = 0.25;
pub const WEIGHT_TURBIDITY: f64 = 0.15;
pub const WEIGHT_IMPAIRMENT: f64 = 0.20;
pub const WEIGHT_MONITORING_GAP: f64 = 0.15;

/// Impaired sites with no data for more than this many days floor at 50.
pub const IMPAIRED_STALE_DAYS: u32 = 365;
pub const IMPAIRED_FLOOR: f64 = 50.0;

/// Category 5 sites with no data for more than this many days floor at 70.
pub const CAT5_STALE_DAYS: u32 = 180;
pub const CAT5_FLOOR: f64 = 70.0;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Severity tiers, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLabel {
    Healthy,
    Stressed,
    Degraded,
    Critical,
}

impl SeverityLabel {
    pub fn from_score(score: f64) -> SeverityLabel {
        if score >= 75.0 {
            SeverityLabel::Critical
        } else if score >= 50.0 {
            SeverityLabel::Degraded
        } else if score >= 25.0 {
            SeverityLabel::Stressed
        } else {
            SeverityLabel::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::Healthy => "healthy",
            SeverityLabel::Stressed => "stressed",
            SeverityLabel::Degraded => "degraded",
            SeverityLabel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-component scores, each 0–100, before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscores {
    pub dissolved_oxygen: f64,
    pub bloom: f64,
    pub turbidity: f64,
    pub impairment: f64,
    pub monitoring_gap: f64,
}

impl Subscores {
    pub fn weighted_sum(&self) -> f64 {
        self.dissolved_oxygen * WEIGHT_DO
            + self.bloom * WEIGHT_BLOOM
            + self.turbidity * WEIGHT_TURBIDITY
            + self.impairment * WEIGHT_IMPAIRMENT
            + self.monitoring_gap * WEIGHT_MONITORING_GAP
    }
}

/// A floor override that raised the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloorRule {
    /// Impaired (Category 4/5) with more than a year since the last sample.
    ImpairedMonitoringGap,
    /// Category 5 with more than six months since the last sample.
    Cat5MonitoringGap,
}

/// Letter grade of the PIN Water Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

/// Grades a PIN Water Score (100 = pristine).
pub fn calculate_grade(water_score: f64) -> Grade {
    if water_score >= 90.0 {
        Grade::A
    } else if water_score >= 80.0 {
        Grade::B
    } else if water_score >= 70.0 {
        Grade::C
    } else if water_score >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityResult {
    /// Composite severity, 0–100, after floors.
    pub score: f64,
    pub label: SeverityLabel,
    pub subscores: Subscores,
    pub floor_applied: Option<FloorRule>,
    /// Inverse of `score`, as shown on the dashboard's detail cards.
    pub water_score: f64,
    pub grade: Grade,
    pub bands: ParameterBands,
    pub freshness: FreshnessResult,
}

impl SeverityResult {
    pub fn is_healthy(&self) -> bool {
        self.label == SeverityLabel::Healthy
    }
}

// ---------------------------------------------------------------------------
// Subscore tables
// ---------------------------------------------------------------------------

pub fn do_subscore(band: DoBand) -> f64 {
    match band {
        DoBand::Critical => 100.0,
        DoBand::Stressed => 60.0,
        DoBand::Adequate => 10.0,
        DoBand::Unknown => 40.0,
    }
}

fn bloom_band_score(band: BloomBand) -> f64 {
    match band {
        BloomBand::Severe => 100.0,
        BloomBand::Significant => 70.0,
        BloomBand::Bloom => 45.0,
        BloomBand::Normal => 10.0,
        BloomBand::Unknown => 35.0,
    }
}

fn nutrient_band_score(band: NutrientBand) -> f64 {
    match band {
        NutrientBand::Excessive => 100.0,
        NutrientBand::Elevated => 70.0,
        NutrientBand::Normal => 10.0,
        NutrientBand::Unknown => 35.0,
    }
}

/// The worse of the bloom and nutrient scores.
pub fn bloom_subscore(bloom: BloomBand, nutrients: NutrientBand) -> f64 {
    bloom_band_score(bloom).max(nutrient_band_score(nutrients))
}

pub fn turbidity_subscore(band: TurbidityBand) -> f64 {
    match band {
        TurbidityBand::Impaired => 100.0,
        TurbidityBand::Elevated => 55.0,
        TurbidityBand::Clear => 10.0,
        TurbidityBand::Unknown => 30.0,
    }
}

/// Scores the resolved category. An unavailable record scores as Category 3,
/// EPA's insufficient-information bucket.
pub fn impairment_subscore(impairment: &ImpairmentStatus) -> f64 {
    let category = impairment.resolved().map(|r| r.category_number()).unwrap_or(3);
    match category {
        5 => 100.0,
        4 => 70.0,
        3 => 40.0,
        2 => 15.0,
        _ => 5.0,
    }
}

pub fn monitoring_gap_subscore(freshness: &FreshnessResult) -> f64 {
    (100.0 - freshness.score).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Floors
// ---------------------------------------------------------------------------

fn gap_exceeds(data_age_days: Option<u32>, limit: u32) -> bool {
    // Never sampled is the longest gap there is.
    data_age_days.is_none_or(|d| d > limit)
}

/// Applies the monitoring-gap floors. Never lowers `score`.
pub fn apply_floors(
    score: f64,
    impairment: &ImpairmentStatus,
    data_age_days: Option<u32>,
) -> (f64, Option<FloorRule>) {
    let mut floored = score;
    let mut rule = None;

    if impairment.is_impaired()
        && gap_exceeds(data_age_days, IMPAIRED_STALE_DAYS)
        && floored < IMPAIRED_FLOOR
    {
        floored = IMPAIRED_FLOOR;
        rule = Some(FloorRule::ImpairedMonitoringGap);
    }
    if impairment.is_cat5() && gap_exceeds(data_age_days, CAT5_STALE_DAYS) && floored < CAT5_FLOOR {
        floored = CAT5_FLOOR;
        rule = Some(FloorRule::Cat5MonitoringGap);
    }
    (floored, rule)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Scores one site.
pub fn score_severity(site: &SiteAssessment) -> Result<SeverityResult, PlanError> {
    let bands = classify_parameters(&site.readings, &site.profile)?;
    let freshness = evaluate_freshness(&site.readings, site.parameter_slots, site.assessed_at);

    let subscores = Subscores {
        dissolved_oxygen: do_subscore(bands.dissolved_oxygen),
        bloom: bloom_subscore(bands.bloom, bands.nutrients),
        turbidity: turbidity_subscore(bands.turbidity),
        impairment: impairment_subscore(&site.impairment),
        monitoring_gap: monitoring_gap_subscore(&freshness),
    };

    let weighted = subscores.weighted_sum().clamp(0.0, 100.0);
    let (floored, floor_applied) = apply_floors(weighted, &site.impairment, site.data_age_days);
    let score = (floored * 10.0).round() / 10.0;

    if let Some(rule) = floor_applied {
        warn!(
            stage = %Stage::Score,
            region = %site.region_name,
            weighted,
            floor = ?rule,
            "monitoring gap floor raised severity score"
        );
    }

    let label = SeverityLabel::from_score(score);
    let water_score = 100.0 - score;
    debug!(
        stage = %Stage::Classify,
        region = %site.region_name,
        profile = %bands.profile_id,
        "parameters classified"
    );
    debug!(
        stage = %Stage::Score,
        region = %site.region_name,
        score,
        label = %label,
        "severity scored"
    );

    Ok(SeverityResult {
        score,
        label,
        subscores,
        floor_applied,
        water_score,
        grade: calculate_grade(water_score),
        bands,
        freshness,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
