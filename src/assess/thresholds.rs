//! Parameter severity classification.
//!
//! Converts the raw readings for a site into one categorical band per
//! parameter family, using the breakpoints of the selected
//! [`ThresholdProfile`]. A missing reading is never guessed at; it becomes
//! `Unknown` and the composite scorer decides how much risk that implies.

use serde::Serialize;

use crate::model::{ParameterKey, ParameterReading, PlanError, find_reading};
use crate::profiles::ThresholdProfile;

/// Dissolved oxygen bands, mg/L. Lower readings are worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoBand {
    Unknown,
    Adequate,
    Stressed,
    Critical,
}

/// Chlorophyll-a bloom bands, µg/L, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomBand {
    Unknown,
    Normal,
    Bloom,
    Significant,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurbidityBand {
    Unknown,
    Clear,
    Elevated,
    Impaired,
}

/// Nutrient (TN/TP) bands, mg/L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientBand {
    Unknown,
    Normal,
    Elevated,
    Excessive,
}

/// The classified state of one site, plus the profile that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBands {
    pub dissolved_oxygen: DoBand,
    pub bloom: BloomBand,
    pub turbidity: TurbidityBand,
    pub nutrients: NutrientBand,
    /// Whether the bacteria reading meets the screening level for its organism.
    pub bacteria_exceeded: bool,
    pub profile_id: String,
    pub profile_source: String,
}

impl ParameterBands {
    /// Audit text naming the breakpoints used, e.g. `"thresholds: EPA ..."`.
    pub fn audit_label(&self) -> String {
        format!("thresholds: {}", self.profile_source)
    }
}

/// Classifies every parameter family the scorer consumes.
///
/// Returns an error if any supplied reading is NaN or infinite; absent
/// readings are not errors.
pub fn classify_parameters(
    readings: &[ParameterReading],
    profile: &ThresholdProfile,
) -> Result<ParameterBands, PlanError> {
    for reading in readings {
        if !reading.value.is_finite() {
            return Err(PlanError::NonFiniteReading { key: reading.key });
        }
    }

    let value_of = |key| find_reading(readings, key).map(|r| r.value);

    Ok(ParameterBands {
        dissolved_oxygen: classify_do(value_of(ParameterKey::DissolvedOxygen), profile),
        bloom: classify_bloom(value_of(ParameterKey::Chlorophyll), profile),
        turbidity: classify_turbidity(value_of(ParameterKey::Turbidity), profile),
        nutrients: classify_nutrients(
            value_of(ParameterKey::TotalNitrogen),
            value_of(ParameterKey::TotalPhosphorus),
            profile,
        ),
        bacteria_exceeded: find_reading(readings, ParameterKey::Bacteria)
            .is_some_and(|r| r.value >= profile.bacteria.screening_level(r.indicator)),
        profile_id: profile.id.clone(),
        profile_source: profile.source.clone(),
    })
}

pub fn classify_do(value: Option<f64>, profile: &ThresholdProfile) -> DoBand {
    let t = &profile.dissolved_oxygen;
    match value {
        None => DoBand::Unknown,
        Some(v) if v <= t.critical_mg_l => DoBand::Critical,
        Some(v) if v <= t.stressed_mg_l => DoBand::Stressed,
        Some(_) => DoBand::Adequate,
    }
}

pub fn classify_bloom(value: Option<f64>, profile: &ThresholdProfile) -> BloomBand {
    let t = &profile.bloom;
    match value {
        None => BloomBand::Unknown,
        Some(v) if v >= t.severe_ug_l => BloomBand::Severe,
        Some(v) if v >= t.significant_ug_l => BloomBand::Significant,
        Some(v) if v >= t.bloom_ug_l => BloomBand::Bloom,
        Some(_) => BloomBand::Normal,
    }
}

pub fn classify_turbidity(value: Option<f64>, profile: &ThresholdProfile) -> TurbidityBand {
    let t = &profile.turbidity;
    match value {
        None => TurbidityBand::Unknown,
        Some(v) if v >= t.impaired_fnu => TurbidityBand::Impaired,
        Some(v) if v >= t.elevated_fnu => TurbidityBand::Elevated,
        Some(_) => TurbidityBand::Clear,
    }
}

/// Classifies nutrients from TN when present, otherwise from TP.
pub fn classify_nutrients(
    total_nitrogen: Option<f64>,
    total_phosphorus: Option<f64>,
    profile: &ThresholdProfile,
) -> NutrientBand {
    let n = &profile.nutrients;
    let (value, elevated, excessive) = match (total_nitrogen, total_phosphorus) {
        (Some(tn), _) => (tn, n.tn_elevated_mg_l, n.tn_excessive_mg_l),
        (None, Some(tp)) => (tp, n.tp_elevated_mg_l, n.tp_excessive_mg_l),
        (None, None) => return NutrientBand::Unknown,
    };
    if value >= excessive {
        NutrientBand::Excessive
    } else if value >= elevated {
        NutrientBand::Elevated
    } else {
        NutrientBand::Normal
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
