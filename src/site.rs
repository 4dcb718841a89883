//! Site assessment: the aggregate root handed to the scoring pipeline.
//!
//! [`SiteInput`] is what callers send (already-fetched readings and
//! regulatory records). [`SiteAssessment::build`] validates it, resolves
//! impairment, selects the threshold profile and fixes the assessment time,
//! so every later stage is a pure function of one immutable value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assess::freshness::data_age_days;
use crate::assess::impairment::{ImpairmentStatus, resolve_impairment};
use crate::model::{
    AcreageSource, AlertLevel, PARAMETER_SLOTS, ParameterReading, PlanError, RecordState,
    WaterType,
};
use crate::profiles::{ProfileRegistry, ThresholdProfile};

/// Caller-supplied description of one waterbody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInput {
    pub region_name: String,
    pub state_abbr: String,
    #[serde(default)]
    pub water_type: WaterType,
    #[serde(default)]
    pub per_site: RecordState,
    #[serde(default)]
    pub bulk: RecordState,
    #[serde(default)]
    pub alert_level: Option<AlertLevel>,
    #[serde(default)]
    pub readings: Vec<ParameterReading>,
    pub estimated_acres: f64,
    #[serde(default)]
    pub acreage_source: AcreageSource,
}

/// A validated, fully resolved site. Rebuilt on every planning request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAssessment {
    pub region_name: String,
    pub state_abbr: String,
    pub water_type: WaterType,
    pub impairment: ImpairmentStatus,
    pub readings: Vec<ParameterReading>,
    /// Age of the oldest dated reading, `None` when nothing is dated.
    pub data_age_days: Option<u32>,
    pub estimated_acres: f64,
    pub acreage_source: AcreageSource,
    pub profile: ThresholdProfile,
    pub parameter_slots: usize,
    pub assessed_at: DateTime<Utc>,
}

impl SiteAssessment {
    /// Validates `input` and resolves everything the scorer needs.
    ///
    /// Fails fast on negative or non-finite acreage, non-finite readings and
    /// duplicate readings for one key.
    pub fn build(
        input: SiteInput,
        registry: &ProfileRegistry,
        now: DateTime<Utc>,
    ) -> Result<SiteAssessment, PlanError> {
        Self::build_with_slots(input, registry, PARAMETER_SLOTS, now)
    }

    pub fn build_with_slots(
        input: SiteInput,
        registry: &ProfileRegistry,
        parameter_slots: usize,
        now: DateTime<Utc>,
    ) -> Result<SiteAssessment, PlanError> {
        validate_acreage(input.estimated_acres)?;
        validate_readings(&input.readings)?;
        if parameter_slots == 0 {
            return Err(PlanError::InvalidParameterSlots);
        }

        let impairment = resolve_impairment(&input.per_site, &input.bulk, input.alert_level);
        let profile = registry.select(&input.state_abbr, input.water_type);
        let data_age_days = data_age_days(&input.readings, now);

        Ok(SiteAssessment {
            region_name: input.region_name,
            state_abbr: input.state_abbr.trim().to_ascii_uppercase(),
            water_type: input.water_type,
            impairment,
            readings: input.readings,
            data_age_days,
            estimated_acres: input.estimated_acres,
            acreage_source: input.acreage_source,
            profile,
            parameter_slots,
            assessed_at: now,
        })
    }
}

pub fn validate_acreage(acres: f64) -> Result<(), PlanError> {
    if !acres.is_finite() {
        return Err(PlanError::NonFiniteAcreage);
    }
    if acres < 0.0 {
        return Err(PlanError::NegativeAcreage(acres));
    }
    Ok(())
}

fn validate_readings(readings: &[ParameterReading]) -> Result<(), PlanError> {
    let mut seen = std::collections::HashSet::new();
    for reading in readings {
        if !reading.value.is_finite() {
            return Err(PlanError::NonFiniteReading { key: reading.key });
        }
        if !seen.insert(reading.key) {
            return Err(PlanError::DuplicateReading { key: reading.key });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
