/// Core data types for the PIN restoration planning engine.
///
/// This module defines the shared domain model imported by all other modules:
/// parameter readings, regulatory impairment records, and the hard
/// validation error raised when input cannot be planned against.
/// It contains no scoring logic and performs no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parameter keys
// ---------------------------------------------------------------------------

/// Every water-quality parameter the dashboard can display.
///
/// The serialized names match the parameter keys used by the upstream
/// aggregation pipeline (`"DO"`, `"TN"`, `"chlorophyll"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKey {
    #[serde(rename = "DO")]
    DissolvedOxygen,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "turbidity")]
    Turbidity,
    #[serde(rename = "TSS")]
    SuspendedSolids,
    #[serde(rename = "TN")]
    TotalNitrogen,
    #[serde(rename = "TP")]
    TotalPhosphorus,
    #[serde(rename = "bacteria")]
    Bacteria,
    #[serde(rename = "chlorophyll")]
    Chlorophyll,
    #[serde(rename = "conductivity")]
    Conductivity,
    #[serde(rename = "salinity")]
    Salinity,
    #[serde(rename = "secchi")]
    Secchi,
}

impl ParameterKey {
    /// All displayable keys, in dashboard order.
    pub const ALL: [ParameterKey; 12] = [
        ParameterKey::DissolvedOxygen,
        ParameterKey::Temperature,
        ParameterKey::Ph,
        ParameterKey::Turbidity,
        ParameterKey::SuspendedSolids,
        ParameterKey::TotalNitrogen,
        ParameterKey::TotalPhosphorus,
        ParameterKey::Bacteria,
        ParameterKey::Chlorophyll,
        ParameterKey::Conductivity,
        ParameterKey::Salinity,
        ParameterKey::Secchi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::DissolvedOxygen => "DO",
            ParameterKey::Temperature => "temperature",
            ParameterKey::Ph => "pH",
            ParameterKey::Turbidity => "turbidity",
            ParameterKey::SuspendedSolids => "TSS",
            ParameterKey::TotalNitrogen => "TN",
            ParameterKey::TotalPhosphorus => "TP",
            ParameterKey::Bacteria => "bacteria",
            ParameterKey::Chlorophyll => "chlorophyll",
            ParameterKey::Conductivity => "conductivity",
            ParameterKey::Salinity => "salinity",
            ParameterKey::Secchi => "secchi",
        }
    }

    /// Maps a Water Quality Portal `CharacteristicName` onto a parameter key.
    ///
    /// Several characteristics collapse onto one key (all nitrogen forms are
    /// `TN`, every fecal indicator organism is `bacteria`; see
    /// [`BacteriaIndicator`] for the organism). Returns `None`
    /// for characteristics the dashboard does not display.
    pub fn from_characteristic(name: &str) -> Option<ParameterKey> {
        let key = match name.trim() {
            "Dissolved oxygen (DO)" => ParameterKey::DissolvedOxygen,
            "Temperature, water" => ParameterKey::Temperature,
            "pH" => ParameterKey::Ph,
            "Turbidity" => ParameterKey::Turbidity,
            "Total suspended solids" => ParameterKey::SuspendedSolids,
            "Nitrogen, mixed forms (NH3), (NH4), organic, (NO2) and (NO3)"
            | "Total Nitrogen, mixed forms"
            | "Nitrogen"
            | "Nitrate"
            | "Nitrite"
            | "Ammonia" => ParameterKey::TotalNitrogen,
            "Phosphorus" => ParameterKey::TotalPhosphorus,
            "Escherichia coli" | "Enterococcus" | "Fecal Coliform" => ParameterKey::Bacteria,
            "Chlorophyll a" => ParameterKey::Chlorophyll,
            "Specific conductance" | "Conductivity" => ParameterKey::Conductivity,
            "Salinity" => ParameterKey::Salinity,
            "Secchi depth" => ParameterKey::Secchi,
            _ => return None,
        };
        Some(key)
    }
}

impl std::fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fecal indicator organism behind a `bacteria` reading. Each organism is
/// screened against its own criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BacteriaIndicator {
    EColi,
    Enterococcus,
    FecalColiform,
}

impl BacteriaIndicator {
    pub fn from_characteristic(name: &str) -> Option<BacteriaIndicator> {
        match name.trim() {
            "Escherichia coli" => Some(BacteriaIndicator::EColi),
            "Enterococcus" => Some(BacteriaIndicator::Enterococcus),
            "Fecal Coliform" => Some(BacteriaIndicator::FecalColiform),
            _ => None,
        }
    }
}

/// Number of parameter slots the dashboard can display for one site.
pub const PARAMETER_SLOTS: usize = ParameterKey::ALL.len();

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// The resolved value of one parameter for one site, as of one assessment run.
///
/// Upstream aggregation has already reconciled multiple sources, so the
/// engine sees at most one reading per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReading {
    pub key: ParameterKey,
    pub value: f64,
    pub unit: String,
    pub source: String, // e.g. "WQP", "USGS", "CEDEN"
    #[serde(default)]
    pub last_sampled: Option<DateTime<Utc>>,
    /// Only meaningful for `bacteria`; unlabeled readings screen as E. coli.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<BacteriaIndicator>,
}

impl ParameterReading {
    pub fn new(key: ParameterKey, value: f64, unit: &str, source: &str) -> Self {
        Self {
            key,
            value,
            unit: unit.to_string(),
            source: source.to_string(),
            last_sampled: None,
            indicator: None,
        }
    }

    pub fn sampled_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_sampled = Some(at);
        self
    }

    pub fn with_indicator(mut self, indicator: BacteriaIndicator) -> Self {
        self.indicator = Some(indicator);
        self
    }
}

/// Finds the reading for `key`, if one was supplied.
pub fn find_reading(readings: &[ParameterReading], key: ParameterKey) -> Option<&ParameterReading> {
    readings.iter().find(|r| r.key == key)
}

// ---------------------------------------------------------------------------
// Site descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterType {
    #[default]
    Freshwater,
    Brackish,
}

/// Where the acreage figure for a waterbody came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcreageSource {
    /// Reported directly by the assessment unit record.
    Reported,
    /// Derived from mapped waterbody geometry.
    Geometry,
    /// Regional default used when nothing better was available.
    #[default]
    Assumed,
}

/// The dashboard's legacy four-level alert, used only as a last-resort
/// source for an impairment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Low,
    Medium,
    High,
}

impl AlertLevel {
    /// Placeholder EPA IR category implied by a legacy alert level.
    pub fn implied_category(&self) -> &'static str {
        match self {
            AlertLevel::High => "5",
            AlertLevel::Medium => "4a",
            AlertLevel::Low => "3",
            AlertLevel::None => "1",
        }
    }
}

// ---------------------------------------------------------------------------
// Impairment records
// ---------------------------------------------------------------------------

/// One regulatory impairment record, either per-site or bulk/statewide.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpairmentRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub cycle: Option<String>,
    /// Explicit TMDL flag from the upstream record, when it carries one.
    #[serde(default)]
    pub has_tmdl: Option<bool>,
}

impl ImpairmentRecord {
    pub fn with_category(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    pub fn causes(mut self, causes: &[&str]) -> Self {
        self.causes = causes.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Availability of one candidate impairment record at planning time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "record", rename_all = "lowercase")]
pub enum RecordState {
    Resolved(ImpairmentRecord),
    /// The upstream request had not completed when planning was requested.
    Loading,
    #[default]
    Absent,
}

impl RecordState {
    pub fn record(&self) -> Option<&ImpairmentRecord> {
        match self {
            RecordState::Resolved(record) => Some(record),
            RecordState::Loading | RecordState::Absent => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Input that cannot be planned against. The engine never returns a partial
/// plan alongside one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Acreage below zero.
    NegativeAcreage(f64),
    /// Acreage was NaN or infinite.
    NonFiniteAcreage,
    /// A parameter reading carried NaN or an infinite value.
    NonFiniteReading { key: ParameterKey },
    /// More than one reading was supplied for the same key.
    DuplicateReading { key: ParameterKey },
    /// The parameter slot count must be at least one.
    InvalidParameterSlots,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::NegativeAcreage(acres) => {
                write!(f, "Invalid acreage: {} (must be zero or greater)", acres)
            }
            PlanError::NonFiniteAcreage => write!(f, "Invalid acreage: not a finite number"),
            PlanError::NonFiniteReading { key } => {
                write!(f, "Invalid reading for {}: not a finite number", key)
            }
            PlanError::DuplicateReading { key } => {
                write!(f, "Duplicate reading for {}: expected one per parameter", key)
            }
            PlanError::InvalidParameterSlots => {
                write!(f, "Invalid parameter slot count: must be at least 1")
            }
        }
    }
}

impl std::error::Error for PlanError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
