/// Parameter coverage and recency scoring.
///
/// Upstream sources sample on very different cadences: continuous sondes
/// report every 15 minutes, state grab-sample programs may visit a station
/// once a season. A full parameter set that is two years old says little
/// about today's conditions, so coverage is weighted by how recent each
/// reading is.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This keeps scoring purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ParameterReading;

/// Readings at most this old carry full weight.
pub const FULL_WEIGHT_DAYS: u32 = 7;

/// Readings this old or older carry only [`MIN_RECENCY_WEIGHT`].
pub const DECAYED_DAYS: u32 = 180;

/// Residual weight of a very old or undated reading. It still shows the
/// parameter is monitored, but barely counts toward coverage.
pub const MIN_RECENCY_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

/// Usability bracket for the oldest reading on a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBracket {
    /// Less than two years old.
    DecisionGrade,
    /// Two to five years.
    TrendAnalysis,
    /// Five to ten years.
    Supplemental,
    /// Ten years or more.
    Historical,
    /// No dated readings at all.
    Never,
}

impl AgeBracket {
    pub fn from_age_days(age_days: Option<u32>) -> AgeBracket {
        match age_days {
            None => AgeBracket::Never,
            Some(d) if d < 730 => AgeBracket::DecisionGrade,
            Some(d) if d < 1825 => AgeBracket::TrendAnalysis,
            Some(d) if d < 3650 => AgeBracket::Supplemental,
            Some(_) => AgeBracket::Historical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessResult {
    pub populated: usize,
    pub total: usize,
    /// Recency-weighted coverage, 0 to 100.
    pub score: f64,
    pub confidence: Confidence,
    /// Age of the oldest dated reading, in whole days.
    pub max_age_days: Option<u32>,
    pub age_bracket: AgeBracket,
}

// ---------------------------------------------------------------------------
// Age and staleness
// ---------------------------------------------------------------------------

/// Whole days between the reading's sample time and `now`.
///
/// Returns `None` for undated readings. Sample times in the future (clock
/// skew between sources) count as zero days old.
pub fn age_days_at(reading: &ParameterReading, now: DateTime<Utc>) -> Option<u32> {
    let sampled = reading.last_sampled?;
    let days = (now - sampled).num_days().max(0);
    Some(u32::try_from(days).unwrap_or(u32::MAX))
}

/// Returns `true` if the reading is older than `max_age_days` relative to
/// `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_days  →  stale
///   age == max_age_days →  not stale
///
/// Undated readings are always stale.
pub fn is_stale_at(reading: &ParameterReading, max_age_days: u32, now: DateTime<Utc>) -> bool {
    match age_days_at(reading, now) {
        Some(age) => age > max_age_days,
        None => true,
    }
}

/// Age of the oldest dated reading, or `None` if no reading is dated.
pub fn data_age_days(readings: &[ParameterReading], now: DateTime<Utc>) -> Option<u32> {
    readings.iter().filter_map(|r| age_days_at(r, now)).max()
}

/// Weight of one reading toward coverage: 1.0 up to a week old, decaying
/// linearly to [`MIN_RECENCY_WEIGHT`] at six months.
pub fn recency_weight(age_days: Option<u32>) -> f64 {
    match age_days {
        None => MIN_RECENCY_WEIGHT,
        Some(d) if d <= FULL_WEIGHT_DAYS => 1.0,
        Some(d) if d >= DECAYED_DAYS => MIN_RECENCY_WEIGHT,
        Some(d) => {
            let span = f64::from(DECAYED_DAYS - FULL_WEIGHT_DAYS);
            let progress = f64::from(d - FULL_WEIGHT_DAYS) / span;
            1.0 - progress * (1.0 - MIN_RECENCY_WEIGHT)
        }
    }
}

pub fn confidence_for(max_age_days: Option<u32>) -> Confidence {
    match max_age_days {
        Some(d) if d <= 30 => Confidence::High,
        Some(d) if d <= 90 => Confidence::Moderate,
        _ => Confidence::Low,
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Scores how complete and recent a site's parameter set is.
///
/// `total_slots` is the number of parameters the dashboard can display;
/// a zero slot count scores zero rather than dividing by it.
pub fn evaluate_freshness(
    readings: &[ParameterReading],
    total_slots: usize,
    now: DateTime<Utc>,
) -> FreshnessResult {
    let populated = readings.len();
    let weighted: f64 = readings
        .iter()
        .map(|r| recency_weight(age_days_at(r, now)))
        .sum();

    let score = if total_slots == 0 {
        0.0
    } else {
        (100.0 * weighted / total_slots as f64).clamp(0.0, 100.0)
    };

    let max_age_days = data_age_days(readings, now);
    let confidence = if populated == 0 {
        Confidence::Low
    } else {
        confidence_for(max_age_days)
    };

    FreshnessResult {
        populated,
        total: total_slots,
        score,
        confidence,
        max_age_days,
        age_bracket: AgeBracket::from_age_days(max_age_days),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
