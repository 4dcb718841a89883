//! Impairment record reconciliation.
//!
//! A site can have two regulatory records in flight: the per-site ATTAINS
//! assessment (authoritative, but frequently still loading) and the bulk
//! statewide listing. This module folds both, plus the legacy alert level,
//! into one category, one de-duplicated cause list and a TMDL status.

use serde::Serialize;

use crate::model::{AlertLevel, ImpairmentRecord, RecordState};

/// Where the resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryOrigin {
    PerSite,
    Bulk,
    AlertLevel,
    /// Records arrived but none carried a recognizable category.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TmdlStatus {
    /// Category 5 without an approved TMDL.
    Needed,
    Completed,
    /// Category 4b/4c: other pollution controls or non-pollutant impairment.
    Alternative,
    NotApplicable,
}

/// The single impairment view the scorer and planner consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImpairment {
    /// Normalized EPA IR category, e.g. `"5"`, `"4a"`. Never blank.
    pub category: String,
    pub causes: Vec<String>,
    pub cycle: Option<String>,
    pub origin: CategoryOrigin,
    pub tmdl_status: TmdlStatus,
}

impl ResolvedImpairment {
    pub fn is_cat5(&self) -> bool {
        self.category.contains('5')
    }

    pub fn is_impaired(&self) -> bool {
        self.category.contains('4') || self.category.contains('5')
    }

    /// Leading category digit, 1 through 5.
    pub fn category_number(&self) -> u8 {
        self.category
            .bytes()
            .find(|b| (b'1'..=b'5').contains(b))
            .map(|b| b - b'0')
            .unwrap_or(3)
    }
}

/// Outcome of resolution. `Unavailable` means neither record resolved and
/// no legacy alert level was supplied; the caller owns any retries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImpairmentStatus {
    Resolved(ResolvedImpairment),
    Unavailable,
}

impl ImpairmentStatus {
    pub fn resolved(&self) -> Option<&ResolvedImpairment> {
        match self {
            ImpairmentStatus::Resolved(r) => Some(r),
            ImpairmentStatus::Unavailable => None,
        }
    }

    pub fn is_cat5(&self) -> bool {
        self.resolved().is_some_and(ResolvedImpairment::is_cat5)
    }

    pub fn is_impaired(&self) -> bool {
        self.resolved().is_some_and(ResolvedImpairment::is_impaired)
    }

    pub fn causes(&self) -> &[String] {
        self.resolved().map(|r| r.causes.as_slice()).unwrap_or(&[])
    }
}

/// Extracts the first EPA IR category token (`[1-5][a-c]?`) from a raw
/// category string, lowercased. `"Category 4A"` yields `"4a"`.
pub fn parse_category(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let pos = bytes.iter().position(|b| (b'1'..=b'5').contains(b))?;
    let mut token = String::from(bytes[pos] as char);
    if let Some(&suffix) = bytes.get(pos + 1) {
        if (b'a'..=b'c').contains(&suffix) {
            token.push(suffix as char);
        }
    }
    Some(token)
}

/// Unions two cause lists, keeping first-seen order and dropping
/// case-insensitive duplicates. Causes from `primary` lead.
pub fn merge_causes(primary: &[String], secondary: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    for cause in primary.iter().chain(secondary) {
        let trimmed = cause.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            merged.push(trimmed.to_string());
        }
    }
    merged
}

/// Reconciles the per-site record, the bulk record and the legacy alert
/// level. Never blocks; a loading record is treated as absent.
pub fn resolve_impairment(
    per_site: &RecordState,
    bulk: &RecordState,
    legacy_level: Option<AlertLevel>,
) -> ImpairmentStatus {
    let per_site = per_site.record();
    let bulk = bulk.record();

    let from_record = |record: Option<&ImpairmentRecord>, origin| {
        record
            .and_then(|r| r.category.as_deref())
            .and_then(parse_category)
            .map(|c| (c, origin))
    };

    let resolved = from_record(per_site, CategoryOrigin::PerSite)
        .or_else(|| from_record(bulk, CategoryOrigin::Bulk))
        .or_else(|| {
            legacy_level.map(|l| (l.implied_category().to_string(), CategoryOrigin::AlertLevel))
        });

    let Some((category, origin)) = resolved else {
        if per_site.is_none() && bulk.is_none() {
            return ImpairmentStatus::Unavailable;
        }
        // Records arrived but none carried a recognizable category. Their
        // causes still count, and "3" is EPA's insufficient-information bucket.
        return ImpairmentStatus::Resolved(build(
            "3".to_string(),
            CategoryOrigin::Unrecognized,
            per_site,
            bulk,
            legacy_level,
        ));
    };

    ImpairmentStatus::Resolved(build(category, origin, per_site, bulk, legacy_level))
}

fn build(
    category: String,
    origin: CategoryOrigin,
    per_site: Option<&ImpairmentRecord>,
    bulk: Option<&ImpairmentRecord>,
    legacy_level: Option<AlertLevel>,
) -> ResolvedImpairment {
    let empty: &[String] = &[];
    let causes = merge_causes(
        per_site.map(|r| r.causes.as_slice()).unwrap_or(empty),
        bulk.map(|r| r.causes.as_slice()).unwrap_or(empty),
    );
    let cycle = per_site
        .and_then(|r| r.cycle.clone())
        .or_else(|| bulk.and_then(|r| r.cycle.clone()));
    let explicit_tmdl = per_site.and_then(|r| r.has_tmdl).or_else(|| bulk.and_then(|r| r.has_tmdl));
    let tmdl_status = tmdl_status(&category, explicit_tmdl, legacy_level);

    ResolvedImpairment {
        category,
        causes,
        cycle,
        origin,
        tmdl_status,
    }
}

/// Derives TMDL status from the category and, for Category 5, an explicit
/// TMDL flag. Without a flag the legacy level is the fallback: `medium`
/// means a TMDL is in place, anything else means one is still needed.
pub fn tmdl_status(
    category: &str,
    explicit_tmdl: Option<bool>,
    legacy_level: Option<AlertLevel>,
) -> TmdlStatus {
    if category.contains('5') {
        let has_tmdl = explicit_tmdl.unwrap_or(legacy_level == Some(AlertLevel::Medium));
        return if has_tmdl {
            TmdlStatus::Completed
        } else {
            TmdlStatus::Needed
        };
    }
    if category.contains('4') {
        return if category.ends_with('b') || category.ends_with('c') {
            TmdlStatus::Alternative
        } else {
            TmdlStatus::Completed
        };
    }
    TmdlStatus::NotApplicable
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn resolved(record: ImpairmentRecord) -> RecordState {
        RecordState::Resolved(record)
    }

    // --- Category parsing ---------------------------------------------------

    #[test]
    fn test_parse_category_extracts_token() {
        assert_eq!(parse_category("5").as_deref(), Some("5"));
        assert_eq!(parse_category("4a").as_deref(), Some("4a"));
        assert_eq!(parse_category("Category 4C").as_deref(), Some("4c"));
        assert_eq!(parse_category("IR 5m").as_deref(), Some("5"));
    }

    #[test]
    fn test_parse_category_rejects_values_without_digit() {
        assert_eq!(parse_category(""), None);
        assert_eq!(parse_category("Not assessed"), None);
        assert_eq!(parse_category("7"), None);
    }

    // --- Category priority --------------------------------------------------

    #[test]
    fn test_per_site_category_wins_over_bulk() {
        let status = resolve_impairment(
            &resolved(ImpairmentRecord::with_category("4a")),
            &resolved(ImpairmentRecord::with_category("5")),
            Some(AlertLevel::High),
        );
        let r = status.resolved().expect("resolved");
        assert_eq!(r.category, "4a");
        assert_eq!(r.origin, CategoryOrigin::PerSite);
    }

    #[test]
    fn test_loading_per_site_falls_back_to_bulk() {
        let status = resolve_impairment(
            &RecordState::Loading,
            &resolved(ImpairmentRecord::with_category("5")),
            None,
        );
        let r = status.resolved().expect("resolved");
        assert_eq!(r.category, "5");
        assert_eq!(r.origin, CategoryOrigin::Bulk);
    }

    #[test]
    fn test_invalid_per_site_category_falls_back_to_bulk() {
        let status = resolve_impairment(
            &resolved(ImpairmentRecord::with_category("Pending")),
            &resolved(ImpairmentRecord::with_category("2")),
            None,
        );
        assert_eq!(status.resolved().expect("resolved").category, "2");
    }

    #[test]
    fn test_legacy_level_used_when_no_record_resolves() {
        let legacy = Some(AlertLevel::Medium);
        let status = resolve_impairment(&RecordState::Absent, &RecordState::Loading, legacy);
        let r = status.resolved().expect("resolved");
        assert_eq!(r.category, "4a");
        assert_eq!(r.origin, CategoryOrigin::AlertLevel);
        assert_eq!(r.tmdl_status, TmdlStatus::Completed);
    }

    #[test]
    fn test_unavailable_without_records_or_level() {
        let status = resolve_impairment(&RecordState::Loading, &RecordState::Absent, None);
        assert_eq!(status, ImpairmentStatus::Unavailable);
        assert!(!status.is_impaired());
        assert!(status.causes().is_empty());
    }

    #[test]
    fn test_records_without_category_resolve_to_insufficient_information() {
        let status = resolve_impairment(
            &resolved(ImpairmentRecord::default().causes(&["Mercury"])),
            &RecordState::Absent,
            None,
        );
        let r = status.resolved().expect("resolved");
        assert_eq!(r.category, "3");
        assert_eq!(r.origin, CategoryOrigin::Unrecognized);
        assert_eq!(r.causes, strings(&["Mercury"]));
    }

    // --- Flags ---------------------------------------------------------------

    #[test]
    fn test_cat5_and_impaired_flags() {
        let per_site = |category| resolved(ImpairmentRecord::with_category(category));
        let cat5 = resolve_impairment(&per_site("5"), &RecordState::Absent, None);
        assert!(cat5.is_cat5());
        assert!(cat5.is_impaired());

        let cat4 = resolve_impairment(&per_site("4b"), &RecordState::Absent, None);
        assert!(!cat4.is_cat5());
        assert!(cat4.is_impaired());

        let cat2 = resolve_impairment(&per_site("2"), &RecordState::Absent, None);
        assert!(!cat2.is_impaired());
    }

    // --- Causes -------------------------------------------------------------

    #[test]
    fn test_merge_causes_dedupes_case_insensitively() {
        let merged = merge_causes(
            &strings(&["Nutrients", "Bacteria"]),
            &strings(&["bacteria", "Sediment", "NUTRIENTS"]),
        );
        assert_eq!(merged, strings(&["Nutrients", "Bacteria", "Sediment"]));
    }

    #[test]
    fn test_merge_causes_is_idempotent_for_repeated_bulk_source() {
        let a = strings(&["Phosphorus", "Mercury"]);
        let b = strings(&["mercury", "PCBs"]);
        let once = merge_causes(&a, &b);
        let twice = merge_causes(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_causes_drops_blank_entries() {
        let merged = merge_causes(&strings(&["", "  "]), &strings(&[" Nitrogen "]));
        assert_eq!(merged, strings(&["Nitrogen"]));
    }

    #[test]
    fn test_per_site_causes_lead_in_resolved_record() {
        let status = resolve_impairment(
            &resolved(ImpairmentRecord::with_category("5").causes(&["Bacteria"])),
            &resolved(ImpairmentRecord::with_category("5").causes(&["Nutrients", "bacteria"])),
            None,
        );
        assert_eq!(status.causes(), strings(&["Bacteria", "Nutrients"]).as_slice());
    }

    // --- TMDL status --------------------------------------------------------

    #[test]
    fn test_tmdl_status_by_category() {
        assert_eq!(tmdl_status("5", None, None), TmdlStatus::Needed);
        assert_eq!(tmdl_status("4a", None, None), TmdlStatus::Completed);
        assert_eq!(tmdl_status("4b", None, None), TmdlStatus::Alternative);
        assert_eq!(tmdl_status("4c", None, None), TmdlStatus::Alternative);
        assert_eq!(tmdl_status("2", None, None), TmdlStatus::NotApplicable);
    }

    #[test]
    fn test_explicit_tmdl_flag_overrides_legacy_inference() {
        assert_eq!(tmdl_status("5", Some(true), Some(AlertLevel::High)), TmdlStatus::Completed);
        assert_eq!(tmdl_status("5", Some(false), Some(AlertLevel::Medium)), TmdlStatus::Needed);
    }

    #[test]
    fn test_legacy_medium_implies_completed_tmdl_for_cat5() {
        assert_eq!(tmdl_status("5", None, Some(AlertLevel::Medium)), TmdlStatus::Completed);
        assert_eq!(tmdl_status("5", None, Some(AlertLevel::High)), TmdlStatus::Needed);
    }

    #[test]
    fn test_cycle_prefers_per_site_record() {
        let mut site = ImpairmentRecord::with_category("5");
        site.cycle = Some("2024".to_string());
        let mut bulk = ImpairmentRecord::with_category("5");
        bulk.cycle = Some("2022".to_string());
        let status = resolve_impairment(&resolved(site), &resolved(bulk), None);
        assert_eq!(status.resolved().and_then(|r| r.cycle.clone()).as_deref(), Some("2024"));
    }
}
