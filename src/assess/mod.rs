/// Per-signal assessment of a site, ahead of composite scoring.
///
/// Submodules:
/// - `thresholds`: readings → severity bands per threshold profile.
/// - `impairment`: per-site / bulk regulatory records → one category.
/// - `freshness` : coverage and recency of the parameter set.

pub mod freshness;
pub mod impairment;
pub mod thresholds;
