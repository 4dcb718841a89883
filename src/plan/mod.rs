/// Restoration deployment planning, downstream of severity scoring.
///
/// Submodules:
/// - `sizing`   : severity tier + acreage → quads, units, GPM, annual cost.
/// - `rollout`  : dominant driver and phase sequencing.
/// - `templates`: `(driver, phase)` mission and justification text.
/// - `economics`: traditional baseline, savings, grants, net cost ranges.

pub mod economics;
pub mod rollout;
pub mod sizing;
pub mod templates;
