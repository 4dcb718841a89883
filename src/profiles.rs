/// Threshold profile registry for the severity classifier.
///
/// Defines the breakpoints used to turn raw readings into severity bands,
/// one named profile per jurisdiction. States with their own criteria
/// (Maryland) get a dedicated profile; every other state falls back to the
/// generic EPA-criteria profile. This is the single source of truth for
/// breakpoints: the classifier never hardcodes a number.
///
/// Profiles can be overridden or extended from a TOML file, since several
/// breakpoints (notably the chlorophyll bloom bands) are reconstructions of
/// narrative criteria rather than published constants.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{BacteriaIndicator, WaterType};

/// Identifier of the fallback profile used for any unlisted state.
pub const GENERIC_PROFILE_ID: &str = "epa-generic";

// ---------------------------------------------------------------------------
// Breakpoint groups
// ---------------------------------------------------------------------------

/// Dissolved oxygen, mg/L. Lower is worse:
/// critical <= `critical_mg_l` < stressed <= `stressed_mg_l`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoThresholds {
    pub critical_mg_l: f64,
    pub stressed_mg_l: f64,
}

/// Chlorophyll-a, µg/L, in ascending order: bloom < significant < severe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomThresholds {
    pub bloom_ug_l: f64,
    pub significant_ug_l: f64,
    pub severe_ug_l: f64,
}

/// Turbidity, FNU: elevated < impaired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurbidityThresholds {
    pub elevated_fnu: f64,
    pub impaired_fnu: f64,
}

/// Total nitrogen and total phosphorus, mg/L: elevated < excessive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientThresholds {
    pub tn_elevated_mg_l: f64,
    pub tn_excessive_mg_l: f64,
    pub tp_elevated_mg_l: f64,
    pub tp_excessive_mg_l: f64,
}

/// Fecal indicator screening levels, one per organism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacteriaThresholds {
    /// MPN/100 mL.
    pub e_coli_mpn: f64,
    /// MPN/100 mL.
    pub enterococcus_mpn: f64,
    /// CFU/100 mL.
    pub fecal_coliform_mpn: f64,
}

impl Default for BacteriaThresholds {
    fn default() -> Self {
        Self {
            e_coli_mpn: 410.0,
            enterococcus_mpn: 130.0,
            fecal_coliform_mpn: 400.0,
        }
    }
}

impl BacteriaThresholds {
    /// Screening level for a reading's organism. Unlabeled readings are
    /// screened as E. coli.
    pub fn screening_level(&self, indicator: Option<BacteriaIndicator>) -> f64 {
        match indicator {
            None | Some(BacteriaIndicator::EColi) => self.e_coli_mpn,
            Some(BacteriaIndicator::Enterococcus) => self.enterococcus_mpn,
            Some(BacteriaIndicator::FecalColiform) => self.fecal_coliform_mpn,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A named set of breakpoints for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Stable identifier, e.g. `"md-dnr"`.
    pub id: String,
    /// Citation shown in audit text ("thresholds: <source>").
    pub source: String,
    /// Two-letter state abbreviations this profile applies to. Empty for
    /// the generic profile.
    #[serde(default)]
    pub states: Vec<String>,
    pub dissolved_oxygen: DoThresholds,
    pub bloom: BloomThresholds,
    /// Alternate chlorophyll breakpoints for tidal/brackish waters.
    #[serde(default)]
    pub brackish_bloom: Option<BloomThresholds>,
    pub turbidity: TurbidityThresholds,
    pub nutrients: NutrientThresholds,
    /// Per-organism fecal indicator screening levels.
    #[serde(default)]
    pub bacteria: BacteriaThresholds,
}

impl ThresholdProfile {
    /// Returns a copy with the water-type-specific chlorophyll breakpoints
    /// swapped in, so the classifier only ever sees one bloom table.
    pub fn for_water_type(&self, water_type: WaterType) -> ThresholdProfile {
        let mut profile = self.clone();
        if water_type == WaterType::Brackish {
            if let Some(brackish) = self.brackish_bloom {
                profile.bloom = brackish;
            }
        }
        profile
    }

    /// Checks that every breakpoint group is positive and strictly ascending.
    ///
    /// A profile with `bloom >= significant` would let a severe reading
    /// classify as a mere bloom.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let fail = |reason: &str| {
            Err(ProfileError {
                profile_id: self.id.clone(),
                reason: reason.to_string(),
            })
        };

        if self.id.trim().is_empty() {
            return fail("profile id must not be blank");
        }
        let d = &self.dissolved_oxygen;
        if !(d.critical_mg_l > 0.0 && d.critical_mg_l < d.stressed_mg_l) {
            return fail("dissolved oxygen requires 0 < critical < stressed");
        }
        let blooms = std::iter::once(&self.bloom).chain(self.brackish_bloom.iter());
        for b in blooms {
            if !(b.bloom_ug_l > 0.0
                && b.bloom_ug_l < b.significant_ug_l
                && b.significant_ug_l < b.severe_ug_l)
            {
                return fail("chlorophyll requires 0 < bloom < significant < severe");
            }
        }
        let t = &self.turbidity;
        if !(t.elevated_fnu > 0.0 && t.elevated_fnu < t.impaired_fnu) {
            return fail("turbidity requires 0 < elevated < impaired");
        }
        let n = &self.nutrients;
        if !(n.tn_elevated_mg_l > 0.0 && n.tn_elevated_mg_l < n.tn_excessive_mg_l) {
            return fail("total nitrogen requires 0 < elevated < excessive");
        }
        if !(n.tp_elevated_mg_l > 0.0 && n.tp_elevated_mg_l < n.tp_excessive_mg_l) {
            return fail("total phosphorus requires 0 < elevated < excessive");
        }
        let b = &self.bacteria;
        if !(b.e_coli_mpn > 0.0 && b.enterococcus_mpn > 0.0 && b.fecal_coliform_mpn > 0.0) {
            return fail("bacteria screening levels must be positive");
        }
        Ok(())
    }

    fn covers_state(&self, state_abbr: &str) -> bool {
        self.states.iter().any(|s| s.eq_ignore_ascii_case(state_abbr.trim()))
    }
}

/// A threshold profile that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileError {
    pub profile_id: String,
    pub reason: String,
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid threshold profile '{}': {}", self.profile_id, self.reason)
    }
}

impl std::error::Error for ProfileError {}

// ---------------------------------------------------------------------------
// Built-in profiles
// ---------------------------------------------------------------------------

/// General screening profile drawn from EPA recommended criteria and the
/// pipeline's exceedance screening levels (DO 5.0, TN 3.0, TP 0.1,
/// turbidity 50, E. coli 410, Enterococcus 130, fecal coliform 400).
pub fn epa_generic() -> ThresholdProfile {
    ThresholdProfile {
        id: GENERIC_PROFILE_ID.to_string(),
        source: "EPA recommended criteria (generic screening)".to_string(),
        states: Vec::new(),
        dissolved_oxygen: DoThresholds {
            critical_mg_l: 3.0,
            stressed_mg_l: 5.0,
        },
        bloom: BloomThresholds {
            bloom_ug_l: 20.0,
            significant_ug_l: 40.0,
            severe_ug_l: 50.0,
        },
        brackish_bloom: None,
        turbidity: TurbidityThresholds {
            elevated_fnu: 25.0,
            impaired_fnu: 50.0,
        },
        nutrients: NutrientThresholds {
            tn_elevated_mg_l: 1.0,
            tn_excessive_mg_l: 3.0,
            tp_elevated_mg_l: 0.05,
            tp_excessive_mg_l: 0.1,
        },
        bacteria: BacteriaThresholds::default(),
    }
}

/// Maryland DNR / MDE criteria, with Chesapeake Bay tidal chlorophyll
/// breakpoints for brackish segments.
pub fn maryland() -> ThresholdProfile {
    ThresholdProfile {
        id: "md-dnr".to_string(),
        source: "Maryland DNR / MDE water quality criteria (COMAR 26.08.02)".to_string(),
        states: vec!["MD".to_string()],
        dissolved_oxygen: DoThresholds {
            critical_mg_l: 3.2,
            stressed_mg_l: 5.0,
        },
        bloom: BloomThresholds {
            bloom_ug_l: 20.0,
            significant_ug_l: 40.0,
            severe_ug_l: 50.0,
        },
        brackish_bloom: Some(BloomThresholds {
            bloom_ug_l: 15.0,
            significant_ug_l: 30.0,
            severe_ug_l: 50.0,
        }),
        turbidity: TurbidityThresholds {
            elevated_fnu: 15.0,
            impaired_fnu: 50.0,
        },
        nutrients: NutrientThresholds {
            tn_elevated_mg_l: 1.0,
            tn_excessive_mg_l: 2.0,
            tp_elevated_mg_l: 0.05,
            tp_excessive_mg_l: 0.1,
        },
        bacteria: BacteriaThresholds::default(),
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<ThresholdProfile>,
}

/// The set of profiles available for selection. Always contains the
/// generic profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRegistry {
    profiles: Vec<ThresholdProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        Self {
            profiles: vec![epa_generic(), maryland()],
        }
    }

    pub fn profiles(&self) -> &[ThresholdProfile] {
        &self.profiles
    }

    /// Looks up a profile by id. Returns `None` if not found.
    pub fn find(&self, id: &str) -> Option<&ThresholdProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Returns the profile for a state, or the generic profile when the
    /// state has no dedicated criteria.
    pub fn for_state(&self, state_abbr: &str) -> &ThresholdProfile {
        self.profiles
            .iter()
            .find(|p| p.covers_state(state_abbr))
            .or_else(|| self.find(GENERIC_PROFILE_ID))
            .unwrap_or(&self.profiles[0])
    }

    /// Selects the profile for a site and applies any water-type override.
    pub fn select(&self, state_abbr: &str, water_type: WaterType) -> ThresholdProfile {
        self.for_state(state_abbr).for_water_type(water_type)
    }

    /// Validates `profile` and inserts it, replacing any profile with the
    /// same id.
    pub fn insert(&mut self, profile: ThresholdProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Merges `[[profiles]]` tables from a TOML document over the built-ins.
    pub fn merge_toml_str(&mut self, contents: &str) -> Result<usize, ProfileLoadError> {
        let file: ProfileFile = toml::from_str(contents).map_err(ProfileLoadError::Parse)?;
        let count = file.profiles.len();
        for profile in file.profiles {
            self.insert(profile).map_err(ProfileLoadError::Invalid)?;
        }
        Ok(count)
    }

    /// Built-in profiles overlaid with the profiles in the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ProfileLoadError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProfileLoadError::Io(format!("{}: {}", path.display(), e)))?;
        let mut registry = Self::builtin();
        registry.merge_toml_str(&contents)?;
        Ok(registry)
    }
}

/// Errors raised while loading a profile file.
#[derive(Debug)]
pub enum ProfileLoadError {
    Io(String),
    Parse(toml::de::Error),
    Invalid(ProfileError),
}

impl std::fmt::Display for ProfileLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileLoadError::Io(msg) => write!(f, "Could not read profile file {}", msg),
            ProfileLoadError::Parse(err) => write!(f, "Profile file parse error: {}", err),
            ProfileLoadError::Invalid(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ProfileLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileLoadError::Io(_) => None,
            ProfileLoadError::Parse(err) => Some(err),
            ProfileLoadError::Invalid(err) => Some(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
