//! PIN restoration planning engine.
//!
//! Scores water-quality severity for a site and turns it into a sized,
//! phased and costed treatment deployment.

pub mod assess;
pub mod config;
pub mod engine;
pub mod logging;
pub mod model;
pub mod plan;
pub mod profiles;
pub mod severity;
pub mod site;

pub use engine::{RestorationOutcome, RestorationPlan, compute_restoration_plan, plan_site};
pub use model::PlanError;
pub use site::{SiteAssessment, SiteInput};
