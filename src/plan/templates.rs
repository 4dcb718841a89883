//! Phase mission and justification templates.
//!
//! Prose is a lookup table keyed by `(driver, phase)` rather than branching
//! string assembly, so every combination can be checked on its own.
//! Templates may reference `{region}` and `{causes}`.

use super::rollout::DominantDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTemplate {
    pub driver: DominantDriver,
    /// 1-based phase index.
    pub phase: u8,
    pub mission: &'static str,
    pub placement: &'static str,
    pub justification: &'static str,
}

/// When a phase may start, relative to plan approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTemplate {
    pub phase: u8,
    pub after_days: u32,
    pub condition: &'static str,
}

pub static PHASE_TEMPLATES: &[PhaseTemplate] = &[
    // --- Nutrients ----------------------------------------------------------
    PhaseTemplate {
        driver: DominantDriver::Nutrient,
        phase: 1,
        mission: "Primary Nutrient Interception",
        placement: "Highest-load nutrient inflow to {region}, upstream of the main bloom area.",
        justification: "Nutrient loading is the dominant driver at {region}. Phase 1 intercepts \
                        the single largest inflow, where chlorophyll and nitrogen/phosphorus \
                        readings show the most acute bloom pressure.",
    },
    PhaseTemplate {
        driver: DominantDriver::Nutrient,
        phase: 2,
        mission: "Secondary Nutrient Reduction",
        placement: "Second-highest nutrient loading zone, sited from Phase 1 monitoring data.",
        justification: "Phase 2 extends nutrient removal to the next-largest loading zone. \
                        Placement is refined with Phase 1 influent and effluent monitoring so \
                        capacity lands where measured reductions are largest.",
    },
    PhaseTemplate {
        driver: DominantDriver::Nutrient,
        phase: 3,
        mission: "Watershed-Scale Nutrient Control",
        placement: "Third loading zone covering residual and diffuse nutrient sources.",
        justification: "Phase 3 completes nutrient coverage across {region}, treating the \
                        residual load that remains after the two primary inflows are addressed.",
    },
    // --- Pathogens ----------------------------------------------------------
    PhaseTemplate {
        driver: DominantDriver::Pathogen,
        phase: 1,
        mission: "Primary Pathogen Treatment",
        placement: "Highest-load bacterial source to {region}, at the dominant outfall or \
                    stormwater discharge.",
        justification: "Bacterial impairment is the dominant driver at {region}. Phase 1 treats \
                        the single largest fecal indicator source, where contact-recreation risk \
                        is highest.",
    },
    PhaseTemplate {
        driver: DominantDriver::Pathogen,
        phase: 2,
        mission: "Secondary Pathogen Reduction",
        placement: "Second-highest bacterial loading zone, sited from Phase 1 monitoring data.",
        justification: "Phase 2 targets the next-largest pathogen source. Placement follows \
                        Phase 1 indicator sampling so treatment follows the measured load, not \
                        the assumed one.",
    },
    PhaseTemplate {
        driver: DominantDriver::Pathogen,
        phase: 3,
        mission: "Comprehensive Pathogen Control",
        placement: "Third zone covering remaining discharge points and tributary inputs.",
        justification: "Phase 3 closes the remaining bacterial sources across {region} to bring \
                        indicator counts below the recreational criterion throughout the \
                        waterbody.",
    },
    // --- Sediment -----------------------------------------------------------
    PhaseTemplate {
        driver: DominantDriver::Sediment,
        phase: 1,
        mission: "Primary Sediment Capture",
        placement: "Highest-load sediment inflow to {region}, below the most active erosion \
                    source.",
        justification: "Sediment and turbidity are the dominant driver at {region}. Phase 1 \
                        captures suspended solids at the single largest inflow, where turbidity \
                        readings are highest.",
    },
    PhaseTemplate {
        driver: DominantDriver::Sediment,
        phase: 2,
        mission: "Secondary Sediment Reduction",
        placement: "Second-highest sediment loading zone, sited from Phase 1 monitoring data.",
        justification: "Phase 2 extends sediment capture to the next-largest loading zone, \
                        placed using Phase 1 turbidity and suspended-solids monitoring.",
    },
    PhaseTemplate {
        driver: DominantDriver::Sediment,
        phase: 3,
        mission: "Watershed-Scale Sediment Control",
        placement: "Third zone covering residual erosion and resuspension sources.",
        justification: "Phase 3 completes sediment control across {region}, addressing \
                        resuspension and smaller tributary loads.",
    },
    // --- Generic ------------------------------------------------------------
    PhaseTemplate {
        driver: DominantDriver::Generic,
        phase: 1,
        mission: "Primary Water Quality Treatment",
        placement: "Highest-load inflow to {region}.",
        justification: "No single pollutant dominates at {region}. Phase 1 treats the largest \
                        inflow, where combined loading is greatest.",
    },
    PhaseTemplate {
        driver: DominantDriver::Generic,
        phase: 2,
        mission: "Secondary Treatment Expansion",
        placement: "Second-highest loading zone, sited from Phase 1 monitoring data.",
        justification: "Phase 2 adds treatment at the next-largest loading zone, placed using \
                        Phase 1 monitoring results.",
    },
    PhaseTemplate {
        driver: DominantDriver::Generic,
        phase: 3,
        mission: "Full-Coverage Treatment",
        placement: "Third zone covering remaining inflows.",
        justification: "Phase 3 completes treatment coverage across {region}.",
    },
];

pub static TRIGGER_TEMPLATES: &[TriggerTemplate] = &[
    TriggerTemplate {
        phase: 1,
        after_days: 0,
        condition: "Immediate: deploy within 30 days of plan approval.",
    },
    TriggerTemplate {
        phase: 2,
        after_days: 90,
        condition: "Day 90: contingent on Phase 1 monitoring data confirming treatment \
                    performance.",
    },
    TriggerTemplate {
        phase: 3,
        after_days: 180,
        condition: "Day 180: contingent on Phase 2 results and the residual load still measured.",
    },
];

/// Appended to Phase 3 when three or more impairment causes are listed.
pub const MULTI_CAUSE_CLAUSE: &str = "With multiple listed impairment causes ({causes}), this \
                                      phase targets co-occurring pollutants that single-zone \
                                      treatment cannot resolve.";

/// Appended to every phase when the site has gone unmonitored for over a year.
pub const MONITORING_CONTINUITY_CLAUSE: &str = "Each deployed unit carries continuous sensors, \
                                                so this phase also restores the monitoring \
                                                continuity lost at {region}.";

pub fn phase_template(driver: DominantDriver, phase: u8) -> Option<&'static PhaseTemplate> {
    PHASE_TEMPLATES.iter().find(|t| t.driver == driver && t.phase == phase)
}

pub fn trigger_template(phase: u8) -> Option<&'static TriggerTemplate> {
    TRIGGER_TEMPLATES.iter().find(|t| t.phase == phase)
}

/// Substitutes `{region}` and `{causes}` placeholders.
pub fn render(template: &str, region: &str, causes: &[String]) -> String {
    let causes = if causes.is_empty() {
        "none listed".to_string()
    } else {
        causes.join(", ")
    };
    template.replace("{region}", region).replace("{causes}", &causes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
