use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::simulation::EngineError;

/// Lower and upper bound shared by every resource and organelle health value.
pub const MIN_LEVEL: f64 = 0.0;
pub const MAX_LEVEL: f64 = 100.0;

pub fn clamp_level(value: f64) -> f64 {
    value.clamp(MIN_LEVEL, MAX_LEVEL)
}

// === Identifiers ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganelleId {
    Mitochondria,
    Ribosome,
    Lysosome,
    Golgi,
    Nucleus,
    Centrosome,
}

impl OrganelleId {
    pub const ALL: [OrganelleId; 6] = [
        OrganelleId::Mitochondria,
        OrganelleId::Ribosome,
        OrganelleId::Lysosome,
        OrganelleId::Golgi,
        OrganelleId::Nucleus,
        OrganelleId::Centrosome,
    ];

    /// Organelles the engine reads directly; a configuration without them cannot run.
    pub const REQUIRED: [OrganelleId; 5] = [
        OrganelleId::Mitochondria,
        OrganelleId::Ribosome,
        OrganelleId::Lysosome,
        OrganelleId::Golgi,
        OrganelleId::Nucleus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OrganelleId::Mitochondria => "mitochondria",
            OrganelleId::Ribosome => "ribosome",
            OrganelleId::Lysosome => "lysosome",
            OrganelleId::Golgi => "golgi",
            OrganelleId::Nucleus => "nucleus",
            OrganelleId::Centrosome => "centrosome",
        }
    }
}

impl fmt::Display for OrganelleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OrganelleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrganelleId::ALL
            .iter()
            .copied()
            .find(|o| o.name() == s)
            .ok_or_else(|| format!("unknown organelle '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    /// Nutrient intake. The only action allowed without enough ATP.
    TakeNutrient,
    CleanWaste,
    ProduceProtein,
    RepairOrganelle,
}

impl ActionId {
    pub const ALL: [ActionId; 4] = [
        ActionId::TakeNutrient,
        ActionId::CleanWaste,
        ActionId::ProduceProtein,
        ActionId::RepairOrganelle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionId::TakeNutrient => "take_nutrient",
            ActionId::CleanWaste => "clean_waste",
            ActionId::ProduceProtein => "produce_protein",
            ActionId::RepairOrganelle => "repair_organelle",
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, ActionId::TakeNutrient)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| EngineError::InvalidActionId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    #[serde(rename = "survivor_3min")]
    Survivor3Min,
    AtpMaster,
    WasteCleaner,
    CalmCell,
    OrganelleProtector,
    EventMaster,
    MitoGuardian,
    BalanceMaster,
}

impl BadgeId {
    pub const ALL: [BadgeId; 8] = [
        BadgeId::Survivor3Min,
        BadgeId::AtpMaster,
        BadgeId::WasteCleaner,
        BadgeId::CalmCell,
        BadgeId::OrganelleProtector,
        BadgeId::EventMaster,
        BadgeId::MitoGuardian,
        BadgeId::BalanceMaster,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BadgeId::Survivor3Min => "survivor_3min",
            BadgeId::AtpMaster => "atp_master",
            BadgeId::WasteCleaner => "waste_cleaner",
            BadgeId::CalmCell => "calm_cell",
            BadgeId::OrganelleProtector => "organelle_protector",
            BadgeId::EventMaster => "event_master",
            BadgeId::MitoGuardian => "mito_guardian",
            BadgeId::BalanceMaster => "balance_master",
        }
    }

    /// Badges only decided at the moment the cell fails.
    pub fn is_end_of_game(&self) -> bool {
        matches!(self, BadgeId::MitoGuardian | BadgeId::BalanceMaster)
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// === Resources ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub atp: f64,
    pub waste: f64,
    pub stress: f64,
    pub protein: f64,
}

impl Resources {
    pub fn clamped(self) -> Resources {
        Resources {
            atp: clamp_level(self.atp),
            waste: clamp_level(self.waste),
            stress: clamp_level(self.stress),
            protein: clamp_level(self.protein),
        }
    }

    pub fn all_within(&self, low: f64, high: f64) -> bool {
        [self.atp, self.waste, self.stress, self.protein]
            .iter()
            .all(|v| (low..=high).contains(v))
    }
}

/// Additive change to resources, as produced by narrative choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDelta {
    #[serde(default)]
    pub atp: Option<f64>,
    #[serde(default)]
    pub waste: Option<f64>,
    #[serde(default)]
    pub stress: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
}

impl ResourceDelta {
    pub fn applied_to(&self, r: Resources) -> Resources {
        Resources {
            atp: clamp_level(r.atp + self.atp.unwrap_or(0.0)),
            waste: clamp_level(r.waste + self.waste.unwrap_or(0.0)),
            stress: clamp_level(r.stress + self.stress.unwrap_or(0.0)),
            protein: clamp_level(r.protein + self.protein.unwrap_or(0.0)),
        }
    }
}

// === Statistics ===

/// Cumulative counters kept across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_play_time_ms: f64,
    pub best_survival_time_ms: f64,
    pub events_handled: u32,
    pub correct_event_choices: u32,
    pub actions_taken: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtpSample {
    pub at_ms: u64,
    pub atp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_parse_back() {
        for action in ActionId::ALL {
            assert_eq!(action.name().parse::<ActionId>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_invalid_action_id() {
        let err = "divide".parse::<ActionId>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidActionId(ref id) if id == "divide"));
    }

    #[test]
    fn badge_serde_names_match_display() {
        for badge in BadgeId::ALL {
            let json = serde_json::to_string(&badge).unwrap();
            assert_eq!(json, format!("\"{}\"", badge.name()));
        }
    }

    #[test]
    fn resource_delta_clamps_both_ends() {
        let start = Resources { atp: 95.0, waste: 3.0, stress: 50.0, protein: 10.0 };
        let delta = ResourceDelta {
            atp: Some(20.0),
            waste: Some(-10.0),
            stress: None,
            protein: Some(5.0),
        };
        let out = delta.applied_to(start);
        assert_eq!(out.atp, 100.0);
        assert_eq!(out.waste, 0.0);
        assert_eq!(out.stress, 50.0);
        assert_eq!(out.protein, 15.0);
    }

    #[test]
    fn all_within_checks_every_resource() {
        let r = Resources { atp: 50.0, waste: 40.0, stress: 80.0, protein: 60.0 };
        assert!(r.all_within(40.0, 80.0));
        let r = Resources { stress: 81.0, ..r };
        assert!(!r.all_within(40.0, 80.0));
    }
}
