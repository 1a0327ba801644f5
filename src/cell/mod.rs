pub mod effects;
pub mod event;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub use effects::{EffectSet, PerOrganelle};
pub use event::{ActiveEvent, EventCard, EventOption};
pub use types::{
    clamp_level, ActionId, AtpSample, BadgeId, OrganelleId, ResourceDelta, Resources, Stats,
};

use crate::config::game::GameConfig;

/// Longest ATP history kept for charting.
pub const MAX_ATP_SAMPLES: usize = 120;

/// Complete snapshot of one simulated cell plus the session's progress.
///
/// Snapshots are never edited in place once published; every change builds a
/// new value (see [`crate::store::GameStore`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub running: bool,
    pub paused: bool,
    pub start_time_ms: Option<u64>,
    pub elapsed_millis: f64,
    pub resources: Resources,
    pub organelles: BTreeMap<OrganelleId, f64>,
    pub selected_organelle: Option<OrganelleId>,
    pub time_scale: f64,
    pub action_cooldowns: BTreeMap<ActionId, f64>,
    pub active_event: Option<ActiveEvent>,
    pub event_effects: EffectSet,
    pub atp_history: VecDeque<AtpSample>,
    pub prologue_completed: bool,
    pub badge_progress: BTreeMap<BadgeId, f64>,
    pub earned_badges: BTreeSet<BadgeId>,
    pub stats: Stats,
}

impl SimulationState {
    /// Fresh, not-yet-running state built from configuration defaults.
    pub fn from_config(config: &GameConfig) -> Self {
        SimulationState {
            running: false,
            paused: false,
            start_time_ms: None,
            elapsed_millis: 0.0,
            resources: config.initial_values.resources(),
            organelles: config.initial_values.organelles.clone(),
            selected_organelle: None,
            time_scale: 1.0,
            action_cooldowns: idle_cooldowns(),
            active_event: None,
            event_effects: EffectSet::default(),
            atp_history: VecDeque::new(),
            prologue_completed: false,
            badge_progress: BTreeMap::new(),
            earned_badges: BTreeSet::new(),
            stats: Stats::default(),
        }
    }

    pub fn organelle(&self, id: OrganelleId) -> Option<f64> {
        self.organelles.get(&id).copied()
    }

    pub fn cooldown(&self, action: ActionId) -> f64 {
        self.action_cooldowns.get(&action).copied().unwrap_or(0.0)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_millis / 1000.0
    }

    pub fn is_ticking(&self) -> bool {
        self.running && !self.paused
    }
}

/// Every action ready to use.
pub fn idle_cooldowns() -> BTreeMap<ActionId, f64> {
    ActionId::ALL.iter().map(|a| (*a, 0.0)).collect()
}
