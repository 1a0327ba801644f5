use crate::cell::{ActionId, OrganelleId, SimulationState};

/// Compact view of the cell after a tick, for logging and status output.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsSummary {
    pub elapsed_seconds: f64,
    pub atp: f64,
    pub waste: f64,
    pub stress: f64,
    pub protein: f64,
    pub mean_organelle_health: f64,
    pub weakest_organelle: Option<(OrganelleId, f64)>,
    pub ready_actions: usize,
    pub effects_active: bool,
}

pub fn compute_vitals(state: &SimulationState) -> VitalsSummary {
    let count = state.organelles.len();
    let mean_organelle_health = if count == 0 {
        0.0
    } else {
        state.organelles.values().sum::<f64>() / count as f64
    };

    let weakest_organelle = state
        .organelles
        .iter()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(id, h)| (*id, *h));

    let ready_actions = ActionId::ALL
        .iter()
        .filter(|a| state.cooldown(**a) <= 0.0)
        .count();

    VitalsSummary {
        elapsed_seconds: state.elapsed_seconds(),
        atp: state.resources.atp,
        waste: state.resources.waste,
        stress: state.resources.stress,
        protein: state.resources.protein,
        mean_organelle_health,
        weakest_organelle,
        ready_actions,
        effects_active: !state.event_effects.is_empty(),
    }
}
