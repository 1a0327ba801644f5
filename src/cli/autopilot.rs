use rand::Rng;

use crate::cell::{ActionId, ActiveEvent, OrganelleId, SimulationState};
use crate::config::game::GameConfig;

/// Health below which the autopilot spends ATP on repairs.
const REPAIR_BELOW: f64 = 60.0;
/// ATP kept in reserve after paying for a repair or protein.
const ATP_RESERVE: f64 = 20.0;

/// Next thing the scripted player wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub action: ActionId,
    pub target: Option<OrganelleId>,
}

/// Scripted player for headless runs: keeps the cell roughly balanced and
/// answers events, knowing the right answer `accuracy` of the time.
#[derive(Debug, Clone)]
pub struct Autopilot {
    accuracy: f64,
}

impl Autopilot {
    pub fn new(accuracy: f64) -> Self {
        Autopilot {
            accuracy: accuracy.clamp(0.0, 1.0),
        }
    }

    pub fn next_move(&self, state: &SimulationState, config: &GameConfig) -> Option<Move> {
        let r = &state.resources;
        let ready = |a: ActionId| state.cooldown(a) <= 0.0;
        let affordable =
            |a: ActionId| r.atp >= config.actions.get(a).atp_cost + ATP_RESERVE;

        if ready(ActionId::TakeNutrient) && r.atp < config.thresholds.atp_critical * 2.0 {
            return Some(Move {
                action: ActionId::TakeNutrient,
                target: None,
            });
        }

        let weakest = state
            .organelles
            .iter()
            .filter(|(_, h)| **h < REPAIR_BELOW)
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, _)| *id);
        if let Some(target) = weakest {
            if ready(ActionId::RepairOrganelle) && affordable(ActionId::RepairOrganelle) {
                return Some(Move {
                    action: ActionId::RepairOrganelle,
                    target: Some(target),
                });
            }
        }

        if ready(ActionId::CleanWaste) && r.waste > config.thresholds.waste_danger * 0.6 {
            return Some(Move {
                action: ActionId::CleanWaste,
                target: None,
            });
        }

        if ready(ActionId::ProduceProtein)
            && r.protein < 50.0
            && affordable(ActionId::ProduceProtein)
        {
            return Some(Move {
                action: ActionId::ProduceProtein,
                target: None,
            });
        }

        None
    }

    pub fn choose_option<R: Rng + ?Sized>(&self, event: &ActiveEvent, rng: &mut R) -> usize {
        let count = event.card.options.len().max(1);
        match event.card.correct_option {
            Some(correct) if rng.gen_bool(self.accuracy) => correct,
            _ => rng.gen_range(0..count),
        }
    }
}
