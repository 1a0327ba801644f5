use std::fmt;

use crate::cell::{clamp_level, ActionId, SimulationState};
use crate::config::game::ActionTable;

/// What happened when the player asked for an action.
///
/// Failed preconditions are ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Success,
    Blocked { remaining_ms: f64 },
    InsufficientResource { required: f64, available: f64 },
    NoTargetSelected,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Success => write!(f, "ok"),
            ActionOutcome::Blocked { remaining_ms } => {
                write!(f, "on cooldown for {:.1}s", remaining_ms / 1000.0)
            }
            ActionOutcome::InsufficientResource {
                required,
                available,
            } => write!(f, "needs {required:.0} ATP, have {available:.1}"),
            ActionOutcome::NoTargetSelected => write!(f, "no organelle selected"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionResolution {
    pub state: SimulationState,
    pub outcome: ActionOutcome,
}

impl ActionResolution {
    fn unchanged(state: &SimulationState, outcome: ActionOutcome) -> Self {
        ActionResolution {
            state: state.clone(),
            outcome,
        }
    }
}

/// Apply one player action. Checks run in order: cooldown, ATP (nutrient
/// intake is free), then the repair target.
pub fn resolve_action(
    state: &SimulationState,
    action: ActionId,
    table: &ActionTable,
) -> ActionResolution {
    let rule = table.get(action);

    let remaining_ms = state.cooldown(action);
    if remaining_ms > 0.0 {
        return ActionResolution::unchanged(state, ActionOutcome::Blocked { remaining_ms });
    }

    if !action.is_free() && state.resources.atp < rule.atp_cost {
        return ActionResolution::unchanged(
            state,
            ActionOutcome::InsufficientResource {
                required: rule.atp_cost,
                available: state.resources.atp,
            },
        );
    }

    let mut next = state.clone();
    let r = &mut next.resources;

    match action {
        ActionId::TakeNutrient => {
            r.atp = clamp_level(r.atp + rule.atp_gain);
            r.waste = clamp_level(r.waste + rule.waste_cost);
        }
        ActionId::CleanWaste => {
            r.atp = clamp_level(r.atp - rule.atp_cost);
            r.waste = clamp_level(r.waste - rule.waste_reduction);
        }
        ActionId::ProduceProtein => {
            r.atp = clamp_level(r.atp - rule.atp_cost);
            r.protein = clamp_level(r.protein + rule.protein_gain);
            r.waste = clamp_level(r.waste + rule.waste_cost);
        }
        ActionId::RepairOrganelle => {
            let Some(target) = state
                .selected_organelle
                .filter(|id| state.organelles.contains_key(id))
            else {
                return ActionResolution::unchanged(state, ActionOutcome::NoTargetSelected);
            };
            r.atp = clamp_level(r.atp - rule.atp_cost);
            r.stress = clamp_level(r.stress + rule.stress_cost);
            if let Some(health) = next.organelles.get_mut(&target) {
                *health = clamp_level(*health + rule.health_gain);
            }
        }
    }

    next.action_cooldowns.insert(action, rule.cooldown_ms);
    next.stats.actions_taken += 1;

    ActionResolution {
        state: next,
        outcome: ActionOutcome::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OrganelleId;
    use crate::config::game::tests::sample_config;

    fn running_state() -> SimulationState {
        let mut s = SimulationState::from_config(&sample_config());
        s.running = true;
        s
    }

    #[test]
    fn nutrient_is_free_and_adds_waste() {
        let config = sample_config();
        let mut s = running_state();
        s.resources.atp = 0.0;
        let res = resolve_action(&s, ActionId::TakeNutrient, &config.actions);
        assert_eq!(res.outcome, ActionOutcome::Success);
        assert_eq!(res.state.resources.atp, 15.0);
        assert_eq!(res.state.resources.waste, 25.0);
        assert_eq!(res.state.cooldown(ActionId::TakeNutrient), 3000.0);
        assert_eq!(res.state.stats.actions_taken, 1);
    }

    #[test]
    fn cooldown_blocks_before_anything_else() {
        let config = sample_config();
        let mut s = running_state();
        s.resources.atp = 0.0;
        s.action_cooldowns.insert(ActionId::CleanWaste, 1200.0);
        let res = resolve_action(&s, ActionId::CleanWaste, &config.actions);
        assert_eq!(res.outcome, ActionOutcome::Blocked { remaining_ms: 1200.0 });
        assert_eq!(res.state, s);
    }

    #[test]
    fn insufficient_atp_leaves_state_alone() {
        let config = sample_config();
        let mut s = running_state();
        s.resources.atp = 7.0;
        let res = resolve_action(&s, ActionId::ProduceProtein, &config.actions);
        assert_eq!(
            res.outcome,
            ActionOutcome::InsufficientResource {
                required: 8.0,
                available: 7.0
            }
        );
        assert_eq!(res.state, s);
    }

    #[test]
    fn clean_waste_floors_at_zero() {
        let config = sample_config();
        let mut s = running_state();
        s.resources.waste = 5.0;
        let res = resolve_action(&s, ActionId::CleanWaste, &config.actions);
        assert!(res.outcome.is_success());
        assert_eq!(res.state.resources.waste, 0.0);
        assert_eq!(res.state.resources.atp, 65.0);
    }

    #[test]
    fn produce_protein_moves_three_resources() {
        let config = sample_config();
        let s = running_state();
        let res = resolve_action(&s, ActionId::ProduceProtein, &config.actions);
        assert_eq!(res.state.resources.atp, 62.0);
        assert_eq!(res.state.resources.protein, 45.0);
        assert_eq!(res.state.resources.waste, 23.0);
    }

    #[test]
    fn repair_requires_a_selection() {
        let config = sample_config();
        let s = running_state();
        let res = resolve_action(&s, ActionId::RepairOrganelle, &config.actions);
        assert_eq!(res.outcome, ActionOutcome::NoTargetSelected);
        assert_eq!(res.state.stats.actions_taken, 0);
    }

    #[test]
    fn repair_heals_exactly_health_gain() {
        let config = sample_config();
        let mut s = running_state();
        s.selected_organelle = Some(OrganelleId::Golgi);
        s.organelles.insert(OrganelleId::Golgi, 50.0);
        let res = resolve_action(&s, ActionId::RepairOrganelle, &config.actions);
        assert!(res.outcome.is_success());
        assert_eq!(res.state.organelle(OrganelleId::Golgi), Some(70.0));
        assert_eq!(res.state.resources.atp, s.resources.atp - 10.0);
        assert_eq!(res.state.resources.stress, s.resources.stress + 5.0);
    }

    #[test]
    fn repair_clamps_at_full_health() {
        let config = sample_config();
        let mut s = running_state();
        s.selected_organelle = Some(OrganelleId::Nucleus);
        s.organelles.insert(OrganelleId::Nucleus, 95.0);
        let res = resolve_action(&s, ActionId::RepairOrganelle, &config.actions);
        assert_eq!(res.state.organelle(OrganelleId::Nucleus), Some(100.0));
    }

    #[test]
    fn unknown_action_name_is_an_error() {
        assert!("divide".parse::<ActionId>().is_err());
        assert_eq!(
            "clean_waste".parse::<ActionId>().unwrap(),
            ActionId::CleanWaste
        );
    }
}
