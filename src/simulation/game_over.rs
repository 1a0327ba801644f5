use std::fmt;

use crate::cell::{OrganelleId, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    AtpDepleted,
    AllOrganellesFailed,
    StressOverload,
    NucleusFailed,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameOverReason::AtpDepleted => "ATP depleted: the cell ran out of energy",
            GameOverReason::AllOrganellesFailed => "Every organelle has failed",
            GameOverReason::StressOverload => "Stress overload: the cell could not cope",
            GameOverReason::NucleusFailed => "The nucleus has failed",
        };
        f.write_str(text)
    }
}

/// Every terminal condition the state meets, or `None` while the cell lives.
pub fn check_game_over(state: &SimulationState) -> Option<Vec<GameOverReason>> {
    let mut reasons = Vec::new();

    if state.resources.atp <= 0.0 {
        reasons.push(GameOverReason::AtpDepleted);
    }
    if !state.organelles.is_empty() && state.organelles.values().all(|h| *h <= 0.0) {
        reasons.push(GameOverReason::AllOrganellesFailed);
    }
    if state.resources.stress >= 100.0 {
        reasons.push(GameOverReason::StressOverload);
    }
    if state
        .organelle(OrganelleId::Nucleus)
        .is_some_and(|h| h <= 0.0)
    {
        reasons.push(GameOverReason::NucleusFailed);
    }

    if reasons.is_empty() {
        None
    } else {
        Some(reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::game::tests::sample_config;

    fn healthy() -> SimulationState {
        let mut s = SimulationState::from_config(&sample_config());
        s.resources.atp = 50.0;
        s.resources.stress = 0.0;
        s
    }

    #[test]
    fn healthy_cell_keeps_going() {
        assert_eq!(check_game_over(&healthy()), None);
    }

    #[test]
    fn zero_atp_is_the_only_reason() {
        let mut s = healthy();
        s.resources.atp = 0.0;
        assert_eq!(check_game_over(&s), Some(vec![GameOverReason::AtpDepleted]));
    }

    #[test]
    fn full_stress_is_the_only_reason() {
        let mut s = healthy();
        s.resources.stress = 100.0;
        assert_eq!(
            check_game_over(&s),
            Some(vec![GameOverReason::StressOverload])
        );
    }

    #[test]
    fn simultaneous_reasons_are_all_reported() {
        let mut s = healthy();
        s.resources.atp = 0.0;
        s.resources.stress = 100.0;
        assert_eq!(
            check_game_over(&s),
            Some(vec![
                GameOverReason::AtpDepleted,
                GameOverReason::StressOverload
            ])
        );
    }

    #[test]
    fn dead_nucleus_ends_the_game() {
        let mut s = healthy();
        s.organelles.insert(OrganelleId::Nucleus, 0.0);
        assert_eq!(check_game_over(&s), Some(vec![GameOverReason::NucleusFailed]));
    }

    #[test]
    fn all_failed_includes_nucleus_reason() {
        let mut s = healthy();
        for h in s.organelles.values_mut() {
            *h = 0.0;
        }
        assert_eq!(
            check_game_over(&s),
            Some(vec![
                GameOverReason::AllOrganellesFailed,
                GameOverReason::NucleusFailed
            ])
        );
    }

    #[test]
    fn reasons_read_as_sentences() {
        assert!(GameOverReason::AtpDepleted.to_string().contains("ATP"));
    }
}
