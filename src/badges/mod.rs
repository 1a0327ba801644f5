//! Achievement tracking.
//!
//! Progress is measured in simulation seconds, taken from how far
//! `elapsed_millis` moved between two samples. The evaluator can therefore run
//! at any cadence without changing what "45 seconds" means.

use std::collections::BTreeMap;

use crate::cell::{BadgeId, OrganelleId, SimulationState};
use crate::config::game::BadgeRules;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeReport {
    /// Updated counters for every badge not yet earned.
    pub badge_progress: BTreeMap<BadgeId, f64>,
    pub newly_earned: Vec<BadgeId>,
}

#[derive(Debug, Clone)]
pub struct BadgeEvaluator {
    rules: BadgeRules,
    last_elapsed_ms: f64,
    last_waste: Option<f64>,
}

impl BadgeEvaluator {
    pub fn new(rules: BadgeRules) -> Self {
        BadgeEvaluator {
            rules,
            last_elapsed_ms: 0.0,
            last_waste: None,
        }
    }

    pub fn rules(&self) -> &BadgeRules {
        &self.rules
    }

    /// Forget the previous sample. Call when a new game starts.
    pub fn reset(&mut self) {
        self.last_elapsed_ms = 0.0;
        self.last_waste = None;
    }

    /// Sample the running game and advance every in-game badge.
    pub fn evaluate(&mut self, state: &SimulationState) -> BadgeReport {
        let mut report = BadgeReport::default();
        if !state.running {
            return report;
        }

        let elapsed_ms = state.elapsed_millis;
        let delta_ms = if elapsed_ms >= self.last_elapsed_ms {
            elapsed_ms - self.last_elapsed_ms
        } else {
            elapsed_ms
        };
        let delta_s = delta_ms / 1000.0;
        let elapsed_s = elapsed_ms / 1000.0;
        let previous_waste = self.last_waste;
        self.last_elapsed_ms = elapsed_ms;
        self.last_waste = Some(state.resources.waste);

        let r = &self.rules;
        let res = &state.resources;
        let progress_of = |id: BadgeId| state.badge_progress.get(&id).copied().unwrap_or(0.0);

        for id in BadgeId::ALL {
            if id.is_end_of_game() || state.earned_badges.contains(&id) {
                continue;
            }
            let (progress, target) = match id {
                BadgeId::Survivor3Min => (elapsed_s, r.survivor_seconds),
                BadgeId::AtpMaster => (
                    sustained(progress_of(id), res.atp >= r.atp_master_level, delta_s),
                    r.atp_master_seconds,
                ),
                BadgeId::WasteCleaner => {
                    let crossed = previous_waste.is_some_and(|prev| {
                        prev >= r.waste_cleaner_level && res.waste < r.waste_cleaner_level
                    });
                    let count = progress_of(id) + if crossed { 1.0 } else { 0.0 };
                    (count, f64::from(r.waste_cleaner_crossings))
                }
                BadgeId::CalmCell => (
                    sustained(progress_of(id), res.stress < r.calm_cell_level, delta_s),
                    r.calm_cell_seconds,
                ),
                BadgeId::OrganelleProtector => {
                    let all_alive = state.organelles.values().all(|h| *h > 0.0);
                    let survived = if all_alive { elapsed_s } else { 0.0 };
                    (survived, r.organelle_protector_seconds)
                }
                BadgeId::EventMaster => (
                    f64::from(state.stats.correct_event_choices),
                    f64::from(r.event_master_choices),
                ),
                BadgeId::MitoGuardian | BadgeId::BalanceMaster => continue,
            };

            report.badge_progress.insert(id, progress.min(target));
            if progress >= target {
                report.newly_earned.push(id);
            }
        }

        report
    }

    /// Badges decided by the state the cell died in.
    pub fn evaluate_final(&self, state: &SimulationState) -> Vec<BadgeId> {
        let r = &self.rules;
        let mut earned = Vec::new();

        let mito = state.organelle(OrganelleId::Mitochondria).unwrap_or(0.0);
        if mito >= r.mito_guardian_health {
            earned.push(BadgeId::MitoGuardian);
        }
        if state.resources.all_within(r.balance_low, r.balance_high) {
            earned.push(BadgeId::BalanceMaster);
        }

        earned.retain(|id| !state.earned_badges.contains(id));
        earned
    }
}

/// Seconds a condition has held without a break.
fn sustained(current: f64, holds: bool, delta_s: f64) -> f64 {
    if holds {
        current + delta_s
    } else {
        0.0
    }
}
