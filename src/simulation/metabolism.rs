//! Rate formulas for the four coupled resources.
//!
//! Rates are per second; callers scale them by the tick's `dt` in seconds.
//! Functions taking `atp`/`waste` arguments read the values already updated
//! earlier in the same tick.

use crate::cell::{EffectSet, OrganelleId, SimulationState};
use crate::config::game::GameConfig;

/// Oxygen availability. Constant in this model.
const OXYGEN_COEFFICIENT: f64 = 1.0;

/// Below this ATP level ribosomes stop and protein slowly degrades.
const PROTEIN_STALL_ATP: f64 = 5.0;
const PROTEIN_DEGRADATION: f64 = 0.1;

const NUTRIENT_WASTE: f64 = 0.1;

fn health_fraction(state: &SimulationState, id: OrganelleId) -> f64 {
    state.organelle(id).unwrap_or(0.0) / 100.0
}

pub fn atp_production(state: &SimulationState, effects: &EffectSet, config: &GameConfig) -> f64 {
    let critical_penalty = if state.resources.atp < config.thresholds.atp_critical {
        0.5
    } else {
        1.0
    };
    config.rates.atp_base_production
        * health_fraction(state, OrganelleId::Mitochondria)
        * OXYGEN_COEFFICIENT
        * effects.atp_production_multiplier()
        * critical_penalty
}

pub fn atp_consumption(state: &SimulationState, effects: &EffectSet, config: &GameConfig) -> f64 {
    let r = &state.resources;
    let protein_cost = if r.protein < 50.0 { 0.3 } else { 0.1 };
    let cleaning_cost = if r.waste > 50.0 { 0.4 } else { 0.2 };
    let stress_cost = r.stress * 0.01;
    (config.rates.atp_consumption_base + protein_cost + cleaning_cost + stress_cost)
        * effects.atp_consumption_multiplier()
}

/// Net ATP rate: production minus consumption plus the smoothed gain/cost effects.
///
/// Gain and cost stop counting once the time box has run out at `now_ms`;
/// the multipliers still apply for that last tick.
pub fn atp_rate(
    state: &SimulationState,
    effects: &EffectSet,
    config: &GameConfig,
    now_ms: u64,
) -> f64 {
    let adjustment = if effects.is_expired(now_ms) {
        0.0
    } else {
        effects.atp_rate_adjustment()
    };
    atp_production(state, effects, config) - atp_consumption(state, effects, config) + adjustment
}

/// Waste produced minus waste cleaned over `dt` seconds.
pub fn waste_change(
    state: &SimulationState,
    effects: &EffectSet,
    config: &GameConfig,
    dt: f64,
) -> f64 {
    let protein_waste = if state.resources.protein < 50.0 { 0.2 } else { 0.1 };
    let produced = (NUTRIENT_WASTE + protein_waste + effects.waste_increase.unwrap_or(0.0)) * dt;
    let cleaned = config.rates.waste_cleaning_base
        * health_fraction(state, OrganelleId::Lysosome)
        * effects.waste_cleaning_boost()
        * dt;
    produced - cleaned
}

/// Stress accumulated over `dt` seconds, driven by the updated `atp` and `waste`.
pub fn stress_change(
    state: &SimulationState,
    effects: &EffectSet,
    atp: f64,
    waste: f64,
    config: &GameConfig,
    dt: f64,
) -> f64 {
    let t = &config.thresholds;
    let mut rate = 0.0;

    if waste > t.waste_danger {
        rate += (waste - t.waste_danger) * 0.05;
    }
    if atp < t.atp_critical {
        rate += (t.atp_critical - atp) * 0.1;
    }
    rate += state
        .organelles
        .values()
        .filter(|h| **h < 50.0)
        .map(|h| (50.0 - h) * 0.02)
        .sum::<f64>();
    rate += config.rates.stress_increase_base;
    rate += effects.stress_adjustment();

    rate * dt
}

/// Protein made (or lost, when ATP has run dry) over `dt` seconds.
pub fn protein_change(
    state: &SimulationState,
    effects: &EffectSet,
    atp: f64,
    config: &GameConfig,
    dt: f64,
) -> f64 {
    if atp < PROTEIN_STALL_ATP {
        return -PROTEIN_DEGRADATION * dt;
    }
    let atp_penalty = if atp < config.thresholds.atp_critical {
        0.5
    } else {
        1.0
    };
    config.rates.protein_production_base
        * health_fraction(state, OrganelleId::Ribosome)
        * effects.protein_boost()
        * effects.protein_multiplier()
        * atp_penalty
        * dt
}
