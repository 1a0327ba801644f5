pub mod actions;
pub mod events;
pub mod game_over;
pub mod metabolism;
pub mod organelles;
pub mod statistics;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::debug;

use crate::cell::{clamp_level, ActionId, ActiveEvent, EffectSet, Resources, SimulationState};
use crate::clock::Clock;
use crate::config::content::ContentCatalog;
use crate::config::game::GameConfig;
use crate::simulation::actions::ActionResolution;
use crate::simulation::events::EventScheduler;
use crate::simulation::game_over::GameOverReason;
use crate::simulation::organelles::WearLevels;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown action '{0}'")]
    InvalidActionId(String),
    #[error("The cell has no organelles configured")]
    EmptyOrganelleSet,
}

/// Pure tick engine plus the random event scheduler.
///
/// Calls are synchronous and do no I/O. Wall-clock time comes from the
/// injected [`Clock`]; randomness from a seeded `ChaCha8Rng`.
pub struct SimulationEngine {
    config: Arc<GameConfig>,
    content: Arc<ContentCatalog>,
    clock: Arc<dyn Clock>,
    rng: ChaCha8Rng,
    scheduler: EventScheduler,
}

impl SimulationEngine {
    pub fn new(
        config: Arc<GameConfig>,
        content: Arc<ContentCatalog>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if config.initial_values.organelles.is_empty() {
            return Err(EngineError::EmptyOrganelleSet);
        }
        Ok(SimulationEngine {
            config,
            content,
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
            scheduler: EventScheduler::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentCatalog {
        &self.content
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Advance the cell by `elapsed_ms` of real time.
    ///
    /// Returns an equal copy when the game is stopped or paused. Elapsed-time
    /// capping belongs to the caller.
    pub fn process_tick(&mut self, state: &SimulationState, elapsed_ms: f64) -> SimulationState {
        if !state.is_ticking() {
            return state.clone();
        }

        let config = Arc::clone(&self.config);
        let effective = elapsed_ms * state.time_scale;
        let dt = effective / 1000.0;

        // Cooldowns and clock
        let action_cooldowns = state
            .action_cooldowns
            .iter()
            .map(|(action, remaining)| (*action, (remaining - effective).max(0.0)))
            .collect();
        let elapsed_millis = state.elapsed_millis + effective;

        let now = self.clock.now_ms();
        let effects = &state.event_effects;
        let expired = effects.is_expired(now);

        // Metabolism
        let atp = clamp_level(
            state.resources.atp + metabolism::atp_rate(state, effects, &config, now) * dt,
        );
        let waste = clamp_level(
            state.resources.waste + metabolism::waste_change(state, effects, &config, dt),
        );
        let stress = clamp_level(
            state.resources.stress
                + metabolism::stress_change(state, effects, atp, waste, &config, dt),
        );
        let protein = clamp_level(
            state.resources.protein + metabolism::protein_change(state, effects, atp, &config, dt),
        );

        // Organelles
        let levels = WearLevels { atp, stress, waste };
        let mut organelles =
            organelles::decay(&state.organelles, effects, levels, &config, dt);
        if let Some((id, damage)) =
            organelles::critical_damage(&organelles, stress, &config, &mut self.rng)
        {
            if let Some(health) = organelles.get_mut(&id) {
                *health = (*health - damage).max(0.0);
                debug!(organelle = %id, damage, health = *health, "Critical stress damage");
            }
        }

        // The set runs its last tick in full, minus gain/cost, then is dropped.
        let event_effects = if expired {
            debug!(now_ms = now, "Event effects expired");
            EffectSet::default()
        } else {
            effects.clone()
        };

        SimulationState {
            elapsed_millis,
            resources: Resources {
                atp,
                waste,
                stress,
                protein,
            },
            organelles,
            action_cooldowns,
            event_effects,
            ..state.clone()
        }
    }

    // === Events ===

    pub fn should_trigger_event(&mut self, state: &SimulationState) -> bool {
        let now = self.clock.now_ms();
        self.scheduler.poll(
            state.active_event.is_some(),
            now,
            &self.config.events,
            &mut self.rng,
        )
    }

    pub fn generate_event(&mut self) -> Option<ActiveEvent> {
        let now = self.clock.now_ms();
        events::generate_event(&self.content, now, &mut self.rng)
    }

    pub fn resolve_choice(&self, event: &ActiveEvent, option_index: usize) -> Option<EffectSet> {
        events::resolve_choice(event, option_index, self.clock.now_ms())
    }

    /// Forget the armed event timer, e.g. when a new game starts.
    pub fn reset_schedule(&mut self) {
        self.scheduler.reset();
    }

    // === Actions and outcome ===

    pub fn apply_action(&self, state: &SimulationState, action: ActionId) -> ActionResolution {
        actions::resolve_action(state, action, &self.config.actions)
    }

    pub fn check_game_over(&self, state: &SimulationState) -> Option<Vec<GameOverReason>> {
        game_over::check_game_over(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{OrganelleId, PerOrganelle};
    use crate::clock::ManualClock;
    use crate::config::content::tests::sample_catalog;
    use crate::config::game::tests::sample_config;

    const T0: u64 = 1_000_000;

    fn engine_with(clock: Arc<ManualClock>, seed: u64) -> SimulationEngine {
        SimulationEngine::new(
            Arc::new(sample_config()),
            Arc::new(sample_catalog()),
            clock,
            seed,
        )
        .unwrap()
    }

    fn engine() -> SimulationEngine {
        engine_with(Arc::new(ManualClock::new(T0)), 11)
    }

    fn running() -> SimulationState {
        let mut s = SimulationState::from_config(&sample_config());
        s.running = true;
        s.start_time_ms = Some(T0);
        s
    }

    fn assert_in_range(s: &SimulationState) {
        let r = &s.resources;
        for v in [r.atp, r.waste, r.stress, r.protein] {
            assert!((0.0..=100.0).contains(&v), "resource out of range: {v}");
        }
        for (id, h) in &s.organelles {
            assert!((0.0..=100.0).contains(h), "{id} out of range: {h}");
        }
    }

    #[test]
    fn empty_organelle_config_is_rejected() {
        let mut config = sample_config();
        config.initial_values.organelles.clear();
        let result = SimulationEngine::new(
            Arc::new(config),
            Arc::new(ContentCatalog::default()),
            Arc::new(ManualClock::new(0)),
            1,
        );
        assert!(matches!(result, Err(EngineError::EmptyOrganelleSet)));
    }

    #[test]
    fn paused_or_stopped_state_is_returned_unchanged() {
        let mut engine = engine();
        let mut paused = running();
        paused.paused = true;
        assert_eq!(engine.process_tick(&paused, 1000.0), paused);

        let stopped = SimulationState::from_config(&sample_config());
        assert_eq!(engine.process_tick(&stopped, 1000.0), stopped);
    }

    #[test]
    fn values_stay_in_range_under_extremes() {
        let mut engine = engine();
        let extremes = [
            Resources { atp: 0.0, waste: 100.0, stress: 100.0, protein: 0.0 },
            Resources { atp: 100.0, waste: 0.0, stress: 0.0, protein: 100.0 },
            Resources { atp: 3.0, waste: 99.0, stress: 95.0, protein: 1.0 },
        ];
        for resources in extremes {
            let mut s = running();
            s.resources = resources;
            s.organelles.insert(OrganelleId::Golgi, 0.1);
            s.event_effects = EffectSet {
                atp_gain: Some(500.0),
                stress_increase: Some(50.0),
                organelle_damage: Some(PerOrganelle {
                    all: Some(30.0),
                    ..Default::default()
                }),
                ..Default::default()
            };
            for _ in 0..20 {
                s = engine.process_tick(&s, 2000.0);
                assert_in_range(&s);
            }
        }
    }

    #[test]
    fn cooldowns_count_down_to_zero() {
        let mut engine = engine();
        let mut s = running();
        s.action_cooldowns.insert(ActionId::CleanWaste, 1200.0);
        s.time_scale = 2.0;

        let mut last = s.cooldown(ActionId::CleanWaste);
        for _ in 0..5 {
            s = engine.process_tick(&s, 250.0);
            let now = s.cooldown(ActionId::CleanWaste);
            assert!(now <= last);
            assert!(now >= 0.0);
            last = now;
        }
        assert_eq!(last, 0.0);
        assert_eq!(s.elapsed_millis, 2500.0);
    }

    #[test]
    fn tick_below_stress_threshold_is_deterministic() {
        let mut s = running();
        s.resources = Resources { atp: 10.0, waste: 10.0, stress: 10.0, protein: 10.0 };

        let first = engine_with(Arc::new(ManualClock::new(T0)), 1).process_tick(&s, 1000.0);
        let second = engine_with(Arc::new(ManualClock::new(T0)), 99).process_tick(&s, 1000.0);
        assert_eq!(first, second);
        assert!(first.resources.stress < 80.0);
    }

    #[test]
    fn critical_damage_hits_one_organelle() {
        let mut engine = engine();
        let mut s = running();
        s.resources.stress = 100.0;
        let next = engine.process_tick(&s, 1000.0);

        let hit: Vec<_> = next
            .organelles
            .values()
            .filter(|h| **h < 99.0)
            .collect();
        assert_eq!(hit.len(), 1);
    }

    #[test]
    fn timed_effects_expire_exactly_at_duration() {
        let clock = Arc::new(ManualClock::new(T0));
        let mut engine = engine_with(Arc::clone(&clock), 5);
        let mut s = running();
        s.event_effects = EffectSet {
            atp_production_multiplier: Some(2.0),
            duration_ms: Some(5000),
            ..Default::default()
        }
        .stamped(T0);

        clock.set(T0 + 4999);
        let still_active = engine.process_tick(&s, 500.0);
        assert_eq!(still_active.event_effects, s.event_effects);

        clock.set(T0 + 5000);
        let expired = engine.process_tick(&still_active, 500.0);
        assert!(expired.event_effects.is_empty());
    }

    #[test]
    fn expiring_tick_keeps_multipliers_but_drops_gain_and_cost() {
        let clock = Arc::new(ManualClock::new(T0 + 1000));
        let mut engine = engine_with(Arc::clone(&clock), 5);
        let mut s = running();
        let baseline = engine.process_tick(&s, 1000.0);

        s.event_effects = EffectSet {
            atp_production_multiplier: Some(3.0),
            waste_increase: Some(5.0),
            atp_gain: Some(100.0),
            duration_ms: Some(1000),
            start_time_ms: Some(T0),
            ..Default::default()
        };
        let next = engine.process_tick(&s, 1000.0);

        // production 2.0 becomes 6.0; the +10/s gain is not counted
        assert!((next.resources.atp - (baseline.resources.atp + 4.0)).abs() < 1e-9);
        assert!((next.resources.waste - (baseline.resources.waste + 5.0)).abs() < 1e-9);
        assert!(next.event_effects.is_empty());
    }

    #[test]
    fn scheduler_stays_quiet_with_active_event() {
        let clock = Arc::new(ManualClock::new(T0));
        let mut engine = engine_with(Arc::clone(&clock), 2);
        let mut s = running();
        assert!(!engine.should_trigger_event(&s));

        s.active_event = engine.generate_event();
        assert!(s.active_event.is_some());
        clock.advance(1_000_000);
        assert!(!engine.should_trigger_event(&s));

        s.active_event = None;
        assert!(engine.should_trigger_event(&s));
    }

    #[test]
    fn choice_effects_start_at_clock_time() {
        let clock = Arc::new(ManualClock::new(T0));
        let mut engine = engine_with(Arc::clone(&clock), 2);
        let mut event = engine.generate_event().unwrap();
        event.card = engine.content().events[0].clone();
        clock.set(T0 + 123);
        let effects = engine.resolve_choice(&event, 1).unwrap();
        assert_eq!(effects.start_time_ms, Some(T0 + 123));
        assert_eq!(effects.stress_increase, Some(2.0));
    }
}
