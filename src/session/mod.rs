use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::badges::BadgeEvaluator;
use crate::cell::{ActionId, BadgeId, OrganelleId, SimulationState};
use crate::clock::Clock;
use crate::config::content::ContentCatalog;
use crate::config::game::GameConfig;
use crate::persistence::SaveData;
use crate::simulation::actions::ActionOutcome;
use crate::simulation::game_over::GameOverReason;
use crate::simulation::{EngineError, SimulationEngine};
use crate::store::{GameStore, Notify, StatePatch};

/// How a game ended.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOver {
    pub reasons: Vec<GameOverReason>,
    pub survived_ms: f64,
    pub final_badges: Vec<BadgeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Real milliseconds fed to the engine, after capping.
    pub elapsed_ms: f64,
    pub capped: bool,
    pub new_event: Option<String>,
    pub game_over: Option<GameOver>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// Not running, or paused.
    Idle,
    /// The clock has not moved since the last tick.
    NoTimeElapsed,
    Advanced(TickSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceReport {
    pub event_id: String,
    pub option_index: usize,
    pub correct: bool,
    pub feedback: Option<String>,
}

/// One player's game: the store plus everything that drives it.
///
/// All mutation goes through `&mut self`, so a tick can never start while
/// another is still running.
pub struct Session {
    store: GameStore,
    engine: SimulationEngine,
    badges: BadgeEvaluator,
    clock: Arc<dyn Clock>,
    max_tick_delta_ms: f64,
    last_tick_ms: Option<u64>,
}

impl Session {
    pub fn new(
        config: Arc<GameConfig>,
        content: Arc<ContentCatalog>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let store = GameStore::new(SimulationState::from_config(&config));
        let badges = BadgeEvaluator::new(config.badges.clone());
        let max_tick_delta_ms = config.max_tick_delta_ms as f64;
        let engine = SimulationEngine::new(config, content, Arc::clone(&clock), seed)?;
        Ok(Session {
            store,
            engine,
            badges,
            clock,
            max_tick_delta_ms,
            last_tick_ms: None,
        })
    }

    pub fn state(&self) -> Arc<SimulationState> {
        self.store.get()
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GameStore {
        &mut self.store
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    // === Lifecycle ===

    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.store.start_game(now);
        self.engine.reset_schedule();
        self.badges.reset();
        self.last_tick_ms = Some(now);
        let s = self.store.get();
        info!(
            atp = s.resources.atp,
            waste = s.resources.waste,
            stress = s.resources.stress,
            protein = s.resources.protein,
            "Game started"
        );
    }

    pub fn stop(&mut self) {
        if !self.store.get().running {
            return;
        }
        self.store.stop_game();
        let s = self.store.get();
        info!(
            survived_s = s.elapsed_seconds(),
            best_s = s.stats.best_survival_time_ms / 1000.0,
            "Game stopped"
        );
    }

    /// Advance the game by the real time since the previous tick.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let raw_ms = self
            .last_tick_ms
            .replace(now)
            .map_or(0.0, |last| now as f64 - last as f64);

        let state = self.store.get();
        if !state.is_ticking() {
            return TickReport::Idle;
        }
        if raw_ms <= 0.0 {
            return TickReport::NoTimeElapsed;
        }

        let capped = raw_ms > self.max_tick_delta_ms;
        if capped {
            warn!(
                elapsed_ms = raw_ms,
                cap_ms = self.max_tick_delta_ms,
                "Tick delta capped"
            );
        }
        let elapsed_ms = raw_ms.min(self.max_tick_delta_ms);

        let next = self.engine.process_tick(&state, elapsed_ms);
        self.store.replace(next, Notify::Quiet);
        self.store.record_atp_sample(now);

        let mut new_event = None;
        if self.engine.should_trigger_event(&self.store.get()) {
            if let Some(event) = self.engine.generate_event() {
                info!(event = %event.card.id, title = %event.card.title, "Event triggered");
                new_event = Some(event.card.id.clone());
                self.store.update(
                    StatePatch {
                        active_event: Some(Some(event)),
                        ..Default::default()
                    },
                    Notify::Quiet,
                );
            }
        }

        let game_over = self.check_game_over();
        self.store.publish();

        TickReport::Advanced(TickSummary {
            elapsed_ms,
            capped,
            new_event,
            game_over,
        })
    }

    fn check_game_over(&mut self) -> Option<GameOver> {
        let state = self.store.get();
        let reasons = self.engine.check_game_over(&state)?;

        let mut final_badges = self.badges.evaluate_final(&state);
        final_badges.retain(|id| self.store.add_badge(*id));
        self.store.stop_game();

        let reason_text: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        info!(
            survived_s = state.elapsed_seconds(),
            reasons = ?reason_text,
            final_badges = ?final_badges,
            "Game over"
        );

        Some(GameOver {
            reasons,
            survived_ms: state.elapsed_millis,
            final_badges,
        })
    }

    /// Run the badge evaluator and apply its report. Returns the newly earned
    /// badges.
    pub fn evaluate_badges(&mut self) -> Vec<BadgeId> {
        let state = self.store.get();
        let report = self.badges.evaluate(&state);
        if !report.badge_progress.is_empty() {
            self.store.update_badge_progress(report.badge_progress);
        }
        let mut earned = report.newly_earned;
        earned.retain(|id| self.store.add_badge(*id));
        for id in &earned {
            let name = self.engine.content().badge_name(*id);
            info!(badge = %id, name = %name, "Badge earned");
        }
        earned
    }

    // === Player input ===

    pub fn perform_action(&mut self, action: ActionId) -> ActionOutcome {
        let state = self.store.get();
        let resolution = self.engine.apply_action(&state, action);
        if resolution.outcome.is_success() {
            self.store.replace(resolution.state, Notify::Subscribers);
            debug!(action = %action, "Action applied");
        } else {
            debug!(action = %action, outcome = %resolution.outcome, "Action refused");
        }
        resolution.outcome
    }

    /// Answer the active event. `None` when there is no event or the index is
    /// out of range.
    pub fn choose_option(&mut self, option_index: usize) -> Option<ChoiceReport> {
        let state = self.store.get();
        let event = state.active_event.as_ref()?;
        let effects = self.engine.resolve_choice(event, option_index)?;

        let correct = event.card.is_correct(option_index);
        let feedback = event
            .card
            .options
            .get(option_index)
            .and_then(|o| o.feedback.clone());

        let now = self.clock.now_ms();
        let event_effects = if state.event_effects.is_expired(now) {
            effects
        } else {
            state.event_effects.merged(&effects)
        };

        let mut stats = state.stats;
        stats.events_handled += 1;
        if correct {
            stats.correct_event_choices += 1;
        }

        self.store.update(
            StatePatch {
                active_event: Some(None),
                event_effects: Some(event_effects),
                stats: Some(stats),
                ..Default::default()
            },
            Notify::Subscribers,
        );
        info!(event = %event.card.id, option = option_index, correct, "Event resolved");

        Some(ChoiceReport {
            event_id: event.card.id.clone(),
            option_index,
            correct,
            feedback,
        })
    }

    pub fn select_organelle(&mut self, id: Option<OrganelleId>) {
        self.store.select_organelle(id);
    }

    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.store.toggle_pause();
        info!(paused, "Pause toggled");
        paused
    }

    pub fn set_time_scale(&mut self, scale: f64) -> f64 {
        let applied = self.store.set_time_scale(scale);
        if applied != scale {
            debug!(requested = scale, applied, "Time scale clamped");
        }
        applied
    }

    // === Progress ===

    pub fn restore_progress(&mut self, data: SaveData) {
        self.store.restore_progress(data);
    }

    pub fn progress(&self) -> SaveData {
        self.store.progress()
    }
}
