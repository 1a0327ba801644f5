use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use crate::cell::{
    idle_cooldowns, ActionId, ActiveEvent, AtpSample, BadgeId, EffectSet, OrganelleId,
    ResourceDelta, Resources, SimulationState, Stats, MAX_ATP_SAMPLES,
};
use crate::persistence::SaveData;

pub const MIN_TIME_SCALE: f64 = 0.5;
pub const MAX_TIME_SCALE: f64 = 2.0;

/// Whether an update is announced to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    Subscribers,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn Fn(&SimulationState) + Send>;

/// Partial update: every `Some` field replaces the matching state field,
/// except `earned_badges`, which is added to the earned set.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub running: Option<bool>,
    pub paused: Option<bool>,
    pub start_time_ms: Option<Option<u64>>,
    pub elapsed_millis: Option<f64>,
    pub resources: Option<Resources>,
    pub organelles: Option<BTreeMap<OrganelleId, f64>>,
    pub selected_organelle: Option<Option<OrganelleId>>,
    pub time_scale: Option<f64>,
    pub action_cooldowns: Option<BTreeMap<ActionId, f64>>,
    pub active_event: Option<Option<ActiveEvent>>,
    pub event_effects: Option<EffectSet>,
    pub atp_history: Option<VecDeque<AtpSample>>,
    pub prologue_completed: Option<bool>,
    pub badge_progress: Option<BTreeMap<BadgeId, f64>>,
    pub earned_badges: Option<BTreeSet<BadgeId>>,
    pub stats: Option<Stats>,
}

impl StatePatch {
    fn apply_to(self, s: &mut SimulationState) {
        if let Some(v) = self.running {
            s.running = v;
        }
        if let Some(v) = self.paused {
            s.paused = v;
        }
        if let Some(v) = self.start_time_ms {
            s.start_time_ms = v;
        }
        if let Some(v) = self.elapsed_millis {
            s.elapsed_millis = v;
        }
        if let Some(v) = self.resources {
            s.resources = v.clamped();
        }
        if let Some(v) = self.organelles {
            s.organelles = v;
        }
        if let Some(v) = self.selected_organelle {
            s.selected_organelle = v;
        }
        if let Some(v) = self.time_scale {
            s.time_scale = v;
        }
        if let Some(v) = self.action_cooldowns {
            s.action_cooldowns = v;
        }
        if let Some(v) = self.active_event {
            s.active_event = v;
        }
        if let Some(v) = self.event_effects {
            s.event_effects = v;
        }
        if let Some(v) = self.atp_history {
            s.atp_history = v;
        }
        if let Some(v) = self.prologue_completed {
            s.prologue_completed = v;
        }
        if let Some(v) = self.badge_progress {
            s.badge_progress = v;
        }
        if let Some(v) = self.earned_badges {
            s.earned_badges.extend(v);
        }
        if let Some(v) = self.stats {
            s.stats = v;
        }
    }
}

/// Owner of the current snapshot.
///
/// Every change builds a new snapshot, swaps it in, and then (unless quiet)
/// calls each listener synchronously with the merged result. Several stores
/// can coexist; nothing here is global.
pub struct GameStore {
    state: Arc<SimulationState>,
    template: SimulationState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl GameStore {
    /// `initial` doubles as the template that new games restart from.
    pub fn new(initial: SimulationState) -> Self {
        GameStore {
            state: Arc::new(initial.clone()),
            template: initial,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn get(&self) -> Arc<SimulationState> {
        Arc::clone(&self.state)
    }

    pub fn update(&mut self, patch: StatePatch, mode: Notify) {
        let mut next = (*self.state).clone();
        patch.apply_to(&mut next);
        self.replace(next, mode);
    }

    /// Swap in a whole snapshot. Badges already earned are carried over.
    pub fn replace(&mut self, mut next: SimulationState, mode: Notify) {
        next.earned_badges.extend(self.state.earned_badges.iter().copied());
        self.state = Arc::new(next);
        if mode == Notify::Subscribers {
            self.notify();
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Announce the current snapshot. Closes a batch of quiet updates.
    pub fn publish(&self) {
        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    // === Lifecycle ===

    /// Begin a game at wall-clock `now_ms`.
    ///
    /// Resources come from the template unless the prologue already set them.
    pub fn start_game(&mut self, now_ms: u64) {
        let resources = if self.state.prologue_completed {
            self.state.resources
        } else {
            self.template.resources
        };
        self.update(
            StatePatch {
                running: Some(true),
                paused: Some(false),
                start_time_ms: Some(Some(now_ms)),
                elapsed_millis: Some(0.0),
                resources: Some(resources),
                organelles: Some(self.template.organelles.clone()),
                selected_organelle: Some(None),
                time_scale: Some(1.0),
                action_cooldowns: Some(idle_cooldowns()),
                active_event: Some(None),
                event_effects: Some(EffectSet::default()),
                atp_history: Some(VecDeque::new()),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    /// Stop the game and fold its duration into the statistics.
    pub fn stop_game(&mut self) {
        let elapsed = self.state.elapsed_millis;
        let mut stats = self.state.stats;
        stats.total_play_time_ms += elapsed;
        stats.best_survival_time_ms = stats.best_survival_time_ms.max(elapsed);
        self.update(
            StatePatch {
                running: Some(false),
                paused: Some(false),
                stats: Some(stats),
                ..Default::default()
            },
            Notify::Quiet,
        );
    }

    /// Returns the new pause flag. Ignored while no game is running.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        let paused = !self.state.paused;
        self.update(
            StatePatch {
                paused: Some(paused),
                ..Default::default()
            },
            Notify::Subscribers,
        );
        paused
    }

    /// Returns the clamped scale actually applied.
    pub fn set_time_scale(&mut self, scale: f64) -> f64 {
        let scale = if scale.is_finite() {
            scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
        } else {
            1.0
        };
        self.update(
            StatePatch {
                time_scale: Some(scale),
                ..Default::default()
            },
            Notify::Subscribers,
        );
        scale
    }

    pub fn select_organelle(&mut self, id: Option<OrganelleId>) {
        self.update(
            StatePatch {
                selected_organelle: Some(id),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    pub fn apply_delta(&mut self, delta: ResourceDelta) {
        let resources = delta.applied_to(self.state.resources);
        self.update(
            StatePatch {
                resources: Some(resources),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    pub fn mark_prologue_completed(&mut self) {
        self.update(
            StatePatch {
                prologue_completed: Some(true),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    /// Back to the template, keeping badges and statistics.
    pub fn reset_for_new_game(&mut self) {
        let mut next = self.template.clone();
        next.earned_badges = self.state.earned_badges.clone();
        next.badge_progress = self.state.badge_progress.clone();
        next.stats = self.state.stats;
        next.prologue_completed = false;
        self.replace(next, Notify::Subscribers);
    }

    // === Progress ===

    /// Returns false when the badge was already earned.
    pub fn add_badge(&mut self, id: BadgeId) -> bool {
        if self.state.earned_badges.contains(&id) {
            return false;
        }
        let mut earned = self.state.earned_badges.clone();
        earned.insert(id);
        self.update(
            StatePatch {
                earned_badges: Some(earned),
                ..Default::default()
            },
            Notify::Subscribers,
        );
        true
    }

    pub fn update_badge_progress(&mut self, progress: BTreeMap<BadgeId, f64>) {
        let mut merged = self.state.badge_progress.clone();
        merged.extend(progress);
        self.update(
            StatePatch {
                badge_progress: Some(merged),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    /// Append the current ATP level to the chart history.
    pub fn record_atp_sample(&mut self, at_ms: u64) {
        let mut history = self.state.atp_history.clone();
        history.push_back(AtpSample {
            at_ms,
            atp: self.state.resources.atp,
        });
        while history.len() > MAX_ATP_SAMPLES {
            history.pop_front();
        }
        self.update(
            StatePatch {
                atp_history: Some(history),
                ..Default::default()
            },
            Notify::Quiet,
        );
    }

    pub fn restore_progress(&mut self, data: SaveData) {
        self.update(
            StatePatch {
                earned_badges: Some(data.earned_badges),
                stats: Some(data.stats),
                badge_progress: Some(data.badge_progress),
                ..Default::default()
            },
            Notify::Subscribers,
        );
    }

    pub fn progress(&self) -> SaveData {
        SaveData {
            earned_badges: self.state.earned_badges.clone(),
            stats: self.state.stats,
            badge_progress: self.state.badge_progress.clone(),
        }
    }
}
