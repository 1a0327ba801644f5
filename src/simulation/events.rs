use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::cell::{ActiveEvent, EffectSet};
use crate::config::content::ContentCatalog;
use crate::config::game::EventTiming;

/// Decides when the next random event fires.
///
/// The first poll only arms the timer; later polls fire once the wall clock
/// reaches the armed time, then re-arm.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    next_trigger_ms: Option<u64>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_trigger_ms(&self) -> Option<u64> {
        self.next_trigger_ms
    }

    pub fn reset(&mut self) {
        self.next_trigger_ms = None;
    }

    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        event_active: bool,
        now_ms: u64,
        timing: &EventTiming,
        rng: &mut R,
    ) -> bool {
        if event_active {
            return false;
        }
        match self.next_trigger_ms {
            None => {
                let next = now_ms + draw_interval(timing, rng);
                debug!(next_trigger_ms = next, "Event timer armed");
                self.next_trigger_ms = Some(next);
                false
            }
            Some(next) if now_ms >= next => {
                let rearmed = now_ms + draw_interval(timing, rng);
                debug!(now_ms, next_trigger_ms = rearmed, "Event timer fired");
                self.next_trigger_ms = Some(rearmed);
                true
            }
            Some(_) => false,
        }
    }
}

fn draw_interval<R: Rng + ?Sized>(timing: &EventTiming, rng: &mut R) -> u64 {
    if timing.max_interval_ms <= timing.min_interval_ms {
        timing.min_interval_ms
    } else {
        rng.gen_range(timing.min_interval_ms..=timing.max_interval_ms)
    }
}

/// Draw one card uniformly from the catalog.
pub fn generate_event<R: Rng + ?Sized>(
    catalog: &ContentCatalog,
    now_ms: u64,
    rng: &mut R,
) -> Option<ActiveEvent> {
    if catalog.events.is_empty() {
        debug!("Event catalog is empty; no event generated");
        return None;
    }
    let card = catalog.events[rng.gen_range(0..catalog.events.len())].clone();
    let instance_id = Uuid::from_bytes(rng.r#gen());
    debug!(event = %card.id, %instance_id, "Event generated");
    Some(ActiveEvent {
        instance_id,
        created_at_ms: now_ms,
        card,
    })
}

/// Effects of the chosen option, with the time box anchored at `now_ms`.
pub fn resolve_choice(event: &ActiveEvent, option_index: usize, now_ms: u64) -> Option<EffectSet> {
    event
        .card
        .options
        .get(option_index)
        .map(|option| option.effects.stamped(now_ms))
}
