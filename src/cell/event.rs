use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cell::effects::EffectSet;

/// One choice on an event card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOption {
    pub text: String,
    #[serde(default)]
    pub effects: EffectSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Catalog entry for a randomly scheduled perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub options: Vec<EventOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
}

impl EventCard {
    pub fn is_correct(&self, option_index: usize) -> bool {
        self.correct_option == Some(option_index)
    }
}

/// An event card drawn from the catalog and waiting for the player's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub instance_id: Uuid,
    pub created_at_ms: u64,
    pub card: EventCard,
}
