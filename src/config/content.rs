use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::cell::{BadgeId, EventCard};
use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Read-only event and badge catalog.
///
/// An empty event list is allowed; the scheduler then never produces events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default)]
    pub events: Vec<EventCard>,
    #[serde(default)]
    pub badges: Vec<BadgeDefinition>,
}

impl ContentCatalog {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, path)
    }

    pub fn from_json_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let catalog: ContentCatalog =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                path: source_path.to_path_buf(),
                message: e.to_string(),
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let mut seen_events = HashSet::new();

        for card in &self.events {
            if !seen_events.insert(card.id.as_str()) {
                errors.push(format!("event '{}' is defined more than once", card.id));
            }
            if card.options.is_empty() {
                errors.push(format!("event '{}' has no options", card.id));
            }
            if let Some(correct) = card.correct_option {
                if correct >= card.options.len() {
                    errors.push(format!(
                        "event '{}' correct_option {} is out of range (0-{})",
                        card.id,
                        correct,
                        card.options.len().saturating_sub(1)
                    ));
                }
            }
        }

        let mut seen_badges = HashSet::new();
        for badge in &self.badges {
            if !seen_badges.insert(badge.id) {
                errors.push(format!("badge '{}' is defined more than once", badge.id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("\n")))
        }
    }

    pub fn badge(&self, id: BadgeId) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|b| b.id == id)
    }

    /// Display name for a badge, falling back to its identifier.
    pub fn badge_name(&self, id: BadgeId) -> String {
        self.badge(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) const SAMPLE: &str = r#"{
        "events": [
            {
                "id": "heat_shock",
                "title": "Heat shock",
                "description": "The medium warms up quickly.",
                "options": [
                    { "text": "Make chaperones", "effects": { "stress_reduction": 1.0, "duration_ms": 10000 } },
                    { "text": "Ignore it", "effects": { "stress_increase": 2.0, "duration_ms": 10000 } }
                ],
                "correct_option": 0
            },
            {
                "id": "toxin",
                "title": "Toxin",
                "options": [
                    { "text": "Seal the membrane", "effects": { "organelle_protection": { "all": true }, "duration_ms": 5000 } }
                ]
            }
        ],
        "badges": [
            { "id": "survivor_3min", "name": "Survivor", "description": "Survive three minutes", "icon": "clock" },
            { "id": "calm_cell", "name": "Calm Cell" }
        ]
    }"#;

    fn test_path() -> PathBuf {
        PathBuf::from("test-content.json")
    }

    pub(crate) fn sample_catalog() -> ContentCatalog {
        ContentCatalog::from_json_str(SAMPLE, &test_path()).unwrap()
    }

    #[test]
    fn sample_catalog_loads() {
        let catalog = sample_catalog();
        assert_eq!(catalog.events.len(), 2);
        assert_eq!(catalog.events[0].correct_option, Some(0));
        assert_eq!(catalog.events[1].correct_option, None);
        assert_eq!(catalog.badge_name(BadgeId::CalmCell), "Calm Cell");
        assert_eq!(catalog.badge_name(BadgeId::EventMaster), "event_master");
    }

    #[test]
    fn empty_catalog_is_valid() {
        let catalog = ContentCatalog::from_json_str("{}", &test_path()).unwrap();
        assert!(catalog.events.is_empty());
        assert!(catalog.badges.is_empty());
    }

    #[test]
    fn out_of_range_correct_option_rejected() {
        let json = r#"{ "events": [ { "id": "a", "title": "A",
            "options": [ { "text": "only" } ], "correct_option": 3 } ] }"#;
        let err = ContentCatalog::from_json_str(json, &test_path()).unwrap_err();
        assert!(err.to_string().contains("correct_option 3"));
    }

    #[test]
    fn duplicate_ids_and_empty_options_reported_together() {
        let json = r#"{ "events": [
            { "id": "a", "title": "A", "options": [] },
            { "id": "a", "title": "A again", "options": [ { "text": "x" } ] }
        ] }"#;
        let msg = ContentCatalog::from_json_str(json, &test_path())
            .unwrap_err()
            .to_string();
        assert!(msg.contains("more than once"));
        assert!(msg.contains("no options"));
    }

    #[test]
    fn unknown_badge_id_is_parse_error() {
        let json = r#"{ "badges": [ { "id": "speed_runner", "name": "Fast" } ] }"#;
        let err = ContentCatalog::from_json_str(json, &test_path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
