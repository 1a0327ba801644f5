use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cell::{ActionId, OrganelleId, Resources};
use crate::config::ConfigError;

/// Static rates, thresholds and tables the engine reads on every tick.
///
/// `rates`, `thresholds`, `actions`, `events` and `initial_values` have no
/// defaults: the engine cannot run without them, so a file missing any of them
/// is rejected at load time. Driver timing, logging and badge rules default.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_max_tick_delta_ms")]
    pub max_tick_delta_ms: u64,
    #[serde(default = "default_badge_interval_ms")]
    pub badge_interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub rates: Rates,
    pub thresholds: Thresholds,
    pub actions: ActionTable,
    pub events: EventTiming,
    pub initial_values: InitialValues,
    #[serde(default)]
    pub badges: BadgeRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rates {
    pub atp_base_production: f64,
    pub atp_consumption_base: f64,
    pub waste_cleaning_base: f64,
    pub stress_increase_base: f64,
    pub protein_production_base: f64,
    pub organelle_decay_base: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    pub atp_critical: f64,
    pub waste_danger: f64,
    pub stress_critical: f64,
}

/// Cost, cooldown and effect of one player action. Unused fields stay zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    pub cooldown_ms: f64,
    #[serde(default)]
    pub atp_cost: f64,
    #[serde(default)]
    pub atp_gain: f64,
    #[serde(default)]
    pub waste_cost: f64,
    #[serde(default)]
    pub waste_reduction: f64,
    #[serde(default)]
    pub protein_gain: f64,
    #[serde(default)]
    pub health_gain: f64,
    #[serde(default)]
    pub stress_cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionTable {
    pub take_nutrient: ActionConfig,
    pub clean_waste: ActionConfig,
    pub produce_protein: ActionConfig,
    pub repair_organelle: ActionConfig,
}

impl ActionTable {
    pub fn get(&self, action: ActionId) -> &ActionConfig {
        match action {
            ActionId::TakeNutrient => &self.take_nutrient,
            ActionId::CleanWaste => &self.clean_waste,
            ActionId::ProduceProtein => &self.produce_protein,
            ActionId::RepairOrganelle => &self.repair_organelle,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTiming {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitialValues {
    pub atp: f64,
    pub waste: f64,
    pub stress: f64,
    pub protein: f64,
    pub organelles: BTreeMap<OrganelleId, f64>,
}

impl InitialValues {
    pub fn resources(&self) -> Resources {
        Resources {
            atp: self.atp,
            waste: self.waste,
            stress: self.stress,
            protein: self.protein,
        }
    }
}

/// Thresholds for the badge evaluator. Durations are in simulation seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BadgeRules {
    pub survivor_seconds: f64,
    pub atp_master_level: f64,
    pub atp_master_seconds: f64,
    pub waste_cleaner_level: f64,
    pub waste_cleaner_crossings: u32,
    pub calm_cell_level: f64,
    pub calm_cell_seconds: f64,
    pub organelle_protector_seconds: f64,
    pub event_master_choices: u32,
    pub mito_guardian_health: f64,
    pub balance_low: f64,
    pub balance_high: f64,
}

impl Default for BadgeRules {
    fn default() -> Self {
        BadgeRules {
            survivor_seconds: 180.0,
            atp_master_level: 60.0,
            atp_master_seconds: 45.0,
            waste_cleaner_level: 30.0,
            waste_cleaner_crossings: 3,
            calm_cell_level: 20.0,
            calm_cell_seconds: 60.0,
            organelle_protector_seconds: 300.0,
            event_master_choices: 5,
            mito_guardian_health: 90.0,
            balance_low: 40.0,
            balance_high: 80.0,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    500
}
fn default_max_tick_delta_ms() -> u64 {
    2000
}
fn default_badge_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl GameConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| ConfigError::from_toml(source_path, e.message()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.tick_interval_ms == 0 {
            errors.push("tick_interval_ms must be > 0. Example: tick_interval_ms = 500".to_string());
        }

        if self.max_tick_delta_ms < self.tick_interval_ms {
            errors.push(format!(
                "max_tick_delta_ms must be >= tick_interval_ms ({}), got {}",
                self.tick_interval_ms, self.max_tick_delta_ms
            ));
        }

        if self.badge_interval_ms == 0 {
            errors.push(
                "badge_interval_ms must be > 0. Example: badge_interval_ms = 1000".to_string(),
            );
        }

        let rates = [
            ("rates.atp_base_production", self.rates.atp_base_production),
            ("rates.atp_consumption_base", self.rates.atp_consumption_base),
            ("rates.waste_cleaning_base", self.rates.waste_cleaning_base),
            ("rates.stress_increase_base", self.rates.stress_increase_base),
            ("rates.protein_production_base", self.rates.protein_production_base),
            ("rates.organelle_decay_base", self.rates.organelle_decay_base),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{} must be a finite value >= 0, got {}", name, value));
            }
        }

        let thresholds = [
            ("thresholds.atp_critical", self.thresholds.atp_critical),
            ("thresholds.waste_danger", self.thresholds.waste_danger),
            ("thresholds.stress_critical", self.thresholds.stress_critical),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("{} must be 0-100, got {}", name, value));
            }
        }

        for action in ActionId::ALL {
            let a = self.actions.get(action);
            if a.cooldown_ms < 0.0 {
                errors.push(format!(
                    "actions.{}.cooldown_ms must be >= 0, got {}",
                    action, a.cooldown_ms
                ));
            }
            if a.atp_cost < 0.0 {
                errors.push(format!(
                    "actions.{}.atp_cost must be >= 0, got {}",
                    action, a.atp_cost
                ));
            }
        }

        if self.events.min_interval_ms == 0 {
            errors.push("events.min_interval_ms must be > 0".to_string());
        }
        if self.events.max_interval_ms < self.events.min_interval_ms {
            errors.push(format!(
                "events.max_interval_ms ({}) must be >= events.min_interval_ms ({})",
                self.events.max_interval_ms, self.events.min_interval_ms
            ));
        }

        let iv = &self.initial_values;
        for (name, value) in [
            ("initial_values.atp", iv.atp),
            ("initial_values.waste", iv.waste),
            ("initial_values.stress", iv.stress),
            ("initial_values.protein", iv.protein),
        ] {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("{} must be 0-100, got {}", name, value));
            }
        }
        for required in OrganelleId::REQUIRED {
            if !iv.organelles.contains_key(&required) {
                errors.push(format!(
                    "initial_values.organelles.{} is required. Example: {} = 100.0",
                    required, required
                ));
            }
        }
        for (id, health) in &iv.organelles {
            if !(0.0..=100.0).contains(health) {
                errors.push(format!(
                    "initial_values.organelles.{} must be 0-100, got {}",
                    id, health
                ));
            }
        }

        let b = &self.badges;
        if b.balance_low > b.balance_high {
            errors.push(format!(
                "badges.balance_low ({}) must be <= badges.balance_high ({})",
                b.balance_low, b.balance_high
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("\n")))
        }
    }
}
