use serde::{Deserialize, Serialize};

use crate::cell::types::OrganelleId;

/// Per-organelle modifier with an optional `all` fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerOrganelle<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitochondria: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ribosome: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lysosome: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golgi: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleus: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centrosome: Option<T>,
}

impl<T: Copy> PerOrganelle<T> {
    pub fn specific(&self, id: OrganelleId) -> Option<T> {
        match id {
            OrganelleId::Mitochondria => self.mitochondria,
            OrganelleId::Ribosome => self.ribosome,
            OrganelleId::Lysosome => self.lysosome,
            OrganelleId::Golgi => self.golgi,
            OrganelleId::Nucleus => self.nucleus,
            OrganelleId::Centrosome => self.centrosome,
        }
    }

    /// The organelle's own entry, else the `all` entry.
    pub fn resolve(&self, id: OrganelleId) -> Option<T> {
        self.specific(id).or(self.all)
    }
}

/// Modifiers applied during tick computation, optionally time-boxed.
///
/// Absent multipliers count as 1.0 and absent additive terms as 0.0. When both
/// `duration_ms` and `start_time_ms` are present the whole set expires at
/// `start_time_ms + duration_ms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atp_production_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atp_consumption_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atp_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atp_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_increase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_cleaning_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_increase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_reduction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_production_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_production_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organelle_protection: Option<PerOrganelle<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organelle_damage: Option<PerOrganelle<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
}

impl EffectSet {
    pub fn is_empty(&self) -> bool {
        *self == EffectSet::default()
    }

    pub fn atp_production_multiplier(&self) -> f64 {
        self.atp_production_multiplier.unwrap_or(1.0)
    }

    pub fn atp_consumption_multiplier(&self) -> f64 {
        self.atp_consumption_multiplier.unwrap_or(1.0)
    }

    pub fn waste_cleaning_boost(&self) -> f64 {
        self.waste_cleaning_boost.unwrap_or(1.0)
    }

    pub fn protein_boost(&self) -> f64 {
        self.protein_production_boost.unwrap_or(1.0)
    }

    pub fn protein_multiplier(&self) -> f64 {
        self.protein_production_multiplier.unwrap_or(1.0)
    }

    /// Gain/cost terms enter the ATP rate at 10% weight.
    pub fn atp_rate_adjustment(&self) -> f64 {
        self.atp_gain.unwrap_or(0.0) * 0.1 - self.atp_cost.unwrap_or(0.0) * 0.1
    }

    /// Net stress rate contributed by the effects.
    pub fn stress_adjustment(&self) -> f64 {
        self.stress_increase.unwrap_or(0.0) - self.stress_reduction.unwrap_or(0.0)
    }

    pub fn is_protected(&self, id: OrganelleId) -> bool {
        self.organelle_protection
            .as_ref()
            .is_some_and(|p| p.specific(id) == Some(true) || p.all == Some(true))
    }

    pub fn damage_for(&self, id: OrganelleId) -> Option<f64> {
        self.organelle_damage.as_ref().and_then(|d| d.resolve(id))
    }

    pub fn is_timed(&self) -> bool {
        self.duration_ms.is_some() && self.start_time_ms.is_some()
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        match (self.duration_ms, self.start_time_ms) {
            (Some(duration), Some(start)) => now_ms.saturating_sub(start) >= duration,
            _ => false,
        }
    }

    /// Copy with the time box anchored at `now_ms`, when the set declares a duration.
    pub fn stamped(&self, now_ms: u64) -> EffectSet {
        let mut out = self.clone();
        if out.duration_ms.is_some() {
            out.start_time_ms = Some(now_ms);
        }
        out
    }

    /// Overlay `newer` on top of `self`: every field `newer` sets wins.
    pub fn merged(&self, newer: &EffectSet) -> EffectSet {
        EffectSet {
            atp_production_multiplier: newer
                .atp_production_multiplier
                .or(self.atp_production_multiplier),
            atp_consumption_multiplier: newer
                .atp_consumption_multiplier
                .or(self.atp_consumption_multiplier),
            atp_gain: newer.atp_gain.or(self.atp_gain),
            atp_cost: newer.atp_cost.or(self.atp_cost),
            waste_increase: newer.waste_increase.or(self.waste_increase),
            waste_cleaning_boost: newer.waste_cleaning_boost.or(self.waste_cleaning_boost),
            stress_increase: newer.stress_increase.or(self.stress_increase),
            stress_reduction: newer.stress_reduction.or(self.stress_reduction),
            protein_production_boost: newer
                .protein_production_boost
                .or(self.protein_production_boost),
            protein_production_multiplier: newer
                .protein_production_multiplier
                .or(self.protein_production_multiplier),
            organelle_protection: newer.organelle_protection.or(self.organelle_protection),
            organelle_damage: newer.organelle_damage.or(self.organelle_damage),
            duration_ms: newer.duration_ms.or(self.duration_ms),
            start_time_ms: newer.start_time_ms.or(self.start_time_ms),
        }
    }
}
