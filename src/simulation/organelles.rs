use rand::Rng;
use std::collections::BTreeMap;

use crate::cell::{clamp_level, EffectSet, OrganelleId};
use crate::config::game::GameConfig;

/// Post-update resource levels that drive organelle wear.
#[derive(Debug, Clone, Copy)]
pub struct WearLevels {
    pub atp: f64,
    pub stress: f64,
    pub waste: f64,
}

/// Health lost per second from the cell's overall condition.
pub fn wear_rate(levels: WearLevels, config: &GameConfig) -> f64 {
    let stress_damage = levels.stress * 0.0005;
    let waste_damage = if levels.waste > 50.0 {
        (levels.waste - 50.0) * 0.0003
    } else {
        0.0
    };
    let atp_damage = if levels.atp < 10.0 {
        (10.0 - levels.atp) * 0.001
    } else {
        0.0
    };
    config.rates.organelle_decay_base + stress_damage + waste_damage + atp_damage
}

/// Apply event damage and wear to every unprotected organelle.
///
/// Event damage is a flat amount per tick; wear is scaled by `dt` seconds.
pub fn decay(
    organelles: &BTreeMap<OrganelleId, f64>,
    effects: &EffectSet,
    levels: WearLevels,
    config: &GameConfig,
    dt: f64,
) -> BTreeMap<OrganelleId, f64> {
    let wear = wear_rate(levels, config) * dt;

    organelles
        .iter()
        .map(|(id, health)| {
            if effects.is_protected(*id) {
                return (*id, *health);
            }
            let mut h = *health;
            if let Some(damage) = effects.damage_for(*id) {
                h = (h - damage).max(0.0);
            }
            (*id, clamp_level(h - wear))
        })
        .collect()
}

/// When stress is past the critical threshold, pick one organelle uniformly at
/// random and return the extra damage it takes.
pub fn critical_damage<R: Rng + ?Sized>(
    organelles: &BTreeMap<OrganelleId, f64>,
    stress: f64,
    config: &GameConfig,
    rng: &mut R,
) -> Option<(OrganelleId, f64)> {
    let threshold = config.thresholds.stress_critical;
    if stress <= threshold || organelles.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..organelles.len());
    let id = organelles.keys().nth(index).copied()?;
    Some((id, (stress - threshold) * 0.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::PerOrganelle;
    use crate::config::game::tests::sample_config;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn full_health() -> BTreeMap<OrganelleId, f64> {
        OrganelleId::REQUIRED.iter().map(|id| (*id, 100.0)).collect()
    }

    const CALM: WearLevels = WearLevels {
        atp: 50.0,
        stress: 0.0,
        waste: 0.0,
    };

    #[test]
    fn wear_rate_terms_add_up() {
        let config = sample_config();
        assert!((wear_rate(CALM, &config) - 0.05).abs() < 1e-12);
        let harsh = WearLevels {
            atp: 0.0,
            stress: 100.0,
            waste: 100.0,
        };
        let expected = 0.05 + 0.05 + 0.015 + 0.01;
        assert!((wear_rate(harsh, &config) - expected).abs() < 1e-12);
    }

    #[test]
    fn decay_applies_wear_to_everything() {
        let config = sample_config();
        let out = decay(&full_health(), &EffectSet::default(), CALM, &config, 2.0);
        for health in out.values() {
            assert!((health - 99.9).abs() < 1e-9);
        }
    }

    #[test]
    fn protected_organelles_are_untouched() {
        let config = sample_config();
        let effects = EffectSet {
            organelle_protection: Some(PerOrganelle {
                nucleus: Some(true),
                ..Default::default()
            }),
            organelle_damage: Some(PerOrganelle {
                all: Some(10.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = decay(&full_health(), &effects, CALM, &config, 1.0);
        assert_eq!(out[&OrganelleId::Nucleus], 100.0);
        assert!((out[&OrganelleId::Golgi] - (90.0 - 0.05)).abs() < 1e-9);
    }

    #[test]
    fn decay_never_goes_below_zero() {
        let config = sample_config();
        let mut organelles = full_health();
        organelles.insert(OrganelleId::Ribosome, 0.01);
        let effects = EffectSet {
            organelle_damage: Some(PerOrganelle {
                ribosome: Some(50.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = decay(&organelles, &effects, CALM, &config, 1.0);
        assert_eq!(out[&OrganelleId::Ribosome], 0.0);
    }

    #[test]
    fn no_critical_damage_at_or_below_threshold() {
        let config = sample_config();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(critical_damage(&full_health(), 80.0, &config, &mut rng).is_none());
        assert!(critical_damage(&full_health(), 12.0, &config, &mut rng).is_none());
    }

    #[test]
    fn critical_damage_scales_with_overshoot() {
        let config = sample_config();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (id, damage) = critical_damage(&full_health(), 90.0, &config, &mut rng).unwrap();
        assert!(OrganelleId::REQUIRED.contains(&id));
        assert!((damage - 1.0).abs() < 1e-12);
    }

    #[test]
    fn critical_damage_pick_is_seed_deterministic() {
        let config = sample_config();
        let picks = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| critical_damage(&full_health(), 95.0, &config, &mut rng).unwrap().0)
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }

    #[test]
    fn empty_organelle_map_yields_no_pick() {
        let config = sample_config();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(critical_damage(&BTreeMap::new(), 99.0, &config, &mut rng).is_none());
    }
}
