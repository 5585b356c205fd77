use crate::constants::*;
use crate::*;
use std::collections::{HashMap, HashSet};

/// Rates a single grenade on a 0-100 scale.
pub trait GrenadeScorer {
    fn score(&self, grenade: &GrenadeEvent) -> f64;
}

/// Rewards blinding enemies and flashes that set up kills; punishes team
/// flashes and flashes that got a teammate killed.
pub struct FlashScorer;

impl GrenadeScorer for FlashScorer {
    fn score(&self, grenade: &GrenadeEvent) -> f64 {
        let mut score = grenade.enemies_flashed as f64 * 20.0 + grenade.enemy_flash_duration * 10.0
            - grenade.teammates_flashed as f64 * 15.0
            - grenade.team_flash_duration * 5.0;
        if grenade.flash_leads_to_kill {
            score += 30.0;
        }
        if grenade.flash_leads_to_death {
            score -= 30.0;
        }
        clamp_percent(score)
    }
}

pub struct ExplosiveScorer;

impl GrenadeScorer for ExplosiveScorer {
    fn score(&self, grenade: &GrenadeEvent) -> f64 {
        normalize_to_percent(
            grenade.net_enemy_damage() as f64,
            EXPLOSIVE_DAMAGE_FOR_MAX_RATING,
        )
    }
}

pub struct UtilityScorer;

impl GrenadeScorer for UtilityScorer {
    fn score(&self, _grenade: &GrenadeEvent) -> f64 {
        0.0
    }
}

pub fn scorer_for(category: GrenadeCategory) -> &'static dyn GrenadeScorer {
    match category {
        GrenadeCategory::Flash => &FlashScorer,
        GrenadeCategory::Explosive => &ExplosiveScorer,
        GrenadeCategory::Utility => &UtilityScorer,
    }
}

fn damage_window(grenade: GrenadeKind, config: &ProcessorConfig, tick_rate: f64) -> Tick {
    let seconds = match grenade {
        GrenadeKind::HighExplosive => config.he_damage_window_seconds,
        _ => config.fire_damage_window_seconds,
    };
    seconds_to_ticks(seconds, tick_rate)
}

/// Attributes every grenade damage event of `round` to the latest matching
/// detonation by the same thrower inside that grenade's damage window, then
/// rates every grenade of the round. Safe to run more than once.
pub fn aggregate_grenade_damage(state: &mut MatchState, round: u32, config: &ProcessorConfig) {
    let tick_rate = state.tick_rate;
    let grenade_indices: Vec<usize> = state
        .grenades
        .iter()
        .enumerate()
        .filter(|(_, grenade)| grenade.round_number == round)
        .map(|(index, _)| index)
        .collect();

    for index in grenade_indices.iter() {
        let grenade = &mut state.grenades[*index];
        grenade.enemy_damage = 0;
        grenade.team_damage = 0;
        grenade.enemies_damaged = 0;
        grenade.teammates_damaged = 0;
    }

    let mut enemies_hit: HashMap<usize, HashSet<PlayerId>> = HashMap::new();
    let mut teammates_hit: HashMap<usize, HashSet<PlayerId>> = HashMap::new();
    for damage in state.damages.iter_mut().filter(|d| d.round_number == round) {
        damage.grenade_entity_id = None;
        let Some(attacker) = damage.attacker_id else {
            continue;
        };
        let source = grenade_indices
            .iter()
            .copied()
            .filter(|index| {
                let grenade = &state.grenades[*index];
                grenade.thrower_id == attacker
                    && grenade.grenade.matches_damage_weapon(damage.weapon)
                    && damage.tick >= grenade.detonation_tick
                    && damage.tick - grenade.detonation_tick
                        <= damage_window(grenade.grenade, config, tick_rate)
            })
            .max_by_key(|index| state.grenades[*index].detonation_tick);
        let Some(source) = source else {
            continue;
        };

        damage.grenade_entity_id = Some(state.grenades[source].entity_id);
        let grenade = &mut state.grenades[source];
        if damage.is_enemy_damage() {
            grenade.enemy_damage += damage.health_damage_taken;
            enemies_hit.entry(source).or_default().insert(damage.victim_id);
        } else {
            grenade.team_damage += damage.health_damage_taken;
            if damage.is_team_damage {
                teammates_hit.entry(source).or_default().insert(damage.victim_id);
            }
        }
    }

    for index in grenade_indices {
        let grenade = &mut state.grenades[index];
        grenade.enemies_damaged = enemies_hit.get(&index).map_or(0, |hit| hit.len() as u32);
        grenade.teammates_damaged = teammates_hit.get(&index).map_or(0, |hit| hit.len() as u32);
        grenade.effectiveness_rating = scorer_for(grenade.grenade.category()).score(grenade);
    }
}

/// Per-round grenade effectiveness for one player:
/// `10 * thrown + 20 * (1 - min(value_lost, 1000) / 1000) + mean rating`,
/// capped at 100. Zero when the player neither threw nor lost a grenade.
pub fn grenade_effectiveness(thrown: u32, value_lost: i32, ratings: &[f64]) -> f64 {
    if thrown == 0 && value_lost <= 0 {
        return 0.0;
    }
    let lost = (value_lost.max(0) as f64).min(GRENADE_VALUE_LOSS_CAP);
    let score = GRENADE_POINTS_PER_THROW * thrown as f64
        + GRENADE_SURVIVAL_POINTS * (1.0 - lost / GRENADE_VALUE_LOSS_CAP)
        + mean(ratings);
    score.min(MAX_GRENADE_EFFECTIVENESS)
}
