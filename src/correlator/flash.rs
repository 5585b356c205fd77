use super::{build_grenade_record, require_live_round, same_team};
use crate::*;

#[derive(Debug, Clone, PartialEq)]
pub struct FlashedPlayer {
    pub player_id: PlayerId,
    pub is_enemy: bool,
    pub duration: f64,
}

/// A flashbang detonation and the players it blinded. Lives until the end of
/// the round it detonated in.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashEffect {
    pub entity_id: EntityId,
    pub round: u32,
    pub tick: Tick,
    pub position: Vector3,
    pub thrower_id: PlayerId,
    pub affected: Vec<FlashedPlayer>,
    /// The grenade record of this flash, if its throw was seen.
    pub grenade_index: Option<usize>,
}

/// A `PlayerFlashed` notification that arrived before its detonation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFlashed {
    pub round: u32,
    pub tick: Tick,
    pub thrower_id: PlayerId,
    pub player_id: PlayerId,
    pub duration: f64,
}

/// Which way a flash swung a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOutcome {
    LeadsToKill,
    LeadsToDeath,
}

pub fn record_flash_explode(
    state: &mut MatchState,
    config: &ProcessorConfig,
    projectile: &ProjectileEvent,
    tick: Tick,
) -> FragActorResult<()> {
    let round = require_live_round(state, "flash_explode")?;
    let thrower = require_actor(&projectile.thrower, "flash_explode", "thrower")?;

    if let Some(effect) = state.tables.flash_effects.get_mut(&projectile.entity_id) {
        if effect.tick != tick {
            log::debug!(
                "Flash {} detonation moved from tick {} to {}",
                projectile.entity_id,
                effect.tick,
                tick
            );
        }
        effect.tick = tick;
        effect.position = projectile.position;
        if let Some(index) = effect.grenade_index {
            let grenade = &mut state.grenades[index];
            grenade.detonation_tick = tick;
            grenade.final_position = projectile.position;
        }
        return Ok(());
    }

    let grenade_index = match build_grenade_record(state, projectile, tick) {
        Ok(Some(index)) => Some(index),
        Ok(None) => return Ok(()),
        Err(error) if !error.is_fatal() => {
            // Keep the effect for flash assists even without a grenade record.
            log::warn!("Flash {} has no grenade record: {}", projectile.entity_id, error);
            None
        }
        Err(error) => return Err(error),
    };

    state.tables.flash_effects.insert(
        projectile.entity_id,
        FlashEffect {
            entity_id: projectile.entity_id,
            round,
            tick,
            position: projectile.position,
            thrower_id: thrower.id,
            affected: Vec::new(),
            grenade_index,
        },
    );

    let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.tables.pending_flashed)
        .into_iter()
        .partition(|pending| {
            pending.round == round
                && pending.thrower_id == thrower.id
                && flash_matches(config.flash_correlation, pending.tick, tick)
        });
    state.tables.pending_flashed = waiting;
    for pending in ready {
        add_flashed_player(
            state,
            projectile.entity_id,
            pending.player_id,
            pending.duration,
        );
    }
    Ok(())
}

pub fn record_player_flashed(
    state: &mut MatchState,
    config: &ProcessorConfig,
    flashed: &PlayerFlashedEvent,
    tick: Tick,
) -> FragActorResult<()> {
    let round = require_live_round(state, "player_flashed")?;
    let player = require_actor(&flashed.player, "player_flashed", "player")?;
    let thrower = require_actor(&flashed.attacker, "player_flashed", "attacker")?;
    let duration = flashed.flash_duration as f64;
    if duration <= 0.0 {
        return Ok(());
    }
    if let Some(player_state) = state.player_states.get_mut(&player.id) {
        player_state.is_flashed = true;
    }

    match find_flash_effect(state, config.flash_correlation, round, tick, thrower.id) {
        Some(entity_id) => {
            add_flashed_player(state, entity_id, player.id, duration);
            Ok(())
        }
        None => {
            log::trace!(
                "Buffering flash of {} by {} at tick {}",
                player.id,
                thrower.id,
                tick
            );
            state.tables.pending_flashed.push(PendingFlashed {
                round,
                tick,
                thrower_id: thrower.id,
                player_id: player.id,
                duration,
            });
            Ok(())
        }
    }
}

fn flash_matches(correlation: FlashCorrelation, flashed: Tick, detonation: Tick) -> bool {
    match correlation {
        FlashCorrelation::Exact => flashed == detonation,
        FlashCorrelation::NearestWithin { ticks } => (flashed - detonation).abs() <= ticks,
    }
}

fn find_flash_effect(
    state: &MatchState,
    correlation: FlashCorrelation,
    round: u32,
    tick: Tick,
    thrower_id: PlayerId,
) -> Option<EntityId> {
    let candidates = state.tables.flash_effects.values().filter(|effect| {
        effect.round == round
            && effect.thrower_id == thrower_id
            && flash_matches(correlation, tick, effect.tick)
    });
    nearest_by_tick(candidates, tick, |effect| effect.tick).map(|effect| effect.entity_id)
}

fn add_flashed_player(
    state: &mut MatchState,
    entity_id: EntityId,
    player_id: PlayerId,
    duration: f64,
) {
    let Some(thrower_id) = state
        .tables
        .flash_effects
        .get(&entity_id)
        .map(|effect| effect.thrower_id)
    else {
        return;
    };
    let is_enemy = same_team(state, &thrower_id, &player_id) == Some(false);
    let Some(effect) = state.tables.flash_effects.get_mut(&entity_id) else {
        return;
    };
    if effect
        .affected
        .iter()
        .any(|affected| affected.player_id == player_id)
    {
        return;
    }
    effect.affected.push(FlashedPlayer {
        player_id,
        is_enemy,
        duration,
    });
    if let Some(index) = effect.grenade_index {
        let grenade = &mut state.grenades[index];
        if is_enemy {
            grenade.enemies_flashed += 1;
            grenade.enemy_flash_duration += duration;
        } else {
            grenade.teammates_flashed += 1;
            grenade.team_flash_duration += duration;
        }
    }
}

/// Looks for flashes that blinded `victim` within the attribution window
/// before a kill and marks their records. Returns the thrower to credit with
/// a flash assist: the most recent flash by one of the killer's teammates.
pub fn attribute_flashes_to_kill(
    state: &mut MatchState,
    config: &ProcessorConfig,
    killer_id: PlayerId,
    victim_id: PlayerId,
    tick: Tick,
) -> Option<PlayerId> {
    let window = seconds_to_ticks(config.flash_window_seconds, state.tick_rate);
    let round = state.round.number;
    let mut hits: Vec<(Tick, EntityId, PlayerId, FlashOutcome)> = state
        .tables
        .flash_effects
        .values()
        .filter(|effect| {
            effect.round == round && effect.tick <= tick && tick - effect.tick <= window
        })
        .filter_map(|effect| {
            let flashed = effect
                .affected
                .iter()
                .find(|affected| affected.player_id == victim_id)?;
            let killer_is_teammate = same_team(state, &effect.thrower_id, &killer_id);
            let outcome = match (killer_is_teammate, flashed.is_enemy) {
                (Some(false), false) => FlashOutcome::LeadsToDeath,
                (Some(true), true) => FlashOutcome::LeadsToKill,
                _ => return None,
            };
            Some((effect.tick, effect.entity_id, effect.thrower_id, outcome))
        })
        .collect();
    hits.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    for (_, entity_id, _, outcome) in hits.iter() {
        let Some(index) = state
            .tables
            .flash_effects
            .get(entity_id)
            .and_then(|effect| effect.grenade_index)
        else {
            continue;
        };
        let grenade = &mut state.grenades[index];
        match outcome {
            FlashOutcome::LeadsToKill => grenade.flash_leads_to_kill = true,
            FlashOutcome::LeadsToDeath => grenade.flash_leads_to_death = true,
        }
    }

    hits.into_iter()
        .find(|(_, _, thrower_id, outcome)| {
            *outcome == FlashOutcome::LeadsToKill && *thrower_id != killer_id
        })
        .map(|(_, _, thrower_id, _)| thrower_id)
}
