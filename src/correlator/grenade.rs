use super::{require_live_round, ThrowSnapshot};
use crate::*;

/// Captures thrower state as it is at `tick`. Must run before the movement
/// classifier observes the handle for the same tick.
pub fn capture_throw(
    state: &MatchState,
    thrower: &PlayerHandle,
    grenade: GrenadeKind,
    tick: Tick,
) -> ThrowSnapshot {
    let movement = state
        .movement
        .classify(thrower, tick, state.tick_rate)
        .to_string();
    ThrowSnapshot {
        thrower_id: thrower.id,
        thrower_name: thrower.name.clone(),
        thrower_team: state.team_for_player(&thrower.id),
        thrower_side: state
            .current_side_for_player(&thrower.id)
            .or_else(|| thrower.team.side()),
        grenade,
        round: state.round.number,
        tick,
        round_time: state.current_round_time(tick),
        position: thrower.position,
        aim: thrower.view,
        movement,
    }
}

/// A grenade left a player's hand. The snapshot waits for the projectile
/// entity that carries it.
pub fn record_grenade_fire(
    state: &mut MatchState,
    thrower: &PlayerHandle,
    grenade: GrenadeKind,
    tick: Tick,
) {
    let snapshot = capture_throw(state, thrower, grenade, tick);
    state
        .tables
        .pending_throws
        .insert((thrower.id, grenade), snapshot);
}

/// Binds a projectile entity to its throw snapshot.
pub fn record_projectile_throw(
    state: &mut MatchState,
    projectile: &ProjectileEvent,
    tick: Tick,
) -> FragActorResult<()> {
    require_live_round(state, "grenade_projectile_throw")?;
    let thrower = require_actor(&projectile.thrower, "grenade_projectile_throw", "thrower")?;
    let grenade = projectile_kind(projectile)?;
    let snapshot = match state.tables.pending_throws.remove(&(thrower.id, grenade)) {
        Some(snapshot) => snapshot,
        None => capture_throw(state, thrower, grenade, tick),
    };
    log::trace!(
        "Projectile {} bound to {:?} thrown by {} at tick {}",
        projectile.entity_id,
        grenade,
        snapshot.thrower_id,
        snapshot.tick
    );
    state.tables.throws.insert(projectile.entity_id, snapshot);
    Ok(())
}

/// A smoke started or a projectile was removed from the world. Flashbangs
/// are built on their explosion instead and are ignored here.
pub fn record_projectile_detonation(
    state: &mut MatchState,
    projectile: &ProjectileEvent,
    tick: Tick,
) -> FragActorResult<()> {
    require_live_round(state, "grenade_detonation")?;
    let grenade = projectile_kind(projectile)?;
    if grenade == GrenadeKind::Flashbang
        || state.tables.grenade_records.contains_key(&projectile.entity_id)
    {
        return Ok(());
    }
    build_grenade_record(state, projectile, tick).map(|_| ())
}

/// Turns a detonation into a [`GrenadeEvent`] built from throw-time fields.
/// Returns the index of the new record, or `None` when the detonation is a
/// duplicate of one already seen.
pub(crate) fn build_grenade_record(
    state: &mut MatchState,
    projectile: &ProjectileEvent,
    tick: Tick,
) -> FragActorResult<Option<usize>> {
    let thrower_id = projectile
        .thrower
        .as_ref()
        .map(|thrower| thrower.id)
        .or_else(|| {
            state
                .tables
                .throws
                .get(&projectile.entity_id)
                .map(|snapshot| snapshot.thrower_id)
        });
    if let Some(thrower_id) = thrower_id {
        if !state.tables.detonations.insert((thrower_id, tick)) {
            log::debug!(
                "Ignoring duplicate detonation by {} at tick {}",
                thrower_id,
                tick
            );
            return Ok(None);
        }
    }

    let Some(snapshot) = state.tables.throws.remove(&projectile.entity_id) else {
        return FragActorError::new_result(FragActorErrorVariant::MissingThrowSnapshot {
            entity_id: projectile.entity_id,
        });
    };

    let record = GrenadeEvent {
        round_number: snapshot.round,
        entity_id: projectile.entity_id,
        thrower_id: snapshot.thrower_id,
        thrower_name: snapshot.thrower_name,
        thrower_team: snapshot.thrower_team,
        thrower_side: snapshot.thrower_side,
        grenade: snapshot.grenade,
        tick_timestamp: snapshot.tick,
        round_time: snapshot.round_time,
        player_position: snapshot.position,
        player_aim: snapshot.aim,
        movement: snapshot.movement,
        detonation_tick: tick,
        final_position: projectile.position,
        throw_distance: snapshot.position.distance(&projectile.position),
        enemies_flashed: 0,
        teammates_flashed: 0,
        enemy_flash_duration: 0.0,
        team_flash_duration: 0.0,
        flash_leads_to_kill: false,
        flash_leads_to_death: false,
        enemy_damage: 0,
        team_damage: 0,
        enemies_damaged: 0,
        teammates_damaged: 0,
        effectiveness_rating: 0.0,
    };
    let index = state.grenades.len();
    state.grenades.push(record);
    state
        .tables
        .grenade_records
        .insert(projectile.entity_id, index);
    Ok(Some(index))
}

fn projectile_kind(projectile: &ProjectileEvent) -> FragActorResult<GrenadeKind> {
    projectile.weapon.grenade_kind().ok_or_else(|| {
        FragActorError::new(FragActorErrorVariant::UnknownGrenade {
            entity_id: projectile.entity_id,
            weapon: projectile.weapon,
        })
    })
}
