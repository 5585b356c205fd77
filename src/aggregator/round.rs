use super::*;
use crate::constants::*;
use crate::correlator::find_damage_assist;
use crate::*;

/// Derived per-round facts shared by every player's record.
struct RoundContext<'a> {
    round: u32,
    gunfights: Vec<&'a GunfightEvent>,
    damages: Vec<&'a DamageEvent>,
    grenades: Vec<&'a GrenadeEvent>,
    exits: Vec<RoundExit>,
    clutches: Vec<ClutchOutcome>,
    trades: TradeSummary,
    winner: Option<TeamLabel>,
}

fn round_gunfights(gunfights: &[GunfightEvent], round: u32) -> Vec<&GunfightEvent> {
    let mut fights: Vec<&GunfightEvent> = gunfights
        .iter()
        .filter(|gunfight| gunfight.round_number == round)
        .collect();
    fights.sort_by_key(|gunfight| gunfight.tick);
    fights
}

/// Runs the deferred per-round pass over the round that is ending: damage
/// and flash assists, grenade damage, clutches, impact and trades, then one
/// [`PlayerRoundEvent`] per registered player.
pub fn finalize_round(state: &mut MatchState, config: &ProcessorConfig) {
    let round = state.round.number;
    if round == 0
        || state
            .player_rounds
            .iter()
            .any(|record| record.round_number == round)
    {
        return;
    }
    log::debug!("Finalizing round {}", round);

    // Damage reported on the same tick as the kill may arrive after it.
    for gunfight in state
        .gunfights
        .iter_mut()
        .filter(|gunfight| gunfight.round_number == round && !gunfight.is_team_kill)
    {
        gunfight.assister_id = find_damage_assist(
            &state.damages,
            round,
            gunfight.player1.id,
            gunfight.player2.id,
            gunfight.tick,
            config.damage_assist_threshold,
        );
    }

    aggregate_grenade_damage(state, round, config);

    let mut exits = state.round.exits.clone();
    exits.sort_by_key(|exit| exit.tick);
    let clutches = detect_clutches(&state.round.roster, &exits);
    for gunfight in state
        .gunfights
        .iter_mut()
        .filter(|gunfight| gunfight.round_number == round)
    {
        apply_impact(gunfight, &clutches, &config.impact);
    }

    let gunfights = round_gunfights(&state.gunfights, round);
    let trades = detect_trades(
        &state.round.roster,
        &gunfights,
        &exits,
        TradeWindow {
            distance: config.trade_distance,
            ticks: seconds_to_ticks(config.trade_window_seconds, state.tick_rate),
        },
    );
    let winner = state
        .rounds
        .iter()
        .rev()
        .find(|event| event.round_number == round && event.event_type == RoundEventType::End)
        .and_then(|event| event.winner_team);

    let context = RoundContext {
        round,
        gunfights,
        damages: state.damages_in_round(round).collect(),
        grenades: state.grenades_in_round(round).collect(),
        exits,
        clutches,
        trades,
        winner,
    };
    let records: Vec<PlayerRoundEvent> = state
        .players
        .values()
        .map(|player| build_player_round(state, config, &context, player))
        .collect();
    state.player_rounds.extend(records);
}

fn build_player_round(
    state: &MatchState,
    config: &ProcessorConfig,
    context: &RoundContext,
    player: &Player,
) -> PlayerRoundEvent {
    let id = player.id;
    let round = context.round;
    let player_state = state.player_states.get(&id);
    let team = state.team_for_player(&id);
    let side = state.round.roster.get(&id).copied();

    let mut record = PlayerRoundEvent {
        round_number: round,
        player_id: id,
        player_name: player.name.clone(),
        team,
        side,
        round_won: team.is_some() && team == context.winner,
        deaths: player_state.map_or(0, |s| s.round_deaths),
        ..Default::default()
    };

    for gunfight in context.gunfights.iter() {
        let (kill, death, assist) = impact_shares(gunfight, id);
        record.kill_impact += kill;
        record.death_impact += death;
        record.assist_impact += assist;

        if gunfight.player1.id == id {
            if gunfight.is_team_kill {
                record.team_kills += 1;
                continue;
            }
            record.kills += 1;
            record.headshots += gunfight.is_headshot as u32;
            record.wallbangs += gunfight.is_wallbang as u32;
            record.awp_kills += (gunfight.weapon == Weapon::Awp) as u32;
            record.first_kill |= gunfight.is_first_kill;
            match classify_buy(round, gunfight.player2.equipment_value, config) {
                BuyType::Eco => record.eco_kills += 1,
                BuyType::ForceBuy => record.force_buy_kills += 1,
                BuyType::FullBuy => record.full_buy_kills += 1,
            }
        } else if gunfight.player2.id == id {
            record.first_death |= gunfight.is_first_kill;
            record.grenade_value_lost = gunfight.player2.grenade_value;
        } else if gunfight.assister_id == Some(id) {
            record.assists += 1;
        } else if gunfight.flash_assister_id == Some(id) {
            record.flash_assists += 1;
        }
    }
    record.impact = record.kill_impact + record.death_impact + record.assist_impact;
    record.time_to_death = context
        .exits
        .iter()
        .find(|exit| exit.player_id == id && exit.cause.is_death())
        .map(|exit| exit.round_time);

    for damage in context.damages.iter() {
        if damage.attacker_id != Some(id) {
            continue;
        }
        if damage.is_enemy_damage() {
            record.damage += damage.health_damage_taken;
            if damage.weapon.is_grenade() || damage.weapon == Weapon::Inferno {
                record.utility_damage += damage.health_damage_taken;
            }
        } else if damage.is_team_damage {
            record.team_damage += damage.health_damage_taken;
        }
        if damage.weapon.is_firearm() && !damage.is_self_damage {
            record.shots_hit += 1;
        }
    }
    record.shots_fired = state.shots_fired.get(&(round, id)).copied().unwrap_or(0);

    let mut ratings = Vec::new();
    for grenade in context.grenades.iter().filter(|g| g.thrower_id == id) {
        match grenade.grenade {
            GrenadeKind::Flashbang => record.flashes_thrown += 1,
            GrenadeKind::Smoke => record.smokes_thrown += 1,
            GrenadeKind::HighExplosive => record.he_thrown += 1,
            GrenadeKind::Molotov | GrenadeKind::Incendiary => record.fire_thrown += 1,
            GrenadeKind::Decoy => record.decoys_thrown += 1,
        }
        record.enemies_flashed += grenade.enemies_flashed;
        record.teammates_flashed += grenade.teammates_flashed;
        record.enemy_flash_duration += grenade.enemy_flash_duration;
        ratings.push(grenade.effectiveness_rating);
    }
    let thrown = record.flashes_thrown
        + record.smokes_thrown
        + record.he_thrown
        + record.fire_thrown
        + record.decoys_thrown;
    record.grenade_effectiveness =
        grenade_effectiveness(thrown, record.grenade_value_lost, &ratings);

    record.trade_kills = context.trades.trade_kills.get(&id).copied().unwrap_or(0);
    record.trade_opportunities = context
        .trades
        .trade_opportunities
        .get(&id)
        .copied()
        .unwrap_or(0);
    record.traded_death = context.trades.traded_deaths.contains(&id);

    if let Some(clutch) = context.clutches.iter().find(|c| c.player_id == id) {
        record.clutch_attempt = true;
        record.clutch_won = clutch.won;
        record.clutch_opponents = clutch.opponents;
    }

    if side.is_some() {
        record.equipment_value = round_equipment_value(
            &context.gunfights,
            id,
            player_state.map_or(0, |s| s.equipment_value),
        );
        match classify_buy(round, record.equipment_value, config) {
            BuyType::Eco => record.is_eco = true,
            BuyType::ForceBuy => record.is_force_buy = true,
            BuyType::FullBuy => record.is_full_buy = true,
        }
        record.survived = record.deaths == 0;
    }

    record.time_to_contact = time_to_contact(state, context, id);
    record.kast = record.kills > 0
        || record.assists > 0
        || record.flash_assists > 0
        || record.survived
        || record.traded_death;

    for event in state.rounds.iter().filter(|e| e.round_number == round) {
        if event.player_id != Some(id) {
            continue;
        }
        match event.event_type {
            RoundEventType::BombPlanted => record.bomb_plants += 1,
            RoundEventType::BombDefused => record.bomb_defuses += 1,
            _ => {}
        }
    }
    record
}

/// Seconds from round reference tick to the player's first enemy contact:
/// damage dealt or taken, or a gunfight. Clamped to the round length.
fn time_to_contact(state: &MatchState, context: &RoundContext, id: PlayerId) -> Option<f64> {
    let damage_contact = context
        .damages
        .iter()
        .filter(|d| d.is_enemy_damage() && (d.attacker_id == Some(id) || d.victim_id == id))
        .map(|d| d.tick);
    let gunfight_contact = context
        .gunfights
        .iter()
        .filter(|g| !g.is_team_kill && (g.player1.id == id || g.player2.id == id))
        .map(|g| g.tick);
    let first = damage_contact.chain(gunfight_contact).min()?;
    Some(
        ticks_to_seconds(first - state.round.reference_tick(), state.tick_rate)
            .clamp(0.0, MAX_TIME_TO_CONTACT_SECONDS),
    )
}
