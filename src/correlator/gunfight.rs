use super::{attribute_flashes_to_kill, damage_between, require_live_round};
use crate::*;
use std::collections::HashMap;

fn combatant(state: &MatchState, handle: &PlayerHandle, weapon: Option<Weapon>) -> Combatant {
    let player_state = state.player_states.get(&handle.id);
    Combatant {
        id: handle.id,
        name: handle.name.clone(),
        team: state.team_for_player(&handle.id),
        side: state
            .current_side_for_player(&handle.id)
            .or_else(|| handle.team.side()),
        position: handle.position,
        health: handle.health.max(0),
        armor: handle.armor,
        flashed: handle.is_flashed() || player_state.map_or(false, |s| s.is_flashed),
        weapon,
        equipment_value: equipment_value(handle),
        grenade_value: grenade_value(&handle.inventory),
    }
}

/// The attacker who dealt `victim` at least `threshold` health damage this
/// round before `tick`, excluding the killer and the victim's teammates. The
/// highest total wins; ties go to the lower player id.
pub fn find_damage_assist(
    damages: &[DamageEvent],
    round: u32,
    killer: PlayerId,
    victim: PlayerId,
    tick: Tick,
    threshold: i32,
) -> Option<PlayerId> {
    let mut totals: HashMap<PlayerId, i32> = HashMap::new();
    for damage in damages.iter().filter(|d| {
        d.round_number == round && d.victim_id == victim && d.tick <= tick && d.is_enemy_damage()
    }) {
        if let Some(attacker) = damage.attacker_id.filter(|id| *id != killer) {
            *totals.entry(attacker).or_default() += damage.health_damage_taken;
        }
    }
    totals
        .into_iter()
        .filter(|(_, total)| *total >= threshold)
        .max_by(|(a_id, a_total), (b_id, b_total)| a_total.cmp(b_total).then(b_id.cmp(a_id)))
        .map(|(id, _)| id)
}

pub fn record_kill(
    state: &mut MatchState,
    config: &ProcessorConfig,
    kill: &KillEvent,
    tick: Tick,
) -> FragActorResult<()> {
    let round = require_live_round(state, "kill")?;
    let victim = require_actor(&kill.victim, "kill", "victim")?;
    let killer = match kill.killer.as_ref() {
        Some(killer) if killer.id != victim.id => killer,
        Some(_) => {
            state.observe_player(victim);
            state.record_exit(victim.id, ExitCause::SelfKill, tick);
            return FragActorError::new_result(FragActorErrorVariant::SelfKill {
                player_id: victim.id,
            });
        }
        None => {
            state.observe_player(victim);
            state.record_exit(victim.id, ExitCause::World, tick);
            return FragActorError::new_result(FragActorErrorVariant::MissingActor {
                event: "kill",
                role: "killer",
            });
        }
    };

    // Alive counts are taken before the victim leaves the roster.
    let killer_side = state
        .current_side_for_player(&killer.id)
        .or_else(|| killer.team.side());
    let victim_side = state
        .current_side_for_player(&victim.id)
        .or_else(|| victim.team.side());
    let (killer_alive, killer_equipment) = killer_side
        .map(|side| state.alive_on_side(side))
        .unwrap_or_default();
    let (victim_alive, victim_equipment) = victim_side
        .map(|side| state.alive_on_side(side))
        .unwrap_or_default();

    state.observe_player(victim);
    state.record_exit(victim.id, ExitCause::Killed { killer: killer.id }, tick);
    let weapon = *require_actor(&kill.weapon, "kill", "weapon")?;
    state.observe_player(killer);

    let is_team_kill = killer_side.is_some() && killer_side == victim_side;
    let is_first_kill = state.round.kills == 0;
    let is_wallbang = kill.penetrated_objects > 0;

    let assister_id = find_damage_assist(
        &state.damages,
        round,
        killer.id,
        victim.id,
        tick,
        config.damage_assist_threshold,
    );
    let flash_assister_id = if is_team_kill {
        None
    } else {
        attribute_flashes_to_kill(state, config, killer.id, victim.id, tick)
    };

    let gunfight = GunfightEvent {
        round_number: round,
        tick,
        round_time: state.current_round_time(tick),
        player1: combatant(state, killer, Some(weapon)),
        player2: combatant(state, victim, victim.active_weapon),
        distance: killer.position.distance(&victim.position),
        weapon,
        is_headshot: kill.is_headshot,
        is_wallbang,
        penetrated_objects: kill.penetrated_objects,
        victor_id: killer.id,
        is_first_kill,
        is_team_kill,
        assister_id,
        flash_assister_id,
        damage_dealt: damage_between(&state.damages, round, killer.id, victim.id, tick),
        round_scenario: format!("{}v{}", killer_alive, victim_alive),
        player1_team_alive: killer_alive,
        player2_team_alive: victim_alive,
        player1_team_equipment: killer_equipment,
        player2_team_equipment: victim_equipment,
        impact_context: ImpactContext::Standard,
        player1_impact: 0.0,
        player2_impact: 0.0,
        assist_impact: 0.0,
        flash_assist_impact: 0.0,
    };
    log::debug!(
        "Round {} kill: {} -> {} with {:?} ({})",
        round,
        killer.id,
        victim.id,
        weapon,
        gunfight.round_scenario
    );
    state.gunfights.push(gunfight);
    state.round.kills += 1;

    if !is_team_kill {
        if let Some(killer_state) = state.player_states.get_mut(&killer.id) {
            killer_state.round_kills += 1;
            killer_state.round_headshots += kill.is_headshot as u32;
            killer_state.round_wallbangs += is_wallbang as u32;
        }
        if let Some(player) = state.players.get_mut(&killer.id) {
            player.kills += 1;
            player.headshots += kill.is_headshot as u32;
            player.wallbangs += is_wallbang as u32;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::record_damage;

    fn handle(id: PlayerId) -> PlayerHandle {
        PlayerHandle {
            id,
            name: format!("p{}", id),
            team: if id <= 5 {
                DemoTeam::CounterTerrorist
            } else {
                DemoTeam::Terrorist
            },
            health: 100,
            is_alive: true,
            inventory: vec![Weapon::Ak47],
            ..Default::default()
        }
    }

    fn setup() -> (MatchState, ProcessorConfig) {
        let config = ProcessorConfig::default();
        let mut state = MatchState::new(DemoHeader::default(), &config);
        for id in 1..=10 {
            state.observe_player(&handle(id));
        }
        state.begin_round(0);
        for id in 1..=10 {
            state.observe_player(&handle(id));
        }
        (state, config)
    }

    fn kill(killer: PlayerId, victim: PlayerId) -> KillEvent {
        KillEvent {
            killer: Some(handle(killer)),
            victim: Some(PlayerHandle {
                health: 0,
                is_alive: false,
                ..handle(victim)
            }),
            assister: None,
            weapon: Some(Weapon::Ak47),
            is_headshot: true,
            penetrated_objects: 0,
            assisted_flash: false,
        }
    }

    fn hurt(
        attacker: PlayerId,
        victim: PlayerId,
        damage: i32,
        tick: Tick,
    ) -> (PlayerHurtEvent, Tick) {
        (
            PlayerHurtEvent {
                attacker: Some(handle(attacker)),
                player: Some(PlayerHandle {
                    health: 100 - damage,
                    ..handle(victim)
                }),
                weapon: Some(Weapon::Ak47),
                health_damage: damage,
                armor_damage: 0,
                hit_group: None,
            },
            tick,
        )
    }

    #[test]
    fn first_kill_records_scenario_and_equipment() {
        let (mut state, config) = setup();
        record_kill(&mut state, &config, &kill(1, 6), 100).unwrap();
        record_kill(&mut state, &config, &kill(2, 7), 200).unwrap();

        let first = &state.gunfights[0];
        assert!(first.is_first_kill);
        assert_eq!(first.round_scenario, "5v5");
        assert_eq!(first.player1_team_equipment, 5 * Weapon::Ak47.price());
        assert_eq!(first.victor_id, 1);

        let second = &state.gunfights[1];
        assert!(!second.is_first_kill);
        assert_eq!(second.round_scenario, "5v4");
        assert_eq!(state.players[&1].kills, 1);
        assert_eq!(state.players[&6].deaths, 1);
    }

    #[test]
    fn self_kill_is_dropped_but_counts_as_death() {
        let (mut state, config) = setup();
        let error = record_kill(&mut state, &config, &kill(6, 6), 100).unwrap_err();
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(state.gunfights.is_empty());
        assert!(!state.player_states[&6].is_alive);
        assert_eq!(state.alive_on_side(Side::T).0, 4);
        assert_eq!(state.round.exits[0].cause, ExitCause::SelfKill);
    }

    #[test]
    fn damage_assist_requires_threshold() {
        let (mut state, config) = setup();
        for (event, tick) in [hurt(2, 6, 40, 10), hurt(3, 7, 41, 20)] {
            record_damage(&mut state, &event, tick).unwrap();
        }
        record_kill(&mut state, &config, &kill(1, 6), 100).unwrap();
        record_kill(&mut state, &config, &kill(1, 7), 110).unwrap();
        assert_eq!(state.gunfights[0].assister_id, None);
        assert_eq!(state.gunfights[1].assister_id, Some(3));
    }

    #[test]
    fn team_kills_are_flagged_and_not_credited() {
        let (mut state, config) = setup();
        record_kill(&mut state, &config, &kill(1, 2), 100).unwrap();
        assert!(state.gunfights[0].is_team_kill);
        assert_eq!(state.players[&1].kills, 0);
    }

    #[test]
    fn world_death_takes_victim_out_of_the_round() {
        let (mut state, config) = setup();
        let event = KillEvent {
            killer: None,
            weapon: Some(Weapon::World),
            ..kill(1, 6)
        };
        let error = record_kill(&mut state, &config, &event, 100).unwrap_err();
        assert!(matches!(
            error.variant,
            FragActorErrorVariant::MissingActor { role: "killer", .. }
        ));
        assert!(state.gunfights.is_empty());
        assert_eq!(state.players[&6].deaths, 1);
        assert_eq!(state.alive_on_side(Side::T).0, 4);
        assert_eq!(state.round.exits[0].cause, ExitCause::World);
    }

    #[test]
    fn lethal_damage_before_the_kill_keeps_the_victim_counted() {
        let (mut state, config) = setup();
        let (event, _) = hurt(1, 6, 100, 100);
        record_damage(&mut state, &event, 100).unwrap();
        assert!(state.player_states[&6].is_alive);

        record_kill(&mut state, &config, &kill(1, 6), 100).unwrap();
        let gunfight = &state.gunfights[0];
        assert_eq!(gunfight.round_scenario, "5v5");
        assert_eq!(gunfight.player2_team_alive, 5);
        assert_eq!(gunfight.player2_team_equipment, gunfight.player1_team_equipment);
        assert_eq!(gunfight.damage_dealt, 100);
        assert!(!state.player_states[&6].is_alive);
    }
}
