use super::{require_live_round, same_team};
use crate::*;

pub fn record_damage(
    state: &mut MatchState,
    hurt: &PlayerHurtEvent,
    tick: Tick,
) -> FragActorResult<()> {
    let round = require_live_round(state, "player_hurt")?;
    let victim = require_actor(&hurt.player, "player_hurt", "player")?;
    let weapon = *require_actor(&hurt.weapon, "player_hurt", "weapon")?;
    if hurt.health_damage < 0 || hurt.armor_damage < 0 {
        return FragActorError::new_result(FragActorErrorVariant::NegativeDamage {
            attacker: hurt.attacker.as_ref().map(|attacker| attacker.id),
            victim: victim.id,
            damage: hurt.health_damage.min(hurt.armor_damage),
        });
    }

    // Health before the hit; the victim handle already reflects the damage.
    let health_before = state
        .player_states
        .get(&victim.id)
        .map(|victim_state| victim_state.health)
        .filter(|health| *health > 0);
    let health_damage_taken = match health_before {
        Some(health) => hurt.health_damage.min(health),
        None => hurt.health_damage,
    };

    state.observe_player(victim);
    if let Some(attacker) = hurt.attacker.as_ref() {
        state.observe_player(attacker);
    }

    let attacker_id = hurt.attacker.as_ref().map(|attacker| attacker.id);
    let is_self_damage = attacker_id == Some(victim.id);
    let attacker_side = attacker_id.and_then(|id| state.current_side_for_player(&id));
    let victim_side = state.current_side_for_player(&victim.id);
    let is_team_damage = match attacker_id {
        Some(id) if !is_self_damage => same_team(state, &id, &victim.id) == Some(true),
        _ => false,
    };

    state.damages.push(DamageEvent {
        round_number: round,
        tick,
        round_time: state.current_round_time(tick),
        attacker_id,
        attacker_team: attacker_id.and_then(|id| state.team_for_player(&id)),
        attacker_side,
        attacker_position: hurt.attacker.as_ref().map(|attacker| attacker.position),
        victim_id: victim.id,
        victim_team: state.team_for_player(&victim.id),
        victim_side,
        victim_position: victim.position,
        weapon,
        health_damage: hurt.health_damage,
        health_damage_taken,
        armor_damage: hurt.armor_damage,
        victim_health_after: victim.health.max(0),
        hit_group: hurt.hit_group.clone(),
        distance: hurt
            .attacker
            .as_ref()
            .map(|attacker| attacker.position.distance(&victim.position)),
        is_team_damage,
        is_self_damage,
        grenade_entity_id: None,
    });
    Ok(())
}

/// Total health damage `attacker` dealt `victim` in `round` up to `tick`.
pub fn damage_between(
    damages: &[DamageEvent],
    round: u32,
    attacker: PlayerId,
    victim: PlayerId,
    tick: Tick,
) -> i32 {
    damages
        .iter()
        .filter(|d| {
            d.round_number == round
                && d.attacker_id == Some(attacker)
                && d.victim_id == victim
                && d.tick <= tick
        })
        .map(|d| d.health_damage_taken)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: PlayerId, team: DemoTeam, health: i32) -> PlayerHandle {
        PlayerHandle {
            id,
            team,
            health,
            is_alive: health > 0,
            ..Default::default()
        }
    }

    fn hurt(
        attacker: PlayerId,
        victim: PlayerId,
        damage: i32,
        health_after: i32,
    ) -> PlayerHurtEvent {
        let attacker_team = if attacker <= 5 {
            DemoTeam::CounterTerrorist
        } else {
            DemoTeam::Terrorist
        };
        let victim_team = if victim <= 5 {
            DemoTeam::CounterTerrorist
        } else {
            DemoTeam::Terrorist
        };
        PlayerHurtEvent {
            attacker: Some(handle(attacker, attacker_team, 100)),
            player: Some(handle(victim, victim_team, health_after)),
            weapon: Some(Weapon::Ak47),
            health_damage: damage,
            armor_damage: 0,
            hit_group: None,
        }
    }

    fn live_state() -> MatchState {
        let mut state = MatchState::new(DemoHeader::default(), &ProcessorConfig::default());
        state.begin_round(0);
        state
    }

    #[test]
    fn overkill_is_capped_at_remaining_health() {
        let mut state = live_state();
        record_damage(&mut state, &hurt(6, 1, 80, 20), 10).unwrap();
        record_damage(&mut state, &hurt(6, 1, 110, 0), 20).unwrap();
        assert_eq!(state.damages[0].health_damage_taken, 80);
        assert_eq!(state.damages[1].health_damage, 110);
        assert_eq!(state.damages[1].health_damage_taken, 20);
        assert_eq!(damage_between(&state.damages, 1, 6, 1, 20), 100);
        // Only the kill event takes a player out of the round.
        assert!(state.player_states[&1].is_alive);
    }

    #[test]
    fn negative_damage_is_rejected() {
        let mut state = live_state();
        let error = record_damage(&mut state, &hurt(6, 1, -5, 100), 10).unwrap_err();
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(state.damages.is_empty());
    }

    #[test]
    fn teammate_damage_is_flagged() {
        let mut state = live_state();
        record_damage(&mut state, &hurt(2, 1, 10, 90), 10).unwrap();
        assert!(state.damages[0].is_team_damage);
        assert!(!state.damages[0].is_enemy_damage());
    }

    #[test]
    fn damage_outside_round_is_informational() {
        let mut state = MatchState::new(DemoHeader::default(), &ProcessorConfig::default());
        let error = record_damage(&mut state, &hurt(6, 1, 10, 90), 10).unwrap_err();
        assert_eq!(error.severity(), ErrorSeverity::Info);
    }
}
