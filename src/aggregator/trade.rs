use crate::*;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeSummary {
    pub trade_kills: HashMap<PlayerId, u32>,
    pub trade_opportunities: HashMap<PlayerId, u32>,
    pub traded_deaths: HashSet<PlayerId>,
}

#[derive(Debug, Clone, Copy)]
pub struct TradeWindow {
    pub distance: f32,
    pub ticks: Tick,
}

/// Position of `player_id` in the gunfight snapshot closest to `tick`.
fn nearest_position(
    gunfights: &[&GunfightEvent],
    player_id: PlayerId,
    tick: Tick,
) -> Option<Vector3> {
    let snapshots = gunfights.iter().filter_map(|gunfight| {
        if gunfight.player1.id == player_id {
            Some((gunfight.tick, gunfight.player1.position))
        } else if gunfight.player2.id == player_id {
            Some((gunfight.tick, gunfight.player2.position))
        } else {
            None
        }
    });
    nearest_by_tick(snapshots, tick, |(snapshot_tick, _)| *snapshot_tick)
        .map(|(_, position)| position)
}

/// For every enemy kill in a round, finds the dead player's teammates who were
/// close enough to trade and whether one of them killed the killer in time.
/// Teammates who already died or disconnected cannot trade. `gunfights` must
/// be in tick order. A death is traded at most once.
pub fn detect_trades(
    roster: &BTreeMap<PlayerId, Side>,
    gunfights: &[&GunfightEvent],
    exits: &[RoundExit],
    window: TradeWindow,
) -> TradeSummary {
    let mut summary = TradeSummary::default();
    let mut exit_ticks: HashMap<PlayerId, Tick> = HashMap::new();
    for exit in exits.iter() {
        let first = exit_ticks.entry(exit.player_id).or_insert(exit.tick);
        *first = (*first).min(exit.tick);
    }

    for (index, death) in gunfights.iter().enumerate() {
        let victim = death.player2.id;
        let killer = death.player1.id;
        if death.is_team_kill {
            continue;
        }
        let Some(victim_side) = roster.get(&victim).copied().or(death.player2.side) else {
            continue;
        };

        let nearby: HashSet<PlayerId> = roster
            .iter()
            .filter(|(id, side)| **side == victim_side && **id != victim)
            .map(|(id, _)| *id)
            .filter(|id| exit_ticks.get(id).map_or(true, |left| *left > death.tick))
            .filter(|id| {
                nearest_position(gunfights, *id, death.tick).map_or(false, |position| {
                    position.distance(&death.player2.position) <= window.distance
                })
            })
            .collect();
        for teammate in nearby.iter() {
            *summary.trade_opportunities.entry(*teammate).or_default() += 1;
        }

        let trade = find_in_direction(gunfights, index, SearchDirection::Forward, |later| {
            if later.tick - death.tick > window.ticks {
                return None;
            }
            (later.player2.id == killer
                && !later.is_team_kill
                && nearby.contains(&later.player1.id))
            .then_some(later.player1.id)
        });
        if let Some((_, trader)) = trade {
            *summary.trade_kills.entry(trader).or_default() += 1;
            summary.traded_deaths.insert(victim);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> BTreeMap<PlayerId, Side> {
        (1..=10)
            .map(|id| (id, if id <= 5 { Side::CT } else { Side::T }))
            .collect()
    }

    fn fight(
        killer: PlayerId,
        victim: PlayerId,
        tick: Tick,
        killer_x: f32,
        victim_x: f32,
    ) -> GunfightEvent {
        let combatant = |id: PlayerId, x: f32| Combatant {
            id,
            name: String::new(),
            team: None,
            side: Some(if id <= 5 { Side::CT } else { Side::T }),
            position: Vector3::new(x, 0.0, 0.0),
            health: 100,
            armor: 0,
            flashed: false,
            weapon: None,
            equipment_value: 0,
            grenade_value: 0,
        };
        GunfightEvent {
            round_number: 1,
            tick,
            round_time: 0.0,
            player1: combatant(killer, killer_x),
            player2: combatant(victim, victim_x),
            distance: 0.0,
            weapon: Weapon::Ak47,
            is_headshot: false,
            is_wallbang: false,
            penetrated_objects: 0,
            victor_id: killer,
            is_first_kill: false,
            is_team_kill: false,
            assister_id: None,
            flash_assister_id: None,
            damage_dealt: 0,
            round_scenario: String::new(),
            player1_team_alive: 0,
            player2_team_alive: 0,
            player1_team_equipment: 0,
            player2_team_equipment: 0,
            impact_context: ImpactContext::Standard,
            player1_impact: 0.0,
            player2_impact: 0.0,
            assist_impact: 0.0,
            flash_assist_impact: 0.0,
        }
    }

    fn deaths(fights: &[GunfightEvent]) -> Vec<RoundExit> {
        fights
            .iter()
            .map(|fight| RoundExit {
                tick: fight.tick,
                round_time: 0.0,
                player_id: fight.player2.id,
                side: fight.player2.side,
                cause: ExitCause::Killed {
                    killer: fight.player1.id,
                },
            })
            .collect()
    }

    fn run(fights: &[GunfightEvent]) -> TradeSummary {
        let refs: Vec<&GunfightEvent> = fights.iter().collect();
        detect_trades(&roster(), &refs, &deaths(fights), window())
    }

    fn window() -> TradeWindow {
        TradeWindow {
            distance: 1000.0,
            ticks: 320,
        }
    }

    #[test]
    fn nearby_teammate_trades_within_window() {
        let fights = [fight(6, 1, 100, 500.0, 0.0), fight(2, 6, 200, 300.0, 500.0)];
        let summary = run(&fights);
        assert_eq!(summary.trade_kills.get(&2), Some(&1));
        assert!(summary.traded_deaths.contains(&1));
        assert_eq!(summary.trade_opportunities.get(&2), Some(&1));
    }

    #[test]
    fn late_revenge_is_not_a_trade() {
        let fights = [fight(6, 1, 100, 500.0, 0.0), fight(2, 6, 421, 300.0, 500.0)];
        let summary = run(&fights);
        assert!(summary.trade_kills.is_empty());
        assert!(summary.traded_deaths.is_empty());
    }

    #[test]
    fn distant_teammate_cannot_trade() {
        let fights = [fight(6, 1, 100, 500.0, 0.0), fight(2, 6, 150, 1500.0, 500.0)];
        let summary = run(&fights);
        assert!(summary.trade_kills.is_empty());
        assert!(summary.trade_opportunities.is_empty());
    }

    #[test]
    fn one_trade_per_death() {
        // Killer 6 is killed by 2, then the body is shot again by 3.
        let fights = [
            fight(6, 1, 100, 500.0, 0.0),
            fight(2, 6, 150, 300.0, 500.0),
            fight(3, 6, 160, 200.0, 500.0),
        ];
        let summary = run(&fights);
        assert_eq!(summary.trade_kills.values().sum::<u32>(), 1);
        assert_eq!(summary.trade_kills.get(&2), Some(&1));
    }

    #[test]
    fn disconnected_teammate_is_no_trade_opportunity() {
        let fights = [fight(6, 1, 100, 500.0, 0.0)];
        let refs: Vec<&GunfightEvent> = fights.iter().collect();
        let mut exits = deaths(&fights);
        exits.push(RoundExit {
            tick: 50,
            round_time: 0.0,
            player_id: 2,
            side: Some(Side::CT),
            cause: ExitCause::Disconnect,
        });
        // Player 2 was last seen next to player 1.
        let earlier = fight(2, 7, 40, 100.0, 900.0);
        let mut with_snapshot = vec![&earlier];
        with_snapshot.extend(refs);

        let summary = detect_trades(&roster(), &with_snapshot, &exits, window());
        assert_eq!(summary.trade_opportunities.get(&2), None);

        let summary = detect_trades(&roster(), &with_snapshot, &deaths(&fights), window());
        assert_eq!(summary.trade_opportunities.get(&2), Some(&1));
    }
}
