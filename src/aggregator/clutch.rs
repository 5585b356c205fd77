use crate::constants::*;
use crate::*;
use std::collections::{BTreeMap, BTreeSet};

/// A player left alone against one or more enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClutchOutcome {
    pub player_id: PlayerId,
    pub opponents: u32,
    pub won: bool,
}

#[derive(Debug, Clone, Copy)]
struct OpenClutch {
    index: usize,
    side: Side,
}

/// Replays a round's exits from the starting roster. A clutch opens when a
/// side drops to one living player facing between one and five enemies, and
/// is won when every enemy is gone while the clutcher lives. `exits` must be
/// in tick order.
pub fn detect_clutches(
    roster: &BTreeMap<PlayerId, Side>,
    exits: &[RoundExit],
) -> Vec<ClutchOutcome> {
    let mut alive: BTreeMap<Side, BTreeSet<PlayerId>> = BTreeMap::new();
    for (player_id, side) in roster.iter() {
        alive.entry(*side).or_default().insert(*player_id);
    }
    let count = |alive: &BTreeMap<Side, BTreeSet<PlayerId>>, side: Side| {
        alive.get(&side).map_or(0, |players| players.len())
    };

    let mut outcomes: Vec<ClutchOutcome> = Vec::new();
    let mut open: Vec<OpenClutch> = Vec::new();

    for exit in exits.iter() {
        let gone = exit.player_id;
        let Some(side) = roster.get(&gone).copied().or(exit.side) else {
            continue;
        };
        if !alive.entry(side).or_default().remove(&gone) {
            continue;
        }

        open.retain(|clutch| {
            let clutcher = outcomes[clutch.index].player_id;
            if clutcher == gone {
                return false;
            }
            if count(&alive, clutch.side.opposite()) == 0 {
                outcomes[clutch.index].won = true;
                return false;
            }
            true
        });

        for side in [Side::CT, Side::T] {
            let enemies = count(&alive, side.opposite());
            if count(&alive, side) != 1 || enemies == 0 || enemies > TEAM_SIZE {
                continue;
            }
            let Some(clutcher) = alive.get(&side).and_then(|players| players.first()).copied()
            else {
                continue;
            };
            if outcomes.iter().any(|outcome| outcome.player_id == clutcher) {
                continue;
            }
            open.push(OpenClutch {
                index: outcomes.len(),
                side,
            });
            outcomes.push(ClutchOutcome {
                player_id: clutcher,
                opponents: enemies as u32,
                won: false,
            });
        }
    }

    for clutch in open {
        let clutcher = outcomes[clutch.index].player_id;
        let clutcher_alive = alive
            .get(&clutch.side)
            .map_or(false, |players| players.contains(&clutcher));
        if clutcher_alive && count(&alive, clutch.side.opposite()) == 0 {
            outcomes[clutch.index].won = true;
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> BTreeMap<PlayerId, Side> {
        (1..=10)
            .map(|id| (id, if id <= 5 { Side::CT } else { Side::T }))
            .collect()
    }

    fn exit(player_id: PlayerId, cause: ExitCause) -> RoundExit {
        RoundExit {
            tick: 0,
            round_time: 0.0,
            player_id,
            side: Some(if player_id <= 5 { Side::CT } else { Side::T }),
            cause,
        }
    }

    fn run(kills: &[(PlayerId, PlayerId)]) -> Vec<ClutchOutcome> {
        let exits: Vec<RoundExit> = kills
            .iter()
            .map(|(killer, victim)| exit(*victim, ExitCause::Killed { killer: *killer }))
            .collect();
        detect_clutches(&roster(), &exits)
    }

    #[test]
    fn one_v_three_won() {
        let outcomes = run(&[
            (1, 9),
            (6, 2),
            (1, 10),
            (6, 3),
            (7, 4),
            (7, 5),
            (1, 6),
            (1, 7),
            (1, 8),
        ]);
        // Player 8 is left alone against player 1 before dying.
        assert_eq!(
            outcomes,
            vec![
                ClutchOutcome {
                    player_id: 1,
                    opponents: 3,
                    won: true
                },
                ClutchOutcome {
                    player_id: 8,
                    opponents: 1,
                    won: false
                },
            ]
        );
    }

    #[test]
    fn clutcher_dying_loses() {
        let outcomes = run(&[(6, 2), (6, 3), (6, 4), (6, 5), (1, 6), (7, 1)]);
        assert_eq!(
            outcomes,
            vec![ClutchOutcome {
                player_id: 1,
                opponents: 5,
                won: false
            }]
        );
    }

    #[test]
    fn both_sides_alone_each_get_an_attempt() {
        let outcomes = run(&[
            (1, 6),
            (1, 7),
            (1, 8),
            (10, 2),
            (10, 3),
            (10, 4),
            (10, 5),
            (1, 9),
            (1, 10),
        ]);
        // After (10, 5): player 1 alone vs 9 and 10.
        // After (1, 9): 1v1, player 10 opens a clutch too.
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&ClutchOutcome {
            player_id: 1,
            opponents: 2,
            won: true
        }));
        assert!(outcomes.contains(&ClutchOutcome {
            player_id: 10,
            opponents: 1,
            won: false
        }));
    }

    #[test]
    fn no_clutch_without_a_lone_survivor() {
        assert!(run(&[(1, 6), (7, 2)]).is_empty());
    }

    #[test]
    fn deaths_without_a_killer_still_empty_the_enemy_side() {
        let kills: [(PlayerId, PlayerId); 7] =
            [(1, 8), (1, 9), (1, 10), (6, 2), (6, 3), (6, 4), (6, 5)];
        let mut exits: Vec<RoundExit> = kills
            .iter()
            .map(|(killer, victim)| exit(*victim, ExitCause::Killed { killer: *killer }))
            .collect();
        exits.push(exit(7, ExitCause::World));
        exits.push(exit(6, ExitCause::SelfKill));

        // Player 6 is briefly alone against player 1 before dying too.
        assert_eq!(
            detect_clutches(&roster(), &exits),
            vec![
                ClutchOutcome {
                    player_id: 1,
                    opponents: 2,
                    won: true
                },
                ClutchOutcome {
                    player_id: 6,
                    opponents: 1,
                    won: false
                },
            ]
        );
    }

    #[test]
    fn disconnected_teammate_leaves_a_clutch() {
        let kills: [(PlayerId, PlayerId); 6] = [(1, 8), (1, 9), (1, 10), (6, 3), (6, 4), (6, 5)];
        let mut exits: Vec<RoundExit> = kills
            .iter()
            .map(|(killer, victim)| exit(*victim, ExitCause::Killed { killer: *killer }))
            .collect();
        exits.push(exit(2, ExitCause::Disconnect));
        exits.push(exit(6, ExitCause::Killed { killer: 1 }));
        exits.push(exit(7, ExitCause::Killed { killer: 1 }));

        let outcomes = detect_clutches(&roster(), &exits);
        assert_eq!(
            outcomes[0],
            ClutchOutcome {
                player_id: 1,
                opponents: 2,
                won: true
            }
        );
        assert_eq!(outcomes.len(), 2);
    }
}
