use crate::*;
use float_ord::FloatOrd;
use std::cmp::Reverse;

fn per_round(value: f64, rounds: u32) -> f64 {
    safe_div(value, rounds as f64)
}

pub fn aim_rating(record: &PlayerMatchEvent) -> f64 {
    weighted_mean(&[
        (record.headshot_percentage, 0.4),
        (record.accuracy, 0.3),
        (normalize_to_percent(record.kpr, 1.0), 0.3),
    ])
}

pub fn fragger_score(record: &PlayerMatchEvent) -> f64 {
    let multi_kill_rounds = record.multi_kills_2k
        + record.multi_kills_3k
        + record.multi_kills_4k
        + record.multi_kills_5k;
    weighted_mean(&[
        (normalize_to_percent(record.kpr, 1.0), 0.4),
        (normalize_to_percent(record.adr, 100.0), 0.3),
        (record.headshot_percentage, 0.15),
        (
            normalize_to_percent(per_round(multi_kill_rounds as f64, record.rounds_played), 0.3),
            0.15,
        ),
    ])
}

pub fn support_score(record: &PlayerMatchEvent) -> f64 {
    let rounds = record.rounds_played;
    weighted_mean(&[
        (normalize_to_percent(per_round(record.assists as f64, rounds), 0.3), 0.25),
        (
            normalize_to_percent(per_round(record.flash_assists as f64, rounds), 0.15),
            0.25,
        ),
        (
            normalize_to_percent(per_round(record.utility_damage as f64, rounds), 25.0),
            0.2,
        ),
        (record.average_grenade_effectiveness, 0.15),
        (
            normalize_to_percent(per_round(record.enemies_flashed as f64, rounds), 1.5),
            0.15,
        ),
    ])
}

pub fn opener_score(record: &PlayerMatchEvent) -> f64 {
    let rounds = record.rounds_played;
    weighted_mean(&[
        (
            normalize_to_percent(per_round(record.first_kills as f64, rounds), 0.25),
            0.5,
        ),
        (
            percentage(
                record.first_kills as f64,
                (record.first_kills + record.first_deaths) as f64,
            ),
            0.3,
        ),
        (
            normalize_to_percent(per_round(record.trade_kills as f64, rounds), 0.2),
            0.2,
        ),
    ])
}

pub fn closer_score(record: &PlayerMatchEvent) -> f64 {
    let survived = record.rounds_played.saturating_sub(record.deaths);
    weighted_mean(&[
        (
            percentage(record.clutch_wins as f64, record.clutch_attempts as f64),
            0.4,
        ),
        (normalize_to_percent(record.clutch_wins as f64, 3.0), 0.3),
        (percentage(survived as f64, record.rounds_played as f64), 0.3),
    ])
}

/// Sums one player's round records into match totals and rates.
pub fn summarize_player(
    player: &Player,
    team: Option<TeamLabel>,
    rounds: &[&PlayerRoundEvent],
) -> PlayerMatchEvent {
    let mut record = PlayerMatchEvent {
        player_id: player.id,
        player_name: player.name.clone(),
        team,
        ..Default::default()
    };
    let mut shots_fired = 0;
    let mut times_to_death = Vec::new();
    let mut times_to_contact = Vec::new();
    let mut grenade_scores = Vec::new();

    for round in rounds.iter().filter(|round| round.side.is_some()) {
        record.rounds_played += 1;
        record.rounds_won += round.round_won as u32;
        record.kills += round.kills;
        record.deaths += round.deaths;
        record.assists += round.assists;
        record.flash_assists += round.flash_assists;
        record.headshots += round.headshots;
        record.wallbangs += round.wallbangs;
        record.awp_kills += round.awp_kills;
        record.team_kills += round.team_kills;
        record.first_kills += round.first_kill as u32;
        record.first_deaths += round.first_death as u32;
        record.damage += round.damage;
        record.utility_damage += round.utility_damage;
        shots_fired += round.shots_fired;
        record.shots_hit += round.shots_hit;
        record.flashes_thrown += round.flashes_thrown;
        record.smokes_thrown += round.smokes_thrown;
        record.he_thrown += round.he_thrown;
        record.fire_thrown += round.fire_thrown;
        record.enemies_flashed += round.enemies_flashed;
        record.teammates_flashed += round.teammates_flashed;
        record.trade_kills += round.trade_kills;
        record.traded_deaths += round.traded_death as u32;
        record.clutch_attempts += round.clutch_attempt as u32;
        record.clutch_wins += round.clutch_won as u32;
        record.eco_kills += round.eco_kills;
        record.force_buy_kills += round.force_buy_kills;
        record.full_buy_kills += round.full_buy_kills;
        record.bomb_plants += round.bomb_plants;
        record.bomb_defuses += round.bomb_defuses;
        record.kast_rounds += round.kast as u32;
        record.total_impact += round.impact;
        match round.kills {
            0 | 1 => {}
            2 => record.multi_kills_2k += 1,
            3 => record.multi_kills_3k += 1,
            4 => record.multi_kills_4k += 1,
            _ => record.multi_kills_5k += 1,
        }
        times_to_death.extend(round.time_to_death);
        times_to_contact.extend(round.time_to_contact);
        if round.grenade_effectiveness > 0.0 {
            grenade_scores.push(round.grenade_effectiveness);
        }
    }
    record.shots_fired = shots_fired;

    let rounds_played = record.rounds_played;
    record.adr = per_round(record.damage as f64, rounds_played);
    record.kpr = per_round(record.kills as f64, rounds_played);
    record.dpr = per_round(record.deaths as f64, rounds_played);
    record.headshot_percentage = percentage(record.headshots as f64, record.kills as f64);
    record.accuracy = clamp_percent(percentage(record.shots_hit as f64, shots_fired as f64));
    record.kast_percentage = percentage(record.kast_rounds as f64, rounds_played as f64);
    record.average_time_to_death = mean(&times_to_death);
    record.average_time_to_contact = mean(&times_to_contact);
    record.average_grenade_effectiveness = mean(&grenade_scores);
    record.average_impact = per_round(record.total_impact, rounds_played);

    record.aim_rating = aim_rating(&record);
    record.fragger_score = fragger_score(&record);
    record.support_score = support_score(&record);
    record.opener_score = opener_score(&record);
    record.closer_score = closer_score(&record);
    record
}

/// Awards `achievement` to the player with the highest strictly positive
/// value. Ties go to the earlier record.
fn award<F>(records: &mut [PlayerMatchEvent], achievement: Achievement, value: F)
where
    F: Fn(&PlayerMatchEvent) -> f64,
{
    let winner = records
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, record)| value(*record) > 0.0)
        .max_by_key(|(_, record)| FloatOrd(value(*record)))
        .map(|(index, _)| index);
    if let Some(index) = winner {
        records[index].achievements.push(achievement);
    }
}

/// Ranks by total impact, then kills, then player id.
fn rank_players(records: &mut [PlayerMatchEvent]) {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|index| {
        let record = &records[*index];
        (
            Reverse(FloatOrd(record.total_impact)),
            Reverse(record.kills),
            record.player_id,
        )
    });
    for (position, index) in order.into_iter().enumerate() {
        records[index].rank = position as u32 + 1;
    }
}

/// Builds one [`PlayerMatchEvent`] per registered player with role scores,
/// achievements and rank.
pub fn finalize_match(state: &mut MatchState) {
    let mut records: Vec<PlayerMatchEvent> = state
        .players
        .values()
        .map(|player| {
            let rounds: Vec<&PlayerRoundEvent> = state
                .player_rounds
                .iter()
                .filter(|round| round.player_id == player.id)
                .collect();
            summarize_player(player, state.team_for_player(&player.id), &rounds)
        })
        .collect();

    let positive_impact: f64 = records
        .iter()
        .map(|record| record.total_impact.max(0.0))
        .sum();
    for record in records.iter_mut() {
        record.match_swing_percentage = percentage(record.total_impact.max(0.0), positive_impact);
    }

    award(&mut records, Achievement::Fragger, |r| r.fragger_score);
    award(&mut records, Achievement::Support, |r| r.support_score);
    award(&mut records, Achievement::Opener, |r| r.opener_score);
    award(&mut records, Achievement::Closer, |r| r.closer_score);
    award(&mut records, Achievement::TopAim, |r| r.aim_rating);
    award(&mut records, Achievement::MostImpact, |r| r.total_impact);
    award(&mut records, Achievement::MatchSwing, |r| r.match_swing_percentage);
    rank_players(&mut records);

    log::info!("Summarized {} players", records.len());
    state.player_matches = records;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId) -> Player {
        Player {
            id,
            name: format!("p{}", id),
            connected: true,
            kills: 0,
            deaths: 0,
            headshots: 0,
            wallbangs: 0,
        }
    }

    fn round(kills: u32, deaths: u32, impact: f64) -> PlayerRoundEvent {
        PlayerRoundEvent {
            side: Some(Side::CT),
            kills,
            headshots: kills / 2,
            deaths,
            impact,
            shots_fired: 10,
            shots_hit: 4,
            damage: 100 * kills as i32,
            survived: deaths == 0,
            kast: kills > 0 || deaths == 0,
            time_to_death: (deaths > 0).then_some(30.0),
            ..Default::default()
        }
    }

    #[test]
    fn totals_and_rates() {
        let rounds = [round(3, 0, 250.0), round(0, 1, -100.0), round(2, 1, 120.0)];
        let refs: Vec<&PlayerRoundEvent> = rounds.iter().collect();
        let record = summarize_player(&player(1), Some(TeamLabel::A), &refs);
        assert_eq!(record.rounds_played, 3);
        assert_eq!(record.kills, 5);
        assert_eq!(record.multi_kills_3k, 1);
        assert_eq!(record.multi_kills_2k, 1);
        assert_eq!(record.total_impact, 270.0);
        assert_eq!(record.accuracy, 40.0);
        assert_eq!(record.adr, 500.0 / 3.0);
        assert_eq!(record.average_time_to_death, 30.0);
        assert_eq!(record.kast_rounds, 2);
    }

    #[test]
    fn absent_rounds_are_not_played() {
        let absent = PlayerRoundEvent::default();
        let record = summarize_player(&player(1), None, &[&absent]);
        assert_eq!(record.rounds_played, 0);
        assert_eq!(record.kpr, 0.0);
        assert_eq!(record.closer_score, 0.0);
    }

    #[test]
    fn achievements_need_positive_scores() {
        let mut records = vec![
            PlayerMatchEvent {
                player_id: 1,
                total_impact: -20.0,
                ..Default::default()
            },
            PlayerMatchEvent {
                player_id: 2,
                total_impact: 0.0,
                ..Default::default()
            },
        ];
        award(&mut records, Achievement::MostImpact, |r| r.total_impact);
        assert!(records.iter().all(|r| r.achievements.is_empty()));

        records[1].total_impact = 10.0;
        award(&mut records, Achievement::MostImpact, |r| r.total_impact);
        assert_eq!(records[1].achievements, vec![Achievement::MostImpact]);
    }

    #[test]
    fn rank_breaks_ties_on_kills() {
        let mut records = vec![
            PlayerMatchEvent {
                player_id: 1,
                total_impact: 100.0,
                kills: 3,
                ..Default::default()
            },
            PlayerMatchEvent {
                player_id: 2,
                total_impact: 100.0,
                kills: 5,
                ..Default::default()
            },
            PlayerMatchEvent {
                player_id: 3,
                total_impact: 300.0,
                kills: 1,
                ..Default::default()
            },
        ];
        rank_players(&mut records);
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![3, 2, 1]);
    }
}
