//! Situational kill impact. A kill is worth more when the killer's side is
//! weaker than the victim's (fewer players, less equipment), and more again
//! when it opens the round or decides a clutch.

use super::ClutchOutcome;
use crate::constants::*;
use crate::*;

/// The state of one side at the moment of a kill.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct TeamSnapshot {
    pub man_count: u32,
    pub equipment_value: f64,
}

pub fn calculate_team_strength(team: &TeamSnapshot, config: &ImpactConfig) -> f64 {
    team.man_count as f64 * config.base_player_value * config.man_count_weight
        + team.equipment_value * config.equipment_weight
}

/// Strength of a full five-player team at maximum equipment.
pub fn max_team_strength(config: &ImpactConfig) -> f64 {
    calculate_team_strength(
        &TeamSnapshot::new(
            TEAM_SIZE as u32,
            TEAM_SIZE as f64 * config.max_player_equipment_value,
        ),
        config,
    )
}

/// Normalised strength difference in `[-1, 1]`, positive when `opponent` is
/// the stronger side.
pub fn calculate_strength_differential(
    own: &TeamSnapshot,
    opponent: &TeamSnapshot,
    config: &ImpactConfig,
) -> f64 {
    let max = max_team_strength(config);
    if max <= 0.0 {
        return 0.0;
    }
    let diff = calculate_team_strength(opponent, config) - calculate_team_strength(own, config);
    (diff / max).clamp(-1.0, 1.0)
}

pub fn calculate_base_impact_multiplier(differential: f64, config: &ImpactConfig) -> f64 {
    1.0 + differential * config.strength_diff_multiplier
}

/// Parses `"{killer_alive}v{victim_alive}"`.
pub fn parse_scenario(scenario: &str) -> Option<(u32, u32)> {
    let (left, right) = scenario.split_once('v')?;
    Some((left.trim().parse().ok()?, right.trim().parse().ok()?))
}

/// First kill beats clutch, clutch beats standard. A kill made while either
/// side is down to its last player is a clutch kill; it counts as won only
/// when the killer is the one alone and goes on to win that clutch.
pub fn select_impact_context(
    is_first_kill: bool,
    scenario: &str,
    killer_won_clutch: bool,
) -> ImpactContext {
    if is_first_kill {
        return ImpactContext::FirstKill;
    }
    match parse_scenario(scenario) {
        Some((1, _)) if killer_won_clutch => ImpactContext::WonClutch,
        Some((killer_alive, victim_alive)) if killer_alive == 1 || victim_alive == 1 => {
            ImpactContext::FailedClutch
        }
        _ => ImpactContext::Standard,
    }
}

pub fn context_multiplier(context: ImpactContext, config: &ImpactConfig) -> f64 {
    match context {
        ImpactContext::FirstKill => config.first_kill_multiplier,
        ImpactContext::WonClutch => config.won_clutch_multiplier,
        ImpactContext::FailedClutch => config.failed_clutch_multiplier,
        ImpactContext::Standard => config.standard_multiplier,
    }
}

pub fn calculate_kill_impact(
    own: &TeamSnapshot,
    opponent: &TeamSnapshot,
    context: ImpactContext,
    config: &ImpactConfig,
) -> f64 {
    let differential = calculate_strength_differential(own, opponent, config);
    config.base_kill_impact
        * calculate_base_impact_multiplier(differential, config)
        * context_multiplier(context, config)
}

/// Fills in the impact fields of a gunfight. Team kills carry no impact.
pub fn apply_impact(
    gunfight: &mut GunfightEvent,
    clutches: &[ClutchOutcome],
    config: &ImpactConfig,
) {
    if gunfight.is_team_kill {
        gunfight.impact_context = ImpactContext::Standard;
        gunfight.player1_impact = 0.0;
        gunfight.player2_impact = 0.0;
        gunfight.assist_impact = 0.0;
        gunfight.flash_assist_impact = 0.0;
        return;
    }
    let killer_won_clutch = clutches
        .iter()
        .any(|clutch| clutch.player_id == gunfight.player1.id && clutch.won);
    let context = select_impact_context(
        gunfight.is_first_kill,
        &gunfight.round_scenario,
        killer_won_clutch,
    );
    let own = TeamSnapshot::new(
        gunfight.player1_team_alive,
        gunfight.player1_team_equipment as f64,
    );
    let opponent = TeamSnapshot::new(
        gunfight.player2_team_alive,
        gunfight.player2_team_equipment as f64,
    );
    let impact = calculate_kill_impact(&own, &opponent, context, config);

    gunfight.impact_context = context;
    gunfight.player1_impact = impact;
    gunfight.player2_impact = -impact;
    gunfight.assist_impact = match gunfight.assister_id {
        Some(_) => impact * config.assist_fraction,
        None => 0.0,
    };
    gunfight.flash_assist_impact = match gunfight.flash_assister_id {
        Some(_) => impact * config.flash_assist_fraction,
        None => 0.0,
    };
}

/// Per-player share of one gunfight's impact: kill, death and assist parts.
/// A player holds at most one role per gunfight, picked killer first, then
/// victim, assister and flash assister.
pub fn impact_shares(gunfight: &GunfightEvent, player_id: PlayerId) -> (f64, f64, f64) {
    if gunfight.player1.id == player_id {
        (gunfight.player1_impact, 0.0, 0.0)
    } else if gunfight.player2.id == player_id {
        (0.0, gunfight.player2_impact, 0.0)
    } else if gunfight.assister_id == Some(player_id) {
        (0.0, 0.0, gunfight.assist_impact)
    } else if gunfight.flash_assister_id == Some(player_id) {
        (0.0, 0.0, gunfight.flash_assist_impact)
    } else {
        (0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImpactConfig {
        ImpactConfig::default()
    }

    #[test]
    fn full_teams_have_no_differential() {
        let team = TeamSnapshot::new(5, 25000.0);
        assert_eq!(calculate_strength_differential(&team, &team, &config()), 0.0);
        assert_eq!(calculate_base_impact_multiplier(0.0, &config()), 1.0);
    }

    #[test]
    fn team_strength_formula() {
        // 5 * 1000 * 1.0 + 25000 * 0.2
        assert_eq!(
            calculate_team_strength(&TeamSnapshot::new(5, 25000.0), &config()),
            10000.0
        );
        // 5 * 1000 + 40000 * 0.2
        assert_eq!(max_team_strength(&config()), 13000.0);
    }

    #[test]
    fn weaker_killer_earns_more() {
        let config = config();
        let strong = TeamSnapshot::new(5, 25000.0);
        let weak = TeamSnapshot::new(2, 3000.0);
        let underdog = calculate_kill_impact(&weak, &strong, ImpactContext::Standard, &config);
        let favourite = calculate_kill_impact(&strong, &weak, ImpactContext::Standard, &config);
        assert!(underdog > 100.0);
        assert!(favourite < 100.0);
        assert!(underdog > favourite);
    }

    #[test]
    fn late_clutch_kills_use_clutch_multipliers() {
        assert_eq!(
            select_impact_context(false, "1v3", false),
            ImpactContext::FailedClutch
        );
        assert_eq!(
            select_impact_context(false, "1v3", true),
            ImpactContext::WonClutch
        );
        assert_eq!(
            select_impact_context(false, "3v1", false),
            ImpactContext::FailedClutch
        );
        assert_eq!(
            select_impact_context(true, "1v3", true),
            ImpactContext::FirstKill
        );
        assert_eq!(
            select_impact_context(false, "4v3", false),
            ImpactContext::Standard
        );
    }

    fn gunfight() -> GunfightEvent {
        let combatant = |id| Combatant {
            id,
            name: String::new(),
            team: None,
            side: None,
            position: Vector3::default(),
            health: 100,
            armor: 0,
            flashed: false,
            weapon: None,
            equipment_value: 0,
            grenade_value: 0,
        };
        GunfightEvent {
            round_number: 1,
            tick: 100,
            round_time: 1.0,
            player1: combatant(1),
            player2: combatant(6),
            distance: 0.0,
            weapon: Weapon::Ak47,
            is_headshot: false,
            is_wallbang: false,
            penetrated_objects: 0,
            victor_id: 1,
            is_first_kill: true,
            is_team_kill: false,
            assister_id: Some(2),
            flash_assister_id: Some(3),
            damage_dealt: 0,
            round_scenario: "5v5".to_string(),
            player1_team_alive: 5,
            player2_team_alive: 5,
            player1_team_equipment: 20000,
            player2_team_equipment: 20000,
            impact_context: ImpactContext::Standard,
            player1_impact: 0.0,
            player2_impact: 0.0,
            assist_impact: 0.0,
            flash_assist_impact: 0.0,
        }
    }

    #[test]
    fn victim_impact_is_exact_negative() {
        let mut fight = gunfight();
        apply_impact(&mut fight, &[], &config());
        assert_eq!(fight.impact_context, ImpactContext::FirstKill);
        assert_eq!(fight.player1_impact, 150.0);
        assert_eq!(fight.player2_impact, -fight.player1_impact);
        assert_eq!(fight.assist_impact, 150.0 * 0.35);
        assert_eq!(fight.flash_assist_impact, 150.0 * 0.2);
    }

    #[test]
    fn roles_are_not_double_counted() {
        let mut fight = gunfight();
        fight.flash_assister_id = Some(2);
        apply_impact(&mut fight, &[], &config());
        assert_eq!(impact_shares(&fight, 2), (0.0, 0.0, fight.assist_impact));
        assert_eq!(impact_shares(&fight, 9), (0.0, 0.0, 0.0));
    }

    #[test]
    fn team_kills_have_no_impact() {
        let mut fight = gunfight();
        fight.is_team_kill = true;
        apply_impact(&mut fight, &[], &config());
        assert_eq!(fight.player1_impact, 0.0);
        assert_eq!(fight.player2_impact, 0.0);
    }
}
