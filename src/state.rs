use crate::constants::*;
use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

/// Permanent team designation, decided by the side a player occupied in the
/// first half. Team A is the team that started the match on CT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
pub enum TeamLabel {
    A,
    B,
}

impl TeamLabel {
    pub fn other(&self) -> TeamLabel {
        match self {
            TeamLabel::A => TeamLabel::B,
            TeamLabel::B => TeamLabel::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamLabel::A => TEAM_A_LABEL,
            TeamLabel::B => TEAM_B_LABEL,
        }
    }
}

/// Whether sides swap when `round` begins: at halftime, and every three
/// rounds of overtime after the first overtime half. Sides carry unchanged
/// into the first overtime round.
pub fn is_side_swap_round(round: u32) -> bool {
    if round == HALFTIME_SWAP_ROUND {
        return true;
    }
    if round <= REGULATION_ROUNDS {
        return false;
    }
    let overtime_round = round - REGULATION_ROUNDS;
    overtime_round > OVERTIME_HALF_LENGTH && overtime_round % OVERTIME_HALF_LENGTH == 1
}

#[derive(Debug, Clone)]
pub struct TeamAssignment {
    labels: HashMap<PlayerId, TeamLabel>,
    team_a_side: Side,
    wins: [u32; 2],
    pending_swap: bool,
}

impl Default for TeamAssignment {
    fn default() -> Self {
        Self {
            labels: HashMap::new(),
            team_a_side: Side::CT,
            wins: [0, 0],
            pending_swap: false,
        }
    }
}

impl TeamAssignment {
    pub fn is_frozen(&self) -> bool {
        self.labels.len() >= TEAM_SIZE * 2
    }

    pub fn label(&self, player_id: &PlayerId) -> Option<TeamLabel> {
        self.labels.get(player_id).copied()
    }

    pub fn side_of(&self, label: TeamLabel) -> Side {
        match label {
            TeamLabel::A => self.team_a_side,
            TeamLabel::B => self.team_a_side.opposite(),
        }
    }

    pub fn label_on_side(&self, side: Side) -> TeamLabel {
        if self.team_a_side == side {
            TeamLabel::A
        } else {
            TeamLabel::B
        }
    }

    /// Assigns a label from the side the player is playing right now. Has no
    /// effect once the player has a label or ten players are assigned.
    pub fn assign(&mut self, player_id: PlayerId, side: Side) -> Option<TeamLabel> {
        if let Some(label) = self.label(&player_id) {
            return Some(label);
        }
        if self.is_frozen() {
            log::debug!(
                "Team assignment frozen, leaving player {} unassigned",
                player_id
            );
            return None;
        }
        let label = self.label_on_side(side);
        self.labels.insert(player_id, label);
        log::debug!("Assigned player {} to team {:?}", player_id, label);
        Some(label)
    }

    pub fn record_win(&mut self, side: Side) -> TeamLabel {
        let label = self.label_on_side(side);
        self.wins[label as usize] += 1;
        label
    }

    pub fn wins(&self, label: TeamLabel) -> u32 {
        self.wins[label as usize]
    }

    pub fn schedule_swap(&mut self) {
        self.pending_swap = true;
    }

    /// Applies a swap scheduled at the previous round end.
    pub fn apply_pending_swap(&mut self) -> bool {
        if !self.pending_swap {
            return false;
        }
        self.pending_swap = false;
        self.team_a_side = self.team_a_side.opposite();
        true
    }

    pub fn reset_score(&mut self) {
        self.wins = [0, 0];
        self.pending_swap = false;
        self.team_a_side = Side::CT;
    }
}

/// Persistent per-match identity and running tallies.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub kills: u32,
    pub deaths: u32,
    pub headshots: u32,
    pub wallbangs: u32,
}

impl Player {
    fn new(handle: &PlayerHandle) -> Self {
        Self {
            id: handle.id,
            name: handle.name.clone(),
            connected: true,
            kills: 0,
            deaths: 0,
            headshots: 0,
            wallbangs: 0,
        }
    }
}

/// Transient per-round state, reset at every round start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    pub demo_team: DemoTeam,
    pub health: i32,
    pub armor: i32,
    pub active_weapon: Option<Weapon>,
    pub is_flashed: bool,
    pub is_alive: bool,
    pub equipment_value: i32,
    pub grenade_value: i32,
    pub position: Vector3,
    pub round_kills: u32,
    pub round_deaths: u32,
    pub round_headshots: u32,
    pub round_wallbangs: u32,
}

impl PlayerState {
    fn reset_for_round(&mut self) {
        *self = PlayerState {
            demo_team: self.demo_team,
            equipment_value: self.equipment_value,
            grenade_value: self.grenade_value,
            position: self.position,
            health: 100,
            is_alive: true,
            ..Default::default()
        };
    }

    fn refresh(&mut self, handle: &PlayerHandle) {
        self.demo_team = handle.team;
        self.health = handle.health;
        self.armor = handle.armor;
        self.active_weapon = handle.active_weapon;
        self.is_flashed = handle.is_flashed();
        self.equipment_value = equipment_value(handle);
        self.grenade_value = grenade_value(&handle.inventory);
        self.position = handle.position;
    }
}

/// How a player left the living roster of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    Killed { killer: PlayerId },
    SelfKill,
    /// Killed with no attacker: falls, the bomb, the world.
    World,
    Disconnect,
}

impl ExitCause {
    pub fn is_death(&self) -> bool {
        !matches!(self, ExitCause::Disconnect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundExit {
    pub tick: Tick,
    pub round_time: f64,
    pub player_id: PlayerId,
    pub side: Option<Side>,
    pub cause: ExitCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    NotStarted,
    Live,
    Ended,
}

#[derive(Debug, Clone)]
pub struct RoundTracker {
    pub number: u32,
    pub start_tick: Tick,
    pub freeze_end_tick: Option<Tick>,
    pub phase: RoundPhase,
    pub kills: u32,
    /// Side each participating player played this round.
    pub roster: BTreeMap<PlayerId, Side>,
    /// Deaths and disconnects in stream order.
    pub exits: Vec<RoundExit>,
}

impl Default for RoundTracker {
    fn default() -> Self {
        Self {
            number: 0,
            start_tick: 0,
            freeze_end_tick: None,
            phase: RoundPhase::NotStarted,
            kills: 0,
            roster: BTreeMap::new(),
            exits: Vec::new(),
        }
    }
}

impl RoundTracker {
    pub fn is_open(&self) -> bool {
        self.phase != RoundPhase::NotStarted
    }

    pub fn reference_tick(&self) -> Tick {
        self.freeze_end_tick.unwrap_or(self.start_tick)
    }
}

/// The single owned aggregate for one match. Correlators and aggregators
/// receive it by reference; nothing else holds match data.
#[derive(Debug)]
pub struct MatchState {
    pub header: DemoHeader,
    pub tick_rate: f64,
    pub current_tick: Tick,
    pub round: RoundTracker,
    pub players: BTreeMap<PlayerId, Player>,
    pub player_states: HashMap<PlayerId, PlayerState>,
    pub teams: TeamAssignment,
    pub movement: MovementClassifier,
    pub rounds: Vec<RoundEvent>,
    pub gunfights: Vec<GunfightEvent>,
    pub damages: Vec<DamageEvent>,
    pub grenades: Vec<GrenadeEvent>,
    pub player_rounds: Vec<PlayerRoundEvent>,
    pub player_matches: Vec<PlayerMatchEvent>,
    pub shots_fired: HashMap<(u32, PlayerId), u32>,
    pub tables: CorrelationTables,
    pub finalized: bool,
}

impl MatchState {
    pub fn new(header: DemoHeader, config: &ProcessorConfig) -> Self {
        let tick_rate = header
            .tick_rate
            .filter(|rate| *rate > 0.0)
            .unwrap_or(config.tick_rate);
        Self {
            header,
            tick_rate,
            current_tick: 0,
            round: RoundTracker::default(),
            players: BTreeMap::new(),
            player_states: HashMap::new(),
            teams: TeamAssignment::default(),
            movement: MovementClassifier::new(),
            rounds: Vec::new(),
            gunfights: Vec::new(),
            damages: Vec::new(),
            grenades: Vec::new(),
            player_rounds: Vec::new(),
            player_matches: Vec::new(),
            shots_fired: HashMap::new(),
            tables: CorrelationTables::default(),
            finalized: false,
        }
    }

    /// Registers the player behind `handle` if they are on a playing side,
    /// and refreshes their transient state from the handle.
    pub fn observe_player(&mut self, handle: &PlayerHandle) {
        let Some(side) = handle.team.side() else {
            if let Some(state) = self.player_states.get_mut(&handle.id) {
                state.demo_team = handle.team;
            }
            return;
        };
        let player = self
            .players
            .entry(handle.id)
            .or_insert_with(|| Player::new(handle));
        player.connected = true;
        if !handle.name.is_empty() {
            player.name = handle.name.clone();
        }
        self.teams.assign(handle.id, side);
        let state = self.player_states.entry(handle.id).or_insert_with(|| PlayerState {
            is_alive: self.round.phase != RoundPhase::Live || handle.is_alive,
            ..Default::default()
        });
        state.refresh(handle);
        if self.round.is_open() {
            let side = self
                .teams
                .label(&handle.id)
                .map(|label| self.teams.side_of(label))
                .unwrap_or(side);
            self.round.roster.entry(handle.id).or_insert(side);
        }
    }

    pub fn team_for_player(&self, player_id: &PlayerId) -> Option<TeamLabel> {
        self.teams.label(player_id)
    }

    /// Side the player's frozen team is playing this round. Falls back to the
    /// decoder team for players who never received a label.
    pub fn current_side_for_player(&self, player_id: &PlayerId) -> Option<Side> {
        match self.teams.label(player_id) {
            Some(label) => Some(self.teams.side_of(label)),
            None => self
                .player_states
                .get(player_id)
                .and_then(|state| state.demo_team.side()),
        }
    }

    pub fn current_round_time(&self, tick: Tick) -> f64 {
        ticks_to_seconds(tick - self.round.reference_tick(), self.tick_rate).max(0.0)
    }

    /// Living players on `side` and their combined equipment value.
    pub fn alive_on_side(&self, side: Side) -> (u32, i32) {
        self.round
            .roster
            .keys()
            .filter(|id| self.current_side_for_player(id) == Some(side))
            .filter_map(|id| self.player_states.get(id))
            .filter(|state| state.is_alive)
            .fold((0, 0), |(count, value), state| {
                (count + 1, value + state.equipment_value)
            })
    }

    /// Takes `player_id` out of the living roster. Every cause but a
    /// disconnect also counts as a death.
    pub fn record_exit(&mut self, player_id: PlayerId, cause: ExitCause, tick: Tick) {
        let side = self
            .round
            .roster
            .get(&player_id)
            .copied()
            .or_else(|| self.current_side_for_player(&player_id));
        if let Some(player_state) = self.player_states.get_mut(&player_id) {
            player_state.is_alive = false;
            if cause.is_death() {
                player_state.round_deaths += 1;
            }
        }
        if cause.is_death() {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.deaths += 1;
            }
        }
        self.round.exits.push(RoundExit {
            tick,
            round_time: self.current_round_time(tick),
            player_id,
            side,
            cause,
        });
    }

    /// Resets transient state for the round that is starting.
    pub fn begin_round(&mut self, tick: Tick) {
        self.round = RoundTracker {
            number: self.round.number + 1,
            start_tick: tick,
            phase: RoundPhase::Live,
            ..Default::default()
        };
        for state in self.player_states.values_mut() {
            state.reset_for_round();
        }
        for (id, player) in self.players.iter() {
            if !player.connected {
                continue;
            }
            if let Some(side) = self.current_side_for_player(id) {
                self.round.roster.insert(*id, side);
            }
        }
        self.movement.clear();
        for unmatched in self.tables.take_unmatched_flashes() {
            log::info!("Discarding flash notification: {}", unmatched);
        }
        self.tables.clear_round();
    }

    pub fn gunfights_in_round(&self, round: u32) -> impl Iterator<Item = &GunfightEvent> {
        self.gunfights.iter().filter(move |g| g.round_number == round)
    }

    pub fn damages_in_round(&self, round: u32) -> impl Iterator<Item = &DamageEvent> {
        self.damages.iter().filter(move |d| d.round_number == round)
    }

    pub fn grenades_in_round(&self, round: u32) -> impl Iterator<Item = &GrenadeEvent> {
        self.grenades.iter().filter(move |g| g.round_number == round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_rounds() {
        let swaps: Vec<u32> = (1..=40).filter(|r| is_side_swap_round(*r)).collect();
        assert_eq!(swaps, vec![13, 28, 31, 34, 37, 40]);
    }

    #[test]
    fn assignment_freezes_after_ten_players() {
        let mut teams = TeamAssignment::default();
        for id in 0..5 {
            assert_eq!(teams.assign(id, Side::CT), Some(TeamLabel::A));
        }
        for id in 5..10 {
            assert_eq!(teams.assign(id, Side::T), Some(TeamLabel::B));
        }
        assert!(teams.is_frozen());
        assert_eq!(teams.assign(11, Side::CT), None);
        // Already-labelled players keep their label even on the other side.
        assert_eq!(teams.assign(0, Side::T), Some(TeamLabel::A));
    }

    #[test]
    fn wins_resolve_through_current_side() {
        let mut teams = TeamAssignment::default();
        assert_eq!(teams.record_win(Side::CT), TeamLabel::A);
        teams.schedule_swap();
        assert!(teams.apply_pending_swap());
        assert!(!teams.apply_pending_swap());
        assert_eq!(teams.side_of(TeamLabel::A), Side::T);
        assert_eq!(teams.record_win(Side::CT), TeamLabel::B);
        assert_eq!(teams.wins(TeamLabel::A), 1);
        assert_eq!(teams.wins(TeamLabel::B), 1);
    }
}
