//! Finalized match records handed to the result-delivery collaborator.

use crate::*;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum GameMode {
    Competitive,
    Premier,
    Wingman,
    Casual,
    Other,
}

impl GameMode {
    pub fn classify(name: &str) -> GameMode {
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("premier") {
            GameMode::Premier
        } else if lowered.contains("competitive") || lowered.contains("scrimcomp5v5") {
            GameMode::Competitive
        } else if lowered.contains("wingman") || lowered.contains("scrimcomp2v2") {
            GameMode::Wingman
        } else if lowered.contains("casual") {
            GameMode::Casual
        } else {
            GameMode::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum MapType {
    Defusal,
    Hostage,
    Custom,
}

impl MapType {
    pub fn classify(map_name: &str) -> MapType {
        let base = map_name.rsplit('/').next().unwrap_or(map_name);
        if base.starts_with("de_") {
            MapType::Defusal
        } else if base.starts_with("cs_") {
            MapType::Hostage
        } else {
            MapType::Custom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum RoundEventType {
    Start,
    FreezeEnd,
    End,
    BombPlanted,
    BombDefused,
    BombExploded,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct RoundEvent {
    pub round_number: u32,
    pub event_type: RoundEventType,
    pub tick: Tick,
    pub round_time: f64,
    pub player_id: Option<PlayerId>,
    pub site: Option<String>,
    pub winner_side: Option<Side>,
    pub winner_team: Option<TeamLabel>,
    pub end_reason: Option<RoundEndReason>,
    pub team_a_side: Side,
    pub team_a_score: u32,
    pub team_b_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum ImpactContext {
    FirstKill,
    WonClutch,
    FailedClutch,
    Standard,
}

/// Snapshot of one combatant at the moment of a kill.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct Combatant {
    pub id: PlayerId,
    pub name: String,
    pub team: Option<TeamLabel>,
    pub side: Option<Side>,
    pub position: Vector3,
    pub health: i32,
    pub armor: i32,
    pub flashed: bool,
    pub weapon: Option<Weapon>,
    pub equipment_value: i32,
    pub grenade_value: i32,
}

/// A single kill with both participants' situational snapshot. Player 1 is
/// the killer and player 2 the victim.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct GunfightEvent {
    pub round_number: u32,
    pub tick: Tick,
    pub round_time: f64,
    pub player1: Combatant,
    pub player2: Combatant,
    pub distance: f32,
    pub weapon: Weapon,
    pub is_headshot: bool,
    pub is_wallbang: bool,
    pub penetrated_objects: u32,
    pub victor_id: PlayerId,
    pub is_first_kill: bool,
    pub is_team_kill: bool,
    pub assister_id: Option<PlayerId>,
    pub flash_assister_id: Option<PlayerId>,
    /// Health damage the killer dealt the victim this round, informational.
    pub damage_dealt: i32,
    pub round_scenario: String,
    pub player1_team_alive: u32,
    pub player2_team_alive: u32,
    pub player1_team_equipment: i32,
    pub player2_team_equipment: i32,
    pub impact_context: ImpactContext,
    pub player1_impact: f64,
    pub player2_impact: f64,
    pub assist_impact: f64,
    pub flash_assist_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DamageEvent {
    pub round_number: u32,
    pub tick: Tick,
    pub round_time: f64,
    pub attacker_id: Option<PlayerId>,
    pub attacker_team: Option<TeamLabel>,
    pub attacker_side: Option<Side>,
    pub attacker_position: Option<Vector3>,
    pub victim_id: PlayerId,
    pub victim_team: Option<TeamLabel>,
    pub victim_side: Option<Side>,
    pub victim_position: Vector3,
    pub weapon: Weapon,
    pub health_damage: i32,
    /// Health damage capped at the health the victim actually had.
    pub health_damage_taken: i32,
    pub armor_damage: i32,
    pub victim_health_after: i32,
    pub hit_group: Option<String>,
    pub distance: Option<f32>,
    pub is_team_damage: bool,
    pub is_self_damage: bool,
    pub grenade_entity_id: Option<EntityId>,
}

impl DamageEvent {
    pub fn is_enemy_damage(&self) -> bool {
        self.attacker_id.is_some() && !self.is_team_damage && !self.is_self_damage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct GrenadeEvent {
    pub round_number: u32,
    pub entity_id: EntityId,
    pub thrower_id: PlayerId,
    pub thrower_name: String,
    pub thrower_team: Option<TeamLabel>,
    pub thrower_side: Option<Side>,
    pub grenade: GrenadeKind,
    /// Tick at which the grenade was thrown.
    pub tick_timestamp: Tick,
    /// Round-relative seconds at throw time.
    pub round_time: f64,
    pub player_position: Vector3,
    pub player_aim: ViewAngles,
    pub movement: String,
    pub detonation_tick: Tick,
    pub final_position: Vector3,
    pub throw_distance: f32,
    pub enemies_flashed: u32,
    pub teammates_flashed: u32,
    pub enemy_flash_duration: f64,
    pub team_flash_duration: f64,
    pub flash_leads_to_kill: bool,
    pub flash_leads_to_death: bool,
    pub enemy_damage: i32,
    pub team_damage: i32,
    pub enemies_damaged: u32,
    pub teammates_damaged: u32,
    pub effectiveness_rating: f64,
}

impl GrenadeEvent {
    pub fn net_enemy_damage(&self) -> i32 {
        self.enemy_damage - self.team_damage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum BuyType {
    Eco,
    ForceBuy,
    FullBuy,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[ts(export)]
pub struct PlayerRoundEvent {
    pub round_number: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: Option<TeamLabel>,
    pub side: Option<Side>,
    pub round_won: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub flash_assists: u32,
    pub headshots: u32,
    pub wallbangs: u32,
    pub awp_kills: u32,
    pub team_kills: u32,
    pub first_kill: bool,
    pub first_death: bool,
    pub damage: i32,
    pub team_damage: i32,
    pub utility_damage: i32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub flashes_thrown: u32,
    pub smokes_thrown: u32,
    pub he_thrown: u32,
    pub fire_thrown: u32,
    pub decoys_thrown: u32,
    pub enemies_flashed: u32,
    pub teammates_flashed: u32,
    pub enemy_flash_duration: f64,
    pub grenade_value_lost: i32,
    pub grenade_effectiveness: f64,
    pub trade_kills: u32,
    pub trade_opportunities: u32,
    pub traded_death: bool,
    pub clutch_attempt: bool,
    pub clutch_won: bool,
    pub clutch_opponents: u32,
    pub equipment_value: i32,
    pub is_eco: bool,
    pub is_force_buy: bool,
    pub is_full_buy: bool,
    pub eco_kills: u32,
    pub force_buy_kills: u32,
    pub full_buy_kills: u32,
    pub time_to_contact: Option<f64>,
    pub time_to_death: Option<f64>,
    pub survived: bool,
    pub kast: bool,
    pub bomb_plants: u32,
    pub bomb_defuses: u32,
    pub kill_impact: f64,
    pub death_impact: f64,
    pub assist_impact: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum Achievement {
    Fragger,
    Support,
    Opener,
    Closer,
    TopAim,
    MostImpact,
    MatchSwing,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[ts(export)]
pub struct PlayerMatchEvent {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: Option<TeamLabel>,
    pub rounds_played: u32,
    pub rounds_won: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub flash_assists: u32,
    pub headshots: u32,
    pub wallbangs: u32,
    pub awp_kills: u32,
    pub team_kills: u32,
    pub first_kills: u32,
    pub first_deaths: u32,
    pub damage: i32,
    pub utility_damage: i32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub flashes_thrown: u32,
    pub smokes_thrown: u32,
    pub he_thrown: u32,
    pub fire_thrown: u32,
    pub enemies_flashed: u32,
    pub teammates_flashed: u32,
    pub trade_kills: u32,
    pub traded_deaths: u32,
    pub clutch_attempts: u32,
    pub clutch_wins: u32,
    pub eco_kills: u32,
    pub force_buy_kills: u32,
    pub full_buy_kills: u32,
    pub multi_kills_2k: u32,
    pub multi_kills_3k: u32,
    pub multi_kills_4k: u32,
    pub multi_kills_5k: u32,
    pub bomb_plants: u32,
    pub bomb_defuses: u32,
    pub kast_rounds: u32,
    pub adr: f64,
    pub kpr: f64,
    pub dpr: f64,
    pub headshot_percentage: f64,
    pub accuracy: f64,
    pub kast_percentage: f64,
    pub average_time_to_death: f64,
    pub average_time_to_contact: f64,
    pub average_grenade_effectiveness: f64,
    pub total_impact: f64,
    pub average_impact: f64,
    pub aim_rating: f64,
    pub match_swing_percentage: f64,
    pub fragger_score: f64,
    pub support_score: f64,
    pub opener_score: f64,
    pub closer_score: f64,
    pub achievements: Vec<Achievement>,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub team: Option<TeamLabel>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct MatchRecord {
    pub map_name: String,
    pub server_name: String,
    pub game_mode: GameMode,
    pub map_type: MapType,
    pub tick_rate: f64,
    pub rounds_played: u32,
    pub team_a_score: u32,
    pub team_b_score: u32,
    pub winner: Option<TeamLabel>,
}

/// Everything a parse produces, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub match_record: MatchRecord,
    pub players: Vec<PlayerRecord>,
    pub rounds: Vec<RoundEvent>,
    pub gunfights: Vec<GunfightEvent>,
    pub damages: Vec<DamageEvent>,
    pub grenades: Vec<GrenadeEvent>,
    pub player_rounds: Vec<PlayerRoundEvent>,
    pub player_matches: Vec<PlayerMatchEvent>,
}
