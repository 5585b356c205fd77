//! The typed event stream produced by an external demo decoder.
//!
//! Every actor arrives as a [`PlayerHandle`], a snapshot of the decoder's
//! live entity state at the tick the event fired. Actors the decoder could
//! not resolve are `None`; the processor logs and skips those events.

use crate::*;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Team as reported by the decoder. This is the raw side for the current
/// tick and flips at halftime; statistics never tally wins through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemoTeam {
    #[default]
    Unassigned,
    Spectator,
    Terrorist,
    CounterTerrorist,
}

impl DemoTeam {
    pub fn side(&self) -> Option<Side> {
        match self {
            DemoTeam::Terrorist => Some(Side::T),
            DemoTeam::CounterTerrorist => Some(Side::CT),
            DemoTeam::Unassigned | DemoTeam::Spectator => None,
        }
    }
}

/// The side a team is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
pub enum Side {
    CT,
    T,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::CT => Side::T,
            Side::T => Side::CT,
        }
    }
}

/// Movement-related entity flags and button state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementFlags {
    pub on_ground: bool,
    pub ducking: bool,
    pub walking: bool,
    pub velocity: Option<Vector3>,
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementFlags {
    pub fn has_movement_intent(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerHandle {
    pub id: PlayerId,
    pub name: String,
    pub team: DemoTeam,
    pub position: Vector3,
    pub view: ViewAngles,
    pub health: i32,
    pub armor: i32,
    pub has_helmet: bool,
    pub has_defuse_kit: bool,
    pub is_alive: bool,
    pub active_weapon: Option<Weapon>,
    pub inventory: Vec<Weapon>,
    pub flash_duration: f32,
    pub money: i32,
    pub movement: MovementFlags,
}

impl PlayerHandle {
    pub fn is_flashed(&self) -> bool {
        self.flash_duration > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoHeader {
    pub map_name: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub game_mode: String,
    #[serde(default)]
    pub tick_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub enum RoundEndReason {
    TargetBombed,
    BombDefused,
    CTWin,
    TerroristsWin,
    TargetSaved,
    HostagesRescued,
    HostagesNotRescued,
    Draw,
    Surrender,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEndEvent {
    pub winner: Option<Side>,
    pub reason: RoundEndReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub killer: Option<PlayerHandle>,
    pub victim: Option<PlayerHandle>,
    #[serde(default)]
    pub assister: Option<PlayerHandle>,
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub is_headshot: bool,
    #[serde(default)]
    pub penetrated_objects: u32,
    #[serde(default)]
    pub assisted_flash: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerHurtEvent {
    pub attacker: Option<PlayerHandle>,
    pub player: Option<PlayerHandle>,
    pub weapon: Option<Weapon>,
    pub health_damage: i32,
    #[serde(default)]
    pub armor_damage: i32,
    #[serde(default)]
    pub hit_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponFireEvent {
    pub shooter: Option<PlayerHandle>,
    pub weapon: Option<Weapon>,
}

/// A grenade projectile entity. `entity_id` is the stable identity that
/// links throw, detonation and destruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileEvent {
    pub entity_id: EntityId,
    pub weapon: Weapon,
    pub thrower: Option<PlayerHandle>,
    pub position: Vector3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFlashedEvent {
    pub player: Option<PlayerHandle>,
    pub attacker: Option<PlayerHandle>,
    pub flash_duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombEvent {
    pub player: Option<PlayerHandle>,
    #[serde(default)]
    pub site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamChangeEvent {
    pub player: Option<PlayerHandle>,
    pub new_team: DemoTeam,
    pub old_team: DemoTeam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DemoEvent {
    MatchStart,
    RoundStart,
    RoundFreezeEnd,
    RoundEnd(RoundEndEvent),
    Kill(KillEvent),
    PlayerHurt(PlayerHurtEvent),
    WeaponFire(WeaponFireEvent),
    GrenadeProjectileThrow(ProjectileEvent),
    GrenadeProjectileDestroy(ProjectileEvent),
    FlashExplode(ProjectileEvent),
    PlayerFlashed(PlayerFlashedEvent),
    SmokeStart(ProjectileEvent),
    BombPlanted(BombEvent),
    BombDefused(BombEvent),
    BombExploded(BombEvent),
    PlayerConnect(PlayerHandle),
    PlayerDisconnect(PlayerHandle),
    PlayerTeamChange(TeamChangeEvent),
}

impl DemoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DemoEvent::MatchStart => "match_start",
            DemoEvent::RoundStart => "round_start",
            DemoEvent::RoundFreezeEnd => "round_freeze_end",
            DemoEvent::RoundEnd(_) => "round_end",
            DemoEvent::Kill(_) => "kill",
            DemoEvent::PlayerHurt(_) => "player_hurt",
            DemoEvent::WeaponFire(_) => "weapon_fire",
            DemoEvent::GrenadeProjectileThrow(_) => "grenade_projectile_throw",
            DemoEvent::GrenadeProjectileDestroy(_) => "grenade_projectile_destroy",
            DemoEvent::FlashExplode(_) => "flash_explode",
            DemoEvent::PlayerFlashed(_) => "player_flashed",
            DemoEvent::SmokeStart(_) => "smoke_start",
            DemoEvent::BombPlanted(_) => "bomb_planted",
            DemoEvent::BombDefused(_) => "bomb_defused",
            DemoEvent::BombExploded(_) => "bomb_exploded",
            DemoEvent::PlayerConnect(_) => "player_connect",
            DemoEvent::PlayerDisconnect(_) => "player_disconnect",
            DemoEvent::PlayerTeamChange(_) => "player_team_change",
        }
    }

    /// Every player snapshot carried by the event.
    pub fn handles(&self) -> Vec<&PlayerHandle> {
        match self {
            DemoEvent::MatchStart
            | DemoEvent::RoundStart
            | DemoEvent::RoundFreezeEnd
            | DemoEvent::RoundEnd(_) => Vec::new(),
            DemoEvent::Kill(kill) => [&kill.killer, &kill.victim, &kill.assister]
                .into_iter()
                .flatten()
                .collect(),
            DemoEvent::PlayerHurt(hurt) => [&hurt.attacker, &hurt.player]
                .into_iter()
                .flatten()
                .collect(),
            DemoEvent::WeaponFire(fire) => fire.shooter.iter().collect(),
            DemoEvent::GrenadeProjectileThrow(projectile)
            | DemoEvent::GrenadeProjectileDestroy(projectile)
            | DemoEvent::FlashExplode(projectile)
            | DemoEvent::SmokeStart(projectile) => projectile.thrower.iter().collect(),
            DemoEvent::PlayerFlashed(flashed) => [&flashed.player, &flashed.attacker]
                .into_iter()
                .flatten()
                .collect(),
            DemoEvent::BombPlanted(bomb)
            | DemoEvent::BombDefused(bomb)
            | DemoEvent::BombExploded(bomb) => bomb.player.iter().collect(),
            DemoEvent::PlayerConnect(handle) | DemoEvent::PlayerDisconnect(handle) => vec![handle],
            DemoEvent::PlayerTeamChange(change) => change.player.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct TimedEvent {
    pub tick: Tick,
    pub event: DemoEvent,
}

/// Unwraps a required actor, turning its absence into the non-fatal
/// [`FragActorErrorVariant::MissingActor`].
pub fn require_actor<'a, T>(
    actor: &'a Option<T>,
    event: &'static str,
    role: &'static str,
) -> FragActorResult<&'a T> {
    actor
        .as_ref()
        .ok_or_else(|| FragActorError::new(FragActorErrorVariant::MissingActor { event, role }))
}
