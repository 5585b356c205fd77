//! Live correlation stage: handlers that fold individual decoder events into
//! gunfight, damage and grenade records as they arrive.

pub mod damage;
pub mod flash;
pub mod grenade;
pub mod gunfight;

pub use self::damage::*;
pub use self::flash::*;
pub use self::grenade::*;
pub use self::gunfight::*;

use crate::*;
use std::collections::{HashMap, HashSet};

/// Everything known about a grenade at the moment it left the thrower's hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowSnapshot {
    pub thrower_id: PlayerId,
    pub thrower_name: String,
    pub thrower_team: Option<TeamLabel>,
    pub thrower_side: Option<Side>,
    pub grenade: GrenadeKind,
    pub round: u32,
    pub tick: Tick,
    pub round_time: f64,
    pub position: Vector3,
    pub aim: ViewAngles,
    pub movement: String,
}

/// Identity-keyed tables used to correlate events that arrive separately.
/// All of them are scoped to the current round.
#[derive(Debug, Default)]
pub struct CorrelationTables {
    pub flash_effects: HashMap<EntityId, FlashEffect>,
    pub pending_flashed: Vec<PendingFlashed>,
    /// Throws seen on weapon fire, waiting for their projectile entity.
    pub pending_throws: HashMap<(PlayerId, GrenadeKind), ThrowSnapshot>,
    pub throws: HashMap<EntityId, ThrowSnapshot>,
    /// Index into `MatchState::grenades` of each record built this round.
    pub grenade_records: HashMap<EntityId, usize>,
    pub detonations: HashSet<(PlayerId, Tick)>,
}

impl CorrelationTables {
    /// Drains buffered flash notifications whose detonation never arrived.
    pub fn take_unmatched_flashes(&mut self) -> Vec<FragActorErrorVariant> {
        self.pending_flashed
            .drain(..)
            .map(|pending| FragActorErrorVariant::UnmatchedFlash {
                round: pending.round,
                tick: pending.tick,
                thrower: pending.thrower_id,
            })
            .collect()
    }

    pub fn clear_round(&mut self) {
        self.pending_flashed.clear();
        if !self.throws.is_empty() {
            log::debug!(
                "Dropping {} grenade throws that never detonated",
                self.throws.len()
            );
        }
        self.flash_effects.clear();
        self.pending_throws.clear();
        self.throws.clear();
        self.grenade_records.clear();
        self.detonations.clear();
    }
}

/// Whether two players are teammates: frozen labels first, current sides when
/// either player has no label.
pub fn same_team(state: &MatchState, a: &PlayerId, b: &PlayerId) -> Option<bool> {
    match (state.team_for_player(a), state.team_for_player(b)) {
        (Some(left), Some(right)) => Some(left == right),
        _ => match (
            state.current_side_for_player(a),
            state.current_side_for_player(b),
        ) {
            (Some(left), Some(right)) => Some(left == right),
            _ => None,
        },
    }
}

pub(crate) fn require_live_round(
    state: &MatchState,
    event: &'static str,
) -> FragActorResult<u32> {
    if state.round.is_open() {
        Ok(state.round.number)
    } else {
        FragActorError::new_result(FragActorErrorVariant::NoRoundInProgress { event })
    }
}
