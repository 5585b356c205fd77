use crate::*;
use std::backtrace::Backtrace;
use thiserror::Error;

/// How much damage an error does to the enclosing operation.
///
/// [`ErrorSeverity::Critical`] and [`ErrorSeverity::Error`] abort whatever
/// produced them. [`ErrorSeverity::Warning`] and [`ErrorSeverity::Info`]
/// only cause the offending event to be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// [`FragActorErrorVariant`] is an enumeration of all the specific error
/// variants that can occur while correlating demo events into match
/// statistics. Validation failures on individual events (missing actors,
/// negative damage, unmatched grenades) sit next to the terminal failures
/// that end a parse (bad configuration, reuse of a finalized match,
/// serialization and delivery problems).
#[derive(Error, Debug, Clone)]
pub enum FragActorErrorVariant {
    #[error("{event} event is missing its {role}")]
    MissingActor {
        event: &'static str,
        role: &'static str,
    },

    #[error("Negative damage {damage} from {attacker:?} to {victim}")]
    NegativeDamage {
        attacker: Option<PlayerId>,
        victim: PlayerId,
        damage: i32,
    },

    #[error("Player {player_id} killed themselves")]
    SelfKill { player_id: PlayerId },

    #[error("{event} arrived while no round was in progress")]
    NoRoundInProgress { event: &'static str },

    #[error("No throw snapshot stored for projectile {entity_id}")]
    MissingThrowSnapshot { entity_id: EntityId },

    #[error("No flash effect for round {round}, tick {tick}, thrower {thrower}")]
    UnmatchedFlash {
        round: u32,
        tick: Tick,
        thrower: PlayerId,
    },

    #[error("Projectile {entity_id} carries non-grenade weapon {weapon:?}")]
    UnknownGrenade { entity_id: EntityId, weapon: Weapon },

    #[error("Player {player_id} is not registered")]
    UnregisteredPlayer { player_id: PlayerId },

    #[error("Match has already been finalized")]
    MatchAlreadyFinalized,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid demo header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("Delivering {collection} batch {batch_index} failed {attempts} times: {reason}")]
    DeliveryFailed {
        collection: String,
        batch_index: usize,
        attempts: u32,
        reason: String,
    },

    #[error("Progress reporting halted after a terminal failure")]
    ProgressHalted,
}

impl FragActorErrorVariant {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingActor { .. }
            | Self::NegativeDamage { .. }
            | Self::SelfKill { .. }
            | Self::MissingThrowSnapshot { .. }
            | Self::UnknownGrenade { .. } => ErrorSeverity::Warning,
            Self::NoRoundInProgress { .. }
            | Self::UnmatchedFlash { .. }
            | Self::UnregisteredPlayer { .. } => ErrorSeverity::Info,
            Self::Serialization { .. }
            | Self::DeliveryFailed { .. }
            | Self::ProgressHalted => ErrorSeverity::Error,
            Self::MatchAlreadyFinalized
            | Self::InvalidConfig { .. }
            | Self::InvalidHeader { .. } => ErrorSeverity::Critical,
        }
    }
}

/// [`FragActorError`] struct provides an error variant
/// [`FragActorErrorVariant`] along with its backtrace.
#[derive(Debug)]
pub struct FragActorError {
    pub backtrace: Backtrace,
    pub variant: FragActorErrorVariant,
}

impl FragActorError {
    pub fn new(variant: FragActorErrorVariant) -> Self {
        Self {
            backtrace: Backtrace::capture(),
            variant,
        }
    }

    pub fn new_result<T>(variant: FragActorErrorVariant) -> Result<T, Self> {
        Err(Self::new(variant))
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.variant.severity()
    }

    /// Fatal errors end the enclosing operation; everything else only skips
    /// the event that caused it.
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::Error
    }
}

impl std::fmt::Display for FragActorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.variant)
    }
}

impl std::error::Error for FragActorError {}

impl From<FragActorErrorVariant> for FragActorError {
    fn from(variant: FragActorErrorVariant) -> Self {
        Self::new(variant)
    }
}

impl From<serde_json::Error> for FragActorError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(FragActorErrorVariant::Serialization {
            message: error.to_string(),
        })
    }
}

#[allow(clippy::result_large_err)]
pub type FragActorResult<T> = Result<T, FragActorError>;
