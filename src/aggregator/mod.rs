//! Deferred stages: round finalization, run when the next round starts or the
//! match ends, and match finalization, run once at the end.

pub mod clutch;
pub mod economy;
pub mod grenade_rating;
pub mod impact;
pub mod match_stats;
pub mod round;
pub mod trade;

pub use self::clutch::*;
pub use self::economy::*;
pub use self::grenade_rating::*;
pub use self::impact::*;
pub use self::match_stats::*;
pub use self::round::*;
pub use self::trade::*;
