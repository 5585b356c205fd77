//! Correlates the event stream of a decoded 5v5 tactical shooter demo into
//! per-gunfight, per-grenade, per-round and per-match statistics.
//!
//! A [`MatchProcessor`] consumes [`TimedEvent`]s in order and produces a
//! [`MatchResult`], which [`deliver_match_result`] can hand to any
//! [`ResultSink`] in flattened batches.

pub mod aggregator;
mod config;
pub mod constants;
pub mod correlator;
mod equipment;
mod error;
mod event;
mod movement;
mod output;
mod processor;
mod records;
mod state;
mod util;

#[cfg(test)]
mod util_test;

pub use crate::aggregator::*;
pub use crate::config::*;
pub use crate::correlator::*;
pub use crate::equipment::*;
pub use crate::error::*;
pub use crate::event::*;
pub use crate::movement::*;
pub use crate::output::*;
pub use crate::processor::*;
pub use crate::records::*;
pub use crate::state::*;
pub use crate::util::*;

#[macro_use]
extern crate derive_new;
