//! # Emberfall Core
//!
//! Turn-resolution engine for Emberfall's active-time battles.
//!
//! The crate owns the rules of an encounter and nothing else: gauge-based
//! turn scheduling, a tagged-union turn state machine, action and status
//! resolution, and the combat formulas. Rendering, input, and persistence
//! live in the host; they drive a [`Battle`] through [`Battle::tick`] and
//! read back its message log.
//!
//! ## Architecture
//!
//! - **Battlers**: participants built from catalog definitions, holding
//!   stats, gauges, statuses, and a turn menu
//! - **Catalog**: typed definition records for battlers, actions, and
//!   statuses, looked up by name with logged fallbacks
//! - **State machine**: one [`TurnState`] union and a single exhaustive
//!   advance step; decisions arrive through a [`DecisionSource`]
//! - **Dice**: every random draw goes through the injectable [`Dice`]
//!   trait, so a seed makes a whole encounter reproducible
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emberfall_core::{Battle, Battler, SeededDice, Tuning};
//!
//! let mut battle = Battle::new(party, enemies, items, catalog,
//!     Box::new(SeededDice::new(0xE14)), Tuning::default());
//! battle.tick(frame_seconds, &mut decisions);
//! for line in battle.drain_log() {
//!     println!("{line}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod battle;
pub mod battler;
pub mod catalog;
pub mod decision;
pub mod error;
pub mod formula;
pub mod rng;
pub mod state;
pub mod status;

pub use action::{ActionDef, ActionKind, Targeting};
pub use battle::{Battle, Item, Outcome, Tuning};
pub use battler::{Affinities, Battler, BattlerId, Command, Element, Side, Stat, StatBlock};
pub use catalog::{BattlerDef, Catalog, StaticCatalog};
pub use decision::{BehaviorPolicy, Decision, DecisionSource, RandomAttack, ScriptedDecisions};
pub use error::BattleError;
pub use rng::{Dice, SeededDice};
pub use state::TurnState;
pub use status::{Status, StatusDef};

#[cfg(test)]
mod tests;
