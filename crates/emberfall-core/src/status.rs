//! Timed, stacking stat modifiers attached to a battler.
//!
//! A [`Status`] instance is owned exclusively by the battler carrying it and
//! moves through an implicit state machine over `(stack, duration)`:
//!
//! - `execute` re-applies the configured multipliers each turn, after the
//!   owner's stats were reset to baseline, so effects never compound
//! - `reduce_duration` ticks down once per owner turn at turn end; an
//!   expiring duration drops one stack, and a surviving stack refreshes the
//!   duration at reduced overall lifetime
//! - `reapply` strengthens an already-present status without ever
//!   shortening it
//!
//! Removal is the owner's job: a status whose stack reaches 0 is filtered
//! out at the end of the owning battler's turn, never mid-turn.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battler::{Stat, StatBlock};

/// Immutable catalog definition a status instance is seeded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDef {
    /// Catalog key and display name.
    pub name: String,
    /// Stacks granted on first application.
    #[serde(default = "one")]
    pub starting_stacks: u32,
    /// Stack ceiling for reapplication.
    #[serde(default = "one")]
    pub max_stacks: u32,
    /// Duration granted per application (and per stack consumed).
    #[serde(default = "three")]
    pub applied_duration: u32,
    /// Duration ceiling for reapplication.
    #[serde(default = "three")]
    pub max_duration: u32,
    /// Stat multipliers applied on every execution.
    #[serde(default)]
    pub modifiers: Vec<(Stat, f64)>,
}

const fn one() -> u32 {
    1
}

const fn three() -> u32 {
    3
}

impl StatusDef {
    /// The documented fallback for a catalog miss: a single-stack,
    /// three-tick status with no modifiers.
    #[must_use]
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            starting_stacks: 1,
            max_stacks: 1,
            applied_duration: 3,
            max_duration: 3,
            modifiers: Vec::new(),
        }
    }
}

/// A live status effect on one battler.
///
/// Invariants while attached: `1 <= stack <= max_stacks` and
/// `0 <= duration <= max_duration`. A stack of 0 marks the status for
/// removal at the owner's end of turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Name, shared with the definition it was seeded from.
    pub name: String,
    /// Current repetition count.
    pub stack: u32,
    /// Ticks remaining on the current stack.
    pub duration: u32,
    starting_stacks: u32,
    max_stacks: u32,
    applied_duration: u32,
    max_duration: u32,
    modifiers: Vec<(Stat, f64)>,
}

impl Status {
    /// Instantiates a status from its definition.
    #[must_use]
    pub fn from_def(def: &StatusDef) -> Self {
        Self {
            name: def.name.clone(),
            stack: def.starting_stacks.clamp(1, def.max_stacks),
            duration: def.applied_duration.min(def.max_duration),
            starting_stacks: def.starting_stacks,
            max_stacks: def.max_stacks,
            applied_duration: def.applied_duration,
            max_duration: def.max_duration,
            modifiers: def.modifiers.clone(),
        }
    }

    /// Applies the configured multipliers to `stats`.
    ///
    /// Called once per owner turn right after the baseline reset, so the
    /// multiplication always starts from clean values.
    pub fn execute(&self, stats: &mut StatBlock) {
        for &(stat, factor) in &self.modifiers {
            stats.apply_multiplier(stat, factor);
        }
    }

    /// Ticks the status down by one at the owner's end of turn.
    ///
    /// An expiring duration consumes one stack; a surviving stack refreshes
    /// the duration to `applied_duration`. Returns `true` when the last
    /// stack expired and the status should be removed (the extension point
    /// for on-end effects).
    pub fn reduce_duration(&mut self) -> bool {
        self.duration = self.duration.saturating_sub(1);
        if self.duration > 0 {
            return false;
        }
        self.stack = self.stack.saturating_sub(1);
        if self.stack > 0 {
            self.duration = self.applied_duration;
            return false;
        }
        debug!(status = %self.name, "status expired");
        true
    }

    /// Re-applies an already-present status: one more stack and more
    /// duration, both capped, never less than before.
    pub fn reapply(&mut self) {
        self.duration = (self.duration + self.applied_duration).min(self.max_duration);
        self.stack = (self.stack + 1).min(self.max_stacks);
    }

    /// Extends the duration by `ticks`, capped at the ceiling. Used to
    /// compensate self-applied statuses for the same-turn end-of-turn
    /// decrement.
    pub fn extend_duration(&mut self, ticks: u32) {
        self.duration = (self.duration + ticks).min(self.max_duration);
    }

    /// Consumes `stacks` as an action cost, saturating at zero. A drained
    /// status stays attached until the owner's end of turn.
    pub fn consume_stacks(&mut self, stacks: u32) {
        self.stack = self.stack.saturating_sub(stacks);
    }

    /// Whether the last stack is gone and the status awaits removal.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.stack == 0
    }

    /// Duration granted per application.
    #[must_use]
    pub const fn applied_duration(&self) -> u32 {
        self.applied_duration
    }

    /// Duration ceiling.
    #[must_use]
    pub const fn max_duration(&self) -> u32 {
        self.max_duration
    }

    /// Stack ceiling.
    #[must_use]
    pub const fn max_stacks(&self) -> u32 {
        self.max_stacks
    }
}
