//! The battle aggregate: roster, ready queue, graveyard, inventory, and
//! the current [`TurnState`].
//!
//! A [`Battle`] owns everything an encounter mutates. The host drives it
//! with [`Battle::tick`], supplying elapsed time and a [`DecisionSource`];
//! each tick runs exactly one state-machine step, so a frame loop calling
//! `tick` per frame gets real-time gauge fill with synchronous turn
//! resolution in between.
//!
//! Presentation reads the message log through [`Battle::drain_log`] and the
//! phase through [`Battle::state_tag`]; nothing in here renders.

use std::mem;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::ActionDef;
use crate::battler::{Battler, BattlerId, Side};
use crate::catalog::Catalog;
use crate::decision::DecisionSource;
use crate::rng::Dice;
use crate::state::{self, TurnState};

/// How an encounter ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The enemy side was emptied.
    Victory,
    /// The party was wiped.
    Defeat,
}

/// Balance knobs, grouped so hosts can load them from data instead of
/// recompiling.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Gauge value at which a battler's turn is queued.
    pub ready_threshold: f64,
    /// Global multiplier on gauge fill per second of elapsed time.
    pub atb_rate: f64,
    /// Lower bound of the damage variance roll, in percent.
    pub variance_min: u32,
    /// Upper bound of the damage variance roll, in percent.
    pub variance_max: u32,
    /// Chance of a critical hit, in percent.
    pub crit_chance: u32,
    /// Damage multiplier on a critical hit.
    pub crit_multiplier: f64,
    /// Limit gauge ceiling.
    pub limit_max: i32,
    /// Largest opening gauge value rolled at battle preparation.
    pub opening_gauge_max: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ready_threshold: 296.0,
            atb_rate: 5.0,
            variance_min: 85,
            variance_max: 115,
            crit_chance: 15,
            crit_multiplier: 2.0,
            limit_max: 100,
            opening_gauge_max: 15,
        }
    }
}

/// A consumable carried into the encounter.
#[derive(Debug, Clone)]
pub struct Item {
    /// Inventory label; must match the item action's name for consumption.
    pub name: String,
    /// The action performed when the item is used.
    pub action: Arc<ActionDef>,
    /// Uses remaining; the entry is dropped at zero.
    pub quantity: u32,
}

impl Item {
    /// Creates an inventory entry.
    #[must_use]
    pub fn new(name: impl Into<String>, action: Arc<ActionDef>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            action,
            quantity,
        }
    }
}

/// One running encounter.
pub struct Battle {
    /// Living participants, party first, in join order.
    pub(crate) roster: Vec<Battler>,
    /// Battlers with a queued turn, in gauge-crossing order, no duplicates.
    pub(crate) ready: Vec<BattlerId>,
    /// The fallen, in burial order.
    pub(crate) graveyard: Vec<Battler>,
    pub(crate) inventory: Vec<Item>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) dice: Box<dyn Dice>,
    pub(crate) tuning: Tuning,
    state: TurnState,
    catalog: Arc<dyn Catalog>,
    log: Vec<String>,
}

impl Battle {
    /// Assembles and prepares an encounter.
    ///
    /// Preparation clears leftover statuses and limit gauges, snapshots
    /// each battler's stat baseline, rebuilds command menus (wiring the
    /// Item command to `inventory`), and rolls every opening gauge so the
    /// first turns do not all land on the same tick.
    #[must_use]
    pub fn new(
        party: Vec<Battler>,
        enemies: Vec<Battler>,
        inventory: Vec<Item>,
        catalog: Arc<dyn Catalog>,
        mut dice: Box<dyn Dice>,
        tuning: Tuning,
    ) -> Self {
        let mut roster = party;
        roster.extend(enemies);

        let item_actions: Vec<Arc<ActionDef>> =
            inventory.iter().map(|i| Arc::clone(&i.action)).collect();
        let opening_range = tuning.opening_gauge_max as usize + 1;
        for battler in &mut roster {
            battler.prepare_for_battle();
            battler.atb = dice.pick(opening_range) as f64;
            if battler.controllable {
                if let Some(items) = battler.commands.iter_mut().find(|c| c.name == "Item") {
                    items.actions = item_actions.clone();
                }
            }
        }

        Self {
            roster,
            ready: Vec::new(),
            graveyard: Vec::new(),
            inventory,
            outcome: None,
            dice,
            tuning,
            state: TurnState::Waiting,
            catalog,
            log: Vec::new(),
        }
    }

    /// Runs one state-machine step against `dt` seconds of elapsed time.
    ///
    /// Terminal states are stable: ticking a concluded battle is a no-op
    /// beyond re-asserting the outcome.
    pub fn tick(&mut self, dt: f64, decisions: &mut dyn DecisionSource) {
        let current = mem::replace(&mut self.state, TurnState::Waiting);
        let from = current.tag();
        let next = state::advance(current, self, dt, decisions);
        if next.tag() != from {
            debug!(from, to = next.tag(), "turn transition");
        }
        self.state = next;
    }

    /// Tears the encounter down: survivors drop their statuses, return to
    /// baseline stats, and rest back to full hp/mp; every participant
    /// (fallen included) is returned in id order.
    #[must_use]
    pub fn conclude(mut self) -> Vec<Battler> {
        for battler in &mut self.roster {
            battler.statuses.clear();
            battler.reset_stats();
            battler.rest();
        }
        let mut everyone = self.roster;
        everyone.extend(self.graveyard);
        everyone.sort_by_key(Battler::id);
        everyone
    }

    /// Looks up a living battler.
    #[must_use]
    pub fn battler(&self, id: BattlerId) -> Option<&Battler> {
        self.roster.iter().find(|b| b.id() == id)
    }

    /// Looks up a living battler for mutation.
    pub fn battler_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        self.roster.iter_mut().find(|b| b.id() == id)
    }

    /// Living participants, party first.
    #[must_use]
    pub fn roster(&self) -> &[Battler] {
        &self.roster
    }

    /// The fallen, in burial order.
    #[must_use]
    pub fn graveyard(&self) -> &[Battler] {
        &self.graveyard
    }

    /// Battlers with a queued turn, in crossing order.
    #[must_use]
    pub fn ready_queue(&self) -> &[BattlerId] {
        &self.ready
    }

    /// Remaining consumables.
    #[must_use]
    pub fn inventory(&self) -> &[Item] {
        &self.inventory
    }

    /// Decrements one use of the named item; returns `false` when the
    /// inventory has none left.
    pub fn consume_item(&mut self, name: &str) -> bool {
        let Some(index) = self.inventory.iter().position(|i| i.name == name) else {
            return false;
        };
        let item = &mut self.inventory[index];
        item.quantity -= 1;
        if item.quantity == 0 {
            debug!(item = name, "inventory entry exhausted");
            self.inventory.remove(index);
        }
        true
    }

    /// The battle's balance knobs.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// The battle's randomness source.
    pub fn dice_mut(&mut self) -> &mut dyn Dice {
        self.dice.as_mut()
    }

    /// The definition catalog this encounter was assembled from.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Appends a presentation message.
    pub fn push_log(&mut self, line: String) {
        self.log.push(line);
    }

    /// Takes every pending presentation message, oldest first.
    pub fn drain_log(&mut self) -> Vec<String> {
        mem::take(&mut self.log)
    }

    /// The current phase.
    #[must_use]
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// Short tag for the current phase.
    #[must_use]
    pub fn state_tag(&self) -> &'static str {
        self.state.tag()
    }

    /// The battler whose turn is in flight, if any.
    #[must_use]
    pub fn active_actor(&self) -> Option<BattlerId> {
        self.state.actor()
    }

    /// How the encounter ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Whether a terminal state was reached.
    #[must_use]
    pub fn is_concluded(&self) -> bool {
        self.state.is_terminal()
    }

    /// Count of living battlers on one side.
    #[must_use]
    pub fn living_on(&self, side: Side) -> usize {
        self.roster
            .iter()
            .filter(|b| b.side == side && b.is_alive())
            .count()
    }

    #[cfg(test)]
    pub(crate) fn set_state_for_test(&mut self, state: TurnState) {
        self.state = state;
    }

    #[cfg(test)]
    pub(crate) fn ready_queue_mut_for_test(&mut self) -> &mut Vec<BattlerId> {
        &mut self.ready
    }

    #[cfg(test)]
    pub(crate) fn push_enemy_for_test(&mut self, name: &str) {
        let next = self
            .roster
            .iter()
            .chain(self.graveyard.iter())
            .map(|b| b.id().as_u32())
            .max()
            .map_or(0, |m| m + 1);
        let mut battler = Battler::from_catalog(
            BattlerId::new(next),
            name,
            100,
            Side::Enemy,
            false,
            self.catalog.as_ref(),
        );
        battler.prepare_for_battle();
        self.roster.push(battler);
    }
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("roster", &self.roster)
            .field("ready", &self.ready)
            .field("graveyard", &self.graveyard)
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}
