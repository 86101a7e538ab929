//! Battle factories and stub dice shared across the encounter tests.

use std::sync::Arc;

use crate::battle::{Battle, Item, Tuning};
use crate::battler::{Battler, BattlerId, Side};
use crate::catalog::{Catalog, StaticCatalog};
use crate::decision::{Decision, ScriptedDecisions};
use crate::rng::{Dice, SeededDice};

/// Dice answering every roll with fixed values.
///
/// The default (`flat`) removes variance and criticals so damage equals
/// the bare formula output.
pub struct FixedDice {
    variance: f64,
    percent: u32,
    pick: usize,
}

impl FixedDice {
    /// Midpoint variance, no criticals, first pick.
    pub fn flat() -> Self {
        Self {
            variance: 1.0,
            percent: 100,
            pick: 0,
        }
    }

    /// Like `flat`, but every pick answers `pick` (clamped to range).
    pub fn picking(pick: usize) -> Self {
        Self {
            pick,
            ..Self::flat()
        }
    }

    /// Like `flat`, but every percent roll is a guaranteed critical.
    pub fn critting() -> Self {
        Self {
            percent: 1,
            ..Self::flat()
        }
    }
}

impl Dice for FixedDice {
    fn roll_variance(&mut self, _lo: u32, _hi: u32) -> f64 {
        self.variance
    }

    fn roll_percent(&mut self) -> u32 {
        self.percent
    }

    fn pick(&mut self, len: usize) -> usize {
        self.pick.min(len.saturating_sub(1))
    }
}

/// Id of the controllable Hero in the factory battles.
pub const HERO: BattlerId = BattlerId::new(0);
/// Id of the autonomous Slime in the factory battles.
pub const SLIME: BattlerId = BattlerId::new(1);

/// A 1v1 encounter from the reference fixture: controllable Hero against
/// an autonomous Slime, one Potion in the bag, default tuning.
pub fn duel_battle(dice: impl Dice + 'static) -> Battle {
    let catalog = Arc::new(StaticCatalog::reference_fixture());
    let hero = Battler::from_catalog(HERO, "Hero", 100, Side::Party, true, catalog.as_ref());
    let slime = Battler::from_catalog(SLIME, "Slime", 100, Side::Enemy, false, catalog.as_ref());
    let potion = catalog.action("Potion").expect("fixture potion");
    Battle::new(
        vec![hero],
        vec![slime],
        vec![Item::new("Potion", potion, 1)],
        catalog,
        Box::new(dice),
        Tuning::default(),
    )
}

/// A seeded duel for determinism tests.
pub fn seeded_duel(seed: u64) -> Battle {
    duel_battle(SeededDice::new(seed))
}

/// A 2v1 skirmish: two controllable heroes (ids 0 and 1) against one
/// autonomous Slime (id 2), empty bag, default tuning.
pub fn skirmish_battle(dice: impl Dice + 'static) -> Battle {
    let catalog = Arc::new(StaticCatalog::reference_fixture());
    let heroes = vec![
        Battler::from_catalog(BattlerId::new(0), "Hero", 100, Side::Party, true, catalog.as_ref()),
        Battler::from_catalog(BattlerId::new(1), "Hero", 100, Side::Party, true, catalog.as_ref()),
    ];
    let slime = Battler::from_catalog(
        BattlerId::new(2),
        "Slime",
        100,
        Side::Enemy,
        false,
        catalog.as_ref(),
    );
    Battle::new(
        heroes,
        vec![slime],
        Vec::new(),
        catalog,
        Box::new(dice),
        Tuning::default(),
    )
}

/// Queues `count` basic-attack decisions against the Slime.
pub fn script_attacks(battle: &Battle, count: usize) -> ScriptedDecisions {
    let attack = battle.catalog().action("Attack").expect("fixture attack");
    let mut decisions = ScriptedDecisions::new();
    for _ in 0..count {
        decisions.push_action(Decision::new(Arc::clone(&attack), vec![SLIME]));
    }
    decisions
}

/// Ticks the battle at a fixed 100ms step until it concludes, collecting
/// every log line along the way. Panics after `max_ticks` steps.
pub fn run_to_conclusion(
    battle: &mut Battle,
    decisions: &mut ScriptedDecisions,
    max_ticks: usize,
) -> Vec<String> {
    let mut transcript = Vec::new();
    for _ in 0..max_ticks {
        battle.tick(0.1, decisions);
        transcript.extend(battle.drain_log());
        if battle.is_concluded() {
            return transcript;
        }
    }
    panic!("battle did not conclude within {max_ticks} ticks");
}
