//! Battler types: participants, stat tables, and elemental affinities.
//!
//! This module provides the runtime representation of a combat participant:
//! - [`BattlerId`]: Unique identifier, ordered for deterministic iteration
//! - [`Side`]: Party/enemy allegiance used for targeting and outcome checks
//! - [`Stat`] and [`StatBlock`]: An explicit stat enumeration with a fixed
//!   table behind it, so status modifiers address stats by identifier
//!   rather than by name
//! - [`Battler`]: The mutable participant, carrying its pre-battle baseline
//!
//! # Ownership
//!
//! A `Battler` is owned by exactly one of the battle's roster or graveyard
//! at any time; burial moves the value rather than copying it.
//!
//! # Stat discipline
//!
//! `stats` is always derived from `baseline` multiplied by the currently
//! active status modifiers. The turn machine resets `stats` to `baseline`
//! at the start of every turn before statuses re-apply, so modifiers never
//! compound across turns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::ActionDef;
use crate::catalog::{self, Catalog};
use crate::decision::{BehaviorPolicy, RandomAttack};
use crate::status::Status;

/// Unique identifier for a battler within one encounter.
///
/// Assigned densely at battle setup (party first, then enemies). Ordered by
/// numeric value so collections of battlers iterate deterministically.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BattlerId(u32);

impl BattlerId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BattlerId({})", self.0)
    }
}

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the encounter a battler fights for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player's party.
    Party,
    /// The opposing side.
    Enemy,
}

impl Side {
    /// Returns the opposing side.
    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Party => Self::Enemy,
            Self::Enemy => Self::Party,
        }
    }
}

/// The combat stats a status modifier can address.
///
/// An explicit identifier plus the fixed-size [`StatBlock`] table replaces
/// by-name attribute access: a modifier for `Stat::Attack` indexes straight
/// into the table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Physical attack power.
    Attack,
    /// Physical damage reduction.
    Defense,
    /// Magical attack power (also drives healing).
    Magic,
    /// Magical damage reduction.
    MagicDefense,
    /// Readiness gauge fill rate.
    Speed,
}

impl Stat {
    /// All stats, in table order.
    pub const ALL: [Self; 5] = [
        Self::Attack,
        Self::Defense,
        Self::Magic,
        Self::MagicDefense,
        Self::Speed,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Attack => 0,
            Self::Defense => 1,
            Self::Magic => 2,
            Self::MagicDefense => 3,
            Self::Speed => 4,
        }
    }
}

/// Fixed table of the five combat stats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock([i32; 5]);

impl StatBlock {
    /// Builds a block from individual values.
    #[must_use]
    pub const fn new(attack: i32, defense: i32, magic: i32, magic_defense: i32, speed: i32) -> Self {
        Self([attack, defense, magic, magic_defense, speed])
    }

    /// Reads one stat.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> i32 {
        self.0[stat.index()]
    }

    /// Writes one stat.
    pub fn set(&mut self, stat: Stat, value: i32) {
        self.0[stat.index()] = value;
    }

    /// Multiplies one stat by `factor`, truncating toward zero.
    ///
    /// This is the only arithmetic status modifiers perform, so truncation
    /// behavior lives here rather than in the status engine.
    pub fn apply_multiplier(&mut self, stat: Stat, factor: f64) {
        let scaled = (f64::from(self.get(stat)) * factor).trunc();
        #[allow(clippy::cast_possible_truncation)]
        self.set(stat, scaled as i32);
    }
}

/// The elements an action can carry and a battler can resist or favor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Fire.
    Fire,
    /// Ice.
    Ice,
    /// Lightning.
    Lightning,
    /// Water.
    Water,
    /// Wind.
    Wind,
    /// Earth.
    Earth,
    /// Unaligned; every battler's affinity to it defaults to 1.
    Neutral,
}

impl Element {
    /// All elements, in table order.
    pub const ALL: [Self; 7] = [
        Self::Fire,
        Self::Ice,
        Self::Lightning,
        Self::Water,
        Self::Wind,
        Self::Earth,
        Self::Neutral,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Fire => 0,
            Self::Ice => 1,
            Self::Lightning => 2,
            Self::Water => 3,
            Self::Wind => 4,
            Self::Earth => 5,
            Self::Neutral => 6,
        }
    }
}

/// Per-element damage multipliers, defaulting to 1.0 everywhere.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affinities([f64; 7]);

impl Default for Affinities {
    fn default() -> Self {
        Self([1.0; 7])
    }
}

impl Affinities {
    /// Returns the multiplier for an element (1.0 when never set).
    #[must_use]
    pub const fn get(&self, element: Element) -> f64 {
        self.0[element.index()]
    }

    /// Sets the multiplier for an element.
    pub fn set(&mut self, element: Element, multiplier: f64) {
        self.0[element.index()] = multiplier;
    }
}

/// A named group of actions offered on a battler's turn.
///
/// `is_single` commands (like the basic Attack) hold exactly one action and
/// a front end executes it directly instead of opening a sub-menu.
#[derive(Debug, Clone)]
pub struct Command {
    /// Menu label.
    pub name: String,
    /// The actions this command groups, shared with the catalog.
    pub actions: Vec<Arc<ActionDef>>,
    /// Whether selecting the command immediately executes its lone action.
    pub is_single: bool,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub fn new(name: impl Into<String>, actions: Vec<Arc<ActionDef>>, is_single: bool) -> Self {
        Self {
            name: name.into(),
            actions,
            is_single,
        }
    }
}

/// A combat participant.
///
/// Created once at encounter setup from its catalog definition and mutated
/// for the whole encounter. The constructor applies the level curve
/// (`level^2 / 10000` of the definition's base values, truncated; speed is
/// exempt) and resolves ability/spell names into shared [`ActionDef`]s.
pub struct Battler {
    id: BattlerId,
    /// Display name, also the catalog key this battler was built from.
    pub name: String,
    /// Character level driving the stat curve.
    pub level: u32,
    /// Allegiance.
    pub side: Side,
    /// Whether a decision source drives this battler's turns (otherwise the
    /// behavior policy does).
    pub controllable: bool,
    /// Current hit points, `0..=hp_max`.
    pub hp: i32,
    /// Hit point ceiling.
    pub hp_max: i32,
    /// Current magic points, `0..=mp_max`.
    pub mp: i32,
    /// Magic point ceiling.
    pub mp_max: i32,
    /// Current stats: baseline times active status modifiers.
    pub stats: StatBlock,
    /// Pre-battle snapshot the turn machine resets to each turn.
    pub baseline: StatBlock,
    /// Per-element damage multipliers.
    pub affinities: Affinities,
    /// Readiness gauge; crossing the threshold queues a turn.
    pub atb: f64,
    /// Special-resource gauge, `0..=limit_max`.
    pub limit: i32,
    /// Active statuses in application order.
    pub statuses: Vec<Status>,
    /// Turn menu, rebuilt at battle preparation.
    pub commands: Vec<Command>,
    /// The always-available basic attack, also what the default AI swings.
    pub basic_attack: Arc<ActionDef>,
    /// Turn policy for autonomous battlers.
    pub behavior: Box<dyn BehaviorPolicy>,
    abilities: Vec<Arc<ActionDef>>,
    spells: Vec<Arc<ActionDef>>,
    ability_command_name: String,
}

impl fmt::Debug for Battler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battler")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("side", &self.side)
            .field("hp", &self.hp)
            .field("hp_max", &self.hp_max)
            .field("mp", &self.mp)
            .field("atb", &self.atb)
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Battler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Battler {
    /// Builds a battler from its catalog definition.
    ///
    /// A missing definition degrades to the catalog default record with a
    /// warning; the encounter proceeds.
    #[must_use]
    pub fn from_catalog(
        id: BattlerId,
        name: &str,
        level: u32,
        side: Side,
        controllable: bool,
        catalog: &dyn Catalog,
    ) -> Self {
        let def = catalog::battler_or_default(catalog, name);

        // Base values in the catalog are tuned for level 100, where the
        // curve evaluates to exactly 1.0.
        let modifier = f64::from(level * level) / 10_000.0;
        let scale = |base: i32| {
            #[allow(clippy::cast_possible_truncation)]
            let scaled = (f64::from(base) * modifier).trunc() as i32;
            scaled
        };

        let hp_max = scale(def.hp);
        let mp_max = scale(def.mp);
        let stats = StatBlock::new(
            scale(def.attack),
            scale(def.defense),
            scale(def.magic),
            scale(def.magic_defense),
            // Speed sits outside the level curve.
            def.speed,
        );

        let mut affinities = Affinities::default();
        for (element, multiplier) in &def.affinities {
            affinities.set(*element, *multiplier);
        }

        let resolve = |names: &[String]| {
            names
                .iter()
                .map(|n| catalog::action_or_default(catalog, n))
                .collect::<Vec<_>>()
        };

        Self {
            id,
            name: name.to_owned(),
            level,
            side,
            controllable,
            hp: hp_max,
            hp_max,
            mp: mp_max,
            mp_max,
            stats,
            baseline: stats,
            affinities,
            atb: 0.0,
            limit: 0,
            statuses: Vec::new(),
            commands: Vec::new(),
            basic_attack: catalog::action_or_default(catalog, "Attack"),
            behavior: Box::new(RandomAttack),
            abilities: resolve(&def.abilities),
            spells: resolve(&def.spells),
            ability_command_name: def.ability_command,
        }
    }

    /// Returns this battler's id.
    #[must_use]
    pub const fn id(&self) -> BattlerId {
        self.id
    }

    /// Whether the battler is still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Puts the battler into fighting shape: clears the limit gauge and any
    /// leftover statuses, rebuilds the command menu, and snapshots the
    /// pre-battle stat baseline.
    pub fn prepare_for_battle(&mut self) {
        self.limit = 0;
        self.statuses.clear();
        self.commands = vec![
            Command::new("Attack", vec![Arc::clone(&self.basic_attack)], true),
            Command::new(self.ability_command_name.clone(), self.abilities.clone(), false),
            Command::new("Magic", self.spells.clone(), false),
            // Populated by the host from the battle inventory.
            Command::new("Item", Vec::new(), false),
        ];
        self.baseline = self.stats;
    }

    /// Resets current stats to the pre-battle baseline, undoing every
    /// status modifier applied since.
    pub fn reset_stats(&mut self) {
        self.stats = self.baseline;
    }

    /// Applies every active status's stat modifiers against the current
    /// stats. Call [`Self::reset_stats`] first so modifiers do not compound.
    pub fn run_status_effects(&mut self) {
        let stats = &mut self.stats;
        for status in &self.statuses {
            status.execute(stats);
        }
    }

    /// Removes up to `amount` hit points and returns the amount actually
    /// lost; hp never drops below zero.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let dealt = amount.min(self.hp).max(0);
        self.hp -= dealt;
        dealt
    }

    /// Restores up to `amount` hit points and returns the amount actually
    /// gained; hp never exceeds `hp_max`.
    pub fn restore_hp(&mut self, amount: i32) -> i32 {
        let gained = amount.min(self.hp_max - self.hp).max(0);
        self.hp += gained;
        gained
    }

    /// Restores hp and mp to full (between encounters).
    pub fn rest(&mut self) {
        self.hp = self.hp_max;
        self.mp = self.mp_max;
    }
}
