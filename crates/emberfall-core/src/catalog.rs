//! The definitions provider consumed at the engine boundary.
//!
//! The engine never parses data files: a [`Catalog`] hands it fully-typed,
//! already-parsed records for battlers, actions, and statuses. How those
//! records were loaded (CSV, JSON, hard-coded) is the host's business.
//!
//! # Lookup misses
//!
//! A missing name must not crash an encounter. The `*_or_default` helpers
//! substitute the documented fallback record and emit a `tracing` warning
//! on the non-fatal degradation channel, so hosts can spot broken content
//! without the battle stalling.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::ActionDef;
use crate::battler::Element;
use crate::status::StatusDef;

/// Immutable definition record for a battler.
///
/// Base values are tuned for level 100; the battler constructor applies the
/// `level^2 / 10000` curve (speed exempt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlerDef {
    /// Catalog key and display name.
    pub name: String,
    /// Hit point ceiling at level 100.
    pub hp: i32,
    /// Magic point ceiling at level 100.
    pub mp: i32,
    /// Physical attack at level 100.
    pub attack: i32,
    /// Physical defense at level 100.
    pub defense: i32,
    /// Magic attack at level 100.
    pub magic: i32,
    /// Magic defense at level 100.
    pub magic_defense: i32,
    /// Gauge fill rate; not level-scaled.
    pub speed: i32,
    /// Non-default elemental multipliers.
    #[serde(default)]
    pub affinities: Vec<(Element, f64)>,
    /// Label of the battler's signature command.
    #[serde(default = "default_ability_command")]
    pub ability_command: String,
    /// Action names grouped under the signature command.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Action names grouped under the Magic command.
    #[serde(default)]
    pub spells: Vec<String>,
}

fn default_ability_command() -> String {
    "Ability".to_owned()
}

impl BattlerDef {
    /// The documented fallback for a catalog miss: a nondescript fighter
    /// with flat stats, no affinities, and no learned actions.
    #[must_use]
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            hp: 1000,
            mp: 100,
            attack: 100,
            defense: 100,
            magic: 100,
            magic_defense: 100,
            speed: 30,
            affinities: Vec::new(),
            ability_command: default_ability_command(),
            abilities: Vec::new(),
            spells: Vec::new(),
        }
    }
}

/// Resolves names into definition records.
///
/// Implementations return `None` for unknown names; the engine degrades to
/// defaults through the `*_or_default` helpers rather than failing.
pub trait Catalog: Send + Sync {
    /// Looks up a battler definition.
    fn battler(&self, name: &str) -> Option<BattlerDef>;
    /// Looks up an action definition, shared by reference.
    fn action(&self, name: &str) -> Option<Arc<ActionDef>>;
    /// Looks up a status definition.
    fn status(&self, name: &str) -> Option<StatusDef>;
}

/// Looks up a battler, degrading to [`BattlerDef::fallback`] with a warning.
#[must_use]
pub fn battler_or_default(catalog: &dyn Catalog, name: &str) -> BattlerDef {
    catalog.battler(name).unwrap_or_else(|| {
        warn!(battler = name, "battler not defined, using fallback record");
        BattlerDef::fallback(name)
    })
}

/// Looks up an action, degrading to [`ActionDef::fallback`] with a warning.
#[must_use]
pub fn action_or_default(catalog: &dyn Catalog, name: &str) -> Arc<ActionDef> {
    catalog.action(name).unwrap_or_else(|| {
        warn!(action = name, "action not defined, using fallback record");
        Arc::new(ActionDef::fallback(name))
    })
}

/// Looks up a status, degrading to [`StatusDef::fallback`] with a warning.
#[must_use]
pub fn status_or_default(catalog: &dyn Catalog, name: &str) -> StatusDef {
    catalog.status(name).unwrap_or_else(|| {
        warn!(status = name, "status not defined, using fallback record");
        StatusDef::fallback(name)
    })
}

/// In-memory [`Catalog`] built from record lists.
///
/// Suitable for hosts that deserialize their content into records up front,
/// and for tests.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    battlers: HashMap<String, BattlerDef>,
    actions: HashMap<String, Arc<ActionDef>>,
    statuses: HashMap<String, StatusDef>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from record lists, keyed by each record's name.
    #[must_use]
    pub fn from_records(
        battlers: Vec<BattlerDef>,
        actions: Vec<ActionDef>,
        statuses: Vec<StatusDef>,
    ) -> Self {
        let mut catalog = Self::new();
        for def in battlers {
            catalog.insert_battler(def);
        }
        for def in actions {
            catalog.insert_action(def);
        }
        for def in statuses {
            catalog.insert_status(def);
        }
        catalog
    }

    /// Adds or replaces a battler record.
    pub fn insert_battler(&mut self, def: BattlerDef) {
        self.battlers.insert(def.name.clone(), def);
    }

    /// Adds or replaces an action record.
    pub fn insert_action(&mut self, def: ActionDef) {
        self.actions.insert(def.name.clone(), Arc::new(def));
    }

    /// Adds or replaces a status record.
    pub fn insert_status(&mut self, def: StatusDef) {
        self.statuses.insert(def.name.clone(), def);
    }
}

impl Catalog for StaticCatalog {
    fn battler(&self, name: &str) -> Option<BattlerDef> {
        self.battlers.get(name).cloned()
    }

    fn action(&self, name: &str) -> Option<Arc<ActionDef>> {
        self.actions.get(name).map(Arc::clone)
    }

    fn status(&self, name: &str) -> Option<StatusDef> {
        self.statuses.get(name).cloned()
    }
}

#[cfg(test)]
impl StaticCatalog {
    /// The catalog the test suites share: a hero/slime pairing exercising
    /// every action kind and the stacking status rules.
    pub(crate) fn reference_fixture() -> Self {
        use crate::action::{ActionKind, Targeting};
        use crate::battler::Stat;

        let battlers = vec![
            BattlerDef {
                name: "Hero".into(),
                hp: 1000,
                mp: 100,
                attack: 100,
                defense: 100,
                magic: 100,
                magic_defense: 100,
                speed: 30,
                affinities: Vec::new(),
                ability_command: "Focus".into(),
                abilities: vec!["Focus".into(), "Focused Strike".into()],
                spells: vec!["Fire".into(), "Cure".into()],
            },
            BattlerDef {
                name: "Slime".into(),
                hp: 800,
                mp: 20,
                attack: 100,
                defense: 100,
                magic: 40,
                magic_defense: 60,
                speed: 20,
                affinities: vec![(Element::Fire, 2.0)],
                ability_command: "Ooze".into(),
                abilities: Vec::new(),
                spells: Vec::new(),
            },
        ];

        let actions = vec![
            ActionDef {
                name: "Attack".into(),
                ..ActionDef::fallback("Attack")
            },
            ActionDef {
                name: "Fire".into(),
                kind: ActionKind::DamageSingle,
                potency: 120,
                physical: false,
                element: Element::Fire,
                targeting: Targeting::SingleEnemy,
                mp_cost: 8,
                ..ActionDef::fallback("Fire")
            },
            ActionDef {
                name: "Cure".into(),
                kind: ActionKind::HealSingle,
                potency: 100,
                physical: false,
                targeting: Targeting::SingleAlly,
                mp_cost: 6,
                ..ActionDef::fallback("Cure")
            },
            ActionDef {
                name: "Focus".into(),
                kind: ActionKind::BuffOnly,
                targeting: Targeting::Actor,
                status_for_actor: vec!["Focused".into()],
                ..ActionDef::fallback("Focus")
            },
            ActionDef {
                name: "Focused Strike".into(),
                kind: ActionKind::DamageSingle,
                potency: 150,
                status_costs: vec![("Focused".into(), 1)],
                ..ActionDef::fallback("Focused Strike")
            },
            ActionDef {
                name: "Potion".into(),
                kind: ActionKind::ItemHeal,
                potency: 100,
                targeting: Targeting::SingleAlly,
                ..ActionDef::fallback("Potion")
            },
            ActionDef {
                name: "Adrenaline".into(),
                kind: ActionKind::LimitGain,
                targeting: Targeting::Actor,
                ..ActionDef::fallback("Adrenaline")
            },
            ActionDef {
                name: "Braver".into(),
                kind: ActionKind::DamageSingle,
                potency: 300,
                consumes_limit: true,
                ..ActionDef::fallback("Braver")
            },
        ];

        let statuses = vec![StatusDef {
            name: "Focused".into(),
            starting_stacks: 1,
            max_stacks: 3,
            applied_duration: 3,
            max_duration: 9,
            modifiers: vec![(Stat::Attack, 1.5)],
        }];

        Self::from_records(battlers, actions, statuses)
    }
}
