//! Action definitions and the resolution engine.
//!
//! An [`ActionDef`] is immutable catalog data shared by `Arc` across every
//! battler that can use it. [`ActionDef::resolve`] turns one chosen action
//! into hp/mp/status/inventory mutations plus human-readable log lines on
//! the battle.
//!
//! # Resolution order
//!
//! 1. Opening line (`"Hero used Attack!"`)
//! 2. Primary effect per [`ActionKind`] (damage, heal, gauge fill, nothing)
//! 3. Status application to actor and targets
//! 4. Cost application (mp, status stacks, item, limit gauge)
//!
//! # Costs are advisory at execution time
//!
//! [`ActionDef::check_costs`] is a non-mutating affordability query for
//! selection UIs. `resolve` does **not** gate on it: costs are applied
//! unconditionally after the effects, so a caller that skips the check can
//! push an actor to 0 mp but never below. The one cost that can fail is
//! item consumption, and by then the heal has already landed;
//! [`BattleError::InventoryExhausted`] reports it without rolling back
//! (best-effort forward progress, not a transaction).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battler::{BattlerId, Element, Stat};
use crate::battle::Battle;
use crate::catalog;
use crate::error::BattleError;
use crate::formula;
use crate::status::Status;

/// What a resolved action does to its targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Damage the first target via the damage formula.
    DamageSingle,
    /// Damage every supplied target.
    DamageAll,
    /// Heal the first target via the heal formula.
    HealSingle,
    /// Heal every supplied target.
    HealAll,
    /// Heal like `HealSingle`, consuming one unit of the same-named item.
    ItemHeal,
    /// No direct hp/mp change; only the status-application step runs.
    BuffOnly,
    /// Fill the actor's limit gauge to its maximum.
    LimitGain,
}

/// Who an action may legally be aimed at. Enforced by the decision source,
/// recorded here so selection UIs can build target lists.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Targeting {
    /// Only the actor itself.
    Actor,
    /// One living ally.
    SingleAlly,
    /// Every ally.
    AllAllies,
    /// One living enemy.
    SingleEnemy,
    /// Every enemy.
    AllEnemies,
    /// Any one battler on either side.
    AnySingle,
    /// Everyone.
    All,
}

/// Immutable definition of an action, resolved once from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Catalog key and display name.
    pub name: String,
    /// Resolution kind.
    pub kind: ActionKind,
    /// Percentage scalar driving formula magnitude.
    pub potency: i32,
    /// Physical actions read attack/defense; magical read magic/mdefense.
    pub physical: bool,
    /// Element looked up in the target's affinity table.
    pub element: Element,
    /// Legal target shape.
    pub targeting: Targeting,
    /// Magic points deducted at cost application.
    #[serde(default)]
    pub mp_cost: i32,
    /// Status names applied to the actor on use.
    #[serde(default)]
    pub status_for_actor: Vec<String>,
    /// Status names applied to every target on use.
    #[serde(default)]
    pub status_for_target: Vec<String>,
    /// Status stacks required and consumed as a cost.
    #[serde(default)]
    pub status_costs: Vec<(String, u32)>,
    /// Whether cost application zeroes the actor's limit gauge.
    #[serde(default)]
    pub consumes_limit: bool,
}

impl ActionDef {
    /// The documented fallback for a catalog miss: a plain physical strike.
    #[must_use]
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: ActionKind::DamageSingle,
            potency: 100,
            physical: true,
            element: Element::Neutral,
            targeting: Targeting::SingleEnemy,
            mp_cost: 0,
            status_for_actor: Vec::new(),
            status_for_target: Vec::new(),
            status_costs: Vec::new(),
            consumes_limit: false,
        }
    }

    /// Non-mutating affordability check for selection UIs.
    ///
    /// Returns the first failing requirement as a human-readable reason.
    /// Execution does not call this; see the module docs.
    ///
    /// # Errors
    ///
    /// [`BattleError::InsufficientResources`] when mp or a cost-status
    /// stack requirement is unmet.
    pub fn check_costs(&self, actor: &crate::battler::Battler) -> Result<(), BattleError> {
        if actor.mp < self.mp_cost {
            return Err(BattleError::InsufficientResources("Not enough MP".into()));
        }
        for (name, required) in &self.status_costs {
            let held = actor.statuses.iter().find(|s| &s.name == name);
            match held {
                None => {
                    return Err(BattleError::InsufficientResources(format!("Need {name}")));
                }
                Some(status) if status.stack < *required => {
                    return Err(BattleError::InsufficientResources(format!(
                        "Need {required} more {name}"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Resolves this action for `actor` against `targets`, mutating hp, mp,
    /// statuses, and the inventory, and appending log lines to the battle.
    ///
    /// Targets are taken as supplied; expanding a [`Targeting`] rule into a
    /// concrete list is the decision source's job.
    ///
    /// # Errors
    ///
    /// - [`BattleError::InvalidTarget`] when a targeted kind receives no
    ///   targets (nothing has been mutated yet)
    /// - [`BattleError::InventoryExhausted`] when an item action finds no
    ///   matching consumable; earlier effects are not rolled back
    pub fn resolve(
        &self,
        actor: BattlerId,
        targets: &[BattlerId],
        battle: &mut Battle,
    ) -> Result<(), BattleError> {
        let actor_name = battle
            .battler(actor)
            .map_or_else(String::new, |b| b.name.clone());
        battle.push_log(format!("{actor_name} used {}!", self.name));

        match self.kind {
            ActionKind::DamageSingle => {
                let first = *targets.first().ok_or(BattleError::InvalidTarget)?;
                self.damage_one(actor, first, battle);
            }
            ActionKind::DamageAll => {
                if targets.is_empty() {
                    return Err(BattleError::InvalidTarget);
                }
                for &target in targets {
                    self.damage_one(actor, target, battle);
                }
            }
            ActionKind::HealSingle | ActionKind::ItemHeal => {
                let first = *targets.first().ok_or(BattleError::InvalidTarget)?;
                self.heal_one(actor, first, battle);
            }
            ActionKind::HealAll => {
                if targets.is_empty() {
                    return Err(BattleError::InvalidTarget);
                }
                for &target in targets {
                    self.heal_one(actor, target, battle);
                }
            }
            ActionKind::BuffOnly => {}
            ActionKind::LimitGain => {
                let limit_max = battle.tuning().limit_max;
                if let Some(b) = battle.battler_mut(actor) {
                    b.limit = limit_max;
                }
            }
        }

        self.statusing(actor, targets, battle);
        self.apply_costs(actor, battle)
    }

    /// Computes and deals damage to one target.
    fn damage_one(&self, actor: BattlerId, target: BattlerId, battle: &mut Battle) {
        let Some(actor_ref) = battle.battler(actor) else {
            return;
        };
        let (offense, defense_stat) = if self.physical {
            (actor_ref.stats.get(Stat::Attack), Stat::Defense)
        } else {
            (actor_ref.stats.get(Stat::Magic), Stat::MagicDefense)
        };
        let Some(target_ref) = battle.battler(target) else {
            return;
        };
        let defense = target_ref.stats.get(defense_stat);

        let raw = formula::damage(offense, defense, self.potency);
        self.deal_damage(raw, target, battle);
    }

    /// Applies variance, affinity, and critical modifiers, then commits the
    /// clamped damage and its log line.
    fn deal_damage(&self, raw: i32, target: BattlerId, battle: &mut Battle) {
        let tuning = *battle.tuning();

        let mut modifiers =
            vec![battle.dice_mut().roll_variance(tuning.variance_min, tuning.variance_max)];

        // Affinity defaults to 1.0 for elements the target never set.
        let affinity = battle
            .battler(target)
            .map_or(1.0, |b| b.affinities.get(self.element));
        modifiers.push(affinity);

        if battle.dice_mut().roll_percent() <= tuning.crit_chance {
            modifiers.push(tuning.crit_multiplier);
            battle.push_log("A critical hit!".to_owned());
        }

        let mut amount = f64::from(raw);
        for modifier in modifiers {
            amount *= modifier;
        }
        #[allow(clippy::cast_possible_truncation)]
        let amount = amount.trunc() as i32;

        let line = battle.battler_mut(target).map(|b| {
            let dealt = b.take_damage(amount);
            format!("{} took {dealt} damage!", b.name)
        });
        if let Some(line) = line {
            battle.push_log(line);
        }
    }

    /// Computes and applies healing to one target, clamped at its ceiling.
    fn heal_one(&self, actor: BattlerId, target: BattlerId, battle: &mut Battle) {
        let tuning = *battle.tuning();
        let magic = battle
            .battler(actor)
            .map_or(0, |b| b.stats.get(Stat::Magic));
        let variance = battle
            .dice_mut()
            .roll_variance(tuning.variance_min, tuning.variance_max);
        let amount = formula::heal(magic, self.potency, variance);

        let line = battle.battler_mut(target).map(|b| {
            let gained = b.restore_hp(amount);
            format!("{} healed {gained} HP!", b.name)
        });
        if let Some(line) = line {
            battle.push_log(line);
        }
    }

    /// Applies configured statuses to the actor and every target.
    ///
    /// Self-applied statuses get one extra duration tick: the end-of-turn
    /// decrement lands on the same turn they were applied, which would
    /// otherwise shorten them by one relative to target-applied statuses.
    fn statusing(&self, actor: BattlerId, targets: &[BattlerId], battle: &mut Battle) {
        for name in &self.status_for_actor {
            Self::apply_status(battle, actor, name);
            if let Some(b) = battle.battler_mut(actor) {
                if let Some(status) = b.statuses.iter_mut().find(|s| &s.name == name) {
                    status.extend_duration(1);
                }
            }
        }
        for name in &self.status_for_target {
            for &target in targets {
                Self::apply_status(battle, target, name);
            }
        }
    }

    /// Attaches a status to `patient`, reapplying when already present.
    fn apply_status(battle: &mut Battle, patient: BattlerId, name: &str) {
        let catalog = Arc::clone(battle.catalog());
        let Some(b) = battle.battler_mut(patient) else {
            return;
        };
        if let Some(existing) = b.statuses.iter_mut().find(|s| s.name == name) {
            existing.reapply();
        } else {
            let def = catalog::status_or_default(catalog.as_ref(), name);
            b.statuses.push(Status::from_def(&def));
        }
    }

    /// Applies the action's costs unconditionally after the effects.
    fn apply_costs(&self, actor: BattlerId, battle: &mut Battle) -> Result<(), BattleError> {
        if let Some(b) = battle.battler_mut(actor) {
            for (name, stacks) in &self.status_costs {
                if let Some(status) = b.statuses.iter_mut().find(|s| &s.name == name) {
                    status.consume_stacks(*stacks);
                }
            }
            // Uncapped by any gate, but mp never goes negative.
            b.mp = (b.mp - self.mp_cost).max(0);
            if self.consumes_limit {
                b.limit = 0;
            }
        }

        if self.kind == ActionKind::ItemHeal {
            let consumed = battle.consume_item(&self.name);
            if !consumed {
                debug!(item = %self.name, "item action resolved with empty inventory");
                return Err(BattleError::InventoryExhausted(self.name.clone()));
            }
        }
        Ok(())
    }
}
