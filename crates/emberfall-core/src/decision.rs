//! Decision sources and AI behavior policies.
//!
//! A [`DecisionSource`] is the external collaborator a player-controlled
//! battler's turn waits on. The turn machine polls it: `None` means "no
//! choice yet" and the state advances nothing that tick, keeping the host
//! loop responsive. Validation of legality (affordability, targeting shape)
//! is the source's job before it reports a choice; the engine only rejects
//! empty or all-dead target lists.
//!
//! Autonomous battlers resolve synchronously through a [`BehaviorPolicy`]
//! attached to the battler, so richer AI can replace the default without
//! touching the state machine.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::action::ActionDef;
use crate::battle::Battle;
use crate::battler::{Battler, BattlerId};
use crate::rng::Dice;

/// A chosen action with its concrete target list.
#[derive(Debug, Clone)]
pub struct Decision {
    /// The action to resolve, shared with the catalog.
    pub action: Arc<ActionDef>,
    /// Concrete targets; must be non-empty with at least one living member.
    pub targets: Vec<BattlerId>,
}

impl Decision {
    /// Creates a decision.
    #[must_use]
    pub fn new(action: Arc<ActionDef>, targets: Vec<BattlerId>) -> Self {
        Self { action, targets }
    }
}

/// Supplies choices for player-controlled battlers.
///
/// Both polls are non-blocking: returning `None` leaves the state machine
/// waiting and it will poll again on the next tick.
pub trait DecisionSource {
    /// Polls for the pending actor's chosen action and targets.
    fn poll_action(&mut self, actor: &Battler, battle: &Battle) -> Option<Decision>;

    /// Polls for the winner of an all-controllable speed tie. The answer
    /// must come from `tied`; anything else is rejected and re-polled.
    fn poll_tie_winner(&mut self, tied: &[BattlerId], battle: &Battle) -> Option<BattlerId>;
}

/// A queue-backed [`DecisionSource`] for tests and scripted hosts.
///
/// Pops one queued decision (or tie winner) per poll; an empty queue polls
/// as `None`, modeling a player who has not chosen yet.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    actions: VecDeque<Decision>,
    tie_winners: VecDeque<BattlerId>,
}

impl ScriptedDecisions {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a decision for the next `poll_action`.
    pub fn push_action(&mut self, decision: Decision) {
        self.actions.push_back(decision);
    }

    /// Queues a winner for the next `poll_tie_winner`.
    pub fn push_tie_winner(&mut self, winner: BattlerId) {
        self.tie_winners.push_back(winner);
    }
}

impl DecisionSource for ScriptedDecisions {
    fn poll_action(&mut self, _actor: &Battler, _battle: &Battle) -> Option<Decision> {
        self.actions.pop_front()
    }

    fn poll_tie_winner(&mut self, _tied: &[BattlerId], _battle: &Battle) -> Option<BattlerId> {
        self.tie_winners.pop_front()
    }
}

/// Turn policy for an autonomous battler.
///
/// Receives the roster as the battle snapshot; `None` means the policy
/// found nothing to do (e.g. no living opponents) and the turn passes.
pub trait BehaviorPolicy: Send + Sync {
    /// Chooses an action and targets for `actor`.
    fn decide(&self, actor: &Battler, roster: &[Battler], dice: &mut dyn Dice) -> Option<Decision>;
}

/// The default policy: basic-attack one living opponent at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAttack;

impl BehaviorPolicy for RandomAttack {
    fn decide(&self, actor: &Battler, roster: &[Battler], dice: &mut dyn Dice) -> Option<Decision> {
        let opposing = actor.side.opposing();
        let candidates: Vec<BattlerId> = roster
            .iter()
            .filter(|b| b.side == opposing && b.is_alive())
            .map(Battler::id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let target = candidates[dice.pick(candidates.len())];
        Some(Decision::new(Arc::clone(&actor.basic_attack), vec![target]))
    }
}
