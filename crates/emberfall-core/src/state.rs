//! The turn state machine.
//!
//! [`TurnState`] is a tagged union over the encounter's phases; a single
//! [`advance`] function with an exhaustive match drives every transition.
//! Each variant carries only the data it needs (the acting battler's id,
//! the tied set), never a back-reference into the battle.
//!
//! One call to `advance` performs exactly one step and runs to completion
//! synchronously; the only "waiting" states are the decision polls, which
//! no-op until the decision source answers.
//!
//! # Ordering guarantees
//!
//! - Stats reset to baseline *before* statuses re-apply (`PrepareActor`),
//!   so modifiers never compound across turns
//! - Status durations tick down only at the actor's end of turn
//! - `Burying` moves exactly one casualty per visit; simultaneous deaths
//!   resolve over successive cycles until all dead are buried

use tracing::{debug, warn};

use crate::battle::{Battle, Outcome};
use crate::battler::{Battler, BattlerId, Side, Stat};
use crate::decision::DecisionSource;

/// The phases of one encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// Gauges fill until somebody crosses the readiness threshold.
    Waiting,
    /// Two or more battlers crossed simultaneously; one must win.
    SpeedTie {
        /// The battlers that crossed together.
        tied: Vec<BattlerId>,
    },
    /// Reset the actor's stats and re-apply its statuses.
    PrepareActor {
        /// The battler about to act.
        actor: BattlerId,
    },
    /// Waiting on the decision source for a player-controlled actor.
    ControlledTurn {
        /// The battler whose choice is pending.
        actor: BattlerId,
    },
    /// An autonomous actor resolves its behavior policy synchronously.
    AiTurn {
        /// The acting battler.
        actor: BattlerId,
    },
    /// Scan for casualties after an action resolved.
    CheckingDeath {
        /// The battler whose turn is concluding.
        actor: BattlerId,
    },
    /// Move one casualty to the graveyard.
    Burying {
        /// The battler whose turn is concluding.
        actor: BattlerId,
    },
    /// Close out the actor's turn: queue removal, gauge carry-over,
    /// status duration ticks.
    EndingTurn {
        /// The battler whose turn is concluding.
        actor: BattlerId,
    },
    /// Terminal: the enemy side was emptied.
    Victory,
    /// Terminal: the party was wiped.
    Defeat,
}

impl TurnState {
    /// A short tag for presentation sinks.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::SpeedTie { .. } => "SpeedTie",
            Self::PrepareActor { .. } => "PrepareActor",
            Self::ControlledTurn { .. } => "ControlledTurn",
            Self::AiTurn { .. } => "AiTurn",
            Self::CheckingDeath { .. } => "CheckingDeath",
            Self::Burying { .. } => "Burying",
            Self::EndingTurn { .. } => "EndingTurn",
            Self::Victory => "Victory",
            Self::Defeat => "Defeat",
        }
    }

    /// The battler currently taking (or preparing) a turn, if any.
    #[must_use]
    pub const fn actor(&self) -> Option<BattlerId> {
        match self {
            Self::PrepareActor { actor }
            | Self::ControlledTurn { actor }
            | Self::AiTurn { actor }
            | Self::CheckingDeath { actor }
            | Self::Burying { actor }
            | Self::EndingTurn { actor } => Some(*actor),
            _ => None,
        }
    }

    /// Whether the encounter has concluded.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Runs one step of the state machine and returns the successor state.
pub(crate) fn advance(
    state: TurnState,
    battle: &mut Battle,
    dt: f64,
    decisions: &mut dyn DecisionSource,
) -> TurnState {
    match state {
        TurnState::Waiting => waiting(battle, dt),
        TurnState::SpeedTie { tied } => speed_tie(tied, battle, decisions),
        TurnState::PrepareActor { actor } => prepare_actor(actor, battle),
        TurnState::ControlledTurn { actor } => controlled_turn(actor, battle, decisions),
        TurnState::AiTurn { actor } => ai_turn(actor, battle),
        TurnState::CheckingDeath { actor } => {
            if battle.roster.iter().any(|b| b.hp == 0) {
                TurnState::Burying { actor }
            } else {
                TurnState::EndingTurn { actor }
            }
        }
        TurnState::Burying { actor } => burying(actor, battle),
        TurnState::EndingTurn { actor } => ending_turn(actor, battle),
        TurnState::Victory => {
            battle.outcome.get_or_insert(Outcome::Victory);
            TurnState::Victory
        }
        TurnState::Defeat => {
            battle.outcome.get_or_insert(Outcome::Defeat);
            TurnState::Defeat
        }
    }
}

/// Fills every roster member's gauge, queues fresh crossers in crossing
/// order, and transitions on the queue length.
fn waiting(battle: &mut Battle, dt: f64) -> TurnState {
    let Battle {
        roster,
        ready,
        tuning,
        ..
    } = battle;

    for battler in roster.iter_mut() {
        battler.atb += f64::from(battler.stats.get(Stat::Speed)) * dt * tuning.atb_rate;
    }
    for battler in roster.iter() {
        if battler.is_alive()
            && battler.atb >= tuning.ready_threshold
            && !ready.contains(&battler.id())
        {
            ready.push(battler.id());
        }
    }

    match battle.ready.len() {
        0 => TurnState::Waiting,
        1 => TurnState::PrepareActor {
            actor: battle.ready[0],
        },
        _ => TurnState::SpeedTie {
            tied: battle.ready.clone(),
        },
    }
}

/// Picks a tie winner: the decision source for all-controllable ties,
/// the dice otherwise. Losers stay in the ready queue and are reconsidered
/// on the next Waiting cycle.
fn speed_tie(
    tied: Vec<BattlerId>,
    battle: &mut Battle,
    decisions: &mut dyn DecisionSource,
) -> TurnState {
    // Members may have died (and been buried) since the tie formed.
    let tied: Vec<BattlerId> = tied
        .into_iter()
        .filter(|id| battle.battler(*id).is_some_and(Battler::is_alive))
        .collect();

    match tied.len() {
        0 => TurnState::Waiting,
        1 => TurnState::PrepareActor { actor: tied[0] },
        _ => {
            let all_controllable = tied
                .iter()
                .all(|id| battle.battler(*id).is_some_and(|b| b.controllable));
            if all_controllable {
                match decisions.poll_tie_winner(&tied, battle) {
                    Some(winner) if tied.contains(&winner) => {
                        TurnState::PrepareActor { actor: winner }
                    }
                    Some(winner) => {
                        warn!(%winner, "tie winner outside the tied set, re-polling");
                        TurnState::SpeedTie { tied }
                    }
                    None => TurnState::SpeedTie { tied },
                }
            } else {
                let winner = tied[battle.dice.pick(tied.len())];
                TurnState::PrepareActor { actor: winner }
            }
        }
    }
}

/// Resets the actor to its pre-battle baseline, then lets every active
/// status apply this turn's modifiers against the clean values.
fn prepare_actor(actor: BattlerId, battle: &mut Battle) -> TurnState {
    let Some(battler) = battle.battler_mut(actor) else {
        return TurnState::CheckingDeath { actor };
    };
    // A battler that died while queued takes no turn; route it to burial.
    if !battler.is_alive() {
        return TurnState::CheckingDeath { actor };
    }

    battler.reset_stats();
    battler.run_status_effects();

    if battler.controllable {
        TurnState::ControlledTurn { actor }
    } else {
        TurnState::AiTurn { actor }
    }
}

/// Polls the decision source; a no-op until a valid decision arrives.
fn controlled_turn(
    actor: BattlerId,
    battle: &mut Battle,
    decisions: &mut dyn DecisionSource,
) -> TurnState {
    let Some(actor_ref) = battle.battler(actor) else {
        return TurnState::CheckingDeath { actor };
    };
    let Some(decision) = decisions.poll_action(actor_ref, battle) else {
        return TurnState::ControlledTurn { actor };
    };

    let any_living_target = decision
        .targets
        .iter()
        .any(|id| battle.battler(*id).is_some_and(Battler::is_alive));
    if decision.targets.is_empty() || !any_living_target {
        warn!(%actor, "decision rejected: empty or dead target list");
        return TurnState::ControlledTurn { actor };
    }

    if let Err(err) = decision.action.resolve(actor, &decision.targets, battle) {
        warn!(%actor, %err, "action resolution reported an error");
    }
    TurnState::CheckingDeath { actor }
}

/// Runs the actor's behavior policy synchronously; a policy with nothing
/// to do passes the turn.
fn ai_turn(actor: BattlerId, battle: &mut Battle) -> TurnState {
    let decision = {
        let Battle { roster, dice, .. } = battle;
        roster
            .iter()
            .find(|b| b.id() == actor)
            .and_then(|a| a.behavior.decide(a, roster, dice.as_mut()))
    };

    match decision {
        Some(decision) => {
            if let Err(err) = decision.action.resolve(actor, &decision.targets, battle) {
                warn!(%actor, %err, "action resolution reported an error");
            }
        }
        None => debug!(%actor, "behavior policy found no viable action"),
    }
    TurnState::CheckingDeath { actor }
}

/// Moves exactly one casualty to the graveyard; sets the outcome when a
/// whole side was emptied (party wipe checked first). The turn still
/// closes out through `EndingTurn`, which honors the outcome.
fn burying(actor: BattlerId, battle: &mut Battle) -> TurnState {
    if let Some(index) = battle.roster.iter().position(|b| b.hp == 0) {
        battle.roster[index].atb = 0.0;
        let dead = battle.roster.remove(index);
        battle.ready.retain(|id| *id != dead.id());
        debug!(battler = %dead.name, "buried");
        battle.graveyard.push(dead);
    }

    let party_stands = battle.roster.iter().any(|b| b.side == Side::Party);
    let enemies_stand = battle.roster.iter().any(|b| b.side == Side::Enemy);
    if !party_stands {
        battle.outcome.get_or_insert(Outcome::Defeat);
    } else if !enemies_stand {
        battle.outcome.get_or_insert(Outcome::Victory);
    }
    TurnState::EndingTurn { actor }
}

/// Closes out the actor's turn: queue removal, gauge carry-over (threshold
/// subtraction, not a reset), status duration ticks and spent-status
/// removal. Lands on the terminal state when a burial this cycle decided
/// the outcome.
fn ending_turn(actor: BattlerId, battle: &mut Battle) -> TurnState {
    battle.ready.retain(|id| *id != actor);

    let threshold = battle.tuning.ready_threshold;
    if let Some(battler) = battle.battler_mut(actor) {
        battler.atb -= threshold;
        for status in &mut battler.statuses {
            status.reduce_duration();
        }
        battler.statuses.retain(|s| !s.is_spent());
    }

    match battle.outcome {
        Some(Outcome::Victory) => TurnState::Victory,
        Some(Outcome::Defeat) => TurnState::Defeat,
        None => TurnState::Waiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::Tuning;
    use crate::decision::ScriptedDecisions;
    use crate::tests::helpers::{duel_battle, FixedDice};

    fn no_decisions() -> ScriptedDecisions {
        ScriptedDecisions::new()
    }

    mod waiting_tests {
        use super::*;

        #[test]
        fn gauges_fill_by_speed() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            battle.set_state_for_test(TurnState::Waiting);
            battle.tick(1.0, &mut decisions);

            // Hero speed 30, rate 5: one second adds 150.
            let hero = battle.battler(BattlerId::new(0)).unwrap();
            assert!((hero.atb - 150.0).abs() < f64::EPSILON);
        }

        #[test]
        fn single_crosser_prepares_directly() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            battle.battler_mut(BattlerId::new(0)).unwrap().atb = Tuning::default().ready_threshold;
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "PrepareActor");
            assert_eq!(battle.active_actor(), Some(BattlerId::new(0)));
        }

        #[test]
        fn simultaneous_crossers_form_a_tie() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let threshold = Tuning::default().ready_threshold;
            battle.battler_mut(BattlerId::new(0)).unwrap().atb = threshold;
            battle.battler_mut(BattlerId::new(1)).unwrap().atb = threshold;
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "SpeedTie");
        }

        #[test]
        fn dead_members_are_not_queued() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let slime = battle.battler_mut(BattlerId::new(1)).unwrap();
            slime.hp = 0;
            slime.atb = Tuning::default().ready_threshold;
            battle.tick(0.0, &mut decisions);
            assert!(battle.ready_queue().is_empty());
        }
    }

    mod tie_tests {
        use super::*;

        #[test]
        fn mixed_tie_resolves_through_dice() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let threshold = Tuning::default().ready_threshold;
            battle.battler_mut(BattlerId::new(0)).unwrap().atb = threshold;
            battle.battler_mut(BattlerId::new(1)).unwrap().atb = threshold;
            battle.tick(0.0, &mut decisions); // SpeedTie
            battle.tick(0.0, &mut decisions); // dice pick index 0
            assert_eq!(battle.state_tag(), "PrepareActor");
            assert_eq!(battle.active_actor(), Some(BattlerId::new(0)));
        }

        #[test]
        fn losers_stay_in_the_ready_queue() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let threshold = Tuning::default().ready_threshold;
            battle.battler_mut(BattlerId::new(0)).unwrap().atb = threshold;
            battle.battler_mut(BattlerId::new(1)).unwrap().atb = threshold;
            battle.tick(0.0, &mut decisions);
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.ready_queue().len(), 2);
        }

        #[test]
        fn controllable_tie_waits_for_the_source() {
            let mut battle = duel_battle(FixedDice::flat());
            battle.battler_mut(BattlerId::new(1)).unwrap().controllable = true;
            let mut decisions = no_decisions();
            let threshold = Tuning::default().ready_threshold;
            battle.battler_mut(BattlerId::new(0)).unwrap().atb = threshold;
            battle.battler_mut(BattlerId::new(1)).unwrap().atb = threshold;
            battle.tick(0.0, &mut decisions);
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "SpeedTie", "no winner supplied yet");

            let mut decisions = no_decisions();
            decisions.push_tie_winner(BattlerId::new(1));
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.active_actor(), Some(BattlerId::new(1)));
        }
    }

    mod prepare_tests {
        use super::*;

        #[test]
        fn prepare_resets_then_reapplies_statuses() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let focus = battle.catalog().action("Focus").unwrap();
            focus.resolve(hero, &[hero], &mut battle).unwrap();

            battle.set_state_for_test(TurnState::PrepareActor { actor: hero });
            battle.tick(0.0, &mut decisions);

            let b = battle.battler(hero).unwrap();
            // Attack baseline 100 x1.5 from Focused.
            assert_eq!(b.stats.get(Stat::Attack), 150);
            assert_eq!(battle.state_tag(), "ControlledTurn");
        }

        #[test]
        fn repeated_prepare_does_not_compound() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let focus = battle.catalog().action("Focus").unwrap();
            focus.resolve(hero, &[hero], &mut battle).unwrap();

            for _ in 0..3 {
                battle.set_state_for_test(TurnState::PrepareActor { actor: hero });
                battle.tick(0.0, &mut decisions);
            }
            assert_eq!(battle.battler(hero).unwrap().stats.get(Stat::Attack), 150);
        }

        #[test]
        fn dead_actor_is_routed_to_burial() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            battle.battler_mut(hero).unwrap().hp = 0;
            battle.set_state_for_test(TurnState::PrepareActor { actor: hero });
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "CheckingDeath");
        }
    }

    mod controlled_turn_tests {
        use super::*;
        use crate::decision::Decision;

        #[test]
        fn no_decision_is_a_noop() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            battle.set_state_for_test(TurnState::ControlledTurn { actor: hero });
            for _ in 0..5 {
                battle.tick(0.016, &mut decisions);
            }
            assert_eq!(battle.state_tag(), "ControlledTurn");
        }

        #[test]
        fn empty_target_list_is_rejected() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let attack = battle.catalog().action("Attack").unwrap();
            decisions.push_action(Decision::new(attack, Vec::new()));

            battle.set_state_for_test(TurnState::ControlledTurn { actor: hero });
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "ControlledTurn", "must resupply");
        }

        #[test]
        fn all_dead_target_list_is_rejected() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let slime = BattlerId::new(1);
            battle.battler_mut(slime).unwrap().hp = 0;
            let attack = battle.catalog().action("Attack").unwrap();
            decisions.push_action(Decision::new(attack, vec![slime]));

            battle.set_state_for_test(TurnState::ControlledTurn { actor: hero });
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "ControlledTurn");
        }

        #[test]
        fn valid_decision_resolves_and_checks_death() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let slime = BattlerId::new(1);
            let attack = battle.catalog().action("Attack").unwrap();
            decisions.push_action(Decision::new(attack, vec![slime]));

            battle.set_state_for_test(TurnState::ControlledTurn { actor: hero });
            let hp_before = battle.battler(slime).unwrap().hp;
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "CheckingDeath");
            assert!(battle.battler(slime).unwrap().hp < hp_before);
        }
    }

    mod ending_turn_tests {
        use super::*;

        #[test]
        fn gauge_carries_over_past_the_threshold() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let threshold = Tuning::default().ready_threshold;
            battle.battler_mut(hero).unwrap().atb = threshold + 40.0;
            battle.ready_queue_mut_for_test().push(hero);

            battle.set_state_for_test(TurnState::EndingTurn { actor: hero });
            battle.tick(0.0, &mut decisions);

            let b = battle.battler(hero).unwrap();
            assert!((b.atb - 40.0).abs() < f64::EPSILON, "overflow preserved");
            assert!(battle.ready_queue().is_empty());
            assert_eq!(battle.state_tag(), "Waiting");
        }

        #[test]
        fn statuses_tick_and_spent_ones_drop() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            let hero = BattlerId::new(0);
            let focus = battle.catalog().action("Focus").unwrap();
            focus.resolve(hero, &[hero], &mut battle).unwrap();
            // Drain the status to its last tick.
            battle.battler_mut(hero).unwrap().statuses[0].duration = 1;

            battle.set_state_for_test(TurnState::EndingTurn { actor: hero });
            battle.tick(0.0, &mut decisions);
            assert!(battle.battler(hero).unwrap().statuses.is_empty());
        }
    }

    mod burying_tests {
        use super::*;

        #[test]
        fn one_casualty_per_visit() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            // Second enemy so the battle does not end at the first burial.
            battle.push_enemy_for_test("Slime");
            battle.battler_mut(BattlerId::new(1)).unwrap().hp = 0;
            battle.battler_mut(BattlerId::new(2)).unwrap().hp = 0;

            battle.set_state_for_test(TurnState::Burying {
                actor: BattlerId::new(0),
            });
            battle.tick(0.0, &mut decisions);

            assert_eq!(battle.graveyard().len(), 1);
            assert_eq!(battle.state_tag(), "EndingTurn");
        }

        #[test]
        fn buried_battler_loses_gauge_and_queue_slot() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            battle.push_enemy_for_test("Slime");
            let slime = BattlerId::new(1);
            {
                let b = battle.battler_mut(slime).unwrap();
                b.hp = 0;
                b.atb = 500.0;
            }
            battle.ready_queue_mut_for_test().push(slime);

            battle.set_state_for_test(TurnState::Burying {
                actor: BattlerId::new(0),
            });
            battle.tick(0.0, &mut decisions);

            assert!(battle.ready_queue().is_empty());
            assert!((battle.graveyard()[0].atb).abs() < f64::EPSILON);
        }

        #[test]
        fn emptying_the_enemy_side_is_victory() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            battle.battler_mut(BattlerId::new(1)).unwrap().hp = 0;

            battle.set_state_for_test(TurnState::Burying {
                actor: BattlerId::new(0),
            });
            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "EndingTurn", "turn still closes out");
            assert_eq!(battle.outcome(), Some(Outcome::Victory));

            battle.tick(0.0, &mut decisions);
            assert_eq!(battle.state_tag(), "Victory");
        }

        #[test]
        fn party_wipe_takes_precedence() {
            let mut battle = duel_battle(FixedDice::flat());
            let mut decisions = no_decisions();
            battle.battler_mut(BattlerId::new(0)).unwrap().hp = 0;
            battle.battler_mut(BattlerId::new(1)).unwrap().hp = 0;

            battle.set_state_for_test(TurnState::Burying {
                actor: BattlerId::new(0),
            });
            // Two burials over two cycles.
            battle.tick(0.0, &mut decisions);
            if battle.outcome().is_none() {
                battle.set_state_for_test(TurnState::Burying {
                    actor: BattlerId::new(0),
                });
                battle.tick(0.0, &mut decisions);
            }
            assert_eq!(battle.outcome(), Some(Outcome::Defeat));
        }
    }
}
