//! Error types for battle resolution.
//!
//! No variant is fatal to the engine: catalog misses degrade to defaults,
//! rejected decisions leave the state machine waiting for the caller to
//! resupply, and inventory exhaustion aborts only the cost-application step
//! of an action (earlier effects stand, see the action module).

use thiserror::Error;

/// Non-fatal errors surfaced by the battle engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// A catalog lookup missed. The engine substitutes a default record
    /// and continues; this variant is surfaced when a caller asks for a
    /// strict lookup.
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),

    /// The actor cannot afford an action's costs. Carries a human-readable
    /// reason suitable for a selection UI (e.g. "Not enough MP").
    #[error("insufficient resources: {0}")]
    InsufficientResources(String),

    /// A decision arrived with an empty or all-dead target list. The turn
    /// does not advance; the decision source must resupply.
    #[error("invalid target list")]
    InvalidTarget,

    /// A consumable named by an item action was absent from the inventory.
    /// Effects already applied by the action are not rolled back.
    #[error("no {0} in inventory")]
    InventoryExhausted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            BattleError::DefinitionNotFound("Meteor".into()).to_string(),
            "definition not found: Meteor"
        );
        assert_eq!(
            BattleError::InsufficientResources("Not enough MP".into()).to_string(),
            "insufficient resources: Not enough MP"
        );
        assert_eq!(BattleError::InvalidTarget.to_string(), "invalid target list");
        assert_eq!(
            BattleError::InventoryExhausted("Potion".into()).to_string(),
            "no Potion in inventory"
        );
    }
}
