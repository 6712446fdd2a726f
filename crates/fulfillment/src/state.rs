//! Buy request stage machine.

use serde::{Deserialize, Serialize};

/// Progress of one buy request.
///
/// Stages advance strictly in order; any non-terminal stage may abort:
/// ```text
/// Start ──► Authenticated ──► InventoryFetched ──► Validated ──► StockDecremented
///       ──► Priced ──► LoyaltyApplied ──► Persisted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum BuyStage {
    #[default]
    Start,
    Authenticated,
    InventoryFetched,
    Validated,
    StockDecremented,
    Priced,
    LoyaltyApplied,
    /// The order is stored (terminal state).
    Persisted,
}

impl BuyStage {
    /// Returns the stage that follows this one, if any.
    pub fn next(&self) -> Option<BuyStage> {
        match self {
            BuyStage::Start => Some(BuyStage::Authenticated),
            BuyStage::Authenticated => Some(BuyStage::InventoryFetched),
            BuyStage::InventoryFetched => Some(BuyStage::Validated),
            BuyStage::Validated => Some(BuyStage::StockDecremented),
            BuyStage::StockDecremented => Some(BuyStage::Priced),
            BuyStage::Priced => Some(BuyStage::LoyaltyApplied),
            BuyStage::LoyaltyApplied => Some(BuyStage::Persisted),
            BuyStage::Persisted => None,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuyStage::Persisted)
    }

    /// Returns true if an abort from this stage leaves stock decremented.
    pub fn stock_committed(&self) -> bool {
        *self >= BuyStage::StockDecremented
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuyStage::Start => "Start",
            BuyStage::Authenticated => "Authenticated",
            BuyStage::InventoryFetched => "InventoryFetched",
            BuyStage::Validated => "Validated",
            BuyStage::StockDecremented => "StockDecremented",
            BuyStage::Priced => "Priced",
            BuyStage::LoyaltyApplied => "LoyaltyApplied",
            BuyStage::Persisted => "Persisted",
        }
    }
}

impl std::fmt::Display for BuyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
