//! Two-state position tracking: fully invested or fully in cash.

use std::fmt;

/// Exactly one of units or cash is held at any time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Holding { units: f64 },
    Divested { cash: f64 },
}

impl PositionState {
    /// Invest `capital` entirely at `price`.
    pub fn invest(capital: f64, price: f64) -> Self {
        PositionState::Holding {
            units: capital / price,
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self, PositionState::Holding { .. })
    }

    pub fn units(&self) -> f64 {
        match self {
            PositionState::Holding { units } => *units,
            PositionState::Divested { .. } => 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        match self {
            PositionState::Holding { .. } => 0.0,
            PositionState::Divested { cash } => *cash,
        }
    }

    /// Mark-to-market value: cash + units * price.
    pub fn value(&self, price: f64) -> f64 {
        self.cash() + self.units() * price
    }

    /// Convert all units to cash. A no-op when already divested.
    pub fn sell(self, price: f64) -> Self {
        match self {
            PositionState::Holding { units } => PositionState::Divested {
                cash: units * price,
            },
            divested => divested,
        }
    }

    /// Convert all cash to units. A no-op when already holding.
    pub fn buy(self, price: f64) -> Self {
        match self {
            PositionState::Divested { cash } => PositionState::Holding {
                units: cash / price,
            },
            holding => holding,
        }
    }

    /// Add new money: as cash when divested, as units bought at `price` when holding.
    pub fn contribute(self, amount: f64, price: f64) -> Self {
        match self {
            PositionState::Holding { units } => PositionState::Holding {
                units: units + amount / price,
            },
            PositionState::Divested { cash } => PositionState::Divested {
                cash: cash + amount,
            },
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Holding { units } => write!(f, "holding {:.4} units", units),
            PositionState::Divested { cash } => write!(f, "divested {:.2} cash", cash),
        }
    }
}
