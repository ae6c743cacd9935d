//! Pending order actions submitted to the proving VM.
//!
//! ## Side Encoding
//!
//! The VM program reads the side as a single operand word:
//! - Sell = 0
//! - Buy = 1
//!
//! ## Market Orders
//!
//! A missing price means "execute at any price". It resolves to the most
//! permissive bound for the side: `0` for a sell, `u64::MAX` for a buy.

use std::fmt;
use std::str::FromStr;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Sell order (ask)
    #[default]
    Sell,
    /// Buy order (bid)
    Buy,
}

impl Side {
    /// Operand word for the VM
    pub fn to_word(self) -> u64 {
        match self {
            Side::Sell => 0,
            Side::Buy => 1,
        }
    }

    pub fn from_word(word: u64) -> Option<Self> {
        match word {
            0 => Some(Side::Sell),
            1 => Some(Side::Buy),
            _ => None,
        }
    }

    /// Price bound used when no limit price is given
    pub fn market_price(self) -> u64 {
        match self {
            Side::Sell => 0,
            Side::Buy => u64::MAX,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Sell => f.write_str("sell"),
            Side::Buy => f.write_str("buy"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sell" | "ask" => Ok(Side::Sell),
            "buy" | "bid" => Ok(Side::Buy),
            other => Err(format!("unknown side {other:?}, expected buy or sell")),
        }
    }
}

// ============================================================================
// PendingAction struct
// ============================================================================

/// An order waiting to be executed by the VM.
///
/// Timestamp and order id are supplied by the caller; this crate never
/// reads the clock or allocates ids.
///
/// # Example
///
/// ```
/// use zkbook::types::{PendingAction, Side};
///
/// let action = PendingAction::market(Side::Buy, 25, 1688473018, 4929032);
/// assert_eq!(action.resolved_price(), u64::MAX);
///
/// let action = PendingAction::limit(Side::Sell, 25, 49, 1688473018, 4929032);
/// assert_eq!(action.resolved_price(), 49);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAction {
    pub side: Side,
    pub quantity: u64,
    /// Limit price, or `None` for a market order
    pub price: Option<u64>,
    pub timestamp: u64,
    /// Provisional id; the VM may report a different one
    pub order_id: u64,
}

impl PendingAction {
    /// Limit order at `price`
    pub fn limit(side: Side, quantity: u64, price: u64, timestamp: u64, order_id: u64) -> Self {
        Self {
            side,
            quantity,
            price: Some(price),
            timestamp,
            order_id,
        }
    }

    /// Market order
    pub fn market(side: Side, quantity: u64, timestamp: u64, order_id: u64) -> Self {
        Self {
            side,
            quantity,
            price: None,
            timestamp,
            order_id,
        }
    }

    #[inline]
    pub fn is_market(&self) -> bool {
        self.price.is_none()
    }

    /// Price operand sent to the VM
    pub fn resolved_price(&self) -> u64 {
        self.price.unwrap_or_else(|| self.side.market_price())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
