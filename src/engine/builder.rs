//! Builds the proving VM's input for a pending action.

use crate::codec::encode_snapshot;
use crate::config::{SessionConfig, StackLayout};
use crate::orderbook::OrderTree;
use crate::prover::{ProgramInput, OPERAND_SLOTS};
use crate::types::PendingAction;

/// Turns a [`PendingAction`] and the current book into a [`ProgramInput`].
///
/// # Example
///
/// ```
/// use zkbook::config::SessionConfig;
/// use zkbook::engine::SessionBuilder;
/// use zkbook::orderbook::OrderTree;
/// use zkbook::types::{PendingAction, Side};
///
/// let builder = SessionBuilder::new(&SessionConfig::default());
/// let action = PendingAction::market(Side::Sell, 25, 1688473018, 1);
/// let input = builder.build(&action, &OrderTree::new());
///
/// assert_eq!(input.operand_stack, ["9999999", "1688473018", "0", "25", "0"]);
/// assert_eq!(input.advice_map.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    layout: StackLayout,
    program_nonce: u64,
}

impl SessionBuilder {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            layout: config.stack_layout,
            program_nonce: config.program_nonce,
        }
    }

    #[inline]
    pub fn layout(&self) -> StackLayout {
        self.layout
    }

    /// Operand stack for `action` in the configured slot order
    pub fn operand_stack(&self, action: &PendingAction) -> [String; OPERAND_SLOTS] {
        let side = action.side.to_word();
        let quantity = action.quantity;
        let price = action.resolved_price();
        let timestamp = action.timestamp;
        let nonce = self.program_nonce;

        let slots = match self.layout {
            StackLayout::SideFirst => [side, quantity, price, timestamp, nonce],
            StackLayout::NonceFirst => [nonce, timestamp, price, quantity, side],
        };
        slots.map(|word| word.to_string())
    }

    /// Full program input: operand stack plus the encoded book
    pub fn build(&self, action: &PendingAction, tree: &OrderTree) -> ProgramInput {
        ProgramInput {
            operand_stack: self.operand_stack(action),
            advice_map: encode_snapshot(tree),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::advice_key;
    use crate::orderbook::OrderNode;
    use crate::types::Side;

    fn side_first() -> SessionBuilder {
        SessionBuilder::new(&SessionConfig {
            stack_layout: StackLayout::SideFirst,
            program_nonce: 42,
        })
    }

    #[test]
    fn test_market_sell_price_is_zero() {
        let action = PendingAction::market(Side::Sell, 10, 1000, 1);
        let stack = SessionBuilder::default().operand_stack(&action);

        assert_eq!(stack[2], "0");
        assert_eq!(stack[4], "0");
    }

    #[test]
    fn test_market_buy_price_is_u64_max() {
        let action = PendingAction::market(Side::Buy, 10, 1000, 1);
        let stack = SessionBuilder::default().operand_stack(&action);

        assert_eq!(stack[2], "18446744073709551615");
        assert_eq!(stack[4], "1");
    }

    #[test]
    fn test_nonce_first_layout() {
        let action = PendingAction::limit(Side::Buy, 25, 49, 1688473018, 7);
        let stack = SessionBuilder::default().operand_stack(&action);

        assert_eq!(stack, ["9999999", "1688473018", "49", "25", "1"]);
    }

    #[test]
    fn test_side_first_layout() {
        let action = PendingAction::limit(Side::Buy, 25, 49, 1688473018, 7);
        let stack = side_first().operand_stack(&action);

        assert_eq!(stack, ["1", "25", "49", "1688473018", "42"]);
    }

    #[test]
    fn test_layouts_are_reverses() {
        let action = PendingAction::limit(Side::Sell, 3, 51, 99, 7);
        let config = SessionConfig {
            program_nonce: 42,
            ..SessionConfig::default()
        };

        let mut forward = side_first().operand_stack(&action);
        forward.reverse();
        assert_eq!(forward, SessionBuilder::new(&config).operand_stack(&action));
    }

    #[test]
    fn test_build_encodes_current_tree() {
        let mut tree = OrderTree::new();
        tree.insert(OrderNode::new(268, 2, 49, 1688473018, 4929032)).unwrap();

        let action = PendingAction::market(Side::Buy, 1, 0, 1);
        let input = SessionBuilder::default().build(&action, &tree);

        assert_eq!(input.advice_map.node_count(), Some(1));
        assert_eq!(input.advice_map.get(&advice_key(1)).map(|v| v[3]), Some(268));
    }
}
