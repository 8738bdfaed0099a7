//! Trade phase enumeration and order side.

use std::fmt;

/// Stage of one trading cycle. Exactly one is active per state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TradePhase {
    #[default]
    Idle,
    Opening,
    Positioned,
    StoppingLoss,
    StoppingProfitA,
    StoppingProfitB,
}

impl TradePhase {
    pub const ALL: [TradePhase; 6] = [
        TradePhase::Idle,
        TradePhase::Opening,
        TradePhase::Positioned,
        TradePhase::StoppingLoss,
        TradePhase::StoppingProfitA,
        TradePhase::StoppingProfitB,
    ];

    /// Phases with a working order at the gateway.
    pub fn has_pending_order(self) -> bool {
        match self {
            TradePhase::Opening
            | TradePhase::StoppingLoss
            | TradePhase::StoppingProfitA
            | TradePhase::StoppingProfitB => true,
            TradePhase::Idle | TradePhase::Positioned => false,
        }
    }

    pub fn is_closing(self) -> bool {
        match self {
            TradePhase::StoppingLoss | TradePhase::StoppingProfitA | TradePhase::StoppingProfitB => {
                true
            }
            TradePhase::Idle | TradePhase::Opening | TradePhase::Positioned => false,
        }
    }

    /// Side of the order a phase works, if any.
    pub fn order_side(self) -> Option<OrderSide> {
        match self {
            TradePhase::Opening => Some(OrderSide::OpenShort),
            TradePhase::StoppingLoss | TradePhase::StoppingProfitA | TradePhase::StoppingProfitB => {
                Some(OrderSide::CoverShort)
            }
            TradePhase::Idle | TradePhase::Positioned => None,
        }
    }

    /// Memo tag: `os` open short, `sl` stop loss, `sp` stop profit.
    pub fn memo_tag(self) -> &'static str {
        match self {
            TradePhase::Opening => "os",
            TradePhase::StoppingLoss => "sl",
            TradePhase::StoppingProfitA | TradePhase::StoppingProfitB => "sp",
            TradePhase::Idle | TradePhase::Positioned => "",
        }
    }
}

impl fmt::Display for TradePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradePhase::Idle => "Idle",
            TradePhase::Opening => "Opening",
            TradePhase::Positioned => "Positioned",
            TradePhase::StoppingLoss => "StoppingLoss",
            TradePhase::StoppingProfitA => "StoppingProfitA",
            TradePhase::StoppingProfitB => "StoppingProfitB",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    /// Sell to open a short lot.
    OpenShort,
    /// Buy to cover the short lot.
    CoverShort,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::OpenShort => f.write_str("open-short"),
            OrderSide::CoverShort => f.write_str("cover-short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(TradePhase::default(), TradePhase::Idle);
    }

    #[test]
    fn pending_order_phases() {
        let pending: Vec<_> = TradePhase::ALL
            .into_iter()
            .filter(|p| p.has_pending_order())
            .collect();
        assert_eq!(
            pending,
            vec![
                TradePhase::Opening,
                TradePhase::StoppingLoss,
                TradePhase::StoppingProfitA,
                TradePhase::StoppingProfitB,
            ]
        );
    }

    #[test]
    fn sides_follow_phase() {
        assert_eq!(TradePhase::Opening.order_side(), Some(OrderSide::OpenShort));
        assert_eq!(
            TradePhase::StoppingProfitB.order_side(),
            Some(OrderSide::CoverShort)
        );
        assert_eq!(TradePhase::Positioned.order_side(), None);
    }

    #[test]
    fn memo_tags() {
        assert_eq!(TradePhase::Opening.memo_tag(), "os");
        assert_eq!(TradePhase::StoppingLoss.memo_tag(), "sl");
        assert_eq!(TradePhase::StoppingProfitA.memo_tag(), "sp");
        assert_eq!(TradePhase::StoppingProfitB.memo_tag(), "sp");
    }

    #[test]
    fn display_names() {
        assert_eq!(TradePhase::StoppingProfitA.to_string(), "StoppingProfitA");
        assert_eq!(OrderSide::CoverShort.to_string(), "cover-short");
    }
}
