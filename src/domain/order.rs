//! Order requests and results.
//!
//! A price of zero is reserved for market orders; any positive price is a
//! limit order. There is no way to express "limit at 0".

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub quantity: u64,
    /// 0 for a market order, otherwise the limit price.
    pub price: u64,
    pub side: OrderSide,
}

impl OrderRequest {
    pub fn market(symbol: &str, quantity: u64, side: OrderSide) -> Self {
        OrderRequest {
            symbol: symbol.to_string(),
            quantity,
            price: 0,
            side,
        }
    }

    pub fn limit(symbol: &str, quantity: u64, price: u64, side: OrderSide) -> Self {
        OrderRequest {
            symbol: symbol.to_string(),
            quantity,
            price,
            side,
        }
    }

    pub fn kind(&self) -> OrderKind {
        match self.price {
            0 => OrderKind::Market,
            price => OrderKind::Limit(price),
        }
    }
}

/// Terminal outcome of a submitted order. `order_no` is present iff `success`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResult {
    pub success: bool,
    pub order_no: Option<String>,
    pub message: String,
}

impl OrderResult {
    pub fn accepted(order_no: impl Into<String>, message: impl Into<String>) -> Self {
        OrderResult {
            success: true,
            order_no: Some(order_no.into()),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        OrderResult {
            success: false,
            order_no: None,
            message: message.into(),
        }
    }
}
