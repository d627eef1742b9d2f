//! Broker-reported holdings.

/// One holding line as reported by the broker, quantity possibly zero
/// (positions sold earlier in the session are still listed).
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    pub buy_price: f64,
    pub current_value: i64,
    pub unrealized_pnl: i64,
}

/// An open position. Quantity is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub quantity: u64,
    /// Average purchase price.
    pub buy_price: f64,
    pub current_value: i64,
    pub unrealized_pnl: i64,
}

impl Holding {
    /// `None` unless the record has a positive quantity.
    pub fn from_record(record: HoldingRecord) -> Option<Self> {
        let quantity = u64::try_from(record.quantity).ok().filter(|&q| q > 0)?;
        Some(Holding {
            symbol: record.symbol,
            name: record.name,
            quantity,
            buy_price: record.buy_price,
            current_value: record.current_value,
            unrealized_pnl: record.unrealized_pnl,
        })
    }

    /// (current - buy) / buy, as a fraction. 0 when the buy price is unknown.
    pub fn profit_rate(&self, current_price: i64) -> f64 {
        if self.buy_price <= 0.0 {
            return 0.0;
        }
        (current_price as f64 - self.buy_price) / self.buy_price
    }

    /// Broker-reported P&L as a percentage of cost basis.
    pub fn pnl_percent(&self) -> f64 {
        let cost = self.buy_price * self.quantity as f64;
        if cost <= 0.0 {
            return 0.0;
        }
        self.unrealized_pnl as f64 / cost * 100.0
    }
}
