#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use kistrader::domain::error::{GatewayError, TransportError, TransportFailure};
pub use kistrader::domain::ohlcv::{OhlcvBar, Quote};
use kistrader::domain::order::{OrderRequest, OrderResult, OrderSide};
use kistrader::domain::portfolio::BalanceSnapshot;
pub use kistrader::domain::position::HoldingRecord;
use kistrader::domain::strategy::{ChartPeriod, Strategy};
use kistrader::ports::broker_port::BrokerPort;
use kistrader::ports::clock_port::ClockPort;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

/// In-memory broker. Accepted orders are applied to the held balance so a
/// refreshed portfolio reflects earlier fills.
pub struct MockBroker {
    pub quotes: HashMap<String, Quote>,
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub balance: RefCell<Option<BalanceSnapshot>>,
    pub failing: HashSet<String>,
    pub declined: HashSet<String>,
    pub order_results: RefCell<VecDeque<OrderResult>>,
    pub orders: RefCell<Vec<OrderRequest>>,
    pub price_calls: Cell<usize>,
    pub chart_calls: Cell<usize>,
    pub balance_calls: Cell<usize>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            bars: HashMap::new(),
            balance: RefCell::new(None),
            failing: HashSet::new(),
            declined: HashSet::new(),
            order_results: RefCell::new(VecDeque::new()),
            orders: RefCell::new(Vec::new()),
            price_calls: Cell::new(0),
            chart_calls: Cell::new(0),
            balance_calls: Cell::new(0),
        }
    }

    pub fn with_balance(self, cash: i64, holdings: Vec<HoldingRecord>) -> Self {
        *self.balance.borrow_mut() = Some(BalanceSnapshot { cash, holdings });
        self
    }

    pub fn with_market(mut self, symbol: &str, price: i64, volume: i64, bars: Vec<OhlcvBar>) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                current_price: price,
                change_rate: 1.0,
                volume,
            },
        );
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    /// Quote requests for `symbol` fail at the transport level.
    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    /// Quote requests for `symbol` are declined by the broker.
    pub fn with_declined(mut self, symbol: &str) -> Self {
        self.declined.insert(symbol.to_string());
        self
    }

    pub fn with_order_result(self, result: OrderResult) -> Self {
        self.order_results.borrow_mut().push_back(result);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.price_calls.get()
            + self.chart_calls.get()
            + self.balance_calls.get()
            + self.orders.borrow().len()
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.orders.borrow().clone()
    }

    fn apply_fill(&self, order: &OrderRequest) {
        let mut balance = self.balance.borrow_mut();
        let Some(snapshot) = balance.as_mut() else {
            return;
        };
        let price = self
            .quotes
            .get(&order.symbol)
            .map(|q| q.current_price)
            .unwrap_or_default();
        let qty = order.quantity as i64;

        match order.side {
            OrderSide::Buy => {
                snapshot.cash -= price * qty;
                snapshot.holdings.push(holding(&order.symbol, qty, price as f64));
            }
            OrderSide::Sell => {
                snapshot.cash += price * qty;
                snapshot.holdings.retain(|h| h.symbol != order.symbol);
            }
        }
    }
}

fn transport_failure() -> GatewayError {
    GatewayError::Transport(TransportFailure {
        cause: TransportError::ReadTimeout("timed out".into()),
        attempts: 3,
    })
}

impl BrokerPort for MockBroker {
    async fn current_price(&self, symbol: &str) -> Result<Option<Quote>, GatewayError> {
        self.price_calls.set(self.price_calls.get() + 1);
        if self.failing.contains(symbol) {
            return Err(transport_failure());
        }
        if self.declined.contains(symbol) {
            return Ok(None);
        }
        Ok(self.quotes.get(symbol).cloned())
    }

    async fn chart_data(
        &self,
        symbol: &str,
        _period: ChartPeriod,
        count: usize,
    ) -> Result<Option<Vec<OhlcvBar>>, GatewayError> {
        self.chart_calls.set(self.chart_calls.get() + 1);
        Ok(self.bars.get(symbol).map(|bars| {
            let start = bars.len().saturating_sub(count);
            bars[start..].to_vec()
        }))
    }

    async fn balance(&self) -> Result<Option<BalanceSnapshot>, GatewayError> {
        self.balance_calls.set(self.balance_calls.get() + 1);
        Ok(self.balance.borrow().clone())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult, GatewayError> {
        self.orders.borrow_mut().push(order.clone());
        let result = self
            .order_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| OrderResult::accepted("0000000001", "accepted"));
        if result.success {
            self.apply_fill(order);
        }
        Ok(result)
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl ClockPort for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Monday 2024-01-15 10:00, inside the session.
pub fn market_open() -> FixedClock {
    FixedClock(at("2024-01-15 10:00"))
}

/// Saturday 2024-01-13 10:00.
pub fn weekend() -> FixedClock {
    FixedClock(at("2024-01-13 10:00"))
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

pub fn holding(symbol: &str, quantity: i64, buy_price: f64) -> HoldingRecord {
    HoldingRecord {
        symbol: symbol.to_string(),
        name: format!("{symbol} Co"),
        quantity,
        buy_price,
        current_value: (buy_price as i64) * quantity,
        unrealized_pnl: 0,
    }
}

pub fn make_bars(closes: &[i64], volume: i64) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

/// Uptrend that alternates +200 / -100: short MA above long MA and an RSI
/// of about 66.7.
pub fn uptrend_bars(count: usize) -> Vec<OhlcvBar> {
    let mut closes = Vec::with_capacity(count);
    let mut close = 50_000;
    for i in 0..count {
        closes.push(close);
        close += if i % 2 == 0 { 200 } else { -100 };
    }
    make_bars(&closes, 1_000)
}

/// No movement at all: RSI pinned at 100 and no crossover.
pub fn flat_bars(count: usize) -> Vec<OhlcvBar> {
    make_bars(&vec![50_000; count], 1_000)
}

pub fn strategy(watchlist: &[&str]) -> Strategy {
    Strategy {
        watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
        ..Strategy::default()
    }
}

pub fn strategy_without_delay(watchlist: &[&str]) -> Strategy {
    Strategy {
        order_delay: Duration::ZERO,
        ..strategy(watchlist)
    }
}
