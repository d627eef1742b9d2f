//! Broker access port trait.
//!
//! `Ok(None)` means the broker answered but declined the request (business
//! status other than success, or a non-2xx HTTP status); the reason has
//! already been logged. `Err` is reserved for transport failures and
//! payloads that could not be parsed.

use crate::domain::error::GatewayError;
use crate::domain::ohlcv::{OhlcvBar, Quote};
use crate::domain::order::{OrderRequest, OrderResult};
use crate::domain::portfolio::BalanceSnapshot;
use crate::domain::strategy::ChartPeriod;

pub trait BrokerPort {
    fn current_price(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<Option<Quote>, GatewayError>>;

    /// Up to `count` most recent bars, oldest first.
    fn chart_data(
        &self,
        symbol: &str,
        period: ChartPeriod,
        count: usize,
    ) -> impl Future<Output = Result<Option<Vec<OhlcvBar>>, GatewayError>>;

    fn balance(&self) -> impl Future<Output = Result<Option<BalanceSnapshot>, GatewayError>>;

    /// Not idempotent: a received response, accepted or rejected, is final.
    fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderResult, GatewayError>>;
}
