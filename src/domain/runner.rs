//! One evaluation cycle of the trading strategy.
//!
//! Steps:
//! 1. Market-hours gate (no broker calls outside the session)
//! 2. Fetch the portfolio; the cycle ends here if it is unavailable
//! 3. Sell review for every holding
//! 4. Buy review for every watchlist symbol not held, while below the
//!    position limit
//!
//! Errors for one symbol are logged and counted; they never abort the cycle
//! and never escape it.

use tracing::{debug, error, info, warn};

use crate::domain::analysis::Analysis;
use crate::domain::error::{GatewayError, Operation, TraderError};
use crate::domain::market_hours::is_market_open;
use crate::domain::order::{OrderRequest, OrderResult, OrderSide};
use crate::domain::portfolio::Portfolio;
use crate::domain::position::Holding;
use crate::domain::signal::{BuyConditions, SellConditions};
use crate::domain::sizing::position_size;
use crate::domain::strategy::Strategy;
use crate::ports::broker_port::BrokerPort;
use crate::ports::clock_port::ClockPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    MarketClosed,
    PortfolioUnavailable,
    Completed,
}

/// An order the cycle submitted and the broker answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub result: OrderResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub status: CycleStatus,
    pub executions: Vec<Execution>,
    /// Symbols whose review failed with a gateway error.
    pub errors: usize,
}

impl CycleReport {
    fn new(status: CycleStatus) -> Self {
        CycleReport {
            status,
            executions: Vec::new(),
            errors: 0,
        }
    }

    pub fn sells(&self) -> impl Iterator<Item = &Execution> {
        self.executions.iter().filter(|e| e.side == OrderSide::Sell)
    }

    pub fn buys(&self) -> impl Iterator<Item = &Execution> {
        self.executions.iter().filter(|e| e.side == OrderSide::Buy)
    }
}

pub struct StrategyRunner<'a, B, C> {
    broker: &'a B,
    clock: &'a C,
    strategy: &'a Strategy,
}

impl<'a, B, C> StrategyRunner<'a, B, C>
where
    B: BrokerPort,
    C: ClockPort,
{
    pub fn new(broker: &'a B, clock: &'a C, strategy: &'a Strategy) -> Self {
        StrategyRunner {
            broker,
            clock,
            strategy,
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        if !is_market_open(self.clock.now()) {
            info!("market closed, skipping cycle");
            return CycleReport::new(CycleStatus::MarketClosed);
        }

        info!("strategy cycle started");

        let portfolio = match self.portfolio().await {
            Ok(Some(p)) => p,
            Ok(None) => {
                error!("portfolio unavailable, ending cycle");
                return CycleReport::new(CycleStatus::PortfolioUnavailable);
            }
            Err(e) => {
                error!(error = %e, "portfolio fetch failed, ending cycle");
                return CycleReport::new(CycleStatus::PortfolioUnavailable);
            }
        };

        info!(
            cash = portfolio.cash,
            positions = portfolio.position_count(),
            "portfolio loaded"
        );

        let mut report = CycleReport::new(CycleStatus::Completed);
        self.review_holdings(&portfolio, &mut report).await;
        self.review_watchlist(portfolio, &mut report).await;

        info!(
            orders = report.executions.len(),
            errors = report.errors,
            "strategy cycle finished"
        );
        report
    }

    /// Fresh portfolio view from the broker.
    pub async fn portfolio(&self) -> Result<Option<Portfolio>, GatewayError> {
        Ok(self.broker.balance().await?.map(Portfolio::from_balance))
    }

    /// Quote plus chart history reduced to an [`Analysis`]. `None` when the
    /// broker declined either request.
    pub async fn analyze(&self, symbol: &str) -> Result<Option<Analysis>, GatewayError> {
        Ok(self.load_analysis(symbol).await?.ok())
    }

    /// Like [`analyze`](Self::analyze), but a declined request is an error
    /// naming the operation the broker refused.
    pub async fn analysis_report(&self, symbol: &str) -> Result<Analysis, TraderError> {
        self.load_analysis(symbol)
            .await?
            .map_err(|operation| TraderError::Rejected {
                operation,
                message: "broker declined the request (see log)".to_string(),
            })
    }

    async fn load_analysis(
        &self,
        symbol: &str,
    ) -> Result<Result<Analysis, Operation>, GatewayError> {
        let Some(quote) = self.broker.current_price(symbol).await? else {
            return Ok(Err(Operation::CurrentPrice));
        };

        let Some(bars) = self
            .broker
            .chart_data(
                symbol,
                self.strategy.chart_period,
                self.strategy.chart_count,
            )
            .await?
        else {
            return Ok(Err(Operation::ChartData));
        };

        Ok(Ok(Analysis::from_market(&quote, &bars)))
    }

    async fn review_holdings(&self, portfolio: &Portfolio, report: &mut CycleReport) {
        for holding in portfolio.holdings.values() {
            if let Err(e) = self.review_holding(holding, report).await {
                report.errors += 1;
                error!(symbol = %holding.symbol, error = %e, "sell review failed");
            }
        }
    }

    async fn review_holding(
        &self,
        holding: &Holding,
        report: &mut CycleReport,
    ) -> Result<(), GatewayError> {
        let Some(analysis) = self.analyze(&holding.symbol).await? else {
            warn!(symbol = %holding.symbol, "analysis unavailable");
            return Ok(());
        };

        let conditions = SellConditions::evaluate(
            &analysis,
            holding,
            self.strategy.stop_loss_ratio,
            self.strategy.take_profit_ratio,
        );
        if !conditions.triggered() {
            debug!(symbol = %holding.symbol, "hold");
            return Ok(());
        }

        info!(
            symbol = %holding.symbol,
            reasons = ?conditions.reasons(),
            price = analysis.current_price,
            buy_price = holding.buy_price,
            "sell signal"
        );

        let order = OrderRequest::market(&holding.symbol, holding.quantity, OrderSide::Sell);
        let outcome = self.submit(order, report).await;
        if outcome.as_ref().is_ok_and(|r| r.success) {
            info!(
                symbol = %holding.symbol,
                quantity = holding.quantity,
                pnl = holding.unrealized_pnl,
                "position closed"
            );
        }
        self.pause().await;
        outcome.map(|_| ())
    }

    async fn review_watchlist(&self, mut portfolio: Portfolio, report: &mut CycleReport) {
        for symbol in &self.strategy.watchlist {
            if !self.may_open(&portfolio, symbol) {
                continue;
            }
            match self.review_candidate(symbol, &mut portfolio, report).await {
                Ok(()) => {}
                Err(e) => {
                    report.errors += 1;
                    error!(symbol = %symbol, error = %e, "buy review failed");
                }
            }
        }
    }

    fn may_open(&self, portfolio: &Portfolio, symbol: &str) -> bool {
        if portfolio.has_holding(symbol) {
            debug!(symbol, "already held");
            return false;
        }
        if portfolio.position_count() >= self.strategy.max_position_count {
            info!(
                symbol,
                max = self.strategy.max_position_count,
                "position limit reached"
            );
            return false;
        }
        true
    }

    async fn review_candidate(
        &self,
        symbol: &str,
        portfolio: &mut Portfolio,
        report: &mut CycleReport,
    ) -> Result<(), GatewayError> {
        let Some(analysis) = self.analyze(symbol).await? else {
            warn!(symbol, "analysis unavailable");
            return Ok(());
        };

        let Some(conditions) = BuyConditions::evaluate(&analysis) else {
            debug!(symbol, "insufficient history for entry");
            return Ok(());
        };
        if !conditions.triggered() {
            debug!(symbol, met = conditions.met(), "no entry");
            return Ok(());
        }

        info!(
            symbol,
            met = conditions.met(),
            price = analysis.current_price,
            rsi = ?analysis.rsi,
            volume_ratio = analysis.volume_ratio,
            "buy signal"
        );

        let outcome = self.open_position(symbol, &analysis, portfolio, report).await;
        self.pause().await;
        outcome
    }

    /// Re-reads the portfolio before sizing so that orders placed earlier in
    /// the cycle are reflected in cash and position count.
    async fn open_position(
        &self,
        symbol: &str,
        analysis: &Analysis,
        portfolio: &mut Portfolio,
        report: &mut CycleReport,
    ) -> Result<(), GatewayError> {
        match self.portfolio().await? {
            Some(fresh) => *portfolio = fresh,
            None => {
                warn!(symbol, "portfolio unavailable, skipping buy");
                return Ok(());
            }
        }
        if !self.may_open(portfolio, symbol) {
            return Ok(());
        }

        let quantity = position_size(
            analysis.current_price,
            portfolio.cash,
            self.strategy.max_invest_ratio,
            self.strategy.max_position_count,
        );
        if quantity == 0 {
            info!(symbol, cash = portfolio.cash, "order quantity is zero, skipping buy");
            return Ok(());
        }

        let order = OrderRequest::market(symbol, quantity, OrderSide::Buy);
        self.submit(order, report).await.map(|_| ())
    }

    async fn submit(
        &self,
        order: OrderRequest,
        report: &mut CycleReport,
    ) -> Result<OrderResult, GatewayError> {
        let result = self.broker.submit_order(&order).await?;

        if result.success {
            info!(
                symbol = %order.symbol,
                side = %order.side,
                quantity = order.quantity,
                order_no = ?result.order_no,
                "order accepted"
            );
        } else {
            error!(
                symbol = %order.symbol,
                side = %order.side,
                quantity = order.quantity,
                message = %result.message,
                "order rejected"
            );
        }

        report.executions.push(Execution {
            symbol: order.symbol,
            side: order.side,
            quantity: order.quantity,
            result: result.clone(),
        });
        Ok(result)
    }

    async fn pause(&self) {
        if !self.strategy.order_delay.is_zero() {
            tokio::time::sleep(self.strategy.order_delay).await;
        }
    }
}
