//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http::{ReqwestTransport, RetryPolicy};
use crate::adapters::kis::auth::{Account, Environment, KisCredentials};
use crate::adapters::kis::{KisBroker, KisConfig};
use crate::adapters::system_clock::LocalClock;
use crate::domain::analysis::Analysis;
use crate::domain::config_validation::{
    validate_api_config, validate_schedule_config, validate_trading_config,
};
use crate::domain::error::{Operation, TraderError};
use crate::domain::market_hours::{MARKET_CLOSE, MARKET_OPEN, is_market_open};
use crate::domain::portfolio::Portfolio;
use crate::domain::runner::{CycleReport, CycleStatus, StrategyRunner};
use crate::domain::scheduler::{Schedule, run_scheduled};
use crate::domain::signal::BuyConditions;
use crate::domain::strategy::{ChartPeriod, Strategy};
use crate::domain::watchlist::parse_watchlist;
use crate::ports::broker_port::BrokerPort;
use crate::ports::clock_port::ClockPort;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(
    name = "kistrader",
    about = "Rule-based equity trader for the KIS Open API"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "config.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a single strategy cycle
    Run,
    /// Run strategy cycles on the configured interval until Ctrl-C
    Schedule,
    /// Show cash, holdings and unrealized P&L
    Portfolio,
    /// Analyze one symbol and show its buy conditions
    Analyze {
        #[arg(long)]
        code: String,
    },
    /// Show current price and change rate for every watchlist symbol
    Watchlist,
    /// Show whether the market is open now
    MarketStatus,
    /// Validate the configuration file
    Validate,
}

pub async fn run(cli: Cli) -> ExitCode {
    let result = match &cli.command {
        Command::MarketStatus => {
            print_market_status(&LocalClock);
            Ok(())
        }
        Command::Validate => run_validate(&cli.config),
        command => run_connected(&cli.config, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads and validates every config section.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderError> {
    let adapter = FileConfigAdapter::load(path)?;
    validate_api_config(&adapter)?;
    validate_trading_config(&adapter)?;
    validate_schedule_config(&adapter)?;
    Ok(adapter)
}

fn run_validate(path: &Path) -> Result<(), TraderError> {
    eprintln!("Validating config {}", path.display());
    let adapter = load_config(path)?;
    let strategy = build_strategy(&adapter)?;
    let kis = build_kis_config(&adapter)?;

    println!("Config OK");
    println!("  Server:         {}", kis.environment);
    println!("  Watchlist:      {}", strategy.watchlist.join(", "));
    println!("  Max positions:  {}", strategy.max_position_count);
    println!("  Invest ratio:   {:.2}", strategy.max_invest_ratio);
    println!("  Stop loss:      {:.2}%", strategy.stop_loss_ratio * 100.0);
    println!("  Take profit:    {:.2}%", strategy.take_profit_ratio * 100.0);
    Ok(())
}

async fn run_connected(path: &Path, command: &Command) -> Result<(), TraderError> {
    let adapter = load_config(path)?;
    let strategy = build_strategy(&adapter)?;
    let schedule = build_schedule(&adapter)?;
    let kis = build_kis_config(&adapter)?;

    info!(server = %kis.environment, "connecting to broker");
    let broker = KisBroker::connect(ReqwestTransport::new(), kis).await?;
    let clock = LocalClock;
    let runner = StrategyRunner::new(&broker, &clock, &strategy);

    match command {
        Command::Run => {
            log_balance_summary(&runner).await;
            let report = runner.run_cycle().await;
            print_cycle_report(&report);
            Ok(())
        }
        Command::Schedule => {
            log_balance_summary(&runner).await;
            run_schedule(&runner, schedule).await;
            Ok(())
        }
        Command::Portfolio => {
            let portfolio = runner
                .portfolio()
                .await?
                .ok_or_else(|| rejected(Operation::Balance))?;
            print_portfolio(&portfolio);
            Ok(())
        }
        Command::Analyze { code } => {
            let symbol = parse_symbol(code)?;
            let analysis = runner.analysis_report(&symbol).await?;
            print_analysis(&analysis);
            Ok(())
        }
        Command::Watchlist => {
            print_watchlist(&broker, &strategy.watchlist).await;
            Ok(())
        }
        Command::MarketStatus | Command::Validate => Ok(()),
    }
}

fn rejected(operation: Operation) -> TraderError {
    TraderError::Rejected {
        operation,
        message: "broker declined the request (see log)".to_string(),
    }
}

fn parse_symbol(code: &str) -> Result<String, TraderError> {
    let mut symbols = parse_watchlist(code).map_err(|e| TraderError::ConfigInvalid {
        section: "cli".into(),
        key: "code".into(),
        reason: e.to_string(),
    })?;
    match symbols.len() {
        1 => Ok(symbols.remove(0)),
        _ => Err(TraderError::ConfigInvalid {
            section: "cli".into(),
            key: "code".into(),
            reason: "expected exactly one symbol".into(),
        }),
    }
}

async fn run_schedule<B, C>(runner: &StrategyRunner<'_, B, C>, schedule: Schedule)
where
    B: BrokerPort,
    C: ClockPort,
{
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
            std::future::pending::<()>().await;
        }
    };

    let runs = run_scheduled(
        schedule,
        move || async move {
            let report = runner.run_cycle().await;
            if report.status == CycleStatus::Completed {
                info!(
                    sells = report.sells().count(),
                    buys = report.buys().count(),
                    errors = report.errors,
                    "cycle summary"
                );
            }
        },
        shutdown,
    )
    .await;

    info!(runs, "trader stopped");
}

async fn log_balance_summary<B: BrokerPort, C: ClockPort>(runner: &StrategyRunner<'_, B, C>) {
    match runner.portfolio().await {
        Ok(Some(portfolio)) => info!(
            cash = portfolio.cash,
            positions = portfolio.position_count(),
            total_value = portfolio.total_value(),
            unrealized_pnl = portfolio.total_unrealized_pnl(),
            "account balance"
        ),
        Ok(None) => warn!("account balance unavailable"),
        Err(e) => warn!(error = %e, "account balance unavailable"),
    }
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, TraderError> {
    let defaults = Strategy::default();

    let watchlist_str =
        adapter
            .get_string("trading", "watchlist")
            .ok_or_else(|| TraderError::ConfigMissing {
                section: "trading".into(),
                key: "watchlist".into(),
            })?;
    let watchlist = parse_watchlist(&watchlist_str).map_err(|e| TraderError::ConfigInvalid {
        section: "trading".into(),
        key: "watchlist".into(),
        reason: e.to_string(),
    })?;

    let chart_period = match adapter.get_string("trading", "chart_period") {
        Some(code) => ChartPeriod::parse(&code).ok_or_else(|| TraderError::ConfigInvalid {
            section: "trading".into(),
            key: "chart_period".into(),
            reason: format!("unknown period {code:?}"),
        })?,
        None => defaults.chart_period,
    };

    let order_delay_secs = adapter.get_double(
        "trading",
        "order_delay_seconds",
        defaults.order_delay.as_secs_f64(),
    );
    let order_delay =
        Duration::try_from_secs_f64(order_delay_secs).map_err(|e| TraderError::ConfigInvalid {
            section: "trading".into(),
            key: "order_delay_seconds".into(),
            reason: e.to_string(),
        })?;

    Ok(Strategy {
        watchlist,
        max_position_count: positive_int(
            adapter,
            "trading",
            "max_position_count",
            defaults.max_position_count as i64,
        )? as usize,
        max_invest_ratio: adapter.get_double(
            "trading",
            "max_invest_ratio",
            defaults.max_invest_ratio,
        ),
        stop_loss_ratio: adapter.get_double("trading", "stop_loss_ratio", defaults.stop_loss_ratio),
        take_profit_ratio: adapter.get_double(
            "trading",
            "take_profit_ratio",
            defaults.take_profit_ratio,
        ),
        chart_period,
        chart_count: positive_int(
            adapter,
            "trading",
            "chart_count",
            defaults.chart_count as i64,
        )? as usize,
        order_delay,
    })
}

pub fn build_schedule(adapter: &dyn ConfigPort) -> Result<Schedule, TraderError> {
    let interval_minutes = positive_int(adapter, "schedule", "interval_minutes", 5)?;
    let poll_seconds = positive_int(adapter, "schedule", "poll_seconds", 1)?;
    Ok(Schedule {
        interval: Duration::from_secs(interval_minutes * 60),
        poll: Duration::from_secs(poll_seconds),
    })
}

pub fn build_kis_config(adapter: &dyn ConfigPort) -> Result<KisConfig, TraderError> {
    let required = |key: &str| {
        adapter
            .get_string("api", key)
            .ok_or_else(|| TraderError::ConfigMissing {
                section: "api".into(),
                key: key.into(),
            })
    };

    let account_no = required("account_no")?;
    let account = Account::parse(&account_no).ok_or_else(|| TraderError::ConfigInvalid {
        section: "api".into(),
        key: "account_no".into(),
        reason: "account_no must look like 12345678-01".into(),
    })?;

    let credentials = KisCredentials {
        app_key: required("app_key")?,
        app_secret: required("app_secret")?,
        account,
    };

    let environment = Environment::from_is_real(adapter.get_bool("api", "is_real", false));
    let mut config = KisConfig::new(credentials, environment);
    if let Some(base_url) = adapter.get_string("api", "base_url") {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    config.timeout = Duration::from_secs(positive_int(adapter, "api", "timeout_seconds", 30)?);
    config.retry = RetryPolicy::new(positive_int(adapter, "api", "max_retries", 3)? as u32);
    Ok(config)
}

fn positive_int(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<u64, TraderError> {
    let value = adapter.get_int(section, key, default);
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| TraderError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{key} must be at least 1"),
        })
}

fn print_market_status(clock: &dyn ClockPort) {
    let now = clock.now();
    let state = if is_market_open(now) { "OPEN" } else { "CLOSED" };
    println!("Market:  {state}");
    println!("Now:     {}", now.format("%Y-%m-%d %H:%M:%S (%a)"));
    println!(
        "Session: Mon-Fri {:02}:{:02} - {:02}:{:02}",
        MARKET_OPEN.0, MARKET_OPEN.1, MARKET_CLOSE.0, MARKET_CLOSE.1
    );
}

fn print_cycle_report(report: &CycleReport) {
    match report.status {
        CycleStatus::MarketClosed => {
            println!("Market closed; no orders evaluated.");
            return;
        }
        CycleStatus::PortfolioUnavailable => {
            println!("Portfolio unavailable; cycle skipped.");
            return;
        }
        CycleStatus::Completed => {}
    }

    println!(
        "Cycle complete: {} order(s), {} error(s)",
        report.executions.len(),
        report.errors
    );
    for e in &report.executions {
        let outcome = if e.result.success {
            format!("accepted #{}", e.result.order_no.as_deref().unwrap_or("-"))
        } else {
            format!("rejected: {}", e.result.message)
        };
        println!("  {:<4} {:<8} x{:<6} {}", e.side, e.symbol, e.quantity, outcome);
    }
}

fn print_portfolio(portfolio: &Portfolio) {
    println!("Cash:        {:>14}", portfolio.cash);
    println!("Total value: {:>14}", portfolio.total_value());
    println!("Positions:   {:>14}", portfolio.position_count());
    println!("Unrealized:  {:>14}", portfolio.total_unrealized_pnl());

    if portfolio.holdings.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<8} {:<20} {:>8} {:>12} {:>14} {:>12} {:>8}",
        "Symbol", "Name", "Qty", "Avg Price", "Value", "P&L", "P&L %"
    );
    for h in portfolio.holdings.values() {
        println!(
            "{:<8} {:<20} {:>8} {:>12.0} {:>14} {:>12} {:>7.2}%",
            h.symbol,
            h.name,
            h.quantity,
            h.buy_price,
            h.current_value,
            h.unrealized_pnl,
            h.pnl_percent()
        );
    }
}

fn print_analysis(analysis: &Analysis) {
    fn opt(value: Option<f64>) -> String {
        value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
    }

    println!("Symbol:        {}", analysis.symbol);
    println!("Price:         {}", analysis.current_price);
    println!("Change:        {:.2}%", analysis.change_rate);
    println!("Volume:        {}", analysis.volume);
    println!("Avg volume:    {:.0}", analysis.avg_volume);
    println!("Volume ratio:  {:.2}", analysis.volume_ratio);
    println!("MA5:           {}", opt(analysis.ma5));
    println!("MA20:          {}", opt(analysis.ma20));
    println!("RSI:           {}", opt(analysis.rsi));

    match BuyConditions::evaluate(analysis) {
        Some(c) => {
            println!();
            println!("Golden cross:    {}", c.golden_cross);
            println!("RSI in range:    {}", c.rsi_in_range);
            println!("Volume surge:    {}", c.volume_surge);
            println!("Limited decline: {}", c.limited_decline);
            let signal = if c.triggered() { "BUY" } else { "NONE" };
            println!("Buy signal:      {signal} ({}/4)", c.met());
        }
        None => println!("Buy signal:    n/a (insufficient history)"),
    }
}

async fn print_watchlist<B: BrokerPort>(broker: &B, watchlist: &[String]) {
    println!("{:<8} {:>10} {:>8} {:>14}", "Symbol", "Price", "Change", "Volume");
    for symbol in watchlist {
        match broker.current_price(symbol).await {
            Ok(Some(q)) => println!(
                "{:<8} {:>10} {:>7.2}% {:>14}",
                q.symbol, q.current_price, q.change_rate, q.volume
            ),
            Ok(None) => println!("{symbol:<8} {:>10}", "unavailable"),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "quote failed");
                println!("{symbol:<8} {:>10}", "error");
            }
        }
    }
}
