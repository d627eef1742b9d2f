//! Configuration validation.
//!
//! Validates all config fields before the trader connects to the broker.

use crate::domain::error::TraderError;
use crate::domain::strategy::ChartPeriod;
use crate::domain::watchlist::parse_watchlist;
use crate::ports::config_port::ConfigPort;

pub const PLACEHOLDER_APP_KEY: &str = "YOUR_APP_KEY";
pub const PLACEHOLDER_APP_SECRET: &str = "YOUR_APP_SECRET";
pub const MAX_CHART_COUNT: i64 = 100;

pub fn validate_api_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_credential(config, "app_key", PLACEHOLDER_APP_KEY)?;
    validate_credential(config, "app_secret", PLACEHOLDER_APP_SECRET)?;
    validate_account_no(config)?;
    validate_base_url(config)?;
    validate_positive_int(config, "api", "timeout_seconds", 30)?;
    validate_positive_int(config, "api", "max_retries", 3)?;
    Ok(())
}

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_watchlist(config)?;
    validate_positive_int(config, "trading", "max_position_count", 5)?;
    validate_ratio(config, "max_invest_ratio", 0.8)?;
    validate_ratio(config, "stop_loss_ratio", 0.05)?;
    validate_take_profit(config)?;
    validate_chart(config)?;
    validate_order_delay(config)?;
    Ok(())
}

pub fn validate_schedule_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_positive_int(config, "schedule", "interval_minutes", 5)?;
    validate_positive_int(config, "schedule", "poll_seconds", 1)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_credential(
    config: &dyn ConfigPort,
    key: &str,
    placeholder: &str,
) -> Result<(), TraderError> {
    match config.get_string("api", key) {
        Some(v) if v.trim() == placeholder => {
            Err(invalid("api", key, format!("{key} is still the placeholder value")))
        }
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(TraderError::ConfigMissing {
            section: "api".to_string(),
            key: key.to_string(),
        }),
    }
}

/// Account numbers look like `12345678-01`.
pub fn is_valid_account_no(value: &str) -> bool {
    match value.trim().split_once('-') {
        Some((cano, product)) => {
            cano.len() == 8
                && product.len() == 2
                && cano.chars().all(|c| c.is_ascii_digit())
                && product.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn validate_account_no(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("api", "account_no") {
        Some(v) if is_valid_account_no(&v) => Ok(()),
        Some(_) => Err(invalid(
            "api",
            "account_no",
            "account_no must look like 12345678-01",
        )),
        None => Err(TraderError::ConfigMissing {
            section: "api".to_string(),
            key: "account_no".to_string(),
        }),
    }
}

fn validate_base_url(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("api", "base_url") {
        Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => Err(
            invalid("api", "base_url", "base_url must start with http:// or https://"),
        ),
        _ => Ok(()),
    }
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), TraderError> {
    if config.get_int(section, key, default) < 1 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(())
}

fn validate_watchlist(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("trading", "watchlist") {
        Some(list) => parse_watchlist(&list)
            .map(|_| ())
            .map_err(|e| invalid("trading", "watchlist", e.to_string())),
        None => Err(TraderError::ConfigMissing {
            section: "trading".to_string(),
            key: "watchlist".to_string(),
        }),
    }
}

fn validate_ratio(config: &dyn ConfigPort, key: &str, default: f64) -> Result<(), TraderError> {
    let value = config.get_double("trading", key, default);
    if value <= 0.0 || value > 1.0 {
        return Err(invalid("trading", key, format!("{key} must be in (0, 1]")));
    }
    Ok(())
}

fn validate_take_profit(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("trading", "take_profit_ratio", 0.1);
    if value <= 0.0 {
        return Err(invalid(
            "trading",
            "take_profit_ratio",
            "take_profit_ratio must be positive",
        ));
    }
    Ok(())
}

fn validate_chart(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(period) = config.get_string("trading", "chart_period") {
        if ChartPeriod::parse(&period).is_none() {
            return Err(invalid(
                "trading",
                "chart_period",
                "chart_period must be one of D, W, M",
            ));
        }
    }

    let count = config.get_int("trading", "chart_count", 30);
    if !(1..=MAX_CHART_COUNT).contains(&count) {
        return Err(invalid(
            "trading",
            "chart_count",
            format!("chart_count must be between 1 and {MAX_CHART_COUNT}"),
        ));
    }
    Ok(())
}

fn validate_order_delay(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_double("trading", "order_delay_seconds", 1.0) < 0.0 {
        return Err(invalid(
            "trading",
            "order_delay_seconds",
            "order_delay_seconds must be non-negative",
        ));
    }
    Ok(())
}
