//! KIS Open API wire types.
//!
//! The broker sends every number as a string; the `de_str` helpers coerce
//! them at this boundary so nothing past the gateway sees raw strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ohlcv::{OhlcvBar, Quote};
use crate::domain::position::HoldingRecord;

/// Deserialize a numeric `String` as the desired type.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let data: String = Deserialize::deserialize(deserializer)?;
    data.trim().parse::<T>().map_err(serde::de::Error::custom)
}

/// Deserialize a `YYYYMMDD` string as a [`NaiveDate`].
pub fn de_yyyymmdd<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let data: String = Deserialize::deserialize(deserializer)?;
    NaiveDate::parse_from_str(data.trim(), "%Y%m%d").map_err(serde::de::Error::custom)
}

/// Business status carried by every non-token response. `rt_cd == "0"` is
/// success; `msg1` explains anything else.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessStatus {
    #[serde(default)]
    pub rt_cd: String,
    #[serde(default)]
    pub msg_cd: String,
    #[serde(default)]
    pub msg1: String,
}

impl BusinessStatus {
    pub fn is_success(&self) -> bool {
        self.rt_cd == "0"
    }

    pub fn message(&self) -> String {
        self.msg1.trim().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub appkey: &'a str,
    pub appsecret: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub access_token_token_expired: Option<String>,
}

/// Error body of a rejected token request.
#[derive(Debug, Default, Deserialize)]
pub struct TokenError {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_description: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    pub output: PriceOutput,
}

#[derive(Debug, Deserialize)]
pub struct PriceOutput {
    #[serde(deserialize_with = "de_str")]
    pub stck_prpr: i64,
    #[serde(deserialize_with = "de_str")]
    pub prdy_ctrt: f64,
    #[serde(deserialize_with = "de_str")]
    pub acml_vol: i64,
}

impl PriceOutput {
    pub fn into_quote(self, symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            current_price: self.stck_prpr,
            change_rate: self.prdy_ctrt,
            volume: self.acml_vol,
        }
    }
}

/// Newest bar first, as sent by the broker.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub output2: Vec<ChartBar>,
}

#[derive(Debug, Deserialize)]
pub struct ChartBar {
    #[serde(deserialize_with = "de_yyyymmdd")]
    pub stck_bsop_date: NaiveDate,
    #[serde(deserialize_with = "de_str")]
    pub stck_oprc: i64,
    #[serde(deserialize_with = "de_str")]
    pub stck_hgpr: i64,
    #[serde(deserialize_with = "de_str")]
    pub stck_lwpr: i64,
    #[serde(deserialize_with = "de_str")]
    pub stck_clpr: i64,
    #[serde(deserialize_with = "de_str")]
    pub acml_vol: i64,
}

impl From<ChartBar> for OhlcvBar {
    fn from(bar: ChartBar) -> Self {
        OhlcvBar {
            date: bar.stck_bsop_date,
            open: bar.stck_oprc,
            high: bar.stck_hgpr,
            low: bar.stck_lwpr,
            close: bar.stck_clpr,
            volume: bar.acml_vol,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub output1: Vec<BalanceHolding>,
    #[serde(default)]
    pub output2: Vec<BalanceSummary>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceHolding {
    pub pdno: String,
    #[serde(default)]
    pub prdt_name: String,
    #[serde(deserialize_with = "de_str")]
    pub hldg_qty: i64,
    #[serde(deserialize_with = "de_str")]
    pub pchs_avg_pric: f64,
    #[serde(deserialize_with = "de_str")]
    pub evlu_amt: i64,
    #[serde(deserialize_with = "de_str")]
    pub evlu_pfls_amt: i64,
}

impl From<BalanceHolding> for HoldingRecord {
    fn from(h: BalanceHolding) -> Self {
        HoldingRecord {
            symbol: h.pdno.trim().to_string(),
            name: h.prdt_name.trim().to_string(),
            quantity: h.hldg_qty,
            buy_price: h.pchs_avg_pric,
            current_value: h.evlu_amt,
            unrealized_pnl: h.evlu_pfls_amt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceSummary {
    #[serde(deserialize_with = "de_str")]
    pub dnca_tot_amt: i64,
}

/// Cash order body. Quantities and prices travel as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OrderBody {
    pub cano: String,
    pub acnt_prdt_cd: String,
    pub pdno: String,
    pub ord_dvsn: String,
    pub ord_qty: String,
    pub ord_unpr: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub output: Option<OrderOutput>,
}

#[derive(Debug, Deserialize)]
pub struct OrderOutput {
    #[serde(rename = "ORD_NO", default)]
    pub ord_no: String,
}
