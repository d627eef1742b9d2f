//! Korea Investment & Securities Open API gateway.
//!
//! Implements [`BrokerPort`] over the retrying [`RequestExecutor`]. Business
//! rejections (`rt_cd != "0"`) and non-2xx statuses are logged and surface as
//! `Ok(None)`; only transport failures and unreadable payloads are errors.

pub mod auth;
pub mod model;

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use self::auth::{AccessToken, Environment, KisCredentials, auth_headers, issue_token};
use self::model::{
    BalanceResponse, BusinessStatus, ChartResponse, OrderBody, OrderResponse, PriceResponse,
};
use crate::adapters::http::{HttpRequest, HttpResponse, HttpTransport, RequestExecutor, RetryPolicy};
use crate::domain::error::{GatewayError, TraderError};
use crate::domain::ohlcv::{OhlcvBar, Quote};
use crate::domain::order::{OrderKind, OrderRequest, OrderResult, OrderSide};
use crate::domain::portfolio::BalanceSnapshot;
use crate::domain::strategy::ChartPeriod;
use crate::ports::broker_port::BrokerPort;

const PRICE_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-price";
const CHART_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice";
const BALANCE_PATH: &str = "/uapi/domestic-stock/v1/trading/inquire-balance";
const ORDER_PATH: &str = "/uapi/domestic-stock/v1/trading/order-cash";

const TR_PRICE: &str = "FHKST01010100";
const TR_CHART: &str = "FHKST03010100";
const TR_BALANCE: &str = "TTTC8434R";
const TR_BUY: &str = "TTTC0802U";
const TR_SELL: &str = "TTTC0801U";

/// Market division code for KRX equities.
const MARKET_DIV: &str = "J";

const ORDER_DIVISION_LIMIT: &str = "00";
const ORDER_DIVISION_MARKET: &str = "01";

#[derive(Debug, Clone)]
pub struct KisConfig {
    pub credentials: KisCredentials,
    pub environment: Environment,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl KisConfig {
    pub fn new(credentials: KisCredentials, environment: Environment) -> Self {
        KisConfig {
            credentials,
            environment,
            base_url: environment.base_url().to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct KisBroker<T> {
    executor: RequestExecutor<T>,
    config: KisConfig,
    token: AccessToken,
}

impl<T: HttpTransport> KisBroker<T> {
    /// Issues an access token and returns a ready gateway.
    pub async fn connect(transport: T, config: KisConfig) -> Result<Self, TraderError> {
        let executor = RequestExecutor::new(transport, config.retry);
        let token = issue_token(
            &executor,
            &config.base_url,
            &config.credentials,
            config.timeout,
        )
        .await?;

        Ok(KisBroker {
            executor,
            config,
            token,
        })
    }

    pub fn with_token(transport: T, config: KisConfig, token: AccessToken) -> Self {
        KisBroker {
            executor: RequestExecutor::new(transport, config.retry),
            config,
            token,
        }
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        self.executor.transport()
    }

    fn request(&self, method: Method, path: &str, tr_id: &str) -> HttpRequest {
        HttpRequest::new(
            method,
            format!("{}{}", self.config.base_url, path),
            self.config.timeout,
        )
        .headers(auth_headers(&self.config.credentials, &self.token, tr_id))
    }

    /// Sends `request` and decodes the payload when the broker accepted it.
    async fn fetch<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
        what: &'static str,
    ) -> Result<Option<R>, GatewayError> {
        let response = self.executor.execute(&request).await?;

        if !response.is_success() {
            let status = lenient_status(&response);
            warn!(
                request = what,
                status = %response.status,
                message = %status.message(),
                "broker returned an error status"
            );
            return Ok(None);
        }

        let status: BusinessStatus = decode(&response, what)?;
        if !status.is_success() {
            warn!(
                request = what,
                rt_cd = %status.rt_cd,
                msg_cd = %status.msg_cd,
                message = %status.message(),
                "broker declined request"
            );
            return Ok(None);
        }

        decode(&response, what).map(Some)
    }

    fn order_tr_id(&self, side: OrderSide) -> String {
        let real_id = match side {
            OrderSide::Buy => TR_BUY,
            OrderSide::Sell => TR_SELL,
        };
        self.config.environment.account_tr_id(real_id)
    }
}

/// Price zero is the only market-order marker; any other price is a limit.
pub fn order_body(credentials: &KisCredentials, order: &OrderRequest) -> OrderBody {
    let (division, unit_price) = match order.kind() {
        OrderKind::Market => (ORDER_DIVISION_MARKET, "0".to_string()),
        OrderKind::Limit(price) => (ORDER_DIVISION_LIMIT, price.to_string()),
    };

    OrderBody {
        cano: credentials.account.cano.clone(),
        acnt_prdt_cd: credentials.account.product_code.clone(),
        pdno: order.symbol.clone(),
        ord_dvsn: division.to_string(),
        ord_qty: order.quantity.to_string(),
        ord_unpr: unit_price,
    }
}

fn decode<R: DeserializeOwned>(
    response: &HttpResponse,
    what: &'static str,
) -> Result<R, GatewayError> {
    serde_json::from_slice(&response.body).map_err(|e| GatewayError::Malformed {
        what,
        reason: e.to_string(),
    })
}

fn lenient_status(response: &HttpResponse) -> BusinessStatus {
    serde_json::from_slice(&response.body).unwrap_or_default()
}

impl<T: HttpTransport> BrokerPort for KisBroker<T> {
    async fn current_price(&self, symbol: &str) -> Result<Option<Quote>, GatewayError> {
        let request = self
            .request(Method::GET, PRICE_PATH, TR_PRICE)
            .query_param("FID_COND_MRKT_DIV_CODE", MARKET_DIV)
            .query_param("FID_INPUT_ISCD", symbol);

        let response: Option<PriceResponse> = self.fetch(request, "current price").await?;
        Ok(response.map(|r| r.output.into_quote(symbol)))
    }

    async fn chart_data(
        &self,
        symbol: &str,
        period: ChartPeriod,
        count: usize,
    ) -> Result<Option<Vec<OhlcvBar>>, GatewayError> {
        let request = self
            .request(Method::GET, CHART_PATH, TR_CHART)
            .query_param("FID_COND_MRKT_DIV_CODE", MARKET_DIV)
            .query_param("FID_INPUT_ISCD", symbol)
            .query_param("FID_INPUT_DATE_1", "")
            .query_param("FID_INPUT_DATE_2", "")
            .query_param("FID_PERIOD_DIV_CODE", period.code())
            .query_param("FID_ORG_ADJ_PRC", "0");

        let Some(response) = self.fetch::<ChartResponse>(request, "chart data").await? else {
            return Ok(None);
        };

        let mut bars: Vec<OhlcvBar> = response
            .output2
            .into_iter()
            .take(count)
            .map(OhlcvBar::from)
            .collect();
        bars.reverse();

        debug!(symbol, bars = bars.len(), period = %period, "chart data loaded");
        Ok(Some(bars))
    }

    async fn balance(&self) -> Result<Option<BalanceSnapshot>, GatewayError> {
        let account = &self.config.credentials.account;
        let tr_id = self.config.environment.account_tr_id(TR_BALANCE);
        let request = self
            .request(Method::GET, BALANCE_PATH, &tr_id)
            .query_param("CANO", &account.cano)
            .query_param("ACNT_PRDT_CD", &account.product_code)
            .query_param("AFHR_FLPR_YN", "N")
            .query_param("OFL_YN", "")
            .query_param("INQR_DVSN", "02")
            .query_param("UNPR_DVSN", "01")
            .query_param("FUND_STTL_ICLD_YN", "N")
            .query_param("FNCG_AMT_AUTO_RDPT_YN", "N")
            .query_param("PRCS_DVSN", "01")
            .query_param("CTX_AREA_FK100", "")
            .query_param("CTX_AREA_NK100", "");

        let Some(response) = self.fetch::<BalanceResponse>(request, "balance").await? else {
            return Ok(None);
        };

        let cash = response
            .output2
            .first()
            .map(|summary| summary.dnca_tot_amt)
            .ok_or_else(|| GatewayError::Malformed {
                what: "balance",
                reason: "missing account summary".to_string(),
            })?;

        Ok(Some(BalanceSnapshot {
            cash,
            holdings: response.output1.into_iter().map(Into::into).collect(),
        }))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult, GatewayError> {
        let body = serde_json::to_value(order_body(&self.config.credentials, order)).map_err(
            |e| GatewayError::Malformed {
                what: "order",
                reason: e.to_string(),
            },
        )?;
        let request = self
            .request(Method::POST, ORDER_PATH, &self.order_tr_id(order.side))
            .json(body);

        // an order that may have reached the broker is never sent twice
        let policy = self.executor.policy().before_send_only();
        let response = self.executor.execute_with(&request, policy).await?;

        if !response.is_success() {
            let status = lenient_status(&response);
            return Ok(OrderResult::rejected(format!(
                "HTTP {}: {}",
                response.status.as_u16(),
                status.message()
            )));
        }

        let status: BusinessStatus = decode(&response, "order")?;
        if !status.is_success() {
            return Ok(OrderResult::rejected(status.message()));
        }

        let accepted: OrderResponse = decode(&response, "order")?;
        let order_no = accepted
            .output
            .map(|o| o.ord_no.trim().to_string())
            .filter(|no| !no.is_empty())
            .ok_or_else(|| GatewayError::Malformed {
                what: "order",
                reason: "accepted without an order number".to_string(),
            })?;
        Ok(OrderResult::accepted(order_no, status.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::mock::ScriptedTransport;
    use crate::domain::error::TransportError;
    use super::auth::{Account, PAPER_BASE_URL, REAL_BASE_URL};
    use reqwest::StatusCode;

    fn credentials() -> KisCredentials {
        KisCredentials {
            app_key: "PSkey".into(),
            app_secret: "secret".into(),
            account: Account::parse("50012345-01").unwrap(),
        }
    }

    fn broker(environment: Environment) -> KisBroker<ScriptedTransport> {
        let token = AccessToken {
            value: "tok".into(),
            expires_at: None,
        };
        KisBroker::with_token(
            ScriptedTransport::new(),
            KisConfig::new(credentials(), environment),
            token,
        )
    }

    #[test]
    fn zero_price_is_market_order() {
        let order = OrderRequest::market("005930", 3, OrderSide::Buy);
        let body = order_body(&credentials(), &order);
        assert_eq!(body.ord_dvsn, "01");
        assert_eq!(body.ord_unpr, "0");
        assert_eq!(body.ord_qty, "3");
        assert_eq!(body.cano, "50012345");
        assert_eq!(body.acnt_prdt_cd, "01");
    }

    #[test]
    fn positive_price_is_limit_order() {
        let order = OrderRequest::limit("005930", 2, 71_000, OrderSide::Sell);
        let body = order_body(&credentials(), &order);
        assert_eq!(body.ord_dvsn, "00");
        assert_eq!(body.ord_unpr, "71000");
    }

    #[tokio::test(start_paused = true)]
    async fn current_price_request_and_parse() {
        let broker = broker(Environment::Paper);
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","msg1":"OK","output":{"stck_prpr":"71500","prdy_ctrt":"1.20","acml_vol":"900"}}"#,
        );

        let quote = broker.current_price("005930").await.unwrap().unwrap();

        assert_eq!(quote.current_price, 71_500);
        assert_eq!(quote.change_rate, 1.2);
        let sent = broker.transport().last_request().unwrap();
        assert_eq!(sent.url, format!("{PAPER_BASE_URL}{PRICE_PATH}"));
        assert_eq!(sent.header_value("tr_id"), Some("FHKST01010100"));
        assert_eq!(sent.header_value("authorization"), Some("Bearer tok"));
        assert_eq!(sent.query_value("FID_COND_MRKT_DIV_CODE"), Some("J"));
        assert_eq!(sent.query_value("FID_INPUT_ISCD"), Some("005930"));
    }

    #[tokio::test(start_paused = true)]
    async fn business_failure_is_absent() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"1","msg_cd":"40570000","msg1":"no such symbol"}"#);

        assert!(broker.current_price("999999").await.unwrap().is_none());
        assert_eq!(broker.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_is_absent_and_not_retried() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_json(StatusCode::INTERNAL_SERVER_ERROR, r#"{"rt_cd":"1","msg1":"busy"}"#);

        assert!(broker.balance().await.unwrap().is_none());
        assert_eq!(broker.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_an_error() {
        let broker = broker(Environment::Paper);
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","output":{"stck_prpr":"n/a","prdy_ctrt":"0","acml_vol":"0"}}"#,
        );

        let err = broker.current_price("005930").await.unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { what: "current price", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_propagates_after_retries() {
        let broker = broker(Environment::Paper);
        for _ in 0..3 {
            broker
                .transport()
                .push_error(TransportError::Connect("connection refused".into()));
        }

        let err = broker.current_price("005930").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(ref f) if f.attempts == 3));
    }

    #[tokio::test(start_paused = true)]
    async fn chart_is_truncated_then_ascending() {
        let broker = broker(Environment::Paper);
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","output1":{},"output2":[
                {"stck_bsop_date":"20240117","stck_oprc":"3","stck_hgpr":"3","stck_lwpr":"3","stck_clpr":"3","acml_vol":"30"},
                {"stck_bsop_date":"20240116","stck_oprc":"2","stck_hgpr":"2","stck_lwpr":"2","stck_clpr":"2","acml_vol":"20"},
                {"stck_bsop_date":"20240115","stck_oprc":"1","stck_hgpr":"1","stck_lwpr":"1","stck_clpr":"1","acml_vol":"10"}
            ]}"#,
        );

        let bars = broker
            .chart_data("005930", ChartPeriod::Weekly, 2)
            .await
            .unwrap()
            .unwrap();

        let closes: Vec<i64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2, 3]);
        let sent = broker.transport().last_request().unwrap();
        assert_eq!(sent.header_value("tr_id"), Some("FHKST03010100"));
        assert_eq!(sent.query_value("FID_PERIOD_DIV_CODE"), Some("W"));
        assert_eq!(sent.query_value("FID_ORG_ADJ_PRC"), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn balance_parses_cash_and_holdings() {
        let broker = broker(Environment::Real);
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","msg1":"OK",
                "output1":[
                    {"pdno":"005930","prdt_name":"Samsung","hldg_qty":"10","pchs_avg_pric":"70000.0000","evlu_amt":"715000","evlu_pfls_amt":"15000"},
                    {"pdno":"000660","prdt_name":"SK hynix","hldg_qty":"0","pchs_avg_pric":"0.0000","evlu_amt":"0","evlu_pfls_amt":"0"}
                ],
                "output2":[{"dnca_tot_amt":"1000000"}]}"#,
        );

        let snapshot = broker.balance().await.unwrap().unwrap();

        assert_eq!(snapshot.cash, 1_000_000);
        assert_eq!(snapshot.holdings.len(), 2);
        let sent = broker.transport().last_request().unwrap();
        assert_eq!(sent.url, format!("{REAL_BASE_URL}{BALANCE_PATH}"));
        assert_eq!(sent.header_value("tr_id"), Some("TTTC8434R"));
        assert_eq!(sent.query_value("CANO"), Some("50012345"));
        assert_eq!(sent.query_value("ACNT_PRDT_CD"), Some("01"));
        assert_eq!(sent.query_value("INQR_DVSN"), Some("02"));
    }

    #[tokio::test(start_paused = true)]
    async fn balance_without_summary_is_malformed() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","output1":[],"output2":[]}"#);

        let err = broker.balance().await.unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { what: "balance", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_order_returns_order_number() {
        let broker = broker(Environment::Paper);
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","msg1":"order placed","output":{"KRX_FWDG_ORD_ORGNO":"91252","ODNO":"0000117057","ORD_NO":"0000117057","ORD_TMD":"121052"}}"#,
        );

        let result = broker
            .submit_order(&OrderRequest::market("005930", 3, OrderSide::Buy))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.order_no.as_deref(), Some("0000117057"));
        let sent = broker.transport().last_request().unwrap();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.header_value("tr_id"), Some("VTTC0802U"));
        let body = sent.body.unwrap();
        assert_eq!(body["ORD_DVSN"], "01");
        assert_eq!(body["ORD_UNPR"], "0");
        assert_eq!(body["ORD_QTY"], "3");
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_order_is_not_resubmitted() {
        let broker = broker(Environment::Real);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"1","msg1":"insufficient balance"}"#);
        broker.transport().push_json(StatusCode::OK, r#"{"rt_cd":"0"}"#);

        let result = broker
            .submit_order(&OrderRequest::market("005930", 1, OrderSide::Sell))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "insufficient balance");
        assert_eq!(broker.transport().calls(), 1);
        let sent = broker.transport().last_request().unwrap();
        assert_eq!(sent.header_value("tr_id"), Some("TTTC0801U"));
    }

    #[tokio::test(start_paused = true)]
    async fn order_read_timeout_is_not_resubmitted() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_error(TransportError::ReadTimeout("operation timed out".into()));
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","output":{"ORD_NO":"0000000002"}}"#);

        let err = broker
            .submit_order(&OrderRequest::market("005930", 3, OrderSide::Buy))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport(ref f) if f.attempts == 1));
        assert_eq!(broker.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn order_body_read_failure_is_not_resubmitted() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_error(TransportError::Body("body read timed out".into()));
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","output":{"ORD_NO":"0000000002"}}"#);

        assert!(
            broker
                .submit_order(&OrderRequest::market("005930", 1, OrderSide::Buy))
                .await
                .is_err()
        );
        assert_eq!(broker.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn order_refused_connection_is_retried() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_error(TransportError::Connect("connection refused".into()));
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","msg1":"ok","output":{"ORD_NO":"0000000003"}}"#);

        let result = broker
            .submit_order(&OrderRequest::market("005930", 1, OrderSide::Buy))
            .await
            .unwrap();

        assert_eq!(result.order_no.as_deref(), Some("0000000003"));
        assert_eq!(broker.transport().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_order_without_number_is_malformed() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","msg1":"ok"}"#);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","output":{"ORD_NO":"0000000004"}}"#);

        let err = broker
            .submit_order(&OrderRequest::market("005930", 1, OrderSide::Buy))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Malformed { what: "order", .. }));
        assert_eq!(broker.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_order_with_blank_number_is_malformed() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_json(StatusCode::OK, r#"{"rt_cd":"0","output":{"ORD_NO":"  "}}"#);

        let err = broker
            .submit_order(&OrderRequest::market("005930", 1, OrderSide::Buy))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Malformed { what: "order", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn reads_still_retry_read_timeouts() {
        let broker = broker(Environment::Paper);
        broker
            .transport()
            .push_error(TransportError::ReadTimeout("operation timed out".into()));
        broker.transport().push_json(
            StatusCode::OK,
            r#"{"rt_cd":"0","output":{"stck_prpr":"100","prdy_ctrt":"0","acml_vol":"1"}}"#,
        );

        assert!(broker.current_price("005930").await.unwrap().is_some());
        assert_eq!(broker.transport().calls(), 2);
    }
}
