//! Credentials, server selection and access-token issuance.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use tracing::{error, info};

use super::model::{TokenError, TokenRequest, TokenResponse};
use crate::adapters::http::{HttpRequest, HttpTransport, RequestExecutor};
use crate::domain::config_validation::is_valid_account_no;
use crate::domain::error::TraderError;

pub const REAL_BASE_URL: &str = "https://openapi.koreainvestment.com:9443";
pub const PAPER_BASE_URL: &str = "https://openapivts.koreainvestment.com:29443";
pub const TOKEN_PATH: &str = "/oauth2/tokenP";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Real,
    Paper,
}

impl Environment {
    pub fn from_is_real(is_real: bool) -> Self {
        if is_real {
            Environment::Real
        } else {
            Environment::Paper
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Real => REAL_BASE_URL,
            Environment::Paper => PAPER_BASE_URL,
        }
    }

    /// Account-scoped transaction ids start with `T` on the real server and
    /// `V` on the paper server. Quotation ids are shared.
    pub fn account_tr_id(&self, real_id: &str) -> String {
        match (self, real_id.strip_prefix('T')) {
            (Environment::Paper, Some(rest)) => format!("V{rest}"),
            _ => real_id.to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Real => f.write_str("real"),
            Environment::Paper => f.write_str("paper"),
        }
    }
}

/// Account number split into its 8-digit account and 2-digit product parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub cano: String,
    pub product_code: String,
}

impl Account {
    pub fn parse(account_no: &str) -> Option<Self> {
        if !is_valid_account_no(account_no) {
            return None;
        }
        let (cano, product) = account_no.trim().split_once('-')?;
        Some(Account {
            cano: cano.to_string(),
            product_code: product.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct KisCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub account: Account,
}

impl fmt::Debug for KisCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KisCredentials")
            .field("app_key", &"<redacted>")
            .field("app_secret", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    /// Expiry as reported by the broker, e.g. `2024-01-16 09:00:00`.
    pub expires_at: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Headers every authenticated request carries.
pub fn auth_headers(
    credentials: &KisCredentials,
    token: &AccessToken,
    tr_id: &str,
) -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), CONTENT_TYPE.to_string()),
        ("authorization".to_string(), format!("Bearer {}", token.value)),
        ("appkey".to_string(), credentials.app_key.clone()),
        ("appsecret".to_string(), credentials.app_secret.clone()),
        ("tr_id".to_string(), tr_id.to_string()),
        ("tr_cont".to_string(), String::new()),
    ]
}

/// Exchanges the app key and secret for a bearer token.
pub async fn issue_token<T: HttpTransport>(
    executor: &RequestExecutor<T>,
    base_url: &str,
    credentials: &KisCredentials,
    timeout: Duration,
) -> Result<AccessToken, TraderError> {
    let body = serde_json::to_value(TokenRequest {
        grant_type: "client_credentials",
        appkey: &credentials.app_key,
        appsecret: &credentials.app_secret,
    })
    .map_err(|e| TraderError::Auth {
        reason: e.to_string(),
    })?;

    let request = HttpRequest::new(Method::POST, format!("{base_url}{TOKEN_PATH}"), timeout)
        .header("content-type", CONTENT_TYPE)
        .json(body);

    let response = executor.execute(&request).await?;

    if !response.is_success() {
        let detail: TokenError = serde_json::from_slice(&response.body).unwrap_or_default();
        error!(
            status = %response.status,
            code = %detail.error_code,
            description = %detail.error_description,
            "token request rejected"
        );
        return Err(TraderError::Auth {
            reason: format!(
                "HTTP {}: {}",
                response.status.as_u16(),
                detail.error_description
            ),
        });
    }

    let token: TokenResponse =
        serde_json::from_slice(&response.body).map_err(|e| TraderError::Auth {
            reason: format!("malformed token response: {e}"),
        })?;

    if token.access_token.trim().is_empty() {
        return Err(TraderError::Auth {
            reason: "empty access token".to_string(),
        });
    }

    info!(expires_at = ?token.access_token_token_expired, "access token issued");

    Ok(AccessToken {
        value: token.access_token,
        expires_at: token.access_token_token_expired,
    })
}
