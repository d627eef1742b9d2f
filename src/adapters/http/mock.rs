//! Scripted transport for adapter tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::StatusCode;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::domain::error::TransportError;

/// Replays queued outcomes in order and records every request it was given.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: StatusCode, body: &str) {
        self.script.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: Bytes::from(body.to_string()),
        }));
    }

    pub fn push_error(&self, error: TransportError) {
        self.script.borrow_mut().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.sent.borrow().last().cloned()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.borrow_mut().push(request.clone());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("script exhausted".into())))
    }
}
