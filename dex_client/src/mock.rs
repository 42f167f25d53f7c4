//! In-memory [`HttpFetcher`] for tests.
//!
//! Routes match on URL prefix (longest prefix wins). A route with several
//! replies hands them out in order and then keeps repeating the last one.
//! Every request is recorded so tests can assert exactly which upstreams
//! were hit and how often.

use crate::http::{HttpFetcher, HttpResponse};
use crate::{DexClientError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(HttpResponse),
    Fail(String),
}

struct Route {
    prefix: String,
    replies: VecDeque<MockReply>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `prefix` with `status` and `body`
    pub fn with_response(self, prefix: &str, status: u16, body: impl Into<String>) -> Self {
        self.with_sequence(prefix, vec![MockReply::Respond(HttpResponse::new(status, body))])
    }

    pub fn with_json(self, prefix: &str, body: serde_json::Value) -> Self {
        self.with_response(prefix, 200, body.to_string())
    }

    /// Simulate a transport failure (timeout, DNS, TLS...)
    pub fn with_failure(self, prefix: &str, message: &str) -> Self {
        self.with_sequence(prefix, vec![MockReply::Fail(message.to_string())])
    }

    pub fn with_sequence(self, prefix: &str, replies: Vec<MockReply>) -> Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.retain(|r| r.prefix != prefix);
            routes.push(Route {
                prefix: prefix.to_string(),
                replies: replies.into(),
            });
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|call| call.url.starts_with(prefix)).count())
            .unwrap_or(0)
    }

    fn reply(
        &self,
        method: &'static str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method,
                url: url.to_string(),
                headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                body,
            });
        }

        let mut routes = self
            .routes
            .lock()
            .map_err(|_| DexClientError::Transport("mock routes poisoned".to_string()))?;

        let route = routes
            .iter_mut()
            .filter(|r| url.starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len());

        let reply = match route {
            Some(route) if route.replies.len() > 1 => route.replies.pop_front(),
            Some(route) => route.replies.front().cloned(),
            None => None,
        };

        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(DexClientError::Transport(message)),
            None => Ok(HttpResponse::new(404, "no mock route")),
        }
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.reply("GET", url, headers, None)
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        self.reply("POST", url, headers, Some(body.clone()))
    }
}
