//! In-memory fetcher for unit tests

use super::auth::Credentials;
use super::http::{Fetch, FetchResponse};
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Canned {
    Response(FetchResponse),
    TransportError,
}

#[derive(Default)]
struct State {
    responses: HashMap<String, Canned>,
    requested: Vec<String>,
}

/// Serves canned responses by URL and records every request.
///
/// Unknown URLs answer 404. Clones share state.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<State>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.insert_json(url, body);
        self
    }

    pub fn with_response(self, url: &str, status: u16, body: &str) -> Self {
        self.insert(url, Canned::Response(FetchResponse::new(status, body)));
        self
    }

    pub fn with_transport_error(self, url: &str) -> Self {
        self.insert(url, Canned::TransportError);
        self
    }

    pub fn insert_json(&self, url: &str, body: Value) {
        let body = serde_json::to_vec(&body).unwrap();
        self.insert(url, Canned::Response(FetchResponse::new(200, body)));
    }

    fn insert(&self, url: &str, canned: Canned) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(url.to_string(), canned);
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requested.len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.clone()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        _credentials: &Credentials,
    ) -> Result<FetchResponse, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.requested.push(url.to_string());
        match state.responses.get(url).cloned() {
            Some(Canned::Response(response)) => Ok(response),
            Some(Canned::TransportError) => Err("connection refused".into()),
            None => Ok(FetchResponse::new(404, "not found")),
        }
    }
}
