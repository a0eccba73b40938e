//! In-process [`RemoteApi`] fake for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::client::{ApiResponse, ApiStatus, RemoteApi};
use crate::credential::Credential;
use crate::error::ApiError;

enum Stub {
    Respond(ApiResponse),
    Timeout,
}

/// Canned upstream keyed by request target.
///
/// Requests carrying a credential outside the accepted set are answered
/// with 401. Targets without a stub fail with a network error so a missing
/// stub never passes silently.
#[derive(Default)]
pub(crate) struct FakeApi {
    stubs: HashMap<String, Stub>,
    accepted: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn accept(mut self, token: &str) -> Self {
        self.accepted.insert(token.to_owned());
        self
    }

    pub(crate) fn respond(mut self, target: &str, resp: ApiResponse) -> Self {
        self.stubs.insert(target.to_owned(), Stub::Respond(resp));
        self
    }

    pub(crate) fn status(self, target: &str, status: ApiStatus) -> Self {
        self.respond(target, ApiResponse::status_only(status))
    }

    pub(crate) fn timeout(mut self, target: &str) -> Self {
        self.stubs.insert(target.to_owned(), Stub::Timeout);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn call_count(&self, target: &str) -> usize {
        self.calls().iter().filter(|c| *c == target).count()
    }
}

#[async_trait::async_trait]
impl RemoteApi for FakeApi {
    async fn get(&self, target: &str, credential: &Credential) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(target.to_owned());

        if !self.accepted.contains(credential.expose()) {
            return Ok(ApiResponse::status_only(ApiStatus::Unauthorized));
        }

        match self.stubs.get(target) {
            Some(Stub::Respond(resp)) => Ok(resp.clone()),
            Some(Stub::Timeout) => Err(ApiError::Timeout {
                url: target.to_owned(),
            }),
            None => Err(ApiError::Network {
                url: target.to_owned(),
                reason: "no stub for target".to_owned(),
            }),
        }
    }
}
