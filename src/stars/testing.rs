// Test doubles for the stars cache collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::error::{HubError, Result};

use super::{Clock, RepoId, StarLookup, StarRecord};

/// Scripted lookup that records every call.
///
/// A gated stub blocks each lookup until a permit is added to the gate.
#[derive(Debug, Default)]
pub struct StubLookup {
    responses: Mutex<HashMap<String, std::result::Result<u64, String>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let stub = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (stub, gate)
    }

    pub fn with_stars(self, repo: &str, stars: u64) -> Self {
        self.set_stars(repo, stars);
        self
    }

    pub fn with_failure(self, repo: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(repo.to_string(), Err(message.to_string()));
        self
    }

    pub fn set_stars(&self, repo: &str, stars: u64) {
        self.responses
            .lock()
            .unwrap()
            .insert(repo.to_string(), Ok(stars));
    }

    pub fn calls_for(&self, repo: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| *r == repo).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StarLookup for StubLookup {
    async fn stargazers(&self, repo: &RepoId) -> Result<u64> {
        self.calls.lock().unwrap().push(repo.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| HubError::Other(e.to_string()))?
                .forget();
        }

        let response = self.responses.lock().unwrap().get(repo.as_str()).cloned();
        match response {
            Some(Ok(stars)) => Ok(stars),
            Some(Err(message)) => Err(HubError::Other(message)),
            None => Err(HubError::NotFound(repo.to_string())),
        }
    }
}

/// Manually advanced clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Serialize cache entries the way the stars cache persists them.
pub fn persisted(entries: &[(&str, u64, DateTime<Utc>)]) -> String {
    let map: HashMap<&str, StarRecord> = entries
        .iter()
        .map(|(repo, stars, observed_at)| (*repo, StarRecord::new(*stars, *observed_at)))
        .collect();
    serde_json::to_string(&map).unwrap()
}
