extern crate tokio;

use crate::{
    config::{
        cookie::LOGIN_DELAYS,
        poll::{POLL_ATTEMPTS, POLL_BUDGET, POLL_DELAYS},
    },
    error::Result,
};
use std::{future::Future, time::Duration};
use tokio::time::{sleep_until, Instant};

/// Delay schedule for repeated checks. `delays[i]` is waited before attempt
/// `i`; the last delay repeats once the list runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub delays: Vec<Duration>,
    pub max_attempts: usize,
    pub budget: Option<Duration>,
}

impl Backoff {
    pub fn new<T: Into<Vec<Duration>>>(delays: T) -> Self {
        let delays = delays.into();
        Self {
            max_attempts: delays.len(),
            delays,
            budget: None,
        }
    }
    pub fn with_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }
    /// Schedule used while waiting for a login to show up in the cookie jar.
    pub fn login() -> Self {
        Self::new(LOGIN_DELAYS.to_vec())
    }
    /// Schedule used while waiting for a verdict.
    pub fn verdict() -> Self {
        Self::new(POLL_DELAYS.to_vec())
            .with_attempts(POLL_ATTEMPTS)
            .with_budget(POLL_BUDGET)
    }
    pub fn delay(&self, attempt: usize) -> Duration {
        self.delays
            .get(attempt)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Runs `probe` on the `policy` schedule until it yields a value.
/// `Ok(None)` means the attempts or the time budget ran out.
pub async fn poll_until<T, F, Fut>(policy: &Backoff, mut probe: F) -> Result<Option<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let mut next = start;
    for attempt in 0..policy.max_attempts {
        next += policy.delay(attempt);
        if let Some(budget) = policy.budget {
            if next > start + budget {
                break;
            }
        }
        sleep_until(next).await;
        if let Some(v) = probe(attempt).await? {
            return Ok(Some(v));
        }
    }
    Ok(None)
}
