extern crate tokio;

use std::{cmp::max, sync::Mutex, time::Duration};
use tokio::time::{sleep_until, Instant};

/// Keeps consecutive submissions at least `gap` apart.
pub struct Throttle {
    gap: Duration,
    next_submit: Mutex<Instant>,
}

impl Throttle {
    pub fn new(gap: Duration) -> Self {
        Throttle {
            gap,
            next_submit: Mutex::new(Instant::now()),
        }
    }
    /// Reserves the next free slot and sleeps until it starts.
    pub async fn wait(&self) {
        let slot = {
            let mut next = self.next_submit.lock().unwrap_or_else(|e| e.into_inner());
            let slot = max(*next, Instant::now());
            *next = slot + self.gap;
            slot
        };
        sleep_until(slot).await;
    }
}
