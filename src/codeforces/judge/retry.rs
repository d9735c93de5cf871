extern crate log;
extern crate reqwest;
extern crate tokio;

use crate::{
    config::retry::{FORBIDDEN_DELAY, RETRY_COUNT, RETRY_DELAY},
    error::{network_error, Result},
};
use log::warn;
use std::future::Future;
use tokio::time::sleep;

/// Retries idempotent requests. Never use this for the submit POST.
pub(super) async fn async_retry<F, U, Out>(fun: F) -> Result<Out>
where
    F: Fn() -> U,
    U: Future<Output = reqwest::Result<Out>>,
{
    for i in 1..RETRY_COUNT {
        match fun().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!("Request failed (attempt {}/{}): {}", i, RETRY_COUNT, e);
                if e.status() == Some(reqwest::StatusCode::FORBIDDEN) {
                    sleep(FORBIDDEN_DELAY).await;
                } else {
                    sleep(RETRY_DELAY).await;
                }
            }
        }
    }
    fun().await.map_err(network_error)
}
