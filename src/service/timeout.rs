//! Per-call timeout decorator.
//!
//! Wraps any [`PollService`] so that each call which does not resolve within the configured
//! duration fails as [`ServiceFault::Unavailable`]. The synchronizer maps that to
//! `ServiceUnavailable` and leaves its cache untouched.

use crate::error::{ServiceFault, ServiceResult};
use crate::poll::PollDetails;
use crate::service::PollService;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TimeoutPollService<S> {
    inner: S,
    timeout: Duration,
}

impl<S: PollService> TimeoutPollService<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = ServiceResult<T>>,
    ) -> ServiceResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ServiceFault::Unavailable(format!(
                "{call} timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl<S: PollService> PollService for TimeoutPollService<S> {
    async fn count_polls(&self) -> ServiceResult<u64> {
        self.bounded("count_polls", self.inner.count_polls()).await
    }

    async fn get_poll_details(&self, poll_id: u64) -> ServiceResult<PollDetails> {
        self.bounded("get_poll_details", self.inner.get_poll_details(poll_id))
            .await
    }

    async fn get_vote_count(&self, poll_id: u64, option_id: u64) -> ServiceResult<u64> {
        self.bounded(
            "get_vote_count",
            self.inner.get_vote_count(poll_id, option_id),
        )
        .await
    }

    async fn submit_create_poll(&self, title: &str, options: &[String]) -> ServiceResult<()> {
        self.bounded(
            "submit_create_poll",
            self.inner.submit_create_poll(title, options),
        )
        .await
    }

    async fn submit_vote(&self, poll_id: u64, option_id: u64) -> ServiceResult<()> {
        self.bounded("submit_vote", self.inner.submit_vote(poll_id, option_id))
            .await
    }

    async fn submit_close_poll(&self, poll_id: u64) -> ServiceResult<()> {
        self.bounded("submit_close_poll", self.inner.submit_close_poll(poll_id))
            .await
    }
}
