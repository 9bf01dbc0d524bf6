//! External poll service abstraction.
//!
//! The poll contract and the wallet-provider library that reaches it are opaque to this
//! crate. [`PollService`] is the minimal accessor set the synchronizer needs from them.
//! Every method is a suspension point; implementations must be thread-safe.

pub mod memory;
pub mod timeout;

use crate::error::ServiceResult;
use crate::poll::PollDetails;
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::{CallCounts, InMemoryPollService};
pub use timeout::TimeoutPollService;

#[async_trait]
pub trait PollService: Send + Sync {
    /// Total number of polls ever created
    async fn count_polls(&self) -> ServiceResult<u64>;

    /// Title, option labels and active flag of poll `poll_id`
    async fn get_poll_details(&self, poll_id: u64) -> ServiceResult<PollDetails>;

    /// Votes recorded for one option of one poll
    async fn get_vote_count(&self, poll_id: u64, option_id: u64) -> ServiceResult<u64>;

    /// Resolves once the service acknowledges the new poll as applied
    async fn submit_create_poll(&self, title: &str, options: &[String]) -> ServiceResult<()>;

    async fn submit_vote(&self, poll_id: u64, option_id: u64) -> ServiceResult<()>;

    async fn submit_close_poll(&self, poll_id: u64) -> ServiceResult<()>;
}

#[async_trait]
impl<T: PollService + ?Sized> PollService for Arc<T> {
    async fn count_polls(&self) -> ServiceResult<u64> {
        (**self).count_polls().await
    }

    async fn get_poll_details(&self, poll_id: u64) -> ServiceResult<PollDetails> {
        (**self).get_poll_details(poll_id).await
    }

    async fn get_vote_count(&self, poll_id: u64, option_id: u64) -> ServiceResult<u64> {
        (**self).get_vote_count(poll_id, option_id).await
    }

    async fn submit_create_poll(&self, title: &str, options: &[String]) -> ServiceResult<()> {
        (**self).submit_create_poll(title, options).await
    }

    async fn submit_vote(&self, poll_id: u64, option_id: u64) -> ServiceResult<()> {
        (**self).submit_vote(poll_id, option_id).await
    }

    async fn submit_close_poll(&self, poll_id: u64) -> ServiceResult<()> {
        (**self).submit_close_poll(poll_id).await
    }
}
