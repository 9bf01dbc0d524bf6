//! In-process poll service.
//!
//! Mirrors the poll contract's rules (sequential ids, one vote per account and poll, only the
//! creator may close) and adds fault injection so outages, malformed reads and slow calls can
//! be reproduced deterministically in tests and in the shell.

use crate::error::{ServiceFault, ServiceResult};
use crate::poll::PollDetails;
use crate::service::PollService;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Account used by handles that never called [`InMemoryPollService::as_account`].
pub const DEFAULT_ACCOUNT: &str = "default";

/// Calls that reached the service, including ones that failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub reads: u64,
    pub submits: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.reads + self.submits
    }
}

#[derive(Debug)]
struct StoredPoll {
    title: String,
    options: Vec<String>,
    active: bool,
    votes: Vec<u64>,
    creator: String,
    voters: HashSet<String>,
}

#[derive(Debug, Default)]
struct ServiceState {
    polls: Vec<StoredPoll>,
    unavailable: bool,
    /// Reads left before one read fails as malformed
    reads_until_failure: Option<u64>,
    /// Reported by the next submission after it was applied
    submit_fault: Option<ServiceFault>,
    call_delay: Duration,
    calls: CallCounts,
}

/// Shared-state handle to an in-memory poll store.
///
/// Clones share the same store. Each handle acts as one account; use [`as_account`] to get a
/// handle acting as a different voter.
///
/// [`as_account`]: InMemoryPollService::as_account
#[derive(Debug, Clone)]
pub struct InMemoryPollService {
    state: Arc<Mutex<ServiceState>>,
    account: Arc<str>,
}

impl Default for InMemoryPollService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPollService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState::default())),
            account: Arc::from(DEFAULT_ACCOUNT),
        }
    }

    /// Handle on the same store acting as `account`.
    pub fn as_account(&self, account: impl AsRef<str>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            account: Arc::from(account.as_ref()),
        }
    }

    /// Insert a poll directly, bypassing validation and call accounting. Returns its id.
    pub fn insert_poll<S: Into<String>>(
        &self,
        title: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        active: bool,
    ) -> u64 {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let mut state = self.state.lock();
        state.polls.push(StoredPoll {
            title: title.into(),
            votes: vec![0; options.len()],
            options,
            active,
            creator: self.account.to_string(),
            voters: HashSet::new(),
        });
        state.polls.len() as u64 - 1
    }

    /// Overwrite the tally of one option, bypassing voter bookkeeping.
    pub fn set_votes(&self, poll_id: u64, option_id: u64, votes: u64) {
        let mut state = self.state.lock();
        if let Some(count) = state
            .polls
            .get_mut(poll_id as usize)
            .and_then(|poll| poll.votes.get_mut(option_id as usize))
        {
            *count = votes;
        }
    }

    /// Simulate the connectivity layer going down (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Let `reads` more reads succeed, then fail the next one as malformed.
    pub fn fail_reads_after(&self, reads: u64) {
        self.state.lock().reads_until_failure = Some(reads);
    }

    /// Cancel a pending [`fail_reads_after`](InMemoryPollService::fail_reads_after).
    pub fn clear_read_failure(&self) {
        self.state.lock().reads_until_failure = None;
    }

    /// Apply the next submission as usual, then report `fault` instead of its outcome.
    pub fn fail_next_submit(&self, fault: ServiceFault) {
        self.state.lock().submit_fault = Some(fault);
    }

    /// Delay applied before every call is served.
    pub fn set_call_delay(&self, delay: Duration) {
        self.state.lock().call_delay = delay;
    }

    pub fn call_counts(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn reset_call_counts(&self) {
        self.state.lock().calls = CallCounts::default();
    }

    async fn delay(&self) {
        let delay = self.state.lock().call_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn read<T>(&self, op: impl FnOnce(&ServiceState) -> ServiceResult<T>) -> ServiceResult<T> {
        self.delay().await;
        let mut state = self.state.lock();
        state.calls.reads += 1;
        if state.unavailable {
            return Err(ServiceFault::Unavailable("rpc endpoint unreachable".to_string()));
        }
        match state.reads_until_failure {
            Some(0) => {
                state.reads_until_failure = None;
                return Err(ServiceFault::Malformed("could not decode call result".to_string()));
            }
            Some(n) => state.reads_until_failure = Some(n - 1),
            None => {}
        }
        op(&state)
    }

    async fn submit(
        &self,
        op: impl FnOnce(&mut ServiceState, &str) -> ServiceResult<()>,
    ) -> ServiceResult<()> {
        self.delay().await;
        let mut state = self.state.lock();
        state.calls.submits += 1;
        if state.unavailable {
            return Err(ServiceFault::Unavailable("rpc endpoint unreachable".to_string()));
        }
        let outcome = op(&mut state, &self.account);
        match state.submit_fault.take() {
            Some(fault) => Err(fault),
            None => outcome,
        }
    }
}

fn stored(state: &ServiceState, poll_id: u64) -> ServiceResult<&StoredPoll> {
    state
        .polls
        .get(poll_id as usize)
        .ok_or_else(|| ServiceFault::Malformed(format!("poll {poll_id} does not exist")))
}

fn stored_mut(state: &mut ServiceState, poll_id: u64) -> ServiceResult<&mut StoredPoll> {
    state
        .polls
        .get_mut(poll_id as usize)
        .ok_or_else(|| ServiceFault::Rejected(format!("poll {poll_id} does not exist")))
}

#[async_trait]
impl PollService for InMemoryPollService {
    async fn count_polls(&self) -> ServiceResult<u64> {
        self.read(|state| Ok(state.polls.len() as u64)).await
    }

    async fn get_poll_details(&self, poll_id: u64) -> ServiceResult<PollDetails> {
        self.read(|state| {
            let poll = stored(state, poll_id)?;
            Ok(PollDetails {
                title: poll.title.clone(),
                options: poll.options.clone(),
                active: poll.active,
            })
        })
        .await
    }

    async fn get_vote_count(&self, poll_id: u64, option_id: u64) -> ServiceResult<u64> {
        self.read(|state| {
            stored(state, poll_id)?
                .votes
                .get(option_id as usize)
                .copied()
                .ok_or_else(|| {
                    ServiceFault::Malformed(format!(
                        "option {option_id} does not exist in poll {poll_id}"
                    ))
                })
        })
        .await
    }

    async fn submit_create_poll(&self, title: &str, options: &[String]) -> ServiceResult<()> {
        self.submit(|state, account| {
            if title.is_empty() || options.len() < 2 {
                return Err(ServiceFault::Rejected(
                    "a poll needs a title and at least two options".to_string(),
                ));
            }
            state.polls.push(StoredPoll {
                title: title.to_string(),
                options: options.to_vec(),
                active: true,
                votes: vec![0; options.len()],
                creator: account.to_string(),
                voters: HashSet::new(),
            });
            Ok(())
        })
        .await
    }

    async fn submit_vote(&self, poll_id: u64, option_id: u64) -> ServiceResult<()> {
        self.submit(|state, account| {
            let poll = stored_mut(state, poll_id)?;
            if !poll.active {
                return Err(ServiceFault::Rejected(format!("poll {poll_id} is closed")));
            }
            if option_id >= poll.options.len() as u64 {
                return Err(ServiceFault::Rejected(format!(
                    "option {option_id} does not exist in poll {poll_id}"
                )));
            }
            if !poll.voters.insert(account.to_string()) {
                return Err(ServiceFault::Rejected(format!(
                    "{account} already voted in poll {poll_id}"
                )));
            }
            poll.votes[option_id as usize] += 1;
            Ok(())
        })
        .await
    }

    async fn submit_close_poll(&self, poll_id: u64) -> ServiceResult<()> {
        self.submit(|state, account| {
            let poll = stored_mut(state, poll_id)?;
            if poll.creator != account {
                return Err(ServiceFault::Rejected(format!(
                    "only {} may close poll {poll_id}",
                    poll.creator
                )));
            }
            if !poll.active {
                return Err(ServiceFault::Rejected(format!(
                    "poll {poll_id} is already closed"
                )));
            }
            poll.active = false;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let service = InMemoryPollService::new();
        service
            .submit_create_poll("Lunch", &options(&["Pizza", "Salad"]))
            .await
            .unwrap();

        assert_eq!(service.count_polls().await.unwrap(), 1);
        let details = service.get_poll_details(0).await.unwrap();
        assert_eq!(details.title, "Lunch");
        assert_eq!(details.options, options(&["Pizza", "Salad"]));
        assert!(details.active);
        assert_eq!(service.get_vote_count(0, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_vote_per_account() {
        let service = InMemoryPollService::new();
        service.insert_poll("Lunch", ["Pizza", "Salad"], true);

        service.submit_vote(0, 1).await.unwrap();
        let second = service.submit_vote(0, 0).await;
        assert!(matches!(second, Err(ServiceFault::Rejected(_))));

        service.as_account("alice").submit_vote(0, 0).await.unwrap();
        assert_eq!(service.get_vote_count(0, 0).await.unwrap(), 1);
        assert_eq!(service.get_vote_count(0, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_only_creator_closes() {
        let service = InMemoryPollService::new();
        service.insert_poll("Lunch", ["Pizza", "Salad"], true);

        let bob = service.as_account("bob");
        assert!(matches!(
            bob.submit_close_poll(0).await,
            Err(ServiceFault::Rejected(_))
        ));

        service.submit_close_poll(0).await.unwrap();
        assert!(!service.get_poll_details(0).await.unwrap().active);
        assert!(matches!(
            service.submit_close_poll(0).await,
            Err(ServiceFault::Rejected(_))
        ));
        assert!(matches!(
            bob.submit_vote(0, 0).await,
            Err(ServiceFault::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let service = InMemoryPollService::new();
        service.insert_poll("Lunch", ["Pizza", "Salad"], true);

        service.set_unavailable(true);
        assert!(matches!(
            service.count_polls().await,
            Err(ServiceFault::Unavailable(_))
        ));
        service.set_unavailable(false);

        service.fail_reads_after(1);
        assert!(service.count_polls().await.is_ok());
        assert!(matches!(
            service.get_poll_details(0).await,
            Err(ServiceFault::Malformed(_))
        ));
        assert!(service.get_poll_details(0).await.is_ok());

        assert_eq!(
            service.call_counts(),
            CallCounts {
                reads: 4,
                submits: 0
            }
        );
    }

    #[tokio::test]
    async fn test_submit_fault_reported_after_apply() {
        let service = InMemoryPollService::new();
        service.insert_poll("Lunch", ["Pizza", "Salad"], true);

        service.fail_next_submit(ServiceFault::Malformed("receipt lost".into()));
        assert_eq!(
            service.submit_vote(0, 1).await,
            Err(ServiceFault::Malformed("receipt lost".into()))
        );
        assert_eq!(service.get_vote_count(0, 1).await.unwrap(), 1);

        // One-shot
        service.submit_close_poll(0).await.unwrap();
        assert!(!service.get_poll_details(0).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_insert_does_not_count_as_call() {
        let service = InMemoryPollService::new();
        service.insert_poll("Color", ["Red", "Blue"], false);
        service.set_votes(0, 1, 7);
        assert_eq!(service.call_counts().total(), 0);
        assert_eq!(service.get_vote_count(0, 1).await.unwrap(), 7);
    }
}
