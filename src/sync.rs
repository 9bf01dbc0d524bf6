//! Poll view synchronizer.
//!
//! [`PollSynchronizer`] owns the cached [`PollSet`] and is the only path to the poll service.
//! The concurrency rules are small:
//!
//! - at most one mutating command (create, vote, close) runs at a time; a second one fails
//!   with [`SyncError::Busy`] instead of queueing
//! - concurrent refreshes share one fetch sequence
//! - the refresh that follows a command begins after the command was acknowledged
//! - the cache is replaced only by a complete, successful scan
//!
//! State is published through a `tokio::sync::watch` channel as [`SyncSnapshot`] values, so a
//! presentation layer can render and enable controls without re-implementing the guards.

pub mod refresh;

use crate::error::{ErrorReport, Result, ServiceResult, SyncError};
use crate::poll::{Poll, PollSet};
use crate::service::PollService;
use futures::FutureExt;
use log::{debug, info, warn};
use refresh::{Acquired, RefreshSlot};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a presentation layer needs to draw the poll list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    /// Polls as of the last successful refresh
    pub polls: PollSet,
    /// A refresh is in flight
    pub loading: bool,
    /// A mutating command is in flight
    pub busy: bool,
    /// Failure of the most recent operation, cleared by the next successful refresh
    pub last_error: Option<ErrorReport>,
    /// Number of successful refreshes published so far
    pub generation: u64,
}

impl SyncSnapshot {
    pub fn can_create(&self) -> bool {
        !self.busy
    }

    pub fn can_vote(&self, poll_id: u64) -> bool {
        !self.busy && self.polls.get(poll_id).is_some_and(|poll| poll.active)
    }

    pub fn can_close(&self, poll_id: u64) -> bool {
        self.can_vote(poll_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Create,
    Vote,
    Close,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Create => "create",
            Command::Vote => "vote",
            Command::Close => "close",
        })
    }
}

struct Inner<S> {
    service: S,
    state: watch::Sender<SyncSnapshot>,
    refresh: RefreshSlot,
    command_in_flight: AtomicBool,
}

/// Cached, serialized front for a [`PollService`].
///
/// Cloning is cheap; clones share the cache, the command flag and the refresh slot.
pub struct PollSynchronizer<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for PollSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Holds the command flag; releasing it also clears `busy` in the published snapshot.
struct CommandGuard<'a, S> {
    inner: &'a Inner<S>,
    failure: Option<ErrorReport>,
}

impl<S> CommandGuard<'_, S> {
    /// Release the flag, publishing `busy = false` and any failure as one update.
    fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        if let Err(err) = &outcome {
            self.failure = Some(ErrorReport::from(err));
        }
        outcome
    }
}

impl<S> Drop for CommandGuard<'_, S> {
    fn drop(&mut self) {
        let failure = self.failure.take();
        self.inner.state.send_modify(|state| {
            state.busy = false;
            if failure.is_some() {
                state.last_error = failure;
            }
        });
        self.inner.command_in_flight.store(false, Ordering::Release);
    }
}

impl<S: PollService + 'static> PollSynchronizer<S> {
    /// Create a synchronizer with an empty cache. Nothing is read until [`refresh`] is called.
    ///
    /// [`refresh`]: PollSynchronizer::refresh
    pub fn new(service: S) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                service,
                state,
                refresh: RefreshSlot::new(),
                command_in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Current published state.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Polls as of the last successful refresh.
    pub fn polls(&self) -> PollSet {
        self.inner.state.borrow().polls.clone()
    }

    /// Receiver notified whenever the published state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.state.subscribe()
    }

    /// Re-read every poll from the service and publish the result.
    ///
    /// Joins a refresh that is already running instead of starting a second scan. On failure
    /// the previously published polls stay untouched.
    pub async fn refresh(&self) -> Result<PollSet> {
        Inner::refresh_from(&self.inner, 0).await
    }

    /// Create a poll, then refresh once the service acknowledged it.
    pub async fn create_poll<T: AsRef<str>>(&self, title: &str, options: &[T]) -> Result<()> {
        let guard = self.begin_command()?;
        let outcome = async {
            let (title, options) = validate_new_poll(title, options)?;
            let submitted = self
                .inner
                .service
                .submit_create_poll(&title, &options)
                .await;
            self.settle(Command::Create, submitted).await
        }
        .await;
        guard.finish(outcome)
    }

    /// Vote for `option_id` of `poll_id`.
    ///
    /// Refused locally, without a service call, when the ids are outside the cached polls or
    /// the cached poll is closed.
    pub async fn vote(&self, poll_id: u64, option_id: u64) -> Result<()> {
        let guard = self.begin_command()?;
        let outcome = async {
            let polls = self.polls();
            let poll = cached_poll(&polls, poll_id)?;
            if !poll.has_option(option_id) {
                return Err(SyncError::invalid_input(format!(
                    "poll {} has {} options, no option {}",
                    poll_id,
                    poll.option_count(),
                    option_id
                )));
            }
            if !poll.active {
                return Err(SyncError::PollClosed { poll_id });
            }
            let submitted = self.inner.service.submit_vote(poll_id, option_id).await;
            self.settle(Command::Vote, submitted).await
        }
        .await;
        guard.finish(outcome)
    }

    /// Close `poll_id`. Refused locally when the cached poll is already closed.
    pub async fn close_poll(&self, poll_id: u64) -> Result<()> {
        let guard = self.begin_command()?;
        let outcome = async {
            let polls = self.polls();
            let poll = cached_poll(&polls, poll_id)?;
            if !poll.active {
                return Err(SyncError::AlreadyClosed { poll_id });
            }
            let submitted = self.inner.service.submit_close_poll(poll_id).await;
            self.settle(Command::Close, submitted).await
        }
        .await;
        guard.finish(outcome)
    }

    fn begin_command(&self) -> Result<CommandGuard<'_, S>> {
        if self
            .inner
            .command_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.record(Err(SyncError::Busy));
        }
        self.inner.state.send_modify(|state| state.busy = true);
        Ok(CommandGuard {
            inner: &self.inner,
            failure: None,
        })
    }

    /// Turn a submission result into the command result, resynchronizing as required.
    ///
    /// An applied command reports success even if the follow-up refresh fails; that refresh
    /// failure is published as `last_error` instead. A rejected create leaves the cache as is;
    /// a rejected vote or close forces a refresh.
    async fn settle(&self, command: Command, submitted: ServiceResult<()>) -> Result<()> {
        let error = match submitted {
            Ok(()) => {
                info!("{} acknowledged by poll service", command);
                self.refresh_after_command(command).await;
                return Ok(());
            }
            Err(fault) => SyncError::from_submit_fault(fault),
        };

        match error {
            SyncError::ServiceUnavailable { .. } => {
                warn!("{} not delivered: {}", command, error);
            }
            SyncError::CommandRejected { .. } if command == Command::Create => {
                warn!("{} rejected: {}", command, error);
            }
            _ => {
                warn!("{} failed: {}", command, error);
                self.refresh_after_command(command).await;
            }
        }
        Err(error)
    }

    async fn refresh_after_command(&self, command: Command) {
        let min_epoch = self.inner.refresh.next_epoch();
        if let Err(err) = Inner::refresh_from(&self.inner, min_epoch).await {
            warn!("refresh after {} failed: {}", command, err);
        }
    }

    fn record<T>(&self, outcome: Result<T>) -> Result<T> {
        if let Err(err) = &outcome {
            let report = ErrorReport::from(err);
            self.inner
                .state
                .send_modify(|state| state.last_error = Some(report));
        }
        outcome
    }
}

impl<S: PollService + 'static> Inner<S> {
    /// Await a refresh whose scan starts no earlier than `min_epoch` was handed out.
    async fn refresh_from(this: &Arc<Self>, min_epoch: u64) -> Result<PollSet> {
        loop {
            let acquired = this.refresh.acquire(min_epoch, |epoch| {
                this.state.send_modify(|state| state.loading = true);
                let inner = Arc::clone(this);
                async move { inner.run_refresh(epoch).await }.boxed()
            });
            match acquired {
                Acquired::Started(future) => return future.await,
                Acquired::Joined(future) => {
                    debug!("joining in-flight refresh");
                    return future.await;
                }
                Acquired::Stale(future) => {
                    debug!("waiting out a refresh started before epoch {}", min_epoch);
                    let _ = future.await;
                }
            }
        }
    }

    async fn run_refresh(self: Arc<Self>, epoch: u64) -> Result<PollSet> {
        debug!("refresh {} started", epoch);
        let result = refresh::fetch_poll_set(&self.service).await;

        self.refresh.finish(epoch, || {
            self.state.send_modify(|state| {
                state.loading = false;
                match &result {
                    Ok(polls) => {
                        state.polls = polls.clone();
                        state.generation += 1;
                        state.last_error = None;
                    }
                    Err(err) => state.last_error = Some(ErrorReport::from(err)),
                }
            });
        });

        match &result {
            Ok(polls) => debug!("refresh {} published {} polls", epoch, polls.len()),
            Err(err) => warn!("refresh {} failed: {}", epoch, err),
        }
        result
    }
}

fn cached_poll(polls: &PollSet, poll_id: u64) -> Result<&Poll> {
    polls.get(poll_id).ok_or_else(|| {
        SyncError::invalid_input(format!(
            "no poll {} among {} cached polls",
            poll_id,
            polls.len()
        ))
    })
}

/// Check a new poll's title and options, returning trimmed copies.
fn validate_new_poll<T: AsRef<str>>(title: &str, options: &[T]) -> Result<(String, Vec<String>)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SyncError::invalid_input("poll title must not be empty"));
    }
    if options.len() < 2 {
        return Err(SyncError::invalid_input(format!(
            "a poll needs at least two options, got {}",
            options.len()
        )));
    }
    let options: Vec<String> = options
        .iter()
        .map(|option| option.as_ref().trim().to_string())
        .collect();
    if let Some(idx) = options.iter().position(String::is_empty) {
        return Err(SyncError::invalid_input(format!("option {} is empty", idx)));
    }
    Ok((title.to_string(), options))
}
