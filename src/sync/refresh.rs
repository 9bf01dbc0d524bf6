//! Full-scan refresh and refresh coalescing.
//!
//! A refresh reads the poll count, then the details and per-option tallies of every poll, and
//! only then yields a [`PollSet`]. Any failed read aborts the scan, so nothing partial ever
//! leaves this module.
//!
//! [`RefreshSlot`] holds at most one in-flight refresh as a shared future. Each refresh is
//! stamped with an epoch when it is created; callers that need data read strictly after some
//! event (a command acknowledgment) ask for a minimum epoch and never join an older refresh.

use crate::error::{Result, SyncError};
use crate::poll::{Poll, PollSet};
use crate::service::PollService;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use parking_lot::Mutex;

/// Upper bound on the up-front allocation for a scan, whatever count the service reports.
const MAX_PREALLOCATED_POLLS: u64 = 1024;

pub(crate) type SharedRefresh = Shared<BoxFuture<'static, Result<PollSet>>>;

/// Read every poll from the service, in index order.
pub async fn fetch_poll_set<S: PollService + ?Sized>(service: &S) -> Result<PollSet> {
    let count = service
        .count_polls()
        .await
        .map_err(SyncError::from_read_fault)?;
    debug!("refresh: service reports {} polls", count);

    let mut polls = Vec::with_capacity(count.min(MAX_PREALLOCATED_POLLS) as usize);
    for poll_id in 0..count {
        let details = service
            .get_poll_details(poll_id)
            .await
            .map_err(SyncError::from_read_fault)?;

        let mut votes = Vec::with_capacity(details.options.len());
        for option_id in 0..details.options.len() as u64 {
            let count = service
                .get_vote_count(poll_id, option_id)
                .await
                .map_err(SyncError::from_read_fault)?;
            votes.push(count);
        }

        polls.push(Poll::from_reads(poll_id, details, votes));
    }

    Ok(PollSet::new(polls))
}

struct InFlight {
    epoch: u64,
    future: SharedRefresh,
}

/// How a caller got hold of a refresh future.
pub(crate) enum Acquired {
    /// A refresh recent enough for the caller was already running
    Joined(SharedRefresh),
    /// The caller created a new refresh
    Started(SharedRefresh),
    /// A refresh older than the caller's minimum epoch is running; await it, then retry
    Stale(SharedRefresh),
}

#[derive(Default)]
pub(crate) struct RefreshSlot {
    in_flight: Mutex<Option<InFlight>>,
    next_epoch: Mutex<u64>,
}

impl RefreshSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Epoch the next created refresh will carry.
    pub(crate) fn next_epoch(&self) -> u64 {
        *self.next_epoch.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Join the running refresh if its epoch is at least `min_epoch`, otherwise create one
    /// with `start` when the slot is empty.
    pub(crate) fn acquire(
        &self,
        min_epoch: u64,
        start: impl FnOnce(u64) -> BoxFuture<'static, Result<PollSet>>,
    ) -> Acquired {
        let mut slot = self.in_flight.lock();
        match slot.as_ref() {
            Some(running) if running.epoch >= min_epoch => {
                Acquired::Joined(running.future.clone())
            }
            Some(running) => Acquired::Stale(running.future.clone()),
            None => {
                let epoch = {
                    let mut next = self.next_epoch.lock();
                    let epoch = *next;
                    *next += 1;
                    epoch
                };
                let future = start(epoch).shared();
                *slot = Some(InFlight {
                    epoch,
                    future: future.clone(),
                });
                Acquired::Started(future)
            }
        }
    }

    /// Vacate the slot if it still holds refresh `epoch`, running `publish` while the slot is
    /// locked so no new refresh can start between publishing and vacating.
    pub(crate) fn finish(&self, epoch: u64, publish: impl FnOnce()) {
        let mut slot = self.in_flight.lock();
        publish();
        if slot.as_ref().map(|running| running.epoch) == Some(epoch) {
            *slot = None;
        }
    }
}
