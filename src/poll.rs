//! Poll data model.
//!
//! A [`PollSet`] is an immutable snapshot of every poll the service reported during one full
//! refresh. It is never edited in place: the synchronizer builds a new set and swaps it in.

use std::sync::Arc;

/// Poll fields returned by a single detail read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDetails {
    pub title: String,
    pub options: Vec<String>,
    pub active: bool,
}

/// A poll as last confirmed by the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    /// Index of the poll in the service, stable for the poll's lifetime
    pub id: u64,
    pub title: String,
    /// Option labels in display order, fixed at creation
    pub options: Vec<String>,
    /// Cleared once the poll is closed, never set again
    pub active: bool,
    /// Vote count per option, same length as `options`
    pub votes: Vec<u64>,
}

impl Poll {
    pub(crate) fn from_reads(id: u64, details: PollDetails, votes: Vec<u64>) -> Self {
        Self {
            id,
            title: details.title,
            options: details.options,
            active: details.active,
            votes,
        }
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn has_option(&self, option_id: u64) -> bool {
        option_id < self.options.len() as u64
    }

    pub fn total_votes(&self) -> u64 {
        self.votes.iter().sum()
    }

    /// Indices of the options holding the highest count. Empty while no votes are cast.
    pub fn leading_options(&self) -> Vec<usize> {
        let max = match self.votes.iter().copied().max() {
            Some(max) if max > 0 => max,
            _ => return Vec::new(),
        };
        self.votes
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == max)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Ordered, immutable collection of polls indexed by poll id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollSet {
    polls: Arc<[Poll]>,
}

impl PollSet {
    /// Polls must be in id order, each id equal to its position.
    pub(crate) fn new(polls: Vec<Poll>) -> Self {
        debug_assert!(polls.iter().enumerate().all(|(idx, p)| p.id == idx as u64));
        Self {
            polls: polls.into(),
        }
    }

    pub fn get(&self, poll_id: u64) -> Option<&Poll> {
        usize::try_from(poll_id)
            .ok()
            .and_then(|idx| self.polls.get(idx))
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Poll> {
        self.polls.iter()
    }

    /// Whether both sets share the same underlying snapshot.
    pub fn ptr_eq(&self, other: &PollSet) -> bool {
        Arc::ptr_eq(&self.polls, &other.polls)
    }
}
