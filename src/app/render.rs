//! Plain-text rendering of synchronizer state for the shell.

use crate::error::SyncError;
use crate::poll::Poll;
use crate::sync::SyncSnapshot;
use std::fmt::Write;

/// Render every cached poll, closed polls marked, leading options starred.
pub fn render_polls(snapshot: &SyncSnapshot) -> String {
    if snapshot.polls.is_empty() {
        return if snapshot.generation == 0 {
            "no polls loaded yet, run 'refresh'\n".to_string()
        } else {
            "no polls\n".to_string()
        };
    }

    let mut out = String::new();
    for poll in snapshot.polls.iter() {
        render_poll(&mut out, poll, snapshot.can_vote(poll.id));
    }
    out
}

fn render_poll(out: &mut String, poll: &Poll, votable: bool) {
    let state = if poll.active { "open" } else { "closed" };
    let _ = writeln!(
        out,
        "[{}] {} ({}, {} votes)",
        poll.id,
        poll.title,
        state,
        poll.total_votes()
    );

    let leading = poll.leading_options();
    let width = poll.options.iter().map(|o| o.chars().count()).max().unwrap_or(0);
    for (idx, (label, votes)) in poll.options.iter().zip(&poll.votes).enumerate() {
        let marker = if leading.contains(&idx) { " *" } else { "" };
        let _ = writeln!(
            out,
            "    {}. {:<width$}  {}{}",
            idx,
            label,
            votes,
            marker,
            width = width
        );
    }
    if !votable && poll.active {
        let _ = writeln!(out, "    (voting disabled while a command is running)");
    }
}

pub fn render_status(snapshot: &SyncSnapshot) -> String {
    let mut out = format!(
        "polls: {}  refreshes: {}  loading: {}  busy: {}\n",
        snapshot.polls.len(),
        snapshot.generation,
        yes_no(snapshot.loading),
        yes_no(snapshot.busy)
    );
    match &snapshot.last_error {
        Some(report) => {
            let _ = writeln!(out, "last error ({:?}): {}", report.kind, report.message);
        }
        None => out.push_str("last error: none\n"),
    }
    out
}

pub fn render_error(err: &SyncError) -> String {
    let hint = if err.kind().is_retryable() {
        " (retry later)"
    } else {
        ""
    };
    format!("error: {}{}\n", err, hint)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
