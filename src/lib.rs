//! # pollsync - Poll View Synchronizer
//!
//! Keeps a local, cached view of on-chain polls consistent with the poll contract that owns
//! them. The contract and the wallet-provider library in front of it are treated as an opaque,
//! slow and fallible [`PollService`]; this crate decides when to read it, how to serialize
//! mutations against it, and what a presentation layer is allowed to show.
//!
//! ## Architecture
//!
//! - [`error`] - Error taxonomy shared by the synchronizer and service adapters
//! - [`poll`] - Poll records and immutable poll set snapshots
//! - [`service`] - The poll service seam, an in-memory service and a timeout decorator
//! - [`sync`] - The synchronizer: cached snapshot, coalesced refresh, serialized commands
//! - [`config`] - TOML configuration for the shell
//! - [`app`] - Line-oriented shell driving a synchronizer

// Core modules
pub mod error;
pub mod poll;

// Core components
pub mod service;
pub mod sync;

// Front end
pub mod app;
pub mod config;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, ErrorReport, Result, ServiceFault, SyncError};

// Public API surface for external usage
pub use app::Application;
pub use config::SyncConfig;
pub use poll::{Poll, PollDetails, PollSet};
pub use service::{InMemoryPollService, PollService, TimeoutPollService};
pub use sync::{PollSynchronizer, SyncSnapshot};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
