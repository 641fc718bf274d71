//! savvylinks core library
//!
//! Keeps an in-memory copy of a user's SavvyCal scheduling links, refreshes
//! it in the background, and serves fuzzy lookups plus a few per-link
//! actions (copy, open, toggle availability).
//!
//! # Architecture
//!
//! - **Credential store**: the API token, with change notification
//! - **API client**: list and toggle requests against the SavvyCal API
//! - **Cache**: immutable snapshots swapped in after each successful fetch
//! - **Refresher / scheduler**: one refresh at a time, driven by a timer,
//!   token changes and explicit reloads
//! - **Query**: fuzzy filter over name and private name
//! - **Actions**: copy / open / toggle through host capabilities
//!
//! # Modules
//!
//! - `engine`: wires everything together (main entry point)
//! - `config`: application configuration

pub mod actions;
pub mod api;
pub mod cache;
pub mod config;
pub mod credential;
pub mod engine;
pub mod models;
pub mod query;
pub mod refresh;

pub use actions::{ActionDispatcher, ActionItem, Host, LinkAction};
pub use api::{FetchError, LinksClient};
pub use cache::{LinkCache, Snapshot};
pub use config::Config;
pub use credential::{Credential, CredentialStore};
pub use engine::LinksEngine;
pub use models::LinkRecord;
pub use query::{FuzzyMatcher, MatchScore, ResultItem, SkimScorer};
pub use refresh::{RefreshOutcome, RefreshState, Refresher, SchedulerEvent, SchedulerHandle};
