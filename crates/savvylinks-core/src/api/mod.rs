//! SavvyCal API client
//!
//! Two endpoints are used:
//!
//! - `GET /v1/links?limit=100` lists the user's scheduling links
//! - `POST /v1/links/{id}/toggle` flips a link between enabled and disabled
//!
//! Both authenticate with a bearer token.

mod client;
mod error;
mod models;

pub use client::{LinksClient, LIST_LIMIT};
pub use error::{FetchError, FetchResult};
pub use models::{ListMetadata, ListResponse, RawEntry, RawScope};
