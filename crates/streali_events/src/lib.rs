// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live stream events for the Streali dashboard.
//!
//! - [`event`]: the event model and its type codes
//! - [`filter`] / [`store`]: which types are shown, persisted as JSON
//! - [`feed`]: history snapshot merged with pushed events
//! - [`api`] / [`source`]: REST history and the server-sent events stream

pub mod event;
pub mod filter;
pub mod store;
pub mod feed;
pub mod api;
pub mod source;

pub use event::{EventKind, StreamEvent};
pub use filter::{EventCheck, EventFilter};
pub use store::{default_filter_path, FilterStore, StoreError, StoreResult, FILTER_FILE_NAME};
pub use feed::EventFeed;
pub use api::{embed_link, ApiClient, ApiError, ApiResult};
pub use source::{EventSource, EventSourceHandle, SourceError, SourceMessage, SseMessage, SseParser};
