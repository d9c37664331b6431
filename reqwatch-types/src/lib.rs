//! # reqwatch-types
//!
//! Wire types for request lifecycle events. This crate defines the schema that
//! an event producer (a browser extension bridge, a proxy tap, a test harness)
//! uses to feed request timings into reqwatch.
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde. Events are internally tagged by a
//!   `type` field so they can be streamed as newline-delimited JSON.
//!
//! ## Example
//!
//! ```rust
//! use reqwatch_types::{Event, RequestBegin, RequestEnd, RequestKind, ViewId};
//!
//! let begin = RequestBegin::new("42", "https://api.example.com/slow", ViewId(7), RequestKind::Fetch)
//!     .at(1_000.0);
//! let end = RequestEnd::new("42").at(13_500.0);
//!
//! let events = vec![Event::RequestBegin(begin), Event::RequestEnd(end)];
//! assert_eq!(events.len(), 2);
//! assert!(RequestKind::Fetch.is_trackable());
//! ```

mod event;
mod ids;
mod kind;

pub use event::*;
pub use ids::*;
pub use kind::*;
