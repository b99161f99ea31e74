//! Pagination and media loading on top of the site adapters.
//!
//! * [`session`] drives one search page by page.
//! * [`scheduler`] loads media for listed items with a fixed concurrency cap.

pub mod error;
pub mod scheduler;
pub mod session;

pub use crate::error::{FetchError, SessionError};
pub use crate::scheduler::{FetchEvent, FetchHandle, FetchOutcome, MediaFetchScheduler};
pub use crate::session::{SearchSession, SessionState};
