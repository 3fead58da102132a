//! Page-side consumer of update messages.
//!
//! - [`page`]: owned HTML page model
//! - [`locate`]: candidate producers and deduplication
//! - [`updater`]: applies updates, runs the refresh fallback, owns timers

pub mod locate;
pub mod page;
pub mod updater;

pub use locate::{Candidate, CandidateProducer, Locator, MatchKind, Query};
pub use page::{Page, PageError};
pub use updater::{ApplyOutcome, LiveUpdater, PageEvent, UpdaterSettings};
