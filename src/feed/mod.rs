//! The Feed Poller (distilled spec §4.A): a single long-running task that
//! long-polls the upstream killmail feed and yields a lazy, unbounded
//! stream of raw events. Poller failures are local: logged and retried
//! with exponential backoff, never propagated to the rest of the core.

mod error;
mod fixture;
mod live;
mod source;

pub use error::FeedError;
pub use fixture::FixtureFeedSource;
pub use live::LongPollFeedSource;
pub use source::{FeedOutcome, FeedSource};
