use crate::types::Event;
use async_trait::async_trait;

/// One long-poll result. `Empty` is the normal "nothing happened within
/// the bounded wait" reply from the upstream contract (distilled spec
/// §6); `Eof` is only produced by fixture sources used in tests.
#[derive(Debug)]
pub enum FeedOutcome {
    Event(Event),
    Empty,
    Eof,
}

/// Abstraction over where raw events come from, so the rest of the core
/// never depends on the live HTTP long-poll client directly (distilled
/// spec §4.A). Implementations own their own retry/backoff policy and
/// never surface transient errors through this trait.
#[async_trait]
pub trait FeedSource: Send {
    async fn next(&mut self) -> FeedOutcome;

    fn source_name(&self) -> &str;
}
