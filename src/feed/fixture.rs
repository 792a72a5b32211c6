use super::source::{FeedOutcome, FeedSource};
use crate::types::Event;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Replays a fixed sequence of events, then reports end-of-stream.
/// Used by integration tests in place of the live long-poll client.
#[derive(Debug)]
pub struct FixtureFeedSource {
    events: VecDeque<Event>,
    exhausted: bool,
}

impl FixtureFeedSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
            exhausted: false,
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeedSource {
    async fn next(&mut self) -> FeedOutcome {
        match self.events.pop_front() {
            Some(event) => FeedOutcome::Event(event),
            None => {
                self.exhausted = true;
                FeedOutcome::Eof
            }
        }
    }

    fn source_name(&self) -> &str {
        "fixture"
    }
}
