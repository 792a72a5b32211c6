use super::error::FeedError;
use super::source::{FeedOutcome, FeedSource};
use crate::types::event::{Event, FeedEnvelope};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Initial backoff delay after a transient upstream failure (doubles each
/// consecutive failure, capped at `backoff_ceiling`).
const INITIAL_BACKOFF_SECS: u64 = 1;

/// Long-polling HTTP client against the upstream killmail feed
/// (distilled spec §4.A, §6). Never gives up: on a transient error it
/// backs off and retries indefinitely, logging each attempt, so a poller
/// failure stays local to this task.
pub struct LongPollFeedSource {
    client: reqwest::Client,
    url: String,
    poll_timeout: Duration,
    backoff_ceiling: Duration,
    consecutive_failures: u32,
}

impl LongPollFeedSource {
    pub fn new(url: String, poll_timeout: Duration, backoff_ceiling: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            poll_timeout,
            backoff_ceiling,
            consecutive_failures: 0,
        }
    }

    async fn poll_once(&self) -> Result<FeedOutcome, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.poll_timeout)
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let envelope: FeedEnvelope = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        let Some(package) = envelope.package else {
            return Ok(FeedOutcome::Empty);
        };

        let kill_id = package.kill_id;
        match Event::try_from(package) {
            Ok(event) => Ok(FeedOutcome::Event(event)),
            Err(e) => {
                warn!(kill_id, error = %e, "dropping malformed event from feed");
                Ok(FeedOutcome::Empty)
            }
        }
    }

    fn backoff_delay(&self) -> Duration {
        let secs = INITIAL_BACKOFF_SECS.saturating_mul(1u64 << self.consecutive_failures.min(16));
        Duration::from_secs(secs).min(self.backoff_ceiling)
    }
}

#[async_trait]
impl FeedSource for LongPollFeedSource {
    async fn next(&mut self) -> FeedOutcome {
        loop {
            match self.poll_once().await {
                Ok(outcome) => {
                    self.consecutive_failures = 0;
                    return outcome;
                }
                Err(e) => {
                    let delay = self.backoff_delay();
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    warn!(
                        error = %e,
                        attempt = self.consecutive_failures,
                        delay_secs = delay.as_secs(),
                        "feed poll failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "long_poll"
    }
}

impl std::fmt::Debug for LongPollFeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongPollFeedSource").field("url", &self.url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_doubles_and_caps() {
        let mut source = LongPollFeedSource::new(
            "http://example.invalid".into(),
            Duration::from_secs(10),
            Duration::from_secs(8),
        );
        assert_eq!(source.backoff_delay(), Duration::from_secs(1));
        source.consecutive_failures = 1;
        assert_eq!(source.backoff_delay(), Duration::from_secs(2));
        source.consecutive_failures = 10;
        assert_eq!(source.backoff_delay(), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn debug_impl_does_not_panic() {
        let source = LongPollFeedSource::new(
            "http://example.invalid".into(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let _ = format!("{source:?}");
    }
}
