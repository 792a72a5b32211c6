use thiserror::Error;

/// Transient, internally-retried failure modes for the feed poller. These
/// never escape [`FeedSource::next`](super::source::FeedSource::next) —
/// they are logged and retried inside the implementation (distilled spec
/// §4.A, §7).
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to upstream feed failed: {0}")]
    Request(String),
    #[error("upstream feed returned status {0}")]
    Status(u16),
    #[error("response body was not valid JSON: {0}")]
    Decode(String),
}
