use thiserror::Error;

/// Enrichment never fails the event (distilled spec §4.B, §7) — this
/// exists only for the rare internal plumbing error (e.g. a worker task
/// panicked) that the pool needs to log.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("enrichment worker task panicked or was cancelled")]
    WorkerLost,
}
