//! Wires the Feed Poller, Enricher, Grouping Rules, Activity Store,
//! Probability Engine, and Classifier into the end-to-end ingest pipeline
//! (distilled spec §2, §5). Grounded on the teacher's unified
//! `ProcessingLoop` (`pipeline/processing_loop.rs`): one task drains the
//! source, a bounded worker pool enriches, and a single consumer applies
//! each event's effects in order before moving to the next.

use crate::classify;
use crate::config::Settings;
use crate::enrich::{Enricher, PinpointService, ShipCatalog, SystemResolver};
use crate::feed::{FeedOutcome, FeedSource};
use crate::grouping;
use crate::scoring;
use crate::store::ActivityStore;
use crate::types::{EnrichedEvent, Event, Session};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;

const RAW_EVENT_CHANNEL_DEPTH: usize = 256;
const ENRICHED_EVENT_CHANNEL_DEPTH: usize = 256;

/// Drains `feed` into the enrichment pool and applies every resulting
/// [`EnrichedEvent`] to `store`, broadcasting a fresh snapshot on `updates`
/// after each event that touched at least one session. Returns when `feed`
/// reports end-of-stream or `shutdown` fires.
pub async fn run_pipeline(
    mut feed: Box<dyn FeedSource>,
    pinpoint: Arc<dyn PinpointService>,
    ships: Arc<dyn ShipCatalog>,
    systems: Arc<dyn SystemResolver>,
    store: ActivityStore,
    settings: Settings,
    updates: broadcast::Sender<Vec<Session>>,
    shutdown: CancellationToken,
) {
    let (raw_tx, raw_rx) = mpsc::channel::<Event>(RAW_EVENT_CHANNEL_DEPTH);
    let (enriched_tx, mut enriched_rx) = mpsc::channel::<EnrichedEvent>(ENRICHED_EVENT_CHANNEL_DEPTH);

    let enricher = Enricher::new(pinpoint, ships, systems, settings.enrich_workers);
    let enrich_task = tokio::spawn(enricher.run(raw_rx, enriched_tx, shutdown.clone()));

    let poll_shutdown = shutdown.clone();
    let poll_task = tokio::spawn(async move {
        loop {
            if poll_shutdown.is_cancelled() {
                return;
            }
            match feed.next().await {
                FeedOutcome::Event(event) => {
                    if raw_tx.send(event).await.is_err() {
                        return;
                    }
                }
                FeedOutcome::Empty => {}
                FeedOutcome::Eof => {
                    info!(source = feed.source_name(), "feed source exhausted");
                    return;
                }
            }
        }
    });

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("ingest pipeline shutting down");
                break;
            }
            maybe_event = enriched_rx.recv() => {
                let Some(enriched) = maybe_event else { break };
                apply_event(&store, &settings, enriched, &updates).await;
            }
        }
    }

    poll_task.abort();
    enrich_task.abort();
}

/// Routes one enriched event into the Activity Store (distilled spec
/// §4.D), then recomputes probability (§4.E), classification (§4.F), and
/// derived metrics for every session it touched, in that order, before
/// broadcasting the new snapshot for the Subscriber Hub to relay.
async fn apply_event(store: &ActivityStore, settings: &Settings, event: EnrichedEvent, updates: &broadcast::Sender<Vec<Session>>) {
    let now = event.event.timestamp;
    let touched = grouping::route_event(store, event).await;
    if touched.is_empty() {
        return;
    }

    for id in &touched {
        store
            .with_existing_session_mut(id, |session| {
                scoring::compute(session, settings, now);
                session.classification = classify::classify(session);
                session.metrics = scoring::metrics::compute(session);
            })
            .await;
    }

    let _ = updates.send(store.snapshot().await);
}
