//! The bounded enrichment worker pool (distilled spec §4.B, §5): fans
//! events out across concurrent workers, but re-establishes ingestion
//! order before handoff downstream.

use super::services::{PinpointService, ShipCatalog, SystemResolver};
use crate::types::{EnrichedEvent, Event, ShipCategories};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Resolves everything for one event. Never fails: a missing pinpoint or
/// ship category resolves to its least-informative default.
pub async fn enrich_one(
    event: Event,
    pinpoint: &dyn PinpointService,
    ships: &dyn ShipCatalog,
    systems: &dyn SystemResolver,
) -> EnrichedEvent {
    let (mut resolved_pinpoint, (system_name, region_name), victim_ship) = tokio::join!(
        pinpoint.pinpoint(&event),
        systems.resolve(event.system_id),
        ships.lookup(event.victim.ship_type_id),
    );
    resolved_pinpoint.system_name = resolved_pinpoint.system_name.or(system_name);
    resolved_pinpoint.region_name = resolved_pinpoint.region_name.or(region_name);

    let mut attacker_ships = Vec::with_capacity(event.attackers.len());
    for attacker in &event.attackers {
        let ship_info = match attacker.ship_type_id {
            Some(type_id) => ships.lookup(type_id).await,
            None => Default::default(),
        };
        attacker_ships.push(ship_info);
    }

    EnrichedEvent {
        event,
        pinpoint: resolved_pinpoint,
        ship_categories: ShipCategories {
            victim: victim_ship,
            attackers: attacker_ships,
        },
    }
}

/// Owns the three enrichment collaborators and the concurrency bound.
/// Cheap to clone: everything inside is an `Arc`.
#[derive(Clone)]
pub struct Enricher {
    pinpoint: Arc<dyn PinpointService>,
    ships: Arc<dyn ShipCatalog>,
    systems: Arc<dyn SystemResolver>,
    permits: Arc<Semaphore>,
}

impl Enricher {
    pub fn new(
        pinpoint: Arc<dyn PinpointService>,
        ships: Arc<dyn ShipCatalog>,
        systems: Arc<dyn SystemResolver>,
        worker_count: usize,
    ) -> Self {
        Self {
            pinpoint,
            ships,
            systems,
            permits: Arc::new(Semaphore::new(worker_count.max(1))),
        }
    }

    /// Consumes raw events from `input` in order, enriches up to
    /// `worker_count` concurrently, and sends `EnrichedEvent`s to
    /// `output` in the same order they arrived. Exits when `input`
    /// closes or `shutdown` fires.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<Event>,
        output: mpsc::Sender<EnrichedEvent>,
        shutdown: CancellationToken,
    ) {
        let (done_tx, mut done_rx) = mpsc::channel::<(u64, EnrichedEvent)>(1);
        let mut next_seq: u64 = 0;
        let mut next_to_emit: u64 = 0;
        let mut pending: BTreeMap<u64, EnrichedEvent> = BTreeMap::new();
        let mut input_closed = false;
        let mut outstanding: u64 = 0;

        loop {
            if input_closed && outstanding == 0 {
                return;
            }
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("enricher shutting down");
                    return;
                }
                maybe_event = input.recv(), if !input_closed => {
                    let Some(event) = maybe_event else {
                        input_closed = true;
                        continue;
                    };
                    let seq = next_seq;
                    next_seq += 1;
                    outstanding += 1;

                    let permit = match self.permits.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };
                    let pinpoint = self.pinpoint.clone();
                    let ships = self.ships.clone();
                    let systems = self.systems.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        let enriched = enrich_one(event, pinpoint.as_ref(), ships.as_ref(), systems.as_ref()).await;
                        drop(permit);
                        let _ = done_tx.send((seq, enriched)).await;
                    });
                }
                Some((seq, enriched)) = done_rx.recv() => {
                    outstanding = outstanding.saturating_sub(1);
                    pending.insert(seq, enriched);
                    while let Some(enriched) = pending.remove(&next_to_emit) {
                        next_to_emit += 1;
                        if output.send(enriched).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}
