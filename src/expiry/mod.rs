//! The Expiry/Archiver (distilled spec §4.G): a periodic scan that
//! recomputes decay for every live session, evicts idle ones, and hands
//! qualifying camp sessions to the durable archive. Grounded on the
//! curator's interval-driven background loop (`hub/curator/mod.rs`) and
//! the self-healer's periodic-task shape (`background/self_healer.rs`).

pub mod archive;

use crate::classify;
use crate::config::Settings;
use crate::scoring;
use crate::store::ActivityStore;
use crate::types::session::{SeedKind, Session};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Returns the idle timeout that applies to `session` given its current
/// classification (distilled spec §4.G): camp-family tags get the longer
/// timeout, everything else the shorter one.
fn idle_timeout(session: &Session, settings: &Settings) -> Duration {
    if session.classification.is_camp_family() {
        Duration::minutes(settings.camp_timeout_min as i64)
    } else {
        Duration::minutes(settings.roam_timeout_min as i64)
    }
}

fn is_archival_candidate(session: &Session) -> bool {
    session.seed_kind == SeedKind::CampSeed && session.classification.is_camp_family()
}

/// Recomputes probability and classification for every live session, then
/// expires and archives the ones past their idle timeout. Returns the
/// surviving snapshot if anything changed, so the caller can decide
/// whether to broadcast (distilled spec §4.G: "emits a snapshot ... only
/// when at least one Session changed state ... or was expired").
async fn run_cycle(store: &ActivityStore, settings: &Settings, archive_pool: Option<&PgPool>) -> Option<Vec<Session>> {
    let now = Utc::now();

    let changed_ids = store
        .rescore_all(|session| {
            let before = (session.probability, session.classification, session.members.len());
            scoring::compute(session, settings, now);
            session.classification = classify::classify(session);
            let after = (session.probability, session.classification, session.members.len());
            before != after
        })
        .await;

    let expired = store
        .expire(|session| now - session.last_event_time > idle_timeout(session, settings))
        .await;

    if !expired.is_empty() {
        info!(count = expired.len(), "expired sessions past idle timeout");
    }

    for session in &expired {
        if !is_archival_candidate(session) {
            continue;
        }
        let Some(pool) = archive_pool else { continue };
        let record = archive::build_record(session, idle_timeout(session, settings));
        if let Err(e) = archive::insert(pool, &record).await {
            warn!(session = %session.id, error = %e, "archive write failed, will retry next scan");
        }
    }

    if changed_ids.is_empty() && expired.is_empty() {
        None
    } else {
        Some(store.snapshot().await)
    }
}

/// Runs the expiry scan on `settings.update_interval_ms` cadence until
/// `shutdown` fires. Broadcasts the surviving snapshot on `updates`
/// whenever this cycle changed anything, for the Subscriber Hub to relay.
pub async fn run(
    store: ActivityStore,
    settings: Settings,
    archive_pool: Option<PgPool>,
    updates: broadcast::Sender<Vec<Session>>,
    shutdown: CancellationToken,
) {
    if let Some(pool) = &archive_pool {
        if let Err(e) = archive::ensure_schema(pool).await {
            error!(error = %e, "failed to ensure expired_camps schema exists");
        }
    }

    let mut interval = tokio::time::interval(StdDuration::from_millis(settings.update_interval_ms));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("expiry loop shutting down");
                return;
            }
            _ = interval.tick() => {
                if let Some(snapshot) = run_cycle(&store, &settings, archive_pool.as_ref()).await {
                    let _ = updates.send(snapshot);
                }
            }
        }
    }
}
