//! Cached derived metrics (distilled spec §3, §4.E groundwork), recomputed
//! on every append. Field names mirror the subscriber wire shape (§6).

use crate::types::enriched::EnrichedEvent;
use crate::types::session::{Session, SessionMetrics};
use chrono::Utc;
use std::collections::HashMap;

pub fn compute(session: &Session) -> SessionMetrics {
    let now = Utc::now();
    let span_secs = (session.last_event_time - session.first_event_time).num_seconds().max(0);
    let inactivity_secs = (now - session.last_event_time).num_seconds().max(0);

    let kill_count = session.events.len();
    let kill_frequency_per_hour = if span_secs > 0 {
        kill_count as f64 / (span_secs as f64 / 3600.0)
    } else {
        kill_count as f64
    };
    let avg_value_per_kill = if kill_count > 0 {
        session.total_value / kill_count as f64
    } else {
        0.0
    };
    let pod_kills = session
        .events
        .iter()
        .filter(|e: &&EnrichedEvent| e.is_pod_kill())
        .count() as u32;

    let mut ship_counts: HashMap<String, u32> = HashMap::new();
    for event in &session.events {
        *ship_counts.entry(event.ship_categories.victim.name.clone()).or_insert(0) += 1;
    }

    SessionMetrics {
        first_seen: session.first_event_time,
        camp_duration_secs: span_secs,
        active_duration_secs: span_secs,
        inactivity_duration_secs: inactivity_secs,
        pod_kills,
        kill_frequency_per_hour,
        avg_value_per_kill,
        ship_counts,
        party_characters: session.members.len(),
        party_corporations: session.composition.num_corps(),
        party_alliances: session.composition.num_alliances(),
    }
}
