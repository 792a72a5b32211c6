//! The Regional Aggregator (distilled spec §4.I): two views of the same
//! data, both derived on demand rather than maintained incrementally — a
//! live fold over the current snapshot, and a history query against the
//! durable archive. Grounded on the dashboard summary handler's
//! `State<Arc<HubState>>` + `sqlx::query_scalar` shape
//! (`hub/api/dashboard.rs`).

use crate::store::ActivityStore;
use crate::types::classification::Classification;
use crate::types::session::Session;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Serialize)]
pub struct LiveRegionActivity {
    pub camps: u32,
    pub gangs: u32,
    pub battles: u32,
    pub other: u32,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct HistoryRegionActivity {
    pub sessions: i64,
    pub kills: i64,
    pub value: f64,
    #[serde(rename = "byType")]
    pub by_type: HashMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct RegionalActivity {
    pub live: HashMap<String, LiveRegionActivity>,
    pub history: HashMap<String, HistoryRegionActivity>,
}

const UNKNOWN_REGION: &str = "unknown";

/// Folds the current snapshot into per-region counts (distilled spec
/// §4.I live view). Sessions whose region is not yet known (no enriched
/// pinpoint region resolved) are pooled under `"unknown"` rather than
/// dropped.
pub fn live_view(sessions: &[Session]) -> HashMap<String, LiveRegionActivity> {
    let mut by_region: HashMap<String, LiveRegionActivity> = HashMap::new();

    for session in sessions {
        let region = session
            .path
            .last()
            .and_then(|p| p.region.clone())
            .unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let entry = by_region.entry(region).or_default();
        entry.total_value += session.total_value;

        match session.classification {
            Classification::Camp | Classification::SoloCamp | Classification::Smartbomb | Classification::RoamingCamp => {
                entry.camps += 1;
            }
            Classification::Roam | Classification::SoloRoam => entry.gangs += 1,
            Classification::Battle => entry.battles += 1,
            Classification::Activity => entry.other += 1,
        }
    }

    by_region
}

/// Queries the archive for sessions whose `end_time` falls within the
/// last `hours` (distilled spec §4.I history view).
pub async fn history_view(pool: &PgPool, hours: i64) -> Result<HashMap<String, HistoryRegionActivity>, sqlx::Error> {
    let rows: Vec<(Option<String>, f64, i64, String)> = sqlx::query_as(
        r#"SELECT
             region_name,
             total_value,
             event_count,
             CASE WHEN stargate_name IS NOT NULL THEN 'camp' ELSE 'roam' END AS type_tag
           FROM expired_camps
           WHERE end_time > NOW() - ($1 || ' hours')::interval"#,
    )
    .bind(hours.to_string())
    .fetch_all(pool)
    .await?;

    let mut by_region: HashMap<String, HistoryRegionActivity> = HashMap::new();
    for (region, total_value, event_count, type_tag) in rows {
        let entry = by_region.entry(region.unwrap_or_else(|| UNKNOWN_REGION.to_string())).or_default();
        entry.sessions += 1;
        entry.kills += event_count;
        entry.value += total_value;
        *entry.by_type.entry(type_tag).or_insert(0) += 1;
    }

    Ok(by_region)
}

#[derive(Clone)]
pub struct AggregateState {
    pub store: ActivityStore,
    pub archive_pool: Option<PgPool>,
}

#[derive(Deserialize)]
struct ActivityParams {
    hours: Option<i64>,
}

/// `GET /api/regions/activity?hours=N` (distilled spec §6).
async fn get_activity(
    State(state): State<Arc<AggregateState>>,
    Query(params): Query<ActivityParams>,
) -> Json<RegionalActivity> {
    let hours = params.hours.unwrap_or(24);
    let sessions = state.store.snapshot().await;
    let live = live_view(&sessions);

    let history = match &state.archive_pool {
        Some(pool) => history_view(pool, hours).await.unwrap_or_default(),
        None => HashMap::new(),
    };

    Json(RegionalActivity { live, history })
}

pub fn router(state: Arc<AggregateState>) -> Router {
    Router::new()
        .route("/api/regions/activity", get(get_activity))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enriched::{Pinpoint, ShipCategories};
    use crate::types::event::{Attacker, Victim};
    use crate::types::{EnrichedEvent, Event};
    use chrono::Utc;

    fn event_in(system_id: i64) -> EnrichedEvent {
        EnrichedEvent {
            event: Event {
                id: 1,
                timestamp: Utc::now(),
                system_id,
                victim: Victim {
                    ship_type_id: 1,
                    character_id: Some(5),
                    corporation_id: Some(9),
                    alliance_id: None,
                },
                attackers: vec![Attacker {
                    character_id: Some(1),
                    corporation_id: None,
                    alliance_id: None,
                    ship_type_id: None,
                    weapon_type_id: None,
                    final_blow: true,
                }],
                total_value: 5_000_000.0,
                labels: vec![],
                awox: false,
            },
            pinpoint: Pinpoint::default(),
            ship_categories: ShipCategories::default(),
        }
    }

    #[test]
    fn live_view_buckets_by_classification_and_region() {
        let event = event_in(1);
        let mut camp = Session::new_camp_seeded(1, "Stargate (Jita)".to_string(), &event);
        camp.append(event.clone());
        camp.classification = Classification::Camp;

        let mut roam = Session::new_roam_seeded(2, &event);
        roam.append(event);
        roam.classification = Classification::Roam;

        let live = live_view(&[camp, roam]);
        let region = live.get(UNKNOWN_REGION).expect("unknown region bucket");
        assert_eq!(region.camps, 1);
        assert_eq!(region.gangs, 1);
        assert_eq!(region.total_value, 10_000_000.0);
    }
}
