//! The durable archive write (distilled spec §4.G, §6: `expired_camps`
//! table keyed by `camp_unique_id`). Grounded on the curator's idempotent
//! upsert pattern (`hub/curator/mod.rs`'s `INSERT ... ON CONFLICT`).

use crate::types::session::Session;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

/// A single row destined for `expired_camps`. Built once per expiring
/// session, then inserted idempotently — a session can only be archived
/// once because `camp_unique_id` is its primary key.
pub struct ArchiveRecord {
    pub camp_unique_id: String,
    pub system_id: i64,
    pub stargate_name: Option<String>,
    pub region_name: Option<String>,
    pub max_probability_seen: u8,
    pub first_event_time: DateTime<Utc>,
    pub last_event_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_value: f64,
    pub seed_kind: String,
    pub event_count: i64,
    pub details: serde_json::Value,
}

/// Builds the archive row for a session that is about to be expired,
/// given the idle timeout that triggered expiry (`end_time` is the last
/// event plus that timeout, per §4.G).
pub fn build_record(session: &Session, timeout: Duration) -> ArchiveRecord {
    let details = serde_json::json!({
        "events": session.events,
        "composition": {
            "originalAttackers": session.composition.original_attackers.as_slice(),
            "activeAttackers": session.composition.active_attackers.as_slice(),
            "killedAttackers": session.composition.killed_attackers.as_slice(),
            "corporations": session.composition.corporations.as_slice(),
            "alliances": session.composition.alliances.as_slice(),
        },
        "metrics": session.metrics,
        "probabilityLog": session.probability_log,
        "path": session.path.iter().map(|p| serde_json::json!({
            "systemId": p.system_id,
            "name": p.name,
            "region": p.region,
            "time": p.time,
        })).collect::<Vec<_>>(),
        "members": session.members.as_slice(),
        "visitedSystemCount": session.visited_systems.len(),
    });

    let region_name = session.path.last().and_then(|p| p.region.clone());

    ArchiveRecord {
        camp_unique_id: session.id.as_str().to_string(),
        system_id: session.system_id,
        stargate_name: session.stargate_name.clone(),
        region_name,
        max_probability_seen: session.max_probability_seen,
        first_event_time: session.first_event_time,
        last_event_time: session.last_event_time,
        end_time: session.last_event_time + timeout,
        total_value: session.total_value,
        seed_kind: format!("{:?}", session.seed_kind),
        event_count: session.events.len() as i64,
        details,
    }
}

/// Writes `record` to the archive. Idempotent: a conflict on the primary
/// key is a silent no-op (distilled spec §7, §6).
pub async fn insert(pool: &PgPool, record: &ArchiveRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO expired_camps
            (camp_unique_id, system_id, stargate_name, region_name, max_probability_seen,
             first_event_time, last_event_time, end_time, total_value,
             seed_kind, event_count, details)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
           ON CONFLICT (camp_unique_id) DO NOTHING"#,
    )
    .bind(&record.camp_unique_id)
    .bind(record.system_id)
    .bind(&record.stargate_name)
    .bind(&record.region_name)
    .bind(record.max_probability_seen as i16)
    .bind(record.first_event_time)
    .bind(record.last_event_time)
    .bind(record.end_time)
    .bind(record.total_value)
    .bind(&record.seed_kind)
    .bind(record.event_count)
    .bind(&record.details)
    .execute(pool)
    .await?;

    Ok(())
}

/// Creates the `expired_camps` table if absent. Called once at startup
/// rather than via a migrations directory, mirroring the teacher's
/// `hub::db::run_migrations` intent without pulling in `sqlx::migrate!`
/// for a single table.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS expired_camps (
            camp_unique_id TEXT PRIMARY KEY,
            system_id BIGINT NOT NULL,
            stargate_name TEXT,
            region_name TEXT,
            max_probability_seen SMALLINT NOT NULL,
            first_event_time TIMESTAMPTZ NOT NULL,
            last_event_time TIMESTAMPTZ NOT NULL,
            end_time TIMESTAMPTZ NOT NULL,
            total_value DOUBLE PRECISION NOT NULL,
            seed_kind TEXT NOT NULL,
            event_count BIGINT NOT NULL,
            details JSONB NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enriched::{Pinpoint, ShipCategories};
    use crate::types::event::{Attacker, Victim};
    use crate::types::{EnrichedEvent, Event};

    fn sample_event() -> EnrichedEvent {
        EnrichedEvent {
            event: Event {
                id: 1,
                timestamp: Utc::now(),
                system_id: 1,
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
                total_value: 1_000_000.0,
                labels: vec![],
                awox: false,
            },
            pinpoint: Pinpoint::default(),
            ship_categories: ShipCategories::default(),
        }
    }

    #[test]
    fn build_record_sets_end_time_from_timeout() {
        let event = sample_event();
        let mut session = Session::new_camp_seeded(1, "Stargate (Jita)".to_string(), &event);
        session.append(event);

        let record = build_record(&session, Duration::minutes(40));
        assert_eq!(record.end_time, record.last_event_time + Duration::minutes(40));
        assert_eq!(record.camp_unique_id, session.id.as_str());
    }
}
