//! The subscriber wire shape (distilled spec §6): the session record
//! flattened into the exact JSON keys clients expect, decoupled from the
//! internal [`Session`] field names so that type can keep evolving freely.

use crate::types::enriched::EnrichedEvent;
use crate::types::session::{SeedKind, Session};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CompositionWire {
    #[serde(rename = "originalCount")]
    pub original_count: usize,
    #[serde(rename = "activeCount")]
    pub active_count: usize,
    #[serde(rename = "killedCount")]
    pub killed_count: usize,
    #[serde(rename = "numCorps")]
    pub num_corps: usize,
    #[serde(rename = "numAlliances")]
    pub num_alliances: usize,
}

#[derive(Debug, Serialize)]
pub struct PartyMetricsWire {
    pub characters: usize,
    pub corporations: usize,
    pub alliances: usize,
}

#[derive(Debug, Serialize)]
pub struct MetricsWire {
    #[serde(rename = "firstSeen")]
    pub first_seen: DateTime<Utc>,
    #[serde(rename = "campDuration")]
    pub camp_duration: i64,
    #[serde(rename = "activeDuration")]
    pub active_duration: i64,
    #[serde(rename = "inactivityDuration")]
    pub inactivity_duration: i64,
    #[serde(rename = "podKills")]
    pub pod_kills: u32,
    #[serde(rename = "killFrequency")]
    pub kill_frequency: f64,
    #[serde(rename = "avgValuePerKill")]
    pub avg_value_per_kill: f64,
    #[serde(rename = "shipCounts")]
    pub ship_counts: std::collections::HashMap<String, u32>,
    #[serde(rename = "partyMetrics")]
    pub party_metrics: PartyMetricsWire,
}

#[derive(Debug, Serialize)]
pub struct PathEntryWire {
    pub id: i64,
    pub name: Option<String>,
    pub region: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LastSystemWire {
    pub id: i64,
    pub name: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionWire {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub classification: String,
    #[serde(rename = "systemId")]
    pub system_id: i64,
    #[serde(rename = "stargateName")]
    pub stargate_name: Option<String>,
    pub kills: Vec<EnrichedEvent>,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(rename = "lastKill")]
    pub last_kill: DateTime<Utc>,
    #[serde(rename = "firstKillTime")]
    pub first_kill_time: DateTime<Utc>,
    #[serde(rename = "lastActivity")]
    pub last_activity: DateTime<Utc>,
    pub composition: CompositionWire,
    pub metrics: MetricsWire,
    pub probability: u8,
    #[serde(rename = "maxProbability")]
    pub max_probability: u8,
    #[serde(rename = "visitedSystems")]
    pub visited_systems: Vec<i64>,
    #[serde(rename = "systemsVisited")]
    pub systems_visited: usize,
    pub members: Vec<i64>,
    pub systems: Vec<PathEntryWire>,
    #[serde(rename = "lastSystem")]
    pub last_system: Option<LastSystemWire>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
}

impl From<&Session> for SessionWire {
    fn from(session: &Session) -> Self {
        let last_system = session.path.last().map(|p| LastSystemWire {
            id: p.system_id,
            name: p.name.clone(),
            region: p.region.clone(),
        });

        SessionWire {
            id: session.id.as_str().to_string(),
            kind: match session.seed_kind {
                SeedKind::CampSeed => "camp",
                SeedKind::RoamSeed => "roam",
            },
            classification: session.classification.as_str().to_string(),
            system_id: session.system_id,
            stargate_name: session.stargate_name.clone(),
            kills: session.events.clone(),
            total_value: session.total_value,
            last_kill: session.last_event_time,
            first_kill_time: session.first_event_time,
            last_activity: session.last_event_time,
            composition: CompositionWire {
                original_count: session.composition.original_attackers.len(),
                active_count: session.composition.active_attackers.len(),
                killed_count: session.composition.killed_attackers.len(),
                num_corps: session.composition.num_corps(),
                num_alliances: session.composition.num_alliances(),
            },
            metrics: MetricsWire {
                first_seen: session.metrics.first_seen,
                camp_duration: session.metrics.camp_duration_secs,
                active_duration: session.metrics.active_duration_secs,
                inactivity_duration: session.metrics.inactivity_duration_secs,
                pod_kills: session.metrics.pod_kills,
                kill_frequency: session.metrics.kill_frequency_per_hour,
                avg_value_per_kill: session.metrics.avg_value_per_kill,
                ship_counts: session.metrics.ship_counts.clone(),
                party_metrics: PartyMetricsWire {
                    characters: session.metrics.party_characters,
                    corporations: session.metrics.party_corporations,
                    alliances: session.metrics.party_alliances,
                },
            },
            probability: session.probability,
            max_probability: session.max_probability_seen,
            visited_systems: session.visited_systems.as_slice().to_vec(),
            systems_visited: session.visited_systems.len(),
            members: session.members.as_slice().to_vec(),
            systems: session
                .path
                .iter()
                .map(|p| PathEntryWire {
                    id: p.system_id,
                    name: p.name.clone(),
                    region: p.region.clone(),
                    time: p.time,
                })
                .collect(),
            last_system,
            start_time: session.first_event_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename = "activityUpdate")]
    ActivityUpdate { data: Vec<SessionWire> },
}
