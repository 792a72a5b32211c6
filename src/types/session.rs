//! The mutable Session record (distilled spec §3) and the structural half
//! of the append operation (distilled spec §4.D).

use super::classification::Classification;
use super::enriched::EnrichedEvent;
use super::ids::{AllianceId, CorporationId, EventId, PilotId, SessionId, SystemId};
use super::ordered_set::OrderedSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedKind {
    CampSeed,
    RoamSeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    pub system_id: SystemId,
    pub name: Option<String>,
    pub region: Option<String>,
    pub time: DateTime<Utc>,
}

/// The four-set composition record (distilled spec §3, Composition Rule
/// in §4.D).
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub original_attackers: OrderedSet<PilotId>,
    pub active_attackers: OrderedSet<PilotId>,
    pub killed_attackers: OrderedSet<PilotId>,
    pub corporations: OrderedSet<CorporationId>,
    pub alliances: OrderedSet<AllianceId>,
}

impl Composition {
    pub fn num_corps(&self) -> usize {
        self.corporations.len()
    }

    pub fn num_alliances(&self) -> usize {
        self.alliances.len()
    }

    /// Applies one enriched event's participants (Composition Rule, 4.D).
    /// `members ⊇ original_attackers` always holds: every attacker pilot
    /// joins both sets together, and the victim (if a pilot) joins `members`
    /// alone.
    fn apply(&mut self, event: &EnrichedEvent, members: &mut OrderedSet<PilotId>) {
        for attacker in &event.event.attackers {
            let Some(pilot) = attacker.character_id else {
                continue;
            };
            self.original_attackers.insert(pilot);
            members.insert(pilot);
            if !self.killed_attackers.contains(&pilot) {
                self.active_attackers.insert(pilot);
            }
            if let Some(corp) = attacker.corporation_id {
                self.corporations.insert(corp);
            }
            if let Some(alliance) = attacker.alliance_id {
                self.alliances.insert(alliance);
            }
        }
        if let Some(victim) = event.event.victim.character_id {
            members.insert(victim);
            if self.active_attackers.contains(&victim) {
                self.active_attackers.remove(&victim);
                self.killed_attackers.insert(victim);
            }
        }
    }
}

/// Cached derived metrics, recomputed on every append (distilled spec
/// §4.E groundwork; field names mirror the subscriber wire shape, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub first_seen: DateTime<Utc>,
    pub camp_duration_secs: i64,
    pub active_duration_secs: i64,
    pub inactivity_duration_secs: i64,
    pub pod_kills: u32,
    pub kill_frequency_per_hour: f64,
    pub avg_value_per_kill: f64,
    pub ship_counts: std::collections::HashMap<String, u32>,
    pub party_characters: usize,
    pub party_corporations: usize,
    pub party_alliances: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub seed_kind: SeedKind,
    pub system_id: SystemId,
    pub stargate_name: Option<String>,
    pub events: Vec<EnrichedEvent>,
    event_ids: HashSet<EventId>,
    pub total_value: f64,
    pub first_event_time: DateTime<Utc>,
    pub last_event_time: DateTime<Utc>,
    pub visited_systems: OrderedSet<SystemId>,
    pub path: Vec<PathEntry>,
    pub members: OrderedSet<PilotId>,
    pub composition: Composition,
    pub metrics: SessionMetrics,
    pub probability: u8,
    pub max_probability_seen: u8,
    pub classification: Classification,
    pub probability_log: Vec<String>,
}

impl Session {
    pub fn new_camp_seeded(system_id: SystemId, stargate_name: String, first: &EnrichedEvent) -> Self {
        let id = SessionId::camp(system_id, &stargate_name);
        Self::new(id, SeedKind::CampSeed, system_id, Some(stargate_name), first)
    }

    pub fn new_roam_seeded(system_id: SystemId, first: &EnrichedEvent) -> Self {
        Self::new(SessionId::roam(), SeedKind::RoamSeed, system_id, None, first)
    }

    fn new(
        id: SessionId,
        seed_kind: SeedKind,
        system_id: SystemId,
        stargate_name: Option<String>,
        first: &EnrichedEvent,
    ) -> Self {
        Session {
            id,
            seed_kind,
            system_id,
            stargate_name,
            events: Vec::new(),
            event_ids: HashSet::new(),
            total_value: 0.0,
            first_event_time: first.event.timestamp,
            last_event_time: first.event.timestamp,
            visited_systems: OrderedSet::new(),
            path: Vec::new(),
            members: OrderedSet::new(),
            composition: Composition::default(),
            metrics: SessionMetrics::default(),
            probability: 0,
            max_probability_seen: 0,
            classification: Classification::default(),
            probability_log: Vec::new(),
        }
    }

    pub fn contains_event(&self, event_id: EventId) -> bool {
        self.event_ids.contains(&event_id)
    }

    /// Structural half of the append operation (distilled spec §4.D):
    /// dedupe, sequence append, value/members/composition/path update.
    /// Probability and classification are recomputed by the caller, which
    /// owns the settings and weight tables those stages need.
    pub fn append(&mut self, event: EnrichedEvent) -> bool {
        if self.contains_event(event.event.id) {
            return false;
        }
        self.event_ids.insert(event.event.id);

        if event.event.timestamp > self.last_event_time {
            self.last_event_time = event.event.timestamp;
        }
        if event.event.timestamp < self.first_event_time {
            self.first_event_time = event.event.timestamp;
        }

        self.total_value += event.event.total_value;
        self.composition.apply(&event, &mut self.members);

        let system_changed = self
            .path
            .last()
            .map(|p| p.system_id != event.event.system_id)
            .unwrap_or(true);
        if system_changed {
            self.visited_systems.insert(event.event.system_id);
            self.path.push(PathEntry {
                system_id: event.event.system_id,
                name: event.pinpoint.system_name.clone(),
                region: event.pinpoint.region_name.clone(),
                time: event.event.timestamp,
            });
        }

        self.events.push(event);
        true
    }
}
