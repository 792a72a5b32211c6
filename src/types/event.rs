//! The immutable input event (distilled spec §3) and its upstream wire
//! encoding (distilled spec §6).

use super::ids::{AllianceId, CorporationId, EventId, PilotId, ShipTypeId, SystemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One attacker's participation in a kill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attacker {
    pub character_id: Option<PilotId>,
    pub corporation_id: Option<CorporationId>,
    pub alliance_id: Option<AllianceId>,
    pub ship_type_id: Option<ShipTypeId>,
    pub weapon_type_id: Option<ShipTypeId>,
    pub final_blow: bool,
}

/// The victim of a kill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Victim {
    pub ship_type_id: ShipTypeId,
    pub character_id: Option<PilotId>,
    pub corporation_id: Option<CorporationId>,
    pub alliance_id: Option<AllianceId>,
}

/// An immutable combat event as ingested from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub victim: Victim,
    pub attackers: Vec<Attacker>,
    pub total_value: f64,
    pub labels: Vec<String>,
    /// Friendly-fire flag (`zkb.awox`). Used by the probability engine's
    /// filtering stage (4.E, filter rule 1).
    pub awox: bool,
}

impl Event {
    /// Distinct attacker pilot ids, ignoring attackers without a pilot
    /// (NPCs, structures) and escape pods (roam branch eligibility, 4.D).
    pub fn distinct_attacker_pilots(&self, pod_ship_type_id: ShipTypeId) -> Vec<PilotId> {
        let mut pilots: Vec<PilotId> = Vec::new();
        for a in &self.attackers {
            let Some(pid) = a.character_id else { continue };
            if a.ship_type_id == Some(pod_ship_type_id) {
                continue;
            }
            if !pilots.contains(&pid) {
                pilots.push(pid);
            }
        }
        pilots
    }

    /// Whether the attacker list contains no pilot or NPC-faction actor
    /// (attacker-only-structure kill, 4.E filter rule 4). A participant
    /// counts if it has a pilot id or a corporation id (NPC factions are
    /// represented upstream as corp-only attackers).
    pub fn has_eligible_attacker(&self) -> bool {
        self.attackers
            .iter()
            .any(|a| a.character_id.is_some() || a.corporation_id.is_some())
    }

    /// Whether the victim is an NPC or structure kill (4.E filter rule 2):
    /// a corp is set but no pilot, or the `npc` label is present.
    pub fn victim_is_npc_or_structure_by_label(&self) -> bool {
        (self.victim.character_id.is_none() && self.victim.corporation_id.is_some())
            || self.labels.iter().any(|l| l == "npc")
    }
}

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("missing killmail_time")]
    MissingTimestamp,
    #[error("non-numeric or missing id field: {0}")]
    InvalidId(&'static str),
    #[error("invalid attacker array")]
    InvalidAttackers,
}

/// Upstream feed envelope (distilled spec §6): a long-poll response is
/// either an empty package or a killmail envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    pub package: Option<RawKillmailPackage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawKillmailPackage {
    #[serde(rename = "killID")]
    pub kill_id: i64,
    pub zkb: RawZkb,
    pub killmail: RawKillmail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawZkb {
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub awox: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawKillmail {
    pub killmail_time: DateTime<Utc>,
    pub solar_system_id: SystemId,
    pub victim: RawVictim,
    pub attackers: Vec<RawAttacker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVictim {
    pub ship_type_id: ShipTypeId,
    pub character_id: Option<PilotId>,
    pub corporation_id: Option<CorporationId>,
    pub alliance_id: Option<AllianceId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAttacker {
    pub character_id: Option<PilotId>,
    pub corporation_id: Option<CorporationId>,
    pub alliance_id: Option<AllianceId>,
    pub ship_type_id: Option<ShipTypeId>,
    pub weapon_type_id: Option<ShipTypeId>,
    #[serde(default)]
    pub final_blow: bool,
}

impl TryFrom<RawKillmailPackage> for Event {
    type Error = EventParseError;

    fn try_from(raw: RawKillmailPackage) -> Result<Self, Self::Error> {
        Ok(Event {
            id: raw.kill_id,
            timestamp: raw.killmail.killmail_time,
            system_id: raw.killmail.solar_system_id,
            victim: Victim {
                ship_type_id: raw.killmail.victim.ship_type_id,
                character_id: raw.killmail.victim.character_id,
                corporation_id: raw.killmail.victim.corporation_id,
                alliance_id: raw.killmail.victim.alliance_id,
            },
            attackers: raw
                .killmail
                .attackers
                .into_iter()
                .map(|a| Attacker {
                    character_id: a.character_id,
                    corporation_id: a.corporation_id,
                    alliance_id: a.alliance_id,
                    ship_type_id: a.ship_type_id,
                    weapon_type_id: a.weapon_type_id,
                    final_blow: a.final_blow,
                })
                .collect(),
            total_value: raw.zkb.total_value,
            labels: raw.zkb.labels,
            awox: raw.zkb.awox,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacker(pilot: Option<PilotId>, ship: Option<ShipTypeId>) -> Attacker {
        Attacker {
            character_id: pilot,
            corporation_id: None,
            alliance_id: None,
            ship_type_id: ship,
            weapon_type_id: None,
            final_blow: false,
        }
    }

    #[test]
    fn distinct_attacker_pilots_ignores_pods_and_npcs() {
        const POD: ShipTypeId = 670;
        let event = Event {
            id: 1,
            timestamp: Utc::now(),
            system_id: 1,
            victim: Victim {
                ship_type_id: 999,
                character_id: None,
                corporation_id: Some(1),
                alliance_id: None,
            },
            attackers: vec![
                attacker(Some(10), Some(123)),
                attacker(Some(10), Some(123)),
                attacker(Some(20), Some(POD)),
                attacker(None, Some(456)),
            ],
            total_value: 0.0,
            labels: vec![],
            awox: false,
        };
        assert_eq!(event.distinct_attacker_pilots(POD), vec![10]);
    }
}
