//! The scoring-input filter and ship-kill/pod-kill partition (distilled
//! spec §4.E).

use crate::types::enriched::EnrichedEvent;
use crate::types::session::{SeedKind, Session};
use crate::types::ShipCategory;

fn passes_base_filter(event: &EnrichedEvent) -> bool {
    if event.event.awox {
        return false;
    }
    if event.event.victim_is_npc_or_structure_by_label()
        || event.ship_categories.victim.category == ShipCategory::Structure
    {
        return false;
    }
    if event.event.victim.ship_type_id == EnrichedEvent::MOBILE_TRACTOR_UNIT_TYPE_ID {
        return false;
    }
    if !event.event.has_eligible_attacker() {
        return false;
    }
    true
}

/// Builds the filtered, time-ordered view of a session's events that the
/// probability engine scores over, then partitions it into ship-kills and
/// pod-kills.
pub fn filtered_view(session: &Session) -> (Vec<&EnrichedEvent>, Vec<&EnrichedEvent>) {
    let filtered: Vec<&EnrichedEvent> = session
        .events
        .iter()
        .filter(|e| passes_base_filter(e))
        .filter(|e| {
            if session.seed_kind == SeedKind::CampSeed {
                e.pinpoint.qualifies_as_gate_kill()
            } else {
                true
            }
        })
        .collect();

    let mut ship_kills: Vec<&EnrichedEvent> = filtered.iter().copied().filter(|e| !e.is_pod_kill()).collect();
    let pod_kills: Vec<&EnrichedEvent> = filtered.iter().copied().filter(|e| e.is_pod_kill()).collect();

    ship_kills.sort_by_key(|e| e.event.timestamp);

    (ship_kills, pod_kills)
}
