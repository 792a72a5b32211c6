//! Grouping Rules (distilled spec §4.D): decides which session(s) an
//! enriched event creates or updates. Both the camp and roam branches may
//! fire for the same event; neither fires if the event is ineligible.

use crate::store::ActivityStore;
use crate::types::enriched::EnrichedEvent;
use crate::types::ids::SessionId;
use crate::types::session::Session;
use crate::types::OrderedSet;

/// Routes one enriched event into the store, returning the ids of every
/// session it touched (zero, one, or two — camp and roam can both fire).
/// Each touched session has had the structural half of the append
/// performed (distilled spec §4.D); the caller is responsible for
/// recomputing probability and classification (§4.E, §4.F) afterward.
pub async fn route_event(store: &ActivityStore, event: EnrichedEvent) -> Vec<SessionId> {
    let mut touched = Vec::with_capacity(2);

    let camp_id = camp_branch(store, &event).await;
    if let Some(id) = &camp_id {
        touched.push(id.clone());
    }

    if let Some(id) = roam_branch(store, &event, camp_id.as_ref()).await {
        touched.push(id);
    }

    touched
}

/// Camp branch (distilled spec §4.D): fires when the pinpoint names a
/// stargate and the triangulation evidence places the kill at or near it.
async fn camp_branch(store: &ActivityStore, event: &EnrichedEvent) -> Option<SessionId> {
    if !event.pinpoint.qualifies_as_gate_kill() {
        return None;
    }
    let stargate_name = event.pinpoint.stargate_name()?.to_string();
    let id = SessionId::camp(event.event.system_id, &stargate_name);
    let system_id = event.event.system_id;
    let event = event.clone();

    store
        .with_session_mut(
            &id,
            || Session::new_camp_seeded(system_id, stargate_name, &event),
            |session| {
                session.append(event);
            },
        )
        .await;

    Some(id)
}

/// Roam branch (distilled spec §4.D): fires on >= 2 distinct attacker
/// pilots (ignoring escape pods), merging into the best existing
/// candidate session or minting a fresh roam-seeded one.
async fn roam_branch(store: &ActivityStore, event: &EnrichedEvent, camp_id: Option<&SessionId>) -> Option<SessionId> {
    let pilots = event.event.distinct_attacker_pilots(EnrichedEvent::CAPSULE_TYPE_ID);
    if pilots.len() < 2 {
        return None;
    }
    let pilots: OrderedSet<_> = pilots.into_iter().collect();

    let system_id = event.event.system_id;
    let event = event.clone();

    let candidate = store.find_roam_candidate(&pilots, camp_id).await;
    let id = candidate.unwrap_or_else(SessionId::roam);

    store
        .with_session_mut(&id, || Session::new_roam_seeded(system_id, &event), |session| {
            session.append(event);
        })
        .await;

    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enriched::{Pinpoint, ShipCategories, TriangulationMethod};
    use crate::types::event::{Attacker, Victim};
    use crate::types::Event;
    use chrono::Utc;

    fn base_event(id: i64, system_id: i64, pilots: &[i64]) -> EnrichedEvent {
        EnrichedEvent {
            event: Event {
                id,
                timestamp: Utc::now(),
                system_id,
                victim: Victim {
                    ship_type_id: 1,
                    character_id: None,
                    corporation_id: Some(999),
                    alliance_id: None,
                },
                attackers: pilots
                    .iter()
                    .map(|p| Attacker {
                        character_id: Some(*p),
                        corporation_id: None,
                        alliance_id: None,
                        ship_type_id: Some(2),
                        weapon_type_id: None,
                        final_blow: false,
                    })
                    .collect(),
                total_value: 1.0,
                labels: vec![],
                awox: false,
            },
            pinpoint: Pinpoint::default(),
            ship_categories: ShipCategories::default(),
        }
    }

    #[tokio::test]
    async fn no_branch_fires_for_solo_non_gate_kill() {
        let store = ActivityStore::new();
        let event = base_event(1, 1, &[10]);
        let touched = route_event(&store, event).await;
        assert!(touched.is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn camp_branch_fires_on_gate_pinpoint() {
        let store = ActivityStore::new();
        let mut event = base_event(1, 1, &[10]);
        event.pinpoint = Pinpoint {
            nearest_celestial: Some("Stargate (Jita)".to_string()),
            at_celestial: true,
            triangulation_method: Some(TriangulationMethod::DirectWarp),
            system_name: None,
            region_name: None,
        };
        let touched = route_event(&store, event).await;
        assert_eq!(touched.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn camp_branch_does_not_fire_on_distant_triangulation() {
        let store = ActivityStore::new();
        let mut event = base_event(1, 1, &[10]);
        event.pinpoint = Pinpoint {
            nearest_celestial: Some("Stargate (Jita)".to_string()),
            at_celestial: false,
            triangulation_method: Some(TriangulationMethod::Far),
            system_name: None,
            region_name: None,
        };
        let touched = route_event(&store, event).await;
        assert!(touched.is_empty(), "a stargate name alone isn't enough without at-or-near-celestial evidence");
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn roam_branch_merges_on_shared_pilots() {
        let store = ActivityStore::new();
        let first = base_event(1, 1, &[10, 11]);
        let touched_first = route_event(&store, first).await;
        assert_eq!(touched_first.len(), 1);

        let second = base_event(2, 2, &[10, 12]);
        let touched_second = route_event(&store, second).await;
        assert_eq!(touched_second, touched_first);
        assert_eq!(store.len().await, 1);

        let session = store.get_clone(&touched_first[0]).await.unwrap();
        assert_eq!(session.visited_systems.len(), 2);
    }
}
