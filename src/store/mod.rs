//! The Activity Store (distilled spec §4.C): the single process-wide map
//! of live sessions. All mutation goes through [`ActivityStore::upsert_event`];
//! all reads for subscribers come from [`ActivityStore::snapshot`] so no
//! reader ever observes a half-updated session.

use crate::types::{Session, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide map of `session_id -> Session`, serialized behind a
/// single writer lock (distilled spec §5: "single-writer inside the
/// Activity Store").
#[derive(Clone, Default)]
pub struct ActivityStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `mutate` against the session for `id`, inserting it via
    /// `make_new` first if absent. This is the only mutation entrypoint;
    /// callers (the Grouping Rules) hold the write lock for the duration
    /// of their closure, so a single event's effects on a session are
    /// atomic with respect to other writers.
    pub async fn with_session_mut<F, R>(&self, id: &SessionId, make_new: impl FnOnce() -> Session, mutate: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.clone()).or_insert_with(make_new);
        mutate(session)
    }

    pub async fn get_clone(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// A consistent copy of every active session. Taking the read lock
    /// for the duration of the clone means no writer can produce a torn
    /// snapshot (distilled spec §5: "a consistent cut across all
    /// sessions").
    pub async fn snapshot(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes every session for which `predicate` returns `true`,
    /// returning the removed sessions (distilled spec §4.C, used by the
    /// Expiry/Archiver).
    pub async fn expire<P>(&self, predicate: P) -> Vec<Session>
    where
        P: Fn(&Session) -> bool,
    {
        let mut sessions = self.sessions.write().await;
        let expired_ids: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, session)| predicate(session))
            .map(|(id, _)| id.clone())
            .collect();

        expired_ids
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .collect()
    }

    /// Finds existing sessions whose `members` set intersects `pilots`,
    /// excluding `exclude`. Used by the Grouping Rules' roam branch
    /// (distilled spec §4.D) to locate a merge candidate without holding
    /// the write lock across the whole grouping decision.
    pub async fn find_roam_candidate(
        &self,
        pilots: &crate::types::OrderedSet<crate::types::ids::PilotId>,
        exclude: Option<&SessionId>,
    ) -> Option<SessionId> {
        let sessions = self.sessions.read().await;
        let mut best: Option<(&SessionId, chrono::DateTime<chrono::Utc>)> = None;
        for (id, session) in sessions.iter() {
            if Some(id) == exclude {
                continue;
            }
            if !session.members.intersects(pilots) {
                continue;
            }
            match best {
                Some((best_id, best_time)) => {
                    if session.last_event_time > best_time
                        || (session.last_event_time == best_time && id.as_str() < best_id.as_str())
                    {
                        best = Some((id, session.last_event_time));
                    }
                }
                None => best = Some((id, session.last_event_time)),
            }
        }
        best.map(|(id, _)| id.clone())
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Runs `mutate` against the session for `id` if one already exists.
    /// Unlike [`with_session_mut`](Self::with_session_mut), never inserts —
    /// used by callers that only ever touch sessions the Grouping Rules
    /// already created in the same event.
    pub async fn with_existing_session_mut<F, R>(&self, id: &SessionId, mutate: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(id).map(mutate)
    }

    /// Runs `mutate` against every live session under a single write lock
    /// (distilled spec §4.G: probability and classification are recomputed
    /// for all surviving sessions on every expiry tick, not just the ones
    /// that received a fresh event, so decay can happen without one).
    /// Returns the ids `mutate` reports as changed.
    pub async fn rescore_all<F>(&self, mutate: F) -> Vec<SessionId>
    where
        F: Fn(&mut Session) -> bool,
    {
        let mut sessions = self.sessions.write().await;
        sessions
            .iter_mut()
            .filter_map(|(id, session)| if mutate(session) { Some(id.clone()) } else { None })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enriched::{Pinpoint, ShipCategories};
    use crate::types::event::{Attacker, Victim};
    use crate::types::{EnrichedEvent, Event};
    use chrono::Utc;

    fn enriched(id: i64, system_id: i64, pilot: i64) -> EnrichedEvent {
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
                attackers: vec![Attacker {
                    character_id: Some(pilot),
                    corporation_id: None,
                    alliance_id: None,
                    ship_type_id: Some(2),
                    weapon_type_id: None,
                    final_blow: true,
                }],
                total_value: 1.0,
                labels: vec![],
                awox: false,
            },
            pinpoint: Pinpoint::default(),
            ship_categories: ShipCategories::default(),
        }
    }

    #[tokio::test]
    async fn upsert_creates_and_snapshot_sees_it() {
        let store = ActivityStore::new();
        let id = SessionId::roam();
        let event = enriched(1, 1, 10);
        store
            .with_session_mut(
                &id,
                || Session::new_roam_seeded(1, &event),
                |session| session.append(event.clone()),
            )
            .await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].events.len(), 1);
    }

    #[tokio::test]
    async fn expire_removes_matching_sessions() {
        let store = ActivityStore::new();
        let id = SessionId::roam();
        let event = enriched(1, 1, 10);
        store
            .with_session_mut(&id, || Session::new_roam_seeded(1, &event), |s| s.append(event.clone()))
            .await;

        let removed = store.expire(|_| true).await;
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len().await, 0);
    }
}
