//! The classifier (distilled spec §4.F): an ordered rule match over a
//! session's accumulated state and the probability the engine just
//! computed for it. First matching rule wins; none of the rules consult
//! `seed_kind` directly, only `members`, `visited_systems`, and
//! `probability`.

use crate::scoring;
use crate::types::classification::Classification;
use crate::types::session::Session;

const BATTLE_PILOT_THRESHOLD: usize = 40;
const CAMP_PROBABILITY_THRESHOLD: u8 = 5;

/// Assigns `session`'s classification tag. Call after [`scoring::compute`]
/// so `session.probability` reflects the current state.
pub fn classify(session: &Session) -> Classification {
    if scoring::session_has_smartbomb(session) {
        return Classification::Smartbomb;
    }
    if session.members.len() >= BATTLE_PILOT_THRESHOLD {
        return Classification::Battle;
    }

    let roaming = session.visited_systems.len() > 1;
    // "Solo" tracks distinct attacker pilots, not `members` (which always
    // includes the victim too) — a lone gate camper with one victim would
    // otherwise never qualify as solo.
    let solo = session.composition.original_attackers.len() <= 1;

    if roaming && session.probability >= CAMP_PROBABILITY_THRESHOLD {
        return Classification::RoamingCamp;
    }
    if session.probability >= CAMP_PROBABILITY_THRESHOLD {
        return if solo { Classification::SoloCamp } else { Classification::Camp };
    }
    if roaming {
        return if solo { Classification::SoloRoam } else { Classification::Roam };
    }
    Classification::Activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::types::enriched::{Pinpoint, ShipCategories, ShipInfo};
    use crate::types::event::{Attacker, Victim};
    use crate::types::{EnrichedEvent, Event};
    use chrono::Utc;

    fn gate_pinpoint() -> Pinpoint {
        Pinpoint {
            nearest_celestial: Some("Stargate (Jita)".to_string()),
            at_celestial: true,
            triangulation_method: None,
            system_name: None,
            region_name: None,
        }
    }

    fn kill(id: i64, system_id: i64, attacker_pilot: i64, victim_pilot: i64) -> EnrichedEvent {
        EnrichedEvent {
            event: Event {
                id,
                timestamp: Utc::now(),
                system_id,
                victim: Victim {
                    ship_type_id: 648,
                    character_id: Some(victim_pilot),
                    corporation_id: Some(1),
                    alliance_id: None,
                },
                attackers: vec![Attacker {
                    character_id: Some(attacker_pilot),
                    corporation_id: Some(2),
                    alliance_id: None,
                    ship_type_id: None,
                    weapon_type_id: None,
                    final_blow: true,
                }],
                total_value: 10_000_000.0,
                labels: vec![],
                awox: false,
            },
            pinpoint: gate_pinpoint(),
            ship_categories: ShipCategories {
                victim: ShipInfo {
                    category: crate::types::ShipCategory::Industrial,
                    name: "Hauler".to_string(),
                    tier: "t1".to_string(),
                },
                attackers: vec![ShipInfo::default()],
            },
        }
    }

    #[test]
    fn single_attacker_camp_seed_classifies_solo_camp() {
        let first = kill(1, 1, 5, 6);
        let mut session = Session::new_camp_seeded(1, "Stargate (Jita)".to_string(), &first);
        session.append(first);
        scoring::compute(&mut session, &Settings::default(), Utc::now());

        assert_eq!(classify(&session), Classification::SoloCamp);
    }

    #[test]
    fn many_attackers_camp_seed_classifies_camp() {
        let first = kill(1, 1, 5, 6);
        let mut session = Session::new_camp_seeded(1, "Stargate (Jita)".to_string(), &first);
        session.append(first);
        session.append(kill(2, 1, 7, 8));
        scoring::compute(&mut session, &Settings::default(), Utc::now());

        assert_eq!(classify(&session), Classification::Camp);
    }

    #[test]
    fn forty_distinct_pilots_classifies_battle() {
        let first = kill(1, 1, 1, 2);
        let mut session = Session::new_camp_seeded(1, "Stargate (Jita)".to_string(), &first);
        session.append(first);
        for i in 0..20 {
            session.append(kill(i + 2, 1, 100 + i, 200 + i));
        }
        scoring::compute(&mut session, &Settings::default(), Utc::now());

        assert_eq!(classify(&session), Classification::Battle);
    }

    #[test]
    fn zero_probability_non_roaming_session_classifies_activity() {
        let first = kill(1, 2, 5, 6);
        let mut session = Session::new_camp_seeded(2, "Stargate (Amarr)".to_string(), &first);
        session.append(first);
        session.probability = 0;

        assert_eq!(classify(&session), Classification::Activity);
    }

    #[test]
    fn multi_system_with_low_probability_classifies_roam() {
        let first = kill(1, 1, 5, 6);
        let mut session = Session::new_roam_seeded(1, &first);
        session.append(first);
        session.append(kill(2, 2, 9, 7));
        session.probability = 0;

        assert_eq!(classify(&session), Classification::Roam);
    }
}
