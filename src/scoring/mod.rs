//! The Probability Engine (distilled spec §4.E): the core algorithm. Given
//! a session, computes an integer percent in `[0, 100]` estimating "this
//! session is an active camp", with a bounded human-readable trace of how
//! it got there.

mod filter;
pub mod metrics;
mod smartbomb;
mod tables;

pub use smartbomb::session_has_smartbomb;

use crate::config::Settings;
use crate::types::enriched::EnrichedEvent;
use crate::types::ids::PilotId;
use crate::types::session::{SeedKind, Session};
use chrono::{DateTime, Utc};

const BURST_WINDOW_MIN: i64 = 15;
const BURST_GAP_SECS: i64 = 120;
const THREAT_CAP: f64 = 0.50;
const CONSISTENCY_CAP: f64 = 0.30;
const WIDE_GAP_MINUTES: i64 = 5;
const WIDE_GAP_BONUS: f64 = 0.15;
const WIDE_GAP_CAP: f64 = 0.45;
const POD_BONUS: f64 = 0.03;
const POD_CAP: f64 = 0.15;
const SCORE_CAP: f64 = 0.95;

/// Recomputes `probability`, `max_probability_seen`, and `probability_log`
/// on `session` in place, using `now` as the reference time for age and
/// decay. Never panics: every stage treats missing data as uninformative.
pub fn compute(session: &mut Session, settings: &Settings, now: DateTime<Utc>) {
    let mut log: Vec<String> = Vec::new();
    let (ship_kills, pod_kills) = filter::filtered_view(session);

    if ship_kills.is_empty() && pod_kills.is_empty() {
        log.push("no scoring-eligible events remain after filtering — probability 0".to_string());
        session.probability_log = log;
        session.probability = 0;
        return;
    }

    let mut p: f64 = 0.0;

    // Stage 1: burst penalty.
    let session_age_min = (now - session.first_event_time).num_seconds() as f64 / 60.0;
    if ship_kills.len() >= 2 && session_age_min < BURST_WINDOW_MIN as f64 && has_burst_pair(&ship_kills) {
        p -= 0.20;
        log.push("burst penalty: -0.20 (>=2 ship-kills within 120s, session <15m old)".to_string());
    }

    // Stage 2: threat-ship contribution.
    let mut threat_sum = 0.0;
    for kill in &ship_kills {
        for attacker in &kill.event.attackers {
            if let Some(ship_type_id) = attacker.ship_type_id {
                threat_sum += tables::threat_weight(ship_type_id);
            }
        }
    }
    let threat_contribution = threat_sum.min(THREAT_CAP);
    if threat_contribution > 0.0 {
        p += threat_contribution;
        log.push(format!("threat-ship contribution: +{threat_contribution:.2} (capped at {THREAT_CAP:.2})"));
    }

    // Stage 3: smartbomb type bonus.
    if smartbomb::session_has_smartbomb(session) {
        p += 0.16;
        let extra = if ship_kills.len() <= 1 { 0.15 } else { 0.30 };
        p += extra;
        log.push(format!("smartbomb bonus: +0.16 +{extra:.2}"));
    }

    // Stage 4: known-location bonus.
    if session.seed_kind == SeedKind::CampSeed {
        if let Some(stargate_name) = &session.stargate_name {
            if let Some(weight) = tables::permanent_camp_weight(session.system_id, stargate_name) {
                p += weight;
                log.push(format!("known-location bonus: +{weight:.2}"));
            }
        }
    }

    // Stage 5: vulnerable-victim bonus.
    let vulnerable_count = ship_kills
        .iter()
        .filter(|k| {
            matches!(
                k.ship_categories.victim.category,
                crate::types::ShipCategory::Industrial | crate::types::ShipCategory::Mining
            )
        })
        .count();
    if vulnerable_count >= 1 {
        let bonus = if vulnerable_count == 1 { 0.20 } else { 0.40 };
        p += bonus;
        log.push(format!("vulnerable-victim bonus: +{bonus:.2} ({vulnerable_count} industrial/mining kills)"));
    }

    // Stage 6: attacker consistency bonus.
    if let Some(bonus) = consistency_bonus(&ship_kills) {
        p += bonus;
        log.push(format!("attacker consistency bonus: +{bonus:.2}"));
    } else {
        log.push("attacker consistency bonus: skipped (same-victim burst or <2 ship-kills)".to_string());
    }

    // Stage 7: widely-spaced bonus.
    let wide_bonus = widely_spaced_bonus(&ship_kills);
    if wide_bonus > 0.0 {
        p += wide_bonus;
        log.push(format!("widely-spaced bonus: +{wide_bonus:.2} (capped at {WIDE_GAP_CAP:.2})"));
    }

    // Stage 8: pod bonus.
    let pod_bonus = (pod_kills.len() as f64 * POD_BONUS).min(POD_CAP);
    if pod_bonus > 0.0 {
        p += pod_bonus;
        log.push(format!("pod bonus: +{pod_bonus:.2} ({} pod-kills, capped at {POD_CAP:.2})", pod_kills.len()));
    }

    p = p.clamp(0.0, SCORE_CAP);
    log.push(format!("raw score after all stages: {:.3}", p));

    let minutes_since_latest = (now - session.last_event_time).num_seconds() as f64 / 60.0;
    if minutes_since_latest > settings.decay_start_min {
        let decay_factor = (1.0 - settings.decay_rate_per_min * (minutes_since_latest - settings.decay_start_min)).max(0.0);
        p *= decay_factor;
        p = p.clamp(0.0, SCORE_CAP);
        log.push(format!(
            "decay: {:.1} min idle past {:.1} min grace, factor {:.3} -> {:.3}",
            minutes_since_latest, settings.decay_start_min, decay_factor, p
        ));
    }

    let rounded = (p * 100.0).round() as i64;
    let rounded = rounded.clamp(0, 100) as u8;
    session.max_probability_seen = session.max_probability_seen.max(rounded);

    let reported = if rounded < 5 { 0 } else { rounded };
    log.push(format!("final probability: {reported}% (max seen {}%)", session.max_probability_seen));

    session.probability = reported;
    session.probability_log = log;
}

fn has_burst_pair(ship_kills: &[&EnrichedEvent]) -> bool {
    ship_kills.windows(2).any(|pair| {
        (pair[1].event.timestamp - pair[0].event.timestamp).num_seconds().abs() <= BURST_GAP_SECS
    })
}

fn widely_spaced_bonus(ship_kills: &[&EnrichedEvent]) -> f64 {
    let mut bonus = 0.0;
    for pair in ship_kills.windows(2) {
        let gap_min = (pair[1].event.timestamp - pair[0].event.timestamp).num_seconds() as f64 / 60.0;
        if gap_min > WIDE_GAP_MINUTES as f64 {
            bonus += WIDE_GAP_BONUS;
        }
    }
    bonus.min(WIDE_GAP_CAP)
}

fn consistency_bonus(ship_kills: &[&EnrichedEvent]) -> Option<f64> {
    let n = ship_kills.len();
    if n < 2 {
        return None;
    }
    let start = n.saturating_sub(3);
    let checked = &ship_kills[start..];
    let latest = checked.last()?;
    let earlier = &checked[..checked.len() - 1];

    if checked.len() == 3 && is_same_victim_burst(checked) {
        return None;
    }

    let latest_pilots = latest.event.distinct_attacker_pilots(EnrichedEvent::CAPSULE_TYPE_ID);
    let mut bonus = 0.0;
    for kill in earlier {
        let earlier_pilots = kill.event.distinct_attacker_pilots(EnrichedEvent::CAPSULE_TYPE_ID);
        let threshold = (earlier_pilots.len() / 3).max(2);
        let shared = intersection_count(&earlier_pilots, &latest_pilots);
        if shared >= threshold {
            bonus += 0.15;
        }
    }
    Some(bonus.min(CONSISTENCY_CAP))
}

fn intersection_count(a: &[PilotId], b: &[PilotId]) -> usize {
    a.iter().filter(|x| b.contains(x)).count()
}

fn is_same_victim_burst(checked: &[&EnrichedEvent]) -> bool {
    let any_two_within_120 = checked.windows(2).any(|pair| {
        (pair[1].event.timestamp - pair[0].event.timestamp).num_seconds().abs() <= BURST_GAP_SECS
    }) || (checked[2].event.timestamp - checked[0].event.timestamp).num_seconds().abs() <= BURST_GAP_SECS;

    let corps: Vec<_> = checked.iter().map(|k| k.event.victim.corporation_id).collect();
    let same_corp = corps[0].is_some() && corps.iter().all(|c| *c == corps[0]);

    let alliances: Vec<_> = checked.iter().map(|k| k.event.victim.alliance_id).collect();
    let same_alliance = alliances[0].is_some() && alliances.iter().all(|a| *a == alliances[0]);

    any_two_within_120 && (same_corp || same_alliance)
}
