//! End-to-end pipeline scenarios: feed a small fixture of kills through
//! [`gatewatch::engine::run_pipeline`] with the in-memory enrichment fakes
//! and check what lands in the Activity Store. Each test exercises one of
//! the worked scenarios from the original design discussion (gate solo
//! kill, sustained multi-attacker camp, cross-system roam merge, smartbomb
//! override, known camping location, and idle decay), the same way
//! `tests/csv_replay_integration.rs` exercises the teacher's pipeline with
//! a small slice of real data rather than an exhaustive grid.

use chrono::{Duration as ChronoDuration, Utc};
use gatewatch::config::Settings;
use gatewatch::engine;
use gatewatch::enrich::{FakePinpointService, FakeShipCatalog, FakeSystemResolver, PinpointService, ShipCatalog, SystemResolver};
use gatewatch::feed::{FeedSource, FixtureFeedSource};
use gatewatch::scoring;
use gatewatch::store::ActivityStore;
use gatewatch::types::{
    Attacker, Classification, Event, Pinpoint, ShipCategory, ShipInfo, SessionId, TriangulationMethod, Victim,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

fn gate_pinpoint(name: &str) -> Pinpoint {
    Pinpoint {
        nearest_celestial: Some(name.to_string()),
        at_celestial: true,
        triangulation_method: Some(TriangulationMethod::DirectWarp),
        system_name: None,
        region_name: None,
    }
}

fn industrial_ship() -> ShipInfo {
    ShipInfo {
        category: ShipCategory::Industrial,
        name: "Hauler".to_string(),
        tier: "t1".to_string(),
    }
}

/// Runs `events` through the full ingest pipeline (Feed Poller -> Enricher
/// -> Grouping Rules -> Activity Store -> Probability Engine -> Classifier)
/// against in-memory fakes, then returns the resulting store. Relies on
/// `FixtureFeedSource` reporting end-of-stream to end the pipeline
/// naturally; a short cancellation timer backstops the test in case that
/// never happens.
async fn run_events(events: Vec<Event>, pinpoints: HashMap<i64, Pinpoint>, ships: HashMap<i64, ShipInfo>) -> ActivityStore {
    let feed: Box<dyn FeedSource> = Box::new(FixtureFeedSource::new(events));
    let pinpoint: Arc<dyn PinpointService> = Arc::new(FakePinpointService { pinpoints });
    let ships: Arc<dyn ShipCatalog> = Arc::new(FakeShipCatalog { ships });
    let systems: Arc<dyn SystemResolver> = Arc::new(FakeSystemResolver::default());
    let store = ActivityStore::new();
    let settings = Settings::default();
    let (updates, _rx) = broadcast::channel(8);
    let shutdown = CancellationToken::new();

    let backstop = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(StdDuration::from_millis(500)).await;
        backstop.cancel();
    });

    engine::run_pipeline(feed, pinpoint, ships, systems, store.clone(), settings, updates, shutdown).await;
    store
}

fn kill(id: i64, system_id: i64, attackers: Vec<Attacker>, victim_ship: i64, victim_pilot: Option<i64>, time: chrono::DateTime<Utc>) -> Event {
    Event {
        id,
        timestamp: time,
        system_id,
        victim: Victim {
            ship_type_id: victim_ship,
            character_id: victim_pilot,
            corporation_id: Some(500),
            alliance_id: None,
        },
        attackers,
        total_value: 40_000_000.0,
        labels: vec![],
        awox: false,
    }
}

fn attacker(pilot: i64, corp: i64, ship_type_id: Option<i64>) -> Attacker {
    Attacker {
        character_id: Some(pilot),
        corporation_id: Some(corp),
        alliance_id: None,
        ship_type_id,
        weapon_type_id: None,
        final_blow: ship_type_id.is_some(),
    }
}

#[tokio::test]
async fn single_hauler_kill_at_gate_classifies_solo_camp() {
    let now = Utc::now();
    let event = kill(1, 30000142, vec![attacker(1, 10, None)], 648, Some(99), now);

    let mut pinpoints = HashMap::new();
    pinpoints.insert(1, gate_pinpoint("Stargate (Jita)"));
    let mut ships = HashMap::new();
    ships.insert(648, industrial_ship());

    let store = run_events(vec![event], pinpoints, ships).await;

    let session = store
        .get_clone(&SessionId::camp(30000142, "Stargate (Jita)"))
        .await
        .expect("camp session should exist after a gate-pinpointed kill");

    assert_eq!(session.probability, 20, "lone hauler kill at a gate should score ~20% (vulnerable-victim bonus only)");
    assert_eq!(session.classification, Classification::SoloCamp);
}

#[tokio::test]
async fn sustained_multi_attacker_camp_scores_above_60_percent() {
    let now = Utc::now();
    let system_id = 30000144;
    let stargate = "Stargate (Amarr)";
    let attackers = vec![attacker(1, 10, Some(11_957)), attacker(2, 10, Some(11_958))];

    let mut events = Vec::new();
    let mut pinpoints = HashMap::new();
    let mut ships = HashMap::new();
    for i in 0..5 {
        let id = i + 1;
        let time = now - ChronoDuration::seconds((4 - i) * 180);
        events.push(kill(id, system_id, attackers.clone(), 648, Some(900 + id), time));
        pinpoints.insert(id, gate_pinpoint(stargate));
    }
    ships.insert(648, industrial_ship());

    let store = run_events(events, pinpoints, ships).await;

    let session = store
        .get_clone(&SessionId::camp(system_id, stargate))
        .await
        .expect("camp session should exist");

    assert!(
        session.probability >= 60,
        "five threat-ship kills with consistent attackers should score >= 60%, got {}",
        session.probability
    );
    assert_eq!(session.classification, Classification::Camp, "two distinct attackers rules out solo_camp");
}

#[tokio::test]
async fn roam_merges_across_two_systems_at_low_probability() {
    let now = Utc::now();
    let first = kill(1, 30000100, vec![attacker(10, 1, None), attacker(11, 1, None)], 2, Some(1), now);
    let second = kill(
        2,
        30000101,
        vec![attacker(10, 1, None), attacker(12, 1, None)],
        2,
        Some(2),
        now + ChronoDuration::minutes(2),
    );

    let store = run_events(vec![first, second], HashMap::new(), HashMap::new()).await;

    assert_eq!(store.len().await, 1, "the shared attacker pilot should merge both kills into one roam session");
    let session = store.snapshot().await.into_iter().next().expect("one session");

    assert_eq!(session.visited_systems.len(), 2);
    assert_eq!(session.members.len(), 5, "members = {{10, 11, 12}} attackers plus both victims");
    assert_eq!(session.probability, 0, "no threat ships, vulnerable victims, or known location here");
    assert_eq!(session.classification, Classification::Roam);
}

#[tokio::test]
async fn smartbomb_kill_classifies_as_smartbomb_regardless_of_probability() {
    let now = Utc::now();
    let event = kill(1, 30000142, vec![attacker(1, 10, Some(23_773))], 1, Some(1), now);
    let mut pinpoints = HashMap::new();
    pinpoints.insert(1, gate_pinpoint("Stargate (Jita)"));

    let store = run_events(vec![event], pinpoints, HashMap::new()).await;

    let session = store
        .get_clone(&SessionId::camp(30000142, "Stargate (Jita)"))
        .await
        .expect("camp session should exist");

    assert_eq!(session.classification, Classification::Smartbomb, "a known smartbomb hull overrides every other rule");
}

#[tokio::test]
async fn known_camping_location_bonus_lands_in_expected_band() {
    let now = Utc::now();
    let system_id = 30_002_187;
    let stargate = "Stargate (Rancer)";
    let event = kill(1, system_id, vec![attacker(1, 10, None)], 648, Some(1), now);
    let mut pinpoints = HashMap::new();
    pinpoints.insert(1, gate_pinpoint(stargate));
    let mut ships = HashMap::new();
    ships.insert(648, industrial_ship());

    let store = run_events(vec![event], pinpoints, ships).await;

    let session = store.get_clone(&SessionId::camp(system_id, stargate)).await.expect("camp session should exist");

    assert!(
        (35..=65).contains(&session.probability),
        "vulnerable-victim bonus (20%) plus the Rancer known-location bonus (25%) should land at 45%, got {}",
        session.probability
    );
    assert_eq!(session.classification, Classification::SoloCamp);
}

#[tokio::test]
async fn idle_decay_can_drop_a_camp_below_its_own_threshold() {
    let now = Utc::now();
    let system_id = 30_002_187;
    let stargate = "Stargate (Rancer)";
    let event = kill(1, system_id, vec![attacker(1, 10, None)], 648, Some(1), now);
    let mut pinpoints = HashMap::new();
    pinpoints.insert(1, gate_pinpoint(stargate));
    let mut ships = HashMap::new();
    ships.insert(648, industrial_ship());

    let store = run_events(vec![event], pinpoints, ships).await;
    let mut session = store.get_clone(&SessionId::camp(system_id, stargate)).await.expect("camp session should exist");
    let fresh = session.probability;
    assert!(fresh >= 5, "needs to start out camp-eligible for the decay to mean anything");

    let settings = Settings::default();
    scoring::compute(&mut session, &settings, now + ChronoDuration::minutes(40));
    let decayed = session.probability;

    assert!(decayed < fresh, "probability should only fall as the session idles, got {fresh} then {decayed}");
    assert!(decayed < 5, "40 minutes past the decay grace period should fully erode a one-kill camp");

    session.classification = gatewatch::classify::classify(&session);
    assert_eq!(
        session.classification,
        Classification::Activity,
        "once probability drops below the camp threshold a single-system session reverts to activity"
    );
}
