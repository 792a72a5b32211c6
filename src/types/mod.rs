//! The wire and domain data model: raw events, enriched events, and the
//! mutable session record they accumulate into (distilled spec §3).

pub mod classification;
pub mod enriched;
pub mod event;
pub mod ids;
pub mod ordered_set;
pub mod session;

pub use classification::Classification;
pub use enriched::{EnrichedEvent, Pinpoint, ShipCategories, ShipCategory, ShipInfo, TriangulationMethod};
pub use event::{Attacker, Event, EventParseError, FeedEnvelope, RawKillmailPackage, Victim};
pub use ids::{AllianceId, CorporationId, EventId, PilotId, SessionId, ShipTypeId, SystemId};
pub use ordered_set::OrderedSet;
pub use session::{Composition, PathEntry, SeedKind, Session, SessionMetrics};
