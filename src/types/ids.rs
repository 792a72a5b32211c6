//! Newtype identifiers.
//!
//! A bare `String` session id reads the same whether it came from the
//! deterministic camp-seed formula (`"{system_id}-{stargate_name}"`) or a
//! freshly minted roam-seed UUID. Keeping them as a newtype prevents the two
//! construction paths from being confused at call sites, mirroring the
//! `RigId`/`WellId` newtype discipline used elsewhere in this codebase.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type SystemId = i64;
pub type PilotId = i64;
pub type CorporationId = i64;
pub type AllianceId = i64;
pub type ShipTypeId = i64;
pub type EventId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Deterministic id for a camp-seeded session (4.D Camp branch).
    pub fn camp(system_id: SystemId, stargate_name: &str) -> Self {
        Self(format!("{system_id}-{stargate_name}"))
    }

    /// Freshly minted id for a roam-seeded session.
    pub fn roam() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
