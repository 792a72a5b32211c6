//! The enriched event (distilled spec §3): an [`Event`](super::event::Event)
//! plus location pinpointing and per-participant ship categorization.

use super::event::Event;
use super::ids::ShipTypeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangulationMethod {
    DirectWarp,
    NearCelestial,
    Far,
}

/// Resolved nearest-celestial record attached to an event. `None` fields
/// mean the pinpoint or triangulation service had nothing to offer; the
/// probability engine treats that as the least informative value (4.E).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pinpoint {
    pub nearest_celestial: Option<String>,
    pub at_celestial: bool,
    pub triangulation_method: Option<TriangulationMethod>,
    pub system_name: Option<String>,
    pub region_name: Option<String>,
}

impl Pinpoint {
    /// Whether the nearest celestial is a stargate, and eligibility for
    /// the camp branch (4.D): named celestial is a stargate AND the
    /// triangulation evidence places the fight at or near it.
    pub fn stargate_name(&self) -> Option<&str> {
        let name = self.nearest_celestial.as_deref()?;
        if name.starts_with("Stargate") {
            Some(name)
        } else {
            None
        }
    }

    pub fn qualifies_as_gate_kill(&self) -> bool {
        self.stargate_name().is_some()
            && (self.at_celestial
                || matches!(
                    self.triangulation_method,
                    Some(TriangulationMethod::DirectWarp) | Some(TriangulationMethod::NearCelestial)
                ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipCategory {
    Frigate,
    Destroyer,
    Cruiser,
    Battlecruiser,
    Battleship,
    Capital,
    Supercapital,
    Industrial,
    Mining,
    Structure,
    Concord,
    Npc,
    Other,
}

impl Default for ShipCategory {
    fn default() -> Self {
        ShipCategory::Other
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipInfo {
    pub category: ShipCategory,
    pub name: String,
    pub tier: String,
}

/// Per-participant ship categorization, aligned positionally with
/// [`Event::attackers`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipCategories {
    pub victim: ShipInfo,
    pub attackers: Vec<ShipInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: Event,
    pub pinpoint: Pinpoint,
    pub ship_categories: ShipCategories,
}

impl EnrichedEvent {
    /// The mobile tractor unit exclusion constant (4.E filter rule 3).
    pub const MOBILE_TRACTOR_UNIT_TYPE_ID: ShipTypeId = 33_475;
    /// Capsule hull type id used to partition ship-kills from pod-kills (4.E).
    pub const CAPSULE_TYPE_ID: ShipTypeId = 670;

    pub fn is_pod_kill(&self) -> bool {
        self.event.victim.ship_type_id == Self::CAPSULE_TYPE_ID
    }

    pub fn victim_category_is(&self, category: ShipCategory) -> bool {
        self.ship_categories.victim.category == category
    }
}
