//! Static weight tables consulted by the probability engine (distilled
//! spec §4.E). These are illustrative domain data, not exhaustive EVE
//! Online ship/weapon catalogs — unknown ids simply contribute nothing,
//! per the engine's "missing fields resolve to defaults" rule (§7).

use crate::types::ids::{ShipTypeId, SystemId};
use std::collections::HashMap;
use std::sync::OnceLock;

/// `threat_weights[ship_type] -> w in (0, 1]` (distilled spec §4.E stage 2).
/// Cloaky recon and force-recon hulls that commonly crew gate camps carry
/// the highest weight; tackle frigates and logistics carry less.
pub fn threat_weight(ship_type_id: ShipTypeId) -> f64 {
    static TABLE: OnceLock<HashMap<ShipTypeId, f64>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        HashMap::from([
            (11_957, 0.9), // Arazu
            (11_958, 0.9), // Lachesis
            (11_959, 0.8), // Huginn
            (11_961, 0.8), // Rapier
            (17_718, 0.7), // Broadsword
            (22_456, 0.7), // Onyx
            (11_969, 0.6), // Sabre
            (22_460, 0.6), // Flycatcher
            (670, 0.0),    // Capsule — never a threat contributor
        ])
    });
    table.get(&ship_type_id).copied().unwrap_or(0.0)
}

/// Ship hulls fitted as smartbombers in most camp-ambush compositions
/// (distilled spec §4.E stage 3).
pub fn is_smartbomb_ship(ship_type_id: ShipTypeId) -> bool {
    matches!(ship_type_id, 23_773 | 23_911 | 24_688 | 4_302) // Sin, Widow, Panther, Scorpion-family
}

/// Weapon type ids for area-effect "smartbomb" modules.
pub fn is_smartbomb_weapon(weapon_type_id: ShipTypeId) -> bool {
    matches!(weapon_type_id, 2_536 | 2_538 | 2_540 | 2_542)
}

/// Known permanent camping locations: `(system_id, stargate_name) -> weight`
/// (distilled spec §4.E stage 4).
pub fn permanent_camp_weight(system_id: SystemId, stargate_name: &str) -> Option<f64> {
    static TABLE: OnceLock<HashMap<(SystemId, String), f64>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        HashMap::from([
            ((30_002_187, "Stargate (Rancer)".to_string()), 0.25), // Rancer gate, Tama
            ((30_002_813, "Stargate (Tama)".to_string()), 0.25),   // Tama gate, Rancer
            ((30_045_349, "Stargate (Ignoitton)".to_string()), 0.20),
        ])
    });
    table.get(&(system_id, stargate_name.to_string())).copied()
}
