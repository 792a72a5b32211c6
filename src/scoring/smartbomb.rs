//! The smartbomb flag (distilled spec §4.E stage 3, §4.F rule 1): shared
//! between the probability engine and the classifier so both agree on
//! what counts as a smartbomb session.

use super::tables::{is_smartbomb_ship, is_smartbomb_weapon};
use crate::types::session::Session;

/// Whether any attacker across any event in the session (not just the
/// scoring-filtered view) used a known smartbomb ship or weapon.
pub fn session_has_smartbomb(session: &Session) -> bool {
    session.events.iter().any(|event| {
        event.event.attackers.iter().any(|a| {
            a.ship_type_id.is_some_and(is_smartbomb_ship) || a.weapon_type_id.is_some_and(is_smartbomb_weapon)
        })
    })
}
