//! Session classification tags (distilled spec §4.F).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Smartbomb,
    Battle,
    RoamingCamp,
    Camp,
    SoloCamp,
    Roam,
    SoloRoam,
    Activity,
}

impl Classification {
    /// Camp-family tags share the longer expiry timeout (4.G) and are the
    /// only ones eligible for archival.
    pub fn is_camp_family(self) -> bool {
        matches!(
            self,
            Classification::Camp
                | Classification::SoloCamp
                | Classification::Smartbomb
                | Classification::RoamingCamp
                | Classification::Battle
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Smartbomb => "smartbomb",
            Classification::Battle => "battle",
            Classification::RoamingCamp => "roaming_camp",
            Classification::Camp => "camp",
            Classification::SoloCamp => "solo_camp",
            Classification::Roam => "roam",
            Classification::SoloRoam => "solo_roam",
            Classification::Activity => "activity",
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Classification::Activity
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
