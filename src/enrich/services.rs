//! Pure enrichment collaborators (distilled spec §6): the celestial
//! triangulation service, the ship catalog, and system/region resolution.
//! All three degrade gracefully on a miss rather than failing the event.

use crate::types::ids::{ShipTypeId, SystemId};
use crate::types::{Event, Pinpoint, ShipCategory, ShipInfo, TriangulationMethod};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[async_trait]
pub trait PinpointService: Send + Sync {
    async fn pinpoint(&self, event: &Event) -> Pinpoint;
}

#[async_trait]
pub trait ShipCatalog: Send + Sync {
    async fn lookup(&self, ship_type_id: ShipTypeId) -> ShipInfo;
}

#[async_trait]
pub trait SystemResolver: Send + Sync {
    async fn resolve(&self, system_id: SystemId) -> (Option<String>, Option<String>);
}

#[derive(Debug, Deserialize)]
struct PinpointResponse {
    #[serde(rename = "nearestCelestial")]
    nearest_celestial: Option<NearestCelestial>,
    #[serde(rename = "atCelestial")]
    at_celestial: bool,
    #[serde(rename = "triangulationType")]
    triangulation_type: Option<String>,
    #[serde(rename = "celestialData")]
    celestial_data: Option<CelestialData>,
}

#[derive(Debug, Deserialize)]
struct NearestCelestial {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CelestialData {
    solarsystemname: Option<String>,
    regionname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShipCatalogResponse {
    category: Option<String>,
    name: Option<String>,
    tier: Option<String>,
}

/// HTTP-backed pinpoint/triangulation client.
pub struct HttpPinpointService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPinpointService {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
        }
    }
}

#[async_trait]
impl PinpointService for HttpPinpointService {
    async fn pinpoint(&self, event: &Event) -> Pinpoint {
        let result = self
            .client
            .post(format!("{}/pinpoint", self.base_url))
            .json(event)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, event_id = event.id, "pinpoint service unreachable, using null pinpoint");
                return Pinpoint::default();
            }
        };

        match response.json::<PinpointResponse>().await {
            Ok(parsed) => Pinpoint {
                nearest_celestial: parsed.nearest_celestial.map(|c| c.name),
                at_celestial: parsed.at_celestial,
                triangulation_method: parsed.triangulation_type.as_deref().and_then(parse_triangulation),
                system_name: parsed.celestial_data.as_ref().and_then(|c| c.solarsystemname.clone()),
                region_name: parsed.celestial_data.as_ref().and_then(|c| c.regionname.clone()),
            },
            Err(e) => {
                tracing::debug!(error = %e, event_id = event.id, "pinpoint response undecodable, using null pinpoint");
                Pinpoint::default()
            }
        }
    }
}

fn parse_triangulation(raw: &str) -> Option<TriangulationMethod> {
    match raw {
        "direct_warp" => Some(TriangulationMethod::DirectWarp),
        "near_celestial" => Some(TriangulationMethod::NearCelestial),
        "far" => Some(TriangulationMethod::Far),
        _ => None,
    }
}

/// HTTP-backed ship catalog client.
pub struct HttpShipCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShipCatalog {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
        }
    }
}

#[async_trait]
impl ShipCatalog for HttpShipCatalog {
    async fn lookup(&self, ship_type_id: ShipTypeId) -> ShipInfo {
        let result = self
            .client
            .get(format!("{}/ships/{ship_type_id}", self.base_url))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, ship_type_id, "ship catalog unreachable, using 'other'");
                return ShipInfo::default();
            }
        };

        match response.json::<ShipCatalogResponse>().await {
            Ok(parsed) => ShipInfo {
                category: parsed.category.as_deref().map(parse_category).unwrap_or(ShipCategory::Other),
                name: parsed.name.unwrap_or_default(),
                tier: parsed.tier.unwrap_or_default(),
            },
            Err(e) => {
                tracing::debug!(error = %e, ship_type_id, "ship catalog response undecodable, using 'other'");
                ShipInfo::default()
            }
        }
    }
}

fn parse_category(raw: &str) -> ShipCategory {
    match raw {
        "frigate" => ShipCategory::Frigate,
        "destroyer" => ShipCategory::Destroyer,
        "cruiser" => ShipCategory::Cruiser,
        "battlecruiser" => ShipCategory::Battlecruiser,
        "battleship" => ShipCategory::Battleship,
        "capital" => ShipCategory::Capital,
        "supercapital" => ShipCategory::Supercapital,
        "industrial" => ShipCategory::Industrial,
        "mining" => ShipCategory::Mining,
        "structure" => ShipCategory::Structure,
        "concord" => ShipCategory::Concord,
        "npc" => ShipCategory::Npc,
        _ => ShipCategory::Other,
    }
}

/// Fixture ship catalog and system resolver backed by in-memory maps, so
/// tests never depend on network access.
#[derive(Debug, Default)]
pub struct FakeShipCatalog {
    pub ships: HashMap<ShipTypeId, ShipInfo>,
}

#[async_trait]
impl ShipCatalog for FakeShipCatalog {
    async fn lookup(&self, ship_type_id: ShipTypeId) -> ShipInfo {
        self.ships.get(&ship_type_id).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct FakeSystemResolver {
    pub systems: HashMap<SystemId, (String, String)>,
}

#[async_trait]
impl SystemResolver for FakeSystemResolver {
    async fn resolve(&self, system_id: SystemId) -> (Option<String>, Option<String>) {
        match self.systems.get(&system_id) {
            Some((name, region)) => (Some(name.clone()), Some(region.clone())),
            None => (None, None),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakePinpointService {
    pub pinpoints: HashMap<i64, Pinpoint>,
}

#[async_trait]
impl PinpointService for FakePinpointService {
    async fn pinpoint(&self, event: &Event) -> Pinpoint {
        self.pinpoints.get(&event.id).cloned().unwrap_or_default()
    }
}
