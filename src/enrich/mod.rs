//! The Enricher (distilled spec §4.B): turns raw events into
//! [`EnrichedEvent`](crate::types::EnrichedEvent)s via a bounded worker
//! pool, degrading gracefully on any resolution miss.

mod error;
mod pool;
mod services;

pub use error::EnrichError;
pub use pool::{enrich_one, Enricher};
pub use services::{
    FakePinpointService, FakeShipCatalog, FakeSystemResolver, HttpPinpointService, HttpShipCatalog,
    PinpointService, ShipCatalog, SystemResolver,
};
