//! Key-value persistence for service state. Values are JSON documents
//! stored under well-known keys.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::*;
pub use memory::*;
pub use traits::*;

/// Imported shipments, keyed by guía.
pub const SHIPMENTS_KEY: &str = "litper_shipments";
pub const NOVEDADES_KEY: &str = "litper_novedades";
pub const PEDIDOS_KEY: &str = "litper_pedidos";
pub const AGENT_CITY_KEY: &str = "litper_agent_city";
/// AI tracking summaries, keyed by guía.
pub const TRACKING_KEY: &str = "litper_tracking";
