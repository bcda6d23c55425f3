//! Simulated operations agents: novedad handling, order lifecycle,
//! shipment tracking and the agent city. Each service is constructed once
//! and persists its state through a [`KeyValueStore`](litper_store::KeyValueStore).

pub mod city;
pub mod novedades;
pub mod orders;
pub mod response;
pub mod tracking;

pub use city::*;
pub use novedades::*;
pub use orders::*;
pub use response::*;
pub use tracking::*;
