//! Risk classification and dashboard aggregation over shipment lists.
//!
//! Every count a dashboard shows (critical, alerts, filter buckets) goes
//! through [`classify`] so the numbers agree across views.

pub mod alerts;
pub mod filter;
pub mod risk;
pub mod summary;
pub mod trend;

pub use alerts::*;
pub use filter::*;
pub use risk::*;
pub use summary::*;
pub use trend::*;
