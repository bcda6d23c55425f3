pub mod agents;
pub mod carrier;
pub mod error;
pub mod novedad;
pub mod pedido;
pub mod risk;
pub mod shipment;

pub use agents::*;
pub use carrier::*;
pub use error::*;
pub use novedad::*;
pub use pedido::*;
pub use risk::*;
pub use shipment::*;
