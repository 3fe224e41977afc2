// Domain layer: service model and the ports the adapters implement.

pub mod fixtures;
pub mod model;
pub mod ports;
