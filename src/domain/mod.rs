// Domain layer: models, ports, and the screening decision logic.
// No I/O here; adapters feed it and consume it.

pub mod extract;
pub mod model;
pub mod ports;
pub mod rules;
