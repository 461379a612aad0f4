// Domain layer: records, domain models, constraint sets and ports (interfaces).

pub mod constraints;
pub mod model;
pub mod ports;
