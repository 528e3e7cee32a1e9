// Domain layer: wire models and ports. No HTTP or terminal concerns here.

pub mod model;
pub mod ports;
