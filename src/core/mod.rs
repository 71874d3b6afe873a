pub mod confidence;
pub mod model;
