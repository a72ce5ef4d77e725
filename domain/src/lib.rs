pub mod errors;
pub mod models;
pub mod pipeline_state;
pub mod ports;
