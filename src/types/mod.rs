pub mod column;
pub mod service;
pub mod water_table;
