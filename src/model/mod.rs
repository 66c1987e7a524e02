pub mod data_core;
pub mod events;
pub mod marshal;
pub mod nested;
pub mod schema;
