pub mod tasks;
pub mod types;
