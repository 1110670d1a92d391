pub mod compatibility;
pub mod fitness;
