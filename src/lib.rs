pub mod config;
pub mod data;
pub mod evaluation;
pub mod evolution;
pub mod export;
