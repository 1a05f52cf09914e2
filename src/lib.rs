pub mod config;
pub mod drivers;
