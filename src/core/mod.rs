pub mod config;
pub mod error;
pub mod hunter;
pub mod models;
pub mod profile;
