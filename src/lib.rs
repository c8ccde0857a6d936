// src/lib.rs
pub mod config;
pub mod errors;
pub mod executor;
pub mod judge;
pub mod catalog;
pub mod progress;
pub mod assessment;
pub mod providers;
pub mod assistant;
pub mod models;
pub mod banner;
pub mod api;
