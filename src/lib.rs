pub mod api;
pub mod broadcast;
pub mod clients;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod utils;
