pub mod commands;
pub mod config;
pub mod exchanges;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod quota;
pub mod remote;
pub mod store;
