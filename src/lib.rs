pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod selection;
pub mod shell;
pub mod sources;
pub mod state;
pub mod types;
pub mod ui;
