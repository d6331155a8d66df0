mod app;
mod commands;
mod config;
mod effects;
mod persistence;
mod ui;

pub use app::run_app;
