mod app;
mod cli;
mod effects;
mod logging;
mod render;
mod settings;
mod toolkit;

pub use app::run_app;
