pub mod command;
pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod menubar;
pub mod player;
pub mod recorder;
pub mod renderer;
pub mod terminal;
pub mod types;
