// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires the terminal to these modules.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod sequencer;
pub mod ui;
