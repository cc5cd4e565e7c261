pub mod agent;
pub mod config;
pub mod errors;
pub mod gates;
pub mod generator;
pub mod logging;
pub mod orchestrator;
pub mod phase;
pub mod sink;
pub mod smith_config;
pub mod ui;
pub mod util;
