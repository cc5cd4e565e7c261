//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `build`  | `Build`          |
//! | `config` | `Config`         |

pub mod build;
pub mod config;

pub use build::{BuildArgs, cmd_build};
pub use config::cmd_config;
