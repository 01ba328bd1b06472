//! Configuration for planner commands.
//!
//! Values are merged in the order defaults < config file < `--set` overrides < explicit
//! command-line flags, then validated by the core [`PlanningConfigBuilder`].
//!
//! [`PlanningConfigBuilder`]: retroplan::engine::config::PlanningConfigBuilder

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::build_config;
pub use defaults::DefaultsConfig;
pub use models::{AppConfig, ResourcePaths};
