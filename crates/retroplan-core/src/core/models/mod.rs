//! # Models Module
//!
//! Data structures shared by every stage of route planning.
//!
//! - [`molecule`] - Canonical molecules and their identity keys
//! - [`route`] - Reaction candidates, pending expansions, search nodes and routes
//! - [`task`] - Planning tasks with their ground-truth starting-material sets

pub mod molecule;
pub mod route;
pub mod task;
