//! # Engine Module
//!
//! The search-and-rerank machinery of route planning.
//!
//! ## Overview
//!
//! Planning a target runs three stages. The [`decoder`] turns one product into ranked
//! candidate reactant sets by character-level beam search over the step predictor. The
//! [`search`] chains those single-step decompositions into complete routes, keeping a
//! beam of the cheapest partial routes per round and cutting branches that exceed the
//! depth limit. Finally [`rerank`] collapses routes with identical starting materials and
//! reorders the survivors with a second model.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Beam width, depth limit, decoding and rerank settings
//! - **Context** ([`context`]) - The read-only bundle of configuration and collaborators
//! - **State Tracking** ([`state`]) - Search outcomes and statistics
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level failures

pub(crate) mod cache;
pub mod config;
pub mod context;
pub mod decoder;
pub mod error;
pub mod progress;
pub mod rerank;
pub mod search;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
