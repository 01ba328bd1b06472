//! # Workflows Module
//!
//! High-level entry points that drive the engine for complete planning runs.
//!
//! ## Overview
//!
//! Workflows are what the command line and other callers use. They resolve per-task
//! settings such as the depth limit, sequence the search and reranking stages, report
//! progress and collect the results into owned, serializable summaries.
//!
//! ## Architecture
//!
//! - **Planning Workflow** ([`plan`]) - Route search, deduplication and reranking for a
//!   single target molecule.
//! - **Evaluation Workflow** ([`evaluate`]) - Runs the planning workflow over a corpus of
//!   tasks and measures how often a ground-truth route appears in the top-k candidates,
//!   overall and per route depth.

pub mod evaluate;
pub mod plan;
