//! # RetroPlan Core Library
//!
//! Multi-step retrosynthesis route planning: given a target molecule, search backward
//! through single-step reaction decompositions until every branch ends in a purchasable
//! starting material, then deduplicate and rerank the complete routes.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split used throughout the project:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`Molecule`, routes, tasks),
//!   the collaborator contracts (canonicalizer, stock, step predictor, value estimator,
//!   route reranker) together with file-backed implementations, and dataset I/O.
//!
//! - **[`engine`]: The Logic Core.** The single-step beam decoder, the beam-pruned
//!   multi-step route search and the deduplicating reranker, driven by an explicit
//!   read-only `PlanningContext`.
//!
//! - **[`workflows`]: The Public API.** Entry points that plan one task end-to-end or
//!   evaluate a corpus of tasks against their ground-truth routes.

pub mod core;
pub mod engine;
pub mod workflows;
