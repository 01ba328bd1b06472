//! # Core Module
//!
//! The fundamental building blocks of route planning: immutable molecular data models,
//! the contracts of the external collaborators the planner consumes, and file I/O.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Molecules, identity keys, reaction candidates, search
//!   nodes whose partial routes are shared between sibling branches, completed and ranked
//!   routes, and planning tasks
//! - **Chemistry** ([`chem`]) - SMILES canonicalization, identity keys, stock membership
//!   and the decoder vocabulary
//! - **Scoring** ([`scoring`]) - Step predictor, value estimator and route reranker
//!   contracts together with table- and weight-file-backed implementations
//! - **File I/O** ([`io`]) - Benchmark dataset loading and CSV table readers
//!
//! Everything in this module is either immutable or a pure function of its inputs;
//! mutable search state lives in [`crate::engine`].

pub mod chem;
pub mod io;
pub mod models;
pub mod scoring;
