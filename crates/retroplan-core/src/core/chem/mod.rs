//! # Chemistry Module
//!
//! Chemical identity services consumed by the planner.
//!
//! - [`canonical`] - The [`canonical::Canonicalizer`] contract and a structural SMILES
//!   normalizer with hash-derived identity keys
//! - [`stock`] - Purchasable-material lookup backed by a set of identity keys
//! - [`vocab`] - The symbol alphabet of the single-step decoder

pub mod canonical;
pub mod stock;
pub mod vocab;
