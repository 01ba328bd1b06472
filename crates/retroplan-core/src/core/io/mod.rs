//! # I/O Module
//!
//! Readers for the files the planner consumes.
//!
//! - [`dataset`] - Benchmark reaction-tree collections turned into planning tasks
//! - [`tables`] - Shared CSV helpers and the error type of every table-backed loader

pub mod dataset;
pub mod tables;
