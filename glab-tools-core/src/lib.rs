#![doc = "glab-tools-core: core logic library for glab-tools."]

//! This crate contains the data models and pipelines behind the `glab-tools` CLI:
//! turning a search index's field mapping into a flat CSV schema, and keeping a
//! local GrimoireLab development environment (forks, clones, upstream remotes) in sync.
//!
//! # Usage
//! Add this as a dependency for all shared mapping, schema and dev-env code.
//! Network clients that need credentials (e.g. GitHub) implement the traits in
//! [`contract`] and live in the CLI crate.

pub mod config;
pub mod contract;
pub mod dev_env;
pub mod emit;
pub mod flatten;
pub mod mapping;
pub mod repos;
pub mod schema;
