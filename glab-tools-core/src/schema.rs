//! High-level pipeline: fetch mapping → flatten → write schema file.
//!
//! # Responsibilities
//! - Fail fast: an adapter failure stops the run before anything touches the destination
//! - Log each stage (fetch, flatten, write) for traceability
//! - Return a [`SchemaReport`] instead of exiting, so callers decide what a failure means
//!
//! # Navigation
//! - Main entrypoint: [`generate_schema`]
//! - Supporting types: [`SchemaJob`], [`SchemaReport`]

use std::path::PathBuf;
use tracing::{error, info};

use crate::contract::{MappingSource, SchemaError};
use crate::emit::{emit_to_path, EmitOptions};
use crate::flatten::{Flattener, PrefixMode};

/// What to generate and where.
#[derive(Debug, Clone)]
pub struct SchemaJob {
    pub index: String,
    pub destination: PathBuf,
    pub prefix_mode: PrefixMode,
    pub emit: EmitOptions,
}

impl SchemaJob {
    pub fn new(index: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            destination: destination.into(),
            prefix_mode: PrefixMode::default(),
            emit: EmitOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub index: String,
    pub destination: PathBuf,
    pub rows: usize,
    pub skipped: usize,
}

pub async fn generate_schema<S>(source: &S, job: &SchemaJob) -> Result<SchemaReport, SchemaError>
where
    S: MappingSource + ?Sized,
{
    info!(index = %job.index, "Fetching mapping");
    let root = source.fetch_mapping(&job.index).await.map_err(|e| {
        error!(index = %job.index, error = %e, "Failed to fetch mapping, no schema written");
        e
    })?;
    info!(index = %job.index, "Mapping fetched");

    info!(index = %job.index, mode = ?job.prefix_mode, "Generating schema");
    let flattened = Flattener::new(job.prefix_mode).flatten(&root);
    info!(
        rows = flattened.table.len(),
        skipped = flattened.skipped,
        "Schema generated"
    );

    info!(path = %job.destination.display(), "Generating schema file");
    let rows = emit_to_path(&flattened.table, &job.destination, job.emit)?;

    Ok(SchemaReport {
        index: job.index.clone(),
        destination: job.destination.clone(),
        rows,
        skipped: flattened.skipped,
    })
}
