//! Schema table emitter: writes a [`SchemaTable`] as a delimited file sorted by name.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};

use crate::contract::EmitError;
use crate::flatten::SchemaTable;

pub const HEADER: [&str; 4] = ["name", "type", "aggregatable", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub delimiter: u8,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Write the header and one record per row to `writer`. Values containing the
/// delimiter or a quote are quoted. Returns the number of rows written.
pub fn emit<W: Write>(
    table: &SchemaTable,
    writer: W,
    options: EmitOptions,
) -> Result<usize, EmitError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for row in table.rows() {
        let aggregatable = if row.aggregatable { "true" } else { "false" };
        wtr.write_record([
            row.name.as_str(),
            row.field_type.as_str(),
            aggregatable,
            row.description.as_str(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(table.len())
}

/// Write the table to `path`, truncating any previous file there. Records are
/// rendered in memory first, so every failure touching the file is reported as
/// [`EmitError::Io`] with the path. A failure part way through leaves the partially
/// written file in place.
pub fn emit_to_path(
    table: &SchemaTable,
    path: &Path,
    options: EmitOptions,
) -> Result<usize, EmitError> {
    let mut rendered = Vec::new();
    let written = emit(table, &mut rendered, options)?;

    let io_error = |source: std::io::Error| {
        error!(error = ?source, path = %path.display(), "Failed to write schema file");
        EmitError::Io {
            path: path.to_path_buf(),
            source,
        }
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(&rendered).map_err(io_error)?;
    file.flush().map_err(io_error)?;

    info!(path = %path.display(), rows = written, "Schema file written");
    Ok(written)
}
