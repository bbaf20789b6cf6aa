//! Schema flattener: walks a nested field-definition tree and collects one
//! [`SchemaRow`] per leaf, keyed by its fully-qualified dotted name.
//!
//! The walk is depth-first and pre-order over children in name order. How a
//! container contributes to the names below it depends on [`PrefixMode`]:
//!
//! - [`PrefixMode::ImmediateParent`] (default): descending into a container resets
//!   the prefix to that container's short name, so `outer.inner.leaf` is emitted as
//!   `inner.leaf`. Existing schema files were generated this way.
//! - [`PrefixMode::FullPath`]: the prefix accumulates every ancestor.
//!
//! Two leaves resolving to the same name keep only the later visited one. Nodes with
//! neither `type` nor `properties` are skipped and counted, never reported as errors.

use std::collections::BTreeMap;
use tracing::debug;

use crate::mapping::{FieldDefinitionNode, NodeKind};

/// Placeholder written for every field until descriptions are filled in by hand.
pub const PLACEHOLDER_DESCRIPTION: &str = "'NA'";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub name: String,
    pub field_type: String,
    /// The mapping carries no aggregatability information; always `true` for now.
    pub aggregatable: bool,
    pub description: String,
}

impl SchemaRow {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            aggregatable: true,
            description: PLACEHOLDER_DESCRIPTION.to_string(),
        }
    }
}

/// Rows keyed by name. Iteration is in ascending byte-wise name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    rows: BTreeMap<String, SchemaRow>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `row`, returning the row it replaced if the name was already present.
    pub fn insert(&mut self, row: SchemaRow) -> Option<SchemaRow> {
        self.rows.insert(row.name.clone(), row)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaRow> {
        self.rows.get(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &SchemaRow> {
        self.rows.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrefixMode {
    #[default]
    ImmediateParent,
    FullPath,
}

/// Result of one flattening run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattened {
    pub table: SchemaTable,
    /// Nodes skipped for lacking both `type` and `properties`.
    pub skipped: usize,
}

/// Owns the accumulator of a single run; consumed by [`Flattener::flatten`].
#[derive(Debug, Default)]
pub struct Flattener {
    mode: PrefixMode,
    table: SchemaTable,
    skipped: usize,
}

impl Flattener {
    pub fn new(mode: PrefixMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn flatten(mut self, root: &FieldDefinitionNode) -> Flattened {
        self.visit(root, "");
        Flattened {
            table: self.table,
            skipped: self.skipped,
        }
    }

    fn visit(&mut self, node: &FieldDefinitionNode, prefix: &str) {
        let Some(children) = &node.properties else {
            return;
        };
        for (name, child) in children {
            match child.kind() {
                NodeKind::Leaf(field_type) => {
                    let row = SchemaRow::new(qualify(prefix, name), field_type);
                    if let Some(previous) = self.table.insert(row) {
                        debug!(
                            field = %previous.name,
                            previous_type = %previous.field_type,
                            field_type,
                            "Field name collision, keeping later field"
                        );
                    }
                }
                NodeKind::Container(_) => {
                    let next = match self.mode {
                        PrefixMode::ImmediateParent => name.clone(),
                        PrefixMode::FullPath => qualify(prefix, name),
                    };
                    self.visit(child, &next);
                }
                NodeKind::Malformed => {
                    self.skipped += 1;
                    debug!(field = %qualify(prefix, name), "Skipping field without type or properties");
                }
            }
        }
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Flatten `root` into a fresh table.
pub fn flatten(root: &FieldDefinitionNode, mode: PrefixMode) -> SchemaTable {
    Flattener::new(mode).flatten(root).table
}
