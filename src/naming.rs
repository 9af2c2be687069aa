//! Name normalization: fills generated class and property names into a
//! copy of the schema.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::inflect::Inflector;
use crate::schema::{Schema, Table};

/// Generated class names mapped to the table that currently owns them.
#[derive(Debug, Default)]
struct NameRegistry {
    entities: IndexMap<String, String>,
}

impl NameRegistry {
    /// Claim `class` for `table`. Returns the previous owner on a collision;
    /// the new owner replaces it.
    fn register(&mut self, class: &str, table: &str) -> Option<String> {
        self.entities
            .insert(class.to_string(), table.to_string())
            .filter(|previous| previous != table)
    }
}

/// A schema with every `net_name` filled in, plus what went wrong on the way.
#[derive(Debug)]
pub struct Prepared {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

/// Derive a normalized copy of `schema`. The input is left untouched.
pub fn prepare(schema: &Schema, inflector: &Inflector) -> Prepared {
    let mut prepared = schema.clone();
    let mut registry = NameRegistry::default();
    let mut diagnostics = Vec::new();

    for table in prepared.tables.iter_mut().chain(prepared.views.iter_mut()) {
        let class = inflector.to_pascal_case(&table.name);
        if let Some(previous) = registry.register(&class, &table.name) {
            let message = format!(
                "class name {class} is also produced by {previous}; the later table wins"
            );
            warn!(table = %table.name, "{message}");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NameCollision,
                &table.name,
                message,
            ));
        }
        name_columns(table, &class, inflector, &mut diagnostics);
        table.net_name = Some(class);
    }

    Prepared {
        schema: prepared,
        diagnostics,
    }
}

fn name_columns(
    table: &mut Table,
    class: &str,
    inflector: &Inflector,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut taken: Vec<String> = Vec::with_capacity(table.columns.len());
    for column in &mut table.columns {
        let mut property = inflector.to_pascal_case(&column.name);
        // a member cannot share its enclosing type's name
        if property == class {
            property.push_str("Column");
        }
        if taken.contains(&property) {
            let base = property.clone();
            let mut n = 2;
            while taken.contains(&property) {
                property = format!("{base}{n}");
                n += 1;
            }
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::AccessorCollision,
                &table.name,
                format!("column {} renamed to {property}", column.name),
            ));
        }
        taken.push(property.clone());
        column.net_name = Some(property);
    }
}
