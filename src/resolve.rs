//! Relationship classification.
//!
//! One pass over the generated tables builds two ordered lookup lists:
//!
//! - reverse lookups, one per parent/child association, used for the
//!   "children of this row" direction;
//! - ambiguous lookups, one per foreign key whose join column is not the
//!   conventional `{SingularTable}Id` (self-joins, several keys to the same
//!   table, free-form column names). These need accessor names that carry
//!   the column.
//!
//! The pass completes before any code is generated, so every generated file
//! of a run sees the same decisions.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::inflect::{Inflector, PRIMARY_KEY_ID_NAME, remove_id};
use crate::schema::{Constraint, Schema, Table};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReverseLookup {
    pub child_table: String,
    pub parent_table: String,
    /// Primary-key column of the parent the child's key points at.
    pub parent_key_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmbiguousLookup {
    /// Table owning the foreign key.
    pub table_name: String,
    /// The join column (first column of the key).
    pub column: String,
    pub refers_to_table: String,
}

#[derive(Debug, Clone, Default)]
pub struct Lookups {
    reverse: IndexSet<ReverseLookup>,
    /// Keyed by (owning table, column).
    ambiguous: IndexMap<(String, String), AmbiguousLookup>,
}

impl Lookups {
    pub fn reverse(&self) -> impl Iterator<Item = &ReverseLookup> {
        self.reverse.iter()
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = &AmbiguousLookup> {
        self.ambiguous.values()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty() && self.ambiguous.is_empty()
    }

    pub fn is_ambiguous(&self, table: &str, column: &str) -> bool {
        self.ambiguous
            .contains_key(&(table.to_string(), column.to_string()))
    }

    /// Ambiguous keys on other tables (or this one) pointing at `table`.
    pub fn ambiguous_referring_to<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a AmbiguousLookup> + 'a {
        self.ambiguous().filter(move |a| a.refers_to_table == table)
    }

    pub fn reverse_for_parent<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a ReverseLookup> + 'a {
        self.reverse().filter(move |r| r.parent_table == table)
    }

    fn add_ambiguous(&mut self, lookup: AmbiguousLookup) {
        self.ambiguous
            .entry((lookup.table_name.clone(), lookup.column.clone()))
            .or_insert(lookup);
    }
}

/// Whether `fk` breaks the `{SingularTable}Id` naming convention in a way
/// that needs a column-qualified accessor.
pub fn is_ambiguous_key(fk: &Constraint, inflector: &Inflector) -> bool {
    let column = fk.first_column();
    let expected = inflector.singularize(fk.refers_to());
    remove_id(column) != expected && column.contains(PRIMARY_KEY_ID_NAME)
}

/// Build the lookup lists for `tables`, which must all belong to `schema`.
/// Children outside `tables` (filtered out of generation) are ignored.
pub fn resolve(schema: &Schema, tables: &[&Table], inflector: &Inflector) -> Lookups {
    let mut lookups = Lookups::default();
    let included = |name: &str| tables.iter().any(|t| t.name == name);

    for table in tables {
        let parent_key_column = table
            .primary_key_column()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| PRIMARY_KEY_ID_NAME.to_string());

        for child in schema.foreign_key_children(table) {
            if !included(&child.name) || table.is_shared_primary_key(child) {
                continue;
            }
            lookups.reverse.insert(ReverseLookup {
                child_table: child.name.clone(),
                parent_table: table.name.clone(),
                parent_key_column: parent_key_column.clone(),
            });
        }

        for fk in &table.foreign_keys {
            if !included(fk.refers_to()) || !is_ambiguous_key(fk, inflector) {
                continue;
            }
            let inherits = schema
                .find_table(fk.refers_to())
                .is_some_and(|parent| parent.is_shared_primary_key(table));
            if inherits {
                continue;
            }
            lookups.add_ambiguous(AmbiguousLookup {
                table_name: table.name.clone(),
                column: fk.first_column().to_string(),
                refers_to_table: fk.refers_to().to_string(),
            });
        }
    }

    debug!(
        reverse = lookups.reverse.len(),
        ambiguous = lookups.ambiguous.len(),
        "resolved relationships"
    );
    lookups
}
