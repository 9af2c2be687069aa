//! Naming and structure conventions the generator relies on.
//!
//! [`validate`] never changes the schema and never stops at the first
//! problem: every check contributes a [`Section`] when it finds something.
//! Critical sections break the generated code or its naming; advisory ones
//! point at relationships that will get column-qualified accessor names;
//! observations list tables whose entity set name will not be the table name.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::datatype::{ClrTypeMap, DataTypeMap};
use crate::error::Result;
use crate::inflect::{Inflector, PRIMARY_KEY_ID_NAME, remove_id};
use crate::resolve::{self, Lookups};
use crate::schema::{Column, Schema, Table};
use crate::settings::GeneratorSettings;

/// Table names that clash with types of the generated API layer.
const RESERVED_TABLE_NAMES: &[&str] = &["Location", "FieldCoordinate", "NameString", "SchemaCoordinate"];
const RESERVED_COLUMN_NAMES: &[&str] = &["Setting"];

const MIN_COLUMN_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    Advisory,
    Observation,
}

impl Severity {
    fn banner(self) -> &'static str {
        match self {
            Self::Critical => "1. CRITICAL: ATTEND TO ANYTHING BELOW, IT NEEDS FIXING",
            Self::Advisory => "2. NOTE: AIM FOR THE TABLE-ID RELATIONSHIP NAMING CONVENTION",
            Self::Observation => "3. OBSERVATION: THESE TABLES WILL BE RENAMED",
        }
    }
}

/// One convention. Variants are listed in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    NullablePrimaryKey,
    UnknownDataType,
    ReservedName,
    MissingPrimaryKey,
    SingularTableName,
    PluralColumnName,
    PrimaryKeyName,
    UppercaseColumnName,
    ForeignKeyTarget,
    UnconventionalForeignKey,
    ShortColumnName,
    ForeignKeySuffix,
    PluralizedName,
}

impl Check {
    const ALL: [Check; 13] = [
        Check::NullablePrimaryKey,
        Check::UnknownDataType,
        Check::ReservedName,
        Check::MissingPrimaryKey,
        Check::SingularTableName,
        Check::PluralColumnName,
        Check::PrimaryKeyName,
        Check::UppercaseColumnName,
        Check::ForeignKeyTarget,
        Check::UnconventionalForeignKey,
        Check::ShortColumnName,
        Check::ForeignKeySuffix,
        Check::PluralizedName,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Self::ForeignKeyTarget
            | Self::UnconventionalForeignKey
            | Self::ShortColumnName
            | Self::ForeignKeySuffix => Severity::Advisory,
            Self::PluralizedName => Severity::Observation,
            _ => Severity::Critical,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::NullablePrimaryKey => "Always have NON-NULL Primary Keys:",
            Self::UnknownDataType => "Unknown DataTypes:",
            Self::ReservedName => "Reserved Keywords:",
            Self::MissingPrimaryKey => "Every Table Has A Primary Key:",
            Self::SingularTableName => "All Table names MUST end with S:",
            Self::PluralColumnName => "All Column names must NOT be plural:",
            Self::PrimaryKeyName => "All Table Primary Keys MUST be named Id:",
            Self::UppercaseColumnName => {
                "All Column names MUST NOT be acronyms or in capital letters:"
            }
            Self::ForeignKeyTarget => "All Foreign Keys should map to Table Primary Keys:",
            Self::UnconventionalForeignKey => {
                "These Foreign Keys appear to be mapped without the Table-Id convention:"
            }
            Self::ShortColumnName => "All Table Column names should be 3 letters or longer:",
            Self::ForeignKeySuffix => "All Table Foreign Keys should be named Id:",
            Self::PluralizedName => "These classes/objects will have pluralized names:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub check: Check,
    pub severity: Severity,
    pub entries: Vec<String>,
}

/// Outcome of a validation run. Renders as text through [`fmt::Display`];
/// an all-clear report renders as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    sections: Vec<Section>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, check: Check) -> Option<&Section> {
        self.sections.iter().find(|s| s.check == check)
    }

    pub fn has_critical(&self) -> bool {
        self.sections.iter().any(|s| s.severity == Severity::Critical)
    }

    /// Entries of every section mentioning `table`.
    pub fn entries_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .filter(move |e| mentions_table(e, table))
            .map(String::as_str)
    }
}

fn mentions_table(entry: &str, table: &str) -> bool {
    entry
        .split(|c: char| c.is_whitespace() || c == ':')
        .any(|word| word == table)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for severity in [Severity::Critical, Severity::Advisory, Severity::Observation] {
            let mut sections = self.sections.iter().filter(|s| s.severity == severity).peekable();
            if sections.peek().is_none() {
                continue;
            }
            writeln!(f, "{}", severity.banner())?;
            writeln!(f)?;
            for section in sections {
                let title = section.check.title();
                writeln!(f, "{title}")?;
                writeln!(f, "{}", "-".repeat(title.width()))?;
                for entry in &section.entries {
                    writeln!(f, "{entry}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

struct Validator<'a> {
    schema: &'a Schema,
    inflector: Inflector,
    types: &'a dyn DataTypeMap,
    lookups: Lookups,
    found: IndexMap<Check, Vec<String>>,
}

/// Check every non-system table of `schema`. Fails only on a schema whose
/// foreign keys point nowhere.
pub fn validate(schema: &Schema, settings: &GeneratorSettings) -> Result<Report> {
    validate_with(schema, settings, &ClrTypeMap::new(schema.provider))
}

/// [`validate`] against the type mapping the generator will use.
pub fn validate_with(
    schema: &Schema,
    settings: &GeneratorSettings,
    types: &dyn DataTypeMap,
) -> Result<Report> {
    schema.check_references()?;

    let tables: Vec<&Table> = schema
        .tables
        .iter()
        .filter(|t| !settings.is_excluded(&t.name))
        .collect();
    let inflector = Inflector::from_settings(settings);
    let lookups = resolve::resolve(schema, &tables, &inflector);

    let mut validator = Validator {
        schema,
        inflector,
        types,
        lookups,
        found: Check::ALL.iter().map(|c| (*c, Vec::new())).collect(),
    };
    for table in &tables {
        validator.check_table(table);
    }

    let sections: Vec<Section> = validator
        .found
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(check, entries)| Section {
            check,
            severity: check.severity(),
            entries,
        })
        .collect();
    debug!(sections = sections.len(), "validated schema");
    Ok(Report { sections })
}

impl Validator<'_> {
    fn push(&mut self, check: Check, entry: String) {
        if let Some(entries) = self.found.get_mut(&check) {
            entries.push(entry);
        }
    }

    fn check_table(&mut self, table: &Table) {
        let name = &table.name;

        if RESERVED_TABLE_NAMES.contains(&name.as_str()) {
            self.push(Check::ReservedName, format!("FIX: {name}"));
        }
        if !name.to_lowercase().ends_with('s') {
            self.push(Check::SingularTableName, format!("FIX: {name}"));
        }

        match table.primary_key_column() {
            None => self.push(
                Check::MissingPrimaryKey,
                format!("FIX TABLE: {name} - NO PRIMARY KEY COLUMN"),
            ),
            Some(pk) => {
                let composite = table.primary_key_columns().len() > 1;
                if pk.nullable {
                    self.push(
                        Check::NullablePrimaryKey,
                        format!("FIX: {name} Column: {} - MAKE NOT NULL", pk.name),
                    );
                }
                // junction tables are keyed by their foreign keys
                if pk.name != PRIMARY_KEY_ID_NAME && !(composite && table.is_many_to_many()) {
                    self.push(Check::PrimaryKeyName, format!("FIX: {name} Column: {}", pk.name));
                }
            }
        }

        for column in &table.columns {
            self.check_column(table, column);
        }

        let set_name = self.inflector.pluralize(&self.inflector.singularize(name));
        if set_name != *name {
            self.push(Check::PluralizedName, format!("NOTE: {name} will be named {set_name}"));
        }
    }

    fn check_column(&mut self, table: &Table, column: &Column) {
        let entry = format!("{} Column: {}", table.name, column.name);

        if self.types.map(column).is_none_or(|t| t.is_placeholder()) {
            self.push(
                Check::UnknownDataType,
                format!("CODE IN A DATATYPE: {entry} ({}) IS AN OBJECT", column.data_type),
            );
        }
        if RESERVED_COLUMN_NAMES.contains(&column.name.as_str()) {
            self.push(Check::ReservedName, format!("FIX: {entry}"));
        }
        if self.inflector.is_plural(&column.name) {
            self.push(Check::PluralColumnName, format!("FIX: {entry}"));
        }
        if is_all_uppercase(&column.name) {
            self.push(Check::UppercaseColumnName, format!("FIX: {entry}"));
        }

        if !column.is_primary_key && column.name.chars().count() < MIN_COLUMN_NAME_LEN {
            self.push(Check::ShortColumnName, format!("NOTE: {entry}"));
        }
        if column.is_foreign_key && !column.name.ends_with(PRIMARY_KEY_ID_NAME) {
            self.push(Check::ForeignKeySuffix, format!("NOTE: {entry}"));
        }

        // columns that read as `{Table}Id` keys but match no table
        let key_like = (column.is_foreign_key || !column.is_primary_key)
            && column.name.ends_with(PRIMARY_KEY_ID_NAME)
            && column.name != PRIMARY_KEY_ID_NAME;
        if key_like && !self.matches_table(&column.name) {
            if self.lookups.is_ambiguous(&table.name, &column.name) {
                self.push(
                    Check::UnconventionalForeignKey,
                    format!("NOTE: {entry} - verify, check for typos"),
                );
            } else {
                self.push(Check::ForeignKeyTarget, format!("WARN: {entry}"));
            }
        }
    }

    fn matches_table(&self, column: &str) -> bool {
        let stem = remove_id(column);
        self.schema
            .tables
            .iter()
            .any(|t| self.inflector.singularize(&t.name).eq_ignore_ascii_case(stem))
    }
}

/// `ID`, `SKU`, `VAT_RATE`: every letter uppercase, more than one letter.
fn is_all_uppercase(name: &str) -> bool {
    let letters: Vec<char> = name.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() > 1 && letters.iter().all(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{MappedType, TypeKind};
    use crate::ddl::Provider;
    use crate::schema::fixtures::{employees, shop, tickets, users};
    use pretty_assertions::assert_eq;

    fn run(schema: &Schema) -> Report {
        validate(schema, &GeneratorSettings::default()).unwrap()
    }

    #[test]
    fn test_clean_schema_renders_empty() {
        let report = run(&shop());
        assert!(report.is_empty(), "{report}");
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn test_singular_table_with_prefixed_key() {
        let order = Table::new("Order")
            .column(Column::new("OrderId", "int"))
            .with_primary_key(&["OrderId"]);
        let schema = Schema {
            tables: vec![order],
            ..Default::default()
        };
        let report = run(&schema);

        let lines: Vec<_> = report.entries_for("Order").collect();
        assert_eq!(
            lines,
            vec![
                "FIX: Order",
                "FIX: Order Column: OrderId",
                "NOTE: Order will be named Orders",
            ]
        );
        assert!(report.section(Check::SingularTableName).is_some());
        assert!(report.section(Check::PrimaryKeyName).is_some());
    }

    #[test]
    fn test_rendering() {
        let order = Table::new("Order")
            .column(Column::new("Id", "int"))
            .with_primary_key(&["Id"]);
        let schema = Schema {
            tables: vec![order],
            ..Default::default()
        };
        let expected = "\
1. CRITICAL: ATTEND TO ANYTHING BELOW, IT NEEDS FIXING

All Table names MUST end with S:
--------------------------------
FIX: Order

3. OBSERVATION: THESE TABLES WILL BE RENAMED

These classes/objects will have pluralized names:
-------------------------------------------------
NOTE: Order will be named Orders

";
        assert_eq!(run(&schema).to_string(), expected);
    }

    #[test]
    fn test_structural_checks() {
        let logs = Table::new("AuditLogs")
            .column(Column::new("Message", "text"))
            .column(Column::new("SKU", "int"))
            .column(Column::new("Notes", "text"))
            .column(Column::new("Setting", "text"))
            .column(Column::new("Shape", "tsvector"))
            .column(Column::new("At", "datetime"));
        let schema = Schema {
            tables: vec![logs],
            provider: Provider::SqlServer,
            ..Default::default()
        };
        let report = run(&schema);

        assert_eq!(
            report.section(Check::MissingPrimaryKey).unwrap().entries,
            vec!["FIX TABLE: AuditLogs - NO PRIMARY KEY COLUMN"]
        );
        assert_eq!(
            report.section(Check::UppercaseColumnName).unwrap().entries,
            vec!["FIX: AuditLogs Column: SKU"]
        );
        assert_eq!(
            report.section(Check::PluralColumnName).unwrap().entries,
            vec!["FIX: AuditLogs Column: Notes"]
        );
        assert_eq!(
            report.section(Check::ReservedName).unwrap().entries,
            vec!["FIX: AuditLogs Column: Setting"]
        );
        assert_eq!(report.section(Check::UnknownDataType).unwrap().entries.len(), 1);
        assert_eq!(
            report.section(Check::ShortColumnName).unwrap().entries,
            vec!["NOTE: AuditLogs Column: At"]
        );
        assert!(report.has_critical());
    }

    #[test]
    fn test_nullable_primary_key() {
        let mut table = users();
        table.columns[0].nullable = true;
        let schema = Schema {
            tables: vec![table],
            ..Default::default()
        };
        let report = run(&schema);
        assert_eq!(
            report.section(Check::NullablePrimaryKey).unwrap().entries,
            vec!["FIX: Users Column: Id - MAKE NOT NULL"]
        );
    }

    #[test]
    fn test_ambiguous_keys_are_advisory_notes() {
        let schema = Schema {
            tables: vec![users(), tickets(), employees()],
            ..Default::default()
        };
        let report = run(&schema);

        assert!(!report.has_critical(), "{report}");
        let notes = &report.section(Check::UnconventionalForeignKey).unwrap().entries;
        assert_eq!(
            notes,
            &vec![
                "NOTE: Tickets Column: ReportedById - verify, check for typos",
                "NOTE: Tickets Column: AssignedToId - verify, check for typos",
                "NOTE: Employees Column: ManagerId - verify, check for typos",
            ]
        );
        assert!(report.section(Check::ForeignKeyTarget).is_none());
        assert!(report.to_string().starts_with("2. NOTE"));
    }

    #[test]
    fn test_undeclared_key_column_warns() {
        let orders = Table::new("Orders")
            .column(Column::new("Id", "int"))
            .column(Column::new("CategoryId", "int"))
            .column(Column::new("Owner", "int"))
            .with_primary_key(&["Id"])
            .with_foreign_key(&["Owner"], "Orders");
        let schema = Schema {
            tables: vec![orders],
            ..Default::default()
        };
        let report = run(&schema);

        assert_eq!(
            report.section(Check::ForeignKeyTarget).unwrap().entries,
            vec!["WARN: Orders Column: CategoryId"]
        );
        assert_eq!(
            report.section(Check::ForeignKeySuffix).unwrap().entries,
            vec!["NOTE: Orders Column: Owner"]
        );
    }

    #[test]
    fn test_pluralized_names_are_observed() {
        let table = |name: &str| {
            Table::new(name)
                .column(Column::new("Id", "int"))
                .with_primary_key(&["Id"])
        };
        let schema = Schema {
            tables: vec![table("Cases"), table("Categories"), table("People")],
            ..Default::default()
        };
        let report = run(&schema);

        assert!(!report.has_critical(), "{report}");
        let section = report.section(Check::PluralizedName).unwrap();
        assert_eq!(section.severity, Severity::Observation);
        assert_eq!(section.entries, vec!["NOTE: Cases will be named Cass"]);
        assert!(report.to_string().starts_with("3. OBSERVATION"));
    }

    #[test]
    fn test_placeholder_types_are_unknown() {
        let blobs = Table::new("Blobs")
            .column(Column::new("Id", "int"))
            .column(Column::new("Payload", "sql_variant"))
            .with_primary_key(&["Id"]);
        let schema = Schema {
            tables: vec![blobs],
            provider: Provider::SqlServer,
            ..Default::default()
        };
        assert_eq!(
            run(&schema).section(Check::UnknownDataType).unwrap().entries,
            vec!["CODE IN A DATATYPE: Blobs Column: Payload (sql_variant) IS AN OBJECT"]
        );
    }

    #[test]
    fn test_validate_with_custom_types() {
        let documents = Table::new("Documents")
            .column(Column::new("Id", "int"))
            .column(Column::new("Body", "tsvector"))
            .with_primary_key(&["Id"]);
        let schema = Schema {
            tables: vec![documents],
            provider: Provider::PostgreSql,
            ..Default::default()
        };
        assert!(run(&schema).section(Check::UnknownDataType).is_some());

        let defaults = ClrTypeMap::new(Provider::PostgreSql);
        let types = |column: &Column| {
            if column.data_type == "tsvector" {
                Some(MappedType {
                    name: "string".to_string(),
                    kind: TypeKind::String,
                })
            } else {
                defaults.map(column)
            }
        };
        let report = validate_with(&schema, &GeneratorSettings::default(), &types).unwrap();
        assert!(report.is_empty(), "{report}");
    }

    #[test]
    fn test_settings_exclude_tables() {
        let schema = Schema {
            tables: vec![Table::new("migration_history")],
            ..Default::default()
        };
        assert!(!run(&schema).is_empty());

        let settings = GeneratorSettings {
            excluded_tables: vec!["migration_history".to_string()],
            ..Default::default()
        };
        assert!(validate(&schema, &settings).unwrap().is_empty());
    }

    #[test]
    fn test_system_tables_are_skipped() {
        let schema = Schema {
            tables: vec![Table::new("sysdiagrams")],
            ..Default::default()
        };
        assert!(run(&schema).is_empty());
    }
}
