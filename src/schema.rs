//! In-memory relational schema model.
//!
//! The model is plain data handed over by a loader (the DDL parser in
//! [`crate::ddl`] or any introspection tool emitting JSON). Back-references
//! such as a table's foreign-key children are computed on demand instead of
//! stored, so the model has no cycles and can be cloned freely.

use serde::{Deserialize, Serialize};

use crate::ddl::Provider;
use crate::error::{GenerateError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Option<Constraint>,
    #[serde(default)]
    pub foreign_keys: Vec<Constraint>,
    /// Generated class name, filled by [`crate::naming::prepare`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared database type, e.g. `varchar(50)` or `int`.
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    /// Generated property name, filled by [`crate::naming::prepare`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub name: Option<String>,
    pub kind: ConstraintKind,
    /// Owning table.
    pub table_name: String,
    /// Local columns. The first one is the canonical join column.
    pub columns: Vec<String>,
    #[serde(default)]
    pub refers_to_table: Option<String>,
    /// Referenced key column or constraint name.
    #[serde(default)]
    pub refers_to_constraint: Option<String>,
}

impl Constraint {
    pub fn primary_key(table: &str, columns: Vec<String>) -> Self {
        Self {
            name: None,
            kind: ConstraintKind::PrimaryKey,
            table_name: table.to_string(),
            columns,
            refers_to_table: None,
            refers_to_constraint: None,
        }
    }

    pub fn foreign_key(table: &str, columns: Vec<String>, refers_to: &str) -> Self {
        Self {
            name: None,
            kind: ConstraintKind::ForeignKey,
            table_name: table.to_string(),
            columns,
            refers_to_table: Some(refers_to.to_string()),
            refers_to_constraint: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn referencing(mut self, column: impl Into<String>) -> Self {
        self.refers_to_constraint = Some(column.into());
        self
    }

    /// The canonical join column, or "" for a malformed constraint.
    pub fn first_column(&self) -> &str {
        self.columns.first().map(String::as_str).unwrap_or("")
    }

    pub fn refers_to(&self) -> &str {
        self.refers_to_table.as_deref().unwrap_or("")
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("({})", self.columns.join(", ")),
        }
    }
}

impl Column {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            ..Default::default()
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Generated property name, falling back to the raw name before
    /// normalization.
    pub fn net_name(&self) -> &str {
        self.net_name.as_deref().unwrap_or(&self.name)
    }
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add a column. Builder style, used by loaders and tests.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare the primary key and flag its columns.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        for column in &mut self.columns {
            if columns.contains(&column.name.as_str()) {
                column.is_primary_key = true;
                column.nullable = false;
            }
        }
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.primary_key = Some(Constraint::primary_key(&self.name, columns));
        self
    }

    /// Add a foreign key and flag its columns.
    pub fn with_foreign_key(mut self, columns: &[&str], refers_to: &str) -> Self {
        self.add_foreign_key(Constraint::foreign_key(
            &self.name,
            columns.iter().map(|c| c.to_string()).collect(),
            refers_to,
        ));
        self
    }

    pub fn add_foreign_key(&mut self, fk: Constraint) {
        for column in &mut self.columns {
            if fk.columns.contains(&column.name) {
                column.is_foreign_key = true;
            }
        }
        self.foreign_keys.push(fk);
    }

    pub fn net_name(&self) -> &str {
        self.net_name.as_deref().unwrap_or(&self.name)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }

    /// The identity column: the first primary-key column.
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.primary_key_columns()
            .first()
            .and_then(|name| self.find_column(name))
    }

    /// A pure junction table: exactly two foreign keys and nothing but
    /// key columns.
    pub fn is_many_to_many(&self) -> bool {
        self.foreign_keys.len() == 2
            && !self.columns.is_empty()
            && self
                .columns
                .iter()
                .all(|c| c.is_primary_key && c.is_foreign_key)
    }

    /// Whether `child` shares this table's primary key through a foreign key,
    /// i.e. is a table-per-type subclass of it.
    pub fn is_shared_primary_key(&self, child: &Table) -> bool {
        if child.name == self.name {
            return false;
        }
        let child_pk = child.primary_key_columns();
        if child_pk.is_empty() {
            return false;
        }
        child
            .foreign_keys
            .iter()
            .any(|fk| fk.refers_to() == self.name && fk.columns == child_pk)
    }

    /// Foreign keys that are associations rather than the shared-key
    /// inheritance edge.
    pub fn association_keys<'a>(
        &'a self,
        inheritance: Option<&'a Table>,
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.foreign_keys.iter().filter(move |fk| {
            inheritance.is_none_or(|base| fk.refers_to() != base.name)
        })
    }
}

impl Schema {
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables whose foreign keys reference `table`, each listed once, in
    /// schema order. Includes `table` itself when it references itself.
    pub fn foreign_key_children(&self, table: &Table) -> Vec<&Table> {
        self.tables
            .iter()
            .filter(|t| t.foreign_keys.iter().any(|fk| fk.refers_to() == table.name))
            .collect()
    }

    /// The base table of a table-per-type subclass.
    pub fn find_inheritance_table(&self, table: &Table) -> Option<&Table> {
        table
            .foreign_keys
            .iter()
            .filter_map(|fk| self.find_table(fk.refers_to()))
            .find(|parent| parent.is_shared_primary_key(table))
    }

    /// Every foreign key must name at least one column and an existing table.
    pub fn check_references(&self) -> Result<()> {
        for table in &self.tables {
            for fk in &table.foreign_keys {
                if fk.columns.is_empty() {
                    return Err(GenerateError::EmptyForeignKey {
                        table: table.name.clone(),
                        constraint: fk.display_name(),
                    });
                }
                let Some(refers_to) = fk.refers_to_table.as_deref() else {
                    return Err(GenerateError::MissingReference {
                        table: table.name.clone(),
                        constraint: fk.display_name(),
                    });
                };
                if self.find_table(refers_to).is_none() {
                    return Err(GenerateError::DanglingForeignKey {
                        table: table.name.clone(),
                        constraint: fk.display_name(),
                        refers_to: refers_to.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn users() -> Table {
        Table::new("Users")
            .column(Column::new("Id", "int"))
            .column(Column::new("Name", "nvarchar(100)"))
            .with_primary_key(&["Id"])
    }

    pub fn tickets() -> Table {
        Table::new("Tickets")
            .column(Column::new("Id", "int"))
            .column(Column::new("Title", "nvarchar(200)"))
            .column(Column::new("ReportedById", "int"))
            .column(Column::new("AssignedToId", "int").nullable())
            .with_primary_key(&["Id"])
            .with_foreign_key(&["ReportedById"], "Users")
            .with_foreign_key(&["AssignedToId"], "Users")
    }

    pub fn employees() -> Table {
        Table::new("Employees")
            .column(Column::new("Id", "int"))
            .column(Column::new("Name", "nvarchar(100)"))
            .column(Column::new("ManagerId", "int").nullable())
            .with_primary_key(&["Id"])
            .with_foreign_key(&["ManagerId"], "Employees")
    }

    /// Customers with Orders, a Products/Orders junction and a
    /// table-per-type subclass of Customers.
    pub fn shop() -> Schema {
        let customers = Table::new("Customers")
            .column(Column::new("Id", "int"))
            .column(Column::new("Name", "nvarchar(100)"))
            .with_primary_key(&["Id"]);
        let orders = Table::new("Orders")
            .column(Column::new("Id", "int"))
            .column(Column::new("CustomerId", "int"))
            .column(Column::new("Total", "decimal(18,2)").nullable())
            .with_primary_key(&["Id"])
            .with_foreign_key(&["CustomerId"], "Customers");
        let products = Table::new("Products")
            .column(Column::new("Id", "int"))
            .column(Column::new("Title", "nvarchar(50)"))
            .with_primary_key(&["Id"]);
        let order_products = Table::new("OrderProducts")
            .column(Column::new("OrderId", "int"))
            .column(Column::new("ProductId", "int"))
            .with_primary_key(&["OrderId", "ProductId"])
            .with_foreign_key(&["OrderId"], "Orders")
            .with_foreign_key(&["ProductId"], "Products");
        let vip_customers = Table::new("VipCustomers")
            .column(Column::new("Id", "int"))
            .column(Column::new("Discount", "decimal(5,2)"))
            .with_primary_key(&["Id"])
            .with_foreign_key(&["Id"], "Customers");

        Schema {
            tables: vec![customers, orders, products, order_products, vip_customers],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_builders_flag_columns() {
        let orders = shop().tables.remove(1);
        let customer_id = orders.find_column("CustomerId").unwrap();
        assert!(customer_id.is_foreign_key);
        assert!(!customer_id.is_primary_key);
        assert!(orders.find_column("Id").unwrap().is_primary_key);
        assert_eq!(orders.primary_key_column().unwrap().name, "Id");
    }

    #[test]
    fn test_many_to_many() {
        let schema = shop();
        assert!(schema.find_table("OrderProducts").unwrap().is_many_to_many());
        assert!(!schema.find_table("Orders").unwrap().is_many_to_many());
    }

    #[test]
    fn test_shared_primary_key() {
        let schema = shop();
        let customers = schema.find_table("Customers").unwrap();
        let vip = schema.find_table("VipCustomers").unwrap();
        let orders = schema.find_table("Orders").unwrap();

        assert!(customers.is_shared_primary_key(vip));
        assert!(!customers.is_shared_primary_key(orders));
        assert_eq!(schema.find_inheritance_table(vip).unwrap().name, "Customers");
        assert!(schema.find_inheritance_table(orders).is_none());
    }

    #[test]
    fn test_self_reference_is_not_inheritance() {
        let schema = Schema {
            tables: vec![employees()],
            ..Default::default()
        };
        let employees = &schema.tables[0];
        assert!(!employees.is_shared_primary_key(employees));
        assert!(schema.find_inheritance_table(employees).is_none());
        assert_eq!(schema.foreign_key_children(employees).len(), 1);
    }

    #[test]
    fn test_foreign_key_children_are_distinct() {
        let schema = Schema {
            tables: vec![users(), tickets()],
            ..Default::default()
        };
        let children = schema.foreign_key_children(&schema.tables[0]);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Tickets");
    }

    #[test]
    fn test_check_references() {
        assert!(shop().check_references().is_ok());

        let schema = Schema {
            tables: vec![tickets()],
            ..Default::default()
        };
        assert!(matches!(
            schema.check_references(),
            Err(GenerateError::DanglingForeignKey { refers_to, .. }) if refers_to == "Users"
        ));

        let mut table = users();
        table
            .foreign_keys
            .push(Constraint::foreign_key("Users", Vec::new(), "Users"));
        let schema = Schema {
            tables: vec![table],
            ..Default::default()
        };
        assert!(matches!(
            schema.check_references(),
            Err(GenerateError::EmptyForeignKey { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let schema = Schema::from_json(
            r#"{
                "provider": "postgresql",
                "tables": [{
                    "name": "Tags",
                    "columns": [
                        { "name": "Id", "data_type": "int4", "is_primary_key": true },
                        { "name": "Label", "data_type": "text", "nullable": true }
                    ],
                    "primary_key": {
                        "kind": "primary-key",
                        "table_name": "Tags",
                        "columns": ["Id"]
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.provider, Provider::PostgreSql);
        assert_eq!(schema.tables[0].columns.len(), 2);
        assert!(schema.tables[0].columns[1].nullable);
        assert!(schema.views.is_empty());
        assert_eq!(schema.tables[0].primary_key_column().unwrap().name, "Id");
    }
}
