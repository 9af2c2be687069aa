//! Entity code synthesis.
//!
//! [`Generator::new`] does every schema-wide decision up front: it checks the
//! inputs, normalizes names, picks the tables to generate and resolves the
//! relationship lookups. [`Generator::generate`] then builds one member model
//! per table (properties, navigations, collections, resolver names) and hands
//! the models to the per-file writers, so a name chosen for one file is the
//! name every other file refers to.

mod aggregate;
mod api;
mod entity;
mod mapping;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::datatype::{ClrTypeMap, DataTypeMap, MappedType};
use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::inflect::{Inflector, PRIMARY_KEY_ID_NAME, RESERVED_ESCAPE, is_reserved, remove_id};
use crate::naming;
use crate::resolve::{self, Lookups, is_ambiguous_key};
use crate::schema::{Column, Schema, Table};
use crate::settings::GeneratorSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Entity,
    Mapping,
    ApiType,
    Aggregate,
}

/// One generated source file, with a suggested path relative to the output
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub kind: FileKind,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct Generation {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

pub struct Generator {
    schema: Schema,
    settings: GeneratorSettings,
    inflector: Inflector,
    types: Box<dyn DataTypeMap>,
    lookups: Lookups,
    diagnostics: Vec<Diagnostic>,
}

impl Generator {
    /// Validate the inputs and resolve everything schema-wide. Fails on
    /// configuration errors; never on questionable data.
    pub fn new(schema: &Schema, settings: GeneratorSettings) -> Result<Self> {
        settings.check()?;
        schema.check_references()?;

        let inflector = Inflector::from_settings(&settings);
        let prepared = naming::prepare(schema, &inflector);
        let lookups = if settings.uses_lookups() {
            let tables = eligible_tables(&prepared.schema, &settings);
            resolve::resolve(&prepared.schema, &tables, &inflector)
        } else {
            Lookups::default()
        };

        Ok(Self {
            types: Box::new(ClrTypeMap::new(schema.provider)),
            schema: prepared.schema,
            settings,
            inflector,
            lookups,
            diagnostics: prepared.diagnostics,
        })
    }

    /// Replace the default type mapping.
    pub fn with_type_map(mut self, types: impl DataTypeMap + 'static) -> Self {
        self.types = Box::new(types);
        self
    }

    /// The normalized schema the generator works from.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    /// Tables that produce code, in schema order.
    pub fn tables(&self) -> Vec<&Table> {
        eligible_tables(&self.schema, &self.settings)
    }

    pub fn generate(&self) -> Result<Generation> {
        let mut diagnostics = self.diagnostics.clone();
        let models = self.build_models(&mut diagnostics);
        let ctx = Context {
            settings: &self.settings,
            lookups: &self.lookups,
            models: &models,
        };

        let mut files: IndexMap<String, GeneratedFile> = IndexMap::new();
        let mut add = |path: String, kind: FileKind, contents: String| {
            debug!(%path, bytes = contents.len(), "generated file");
            let file = GeneratedFile {
                path: path.clone(),
                kind,
                contents,
            };
            files.insert(path, file);
        };

        let has_mapping = self.settings.target.has_mapping();
        for model in &models {
            add(
                format!("Models/{}.cs", model.class),
                FileKind::Entity,
                entity::write_entity(&ctx, model)?,
            );
            if has_mapping {
                add(
                    format!("Mapping/{}Mapping.cs", model.class),
                    FileKind::Mapping,
                    mapping::write_mapping(&ctx, model)?,
                );
            }
            if self.settings.api_layer && !model.is_view {
                add(
                    format!("Api/{}Type.cs", model.class),
                    FileKind::ApiType,
                    api::write_api_type(&ctx, model)?,
                );
            }
        }

        if has_mapping {
            add(
                "DataContext.cs".to_string(),
                FileKind::Aggregate,
                aggregate::write_data_context(&ctx)?,
            );
        }
        if self.settings.api_layer {
            add(
                "Query.cs".to_string(),
                FileKind::Aggregate,
                aggregate::write_query(&ctx)?,
            );
            add(
                "Mutation.cs".to_string(),
                FileKind::Aggregate,
                aggregate::write_mutation(&ctx)?,
            );
            add(
                "Subscription.cs".to_string(),
                FileKind::Aggregate,
                aggregate::write_subscription(&ctx)?,
            );
        }

        for diagnostic in &diagnostics[self.diagnostics.len()..] {
            warn!("{diagnostic}");
        }

        Ok(Generation {
            files: files.into_values().collect(),
            diagnostics,
        })
    }

    fn build_models(&self, diagnostics: &mut Vec<Diagnostic>) -> Vec<EntityModel<'_>> {
        let tables = self.tables();
        let mut models: Vec<EntityModel<'_>> = tables
            .iter()
            .map(|table| self.model(table, false, &tables, diagnostics))
            .collect();
        if self.settings.include_views {
            for view in &self.schema.views {
                models.push(self.model(view, true, &tables, diagnostics));
            }
        }
        // a class produced twice is owned by the later table, in the slot of
        // the earlier one
        let mut by_class: IndexMap<String, EntityModel<'_>> = IndexMap::new();
        for model in models {
            by_class.insert(model.class.clone(), model);
        }
        let mut models: Vec<EntityModel<'_>> = by_class.into_values().collect();

        if !self.lookups.is_empty() {
            self.attach_collections(&mut models, diagnostics);
        }
        if self.settings.api_layer {
            for model in &mut models {
                if !model.is_view {
                    name_resolvers(model, diagnostics);
                }
            }
        }
        models
    }

    /// Properties and navigations of one table.
    fn model<'s>(
        &'s self,
        table: &'s Table,
        is_view: bool,
        generated: &[&'s Table],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> EntityModel<'s> {
        let class = table.net_name().to_string();
        let base = if is_view || !self.settings.target.has_mapping() {
            None
        } else {
            self.schema
                .find_inheritance_table(table)
                .filter(|b| generated.iter().any(|t| t.name == b.name))
        };

        let mut members = Members::new(&class);
        let mut properties = Vec::new();
        for column in &table.columns {
            // the shared key lives on the base class
            if base.is_some() && column.is_primary_key {
                continue;
            }
            let mapped = self
                .types
                .map(column)
                .filter(|t| !t.is_placeholder())
                .unwrap_or_else(|| {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnknownDataType,
                        &table.name,
                        format!(
                            "column {} of type {} has no mapping; using object",
                            column.name, column.data_type
                        ),
                    ));
                    MappedType::placeholder()
                });
            members.reserve(column.net_name());
            properties.push(Property {
                column,
                name: column.net_name().to_string(),
                ty: mapped.render(column.nullable),
            });
        }

        let key = if base.is_some() {
            Vec::new()
        } else {
            table
                .primary_key_columns()
                .iter()
                .map(|c| property_name(table, c))
                .collect()
        };

        let mut navigations = Vec::new();
        if !is_view {
            for fk in table.association_keys(base) {
                let target = if self.settings.target.has_mapping() {
                    generated.iter().copied().find(|t| t.name == fk.refers_to())
                } else {
                    self.schema.find_table(fk.refers_to())
                };
                let Some(target) = target else {
                    continue;
                };

                let foreign_keys: Vec<String> =
                    fk.columns.iter().map(|c| property_name(table, c)).collect();
                let qualifier = foreign_keys.first().cloned().unwrap_or_default();
                let ambiguous = is_ambiguous_key(fk, &self.inflector);
                let stripped = remove_id(&qualifier);
                let preferred = if ambiguous && !stripped.is_empty() {
                    stripped.to_string()
                } else {
                    target.net_name().to_string()
                };
                let name = members.claim(preferred, &qualifier, &table.name, diagnostics);

                navigations.push(Navigation {
                    name,
                    column: fk.first_column().to_string(),
                    target_table: target.name.clone(),
                    target_class: target.net_name().to_string(),
                    foreign_keys,
                    ambiguous,
                    inverse: None,
                    resolver: None,
                });
            }
        }

        EntityModel {
            table,
            class: class.clone(),
            set_name: self.inflector.name_collection(&class, self.settings.pluralize),
            is_view,
            base: base.map(|b| b.net_name().to_string()),
            key,
            properties,
            navigations,
            collections: Vec::new(),
            members,
        }
    }

    /// Give each parent its child collections and pair them with the child
    /// navigations, following the lookup lists.
    fn attach_collections(&self, models: &mut [EntityModel<'_>], diagnostics: &mut Vec<Diagnostic>) {
        for parent in 0..models.len() {
            if models[parent].is_view {
                continue;
            }
            let parent_table = models[parent].table.name.clone();

            // (child model, child navigation, preferred collection name, ambiguous)
            let mut pending: Vec<(usize, usize, String, bool)> = Vec::new();
            for lookup in self.lookups.ambiguous_referring_to(&parent_table) {
                let Some(child) = find_model(models, &lookup.table_name) else {
                    continue;
                };
                let Some(nav) = models[child].navigations.iter().position(|n| {
                    n.ambiguous && n.target_table == parent_table && n.column == lookup.column
                }) else {
                    continue;
                };
                let children = self
                    .inflector
                    .name_collection(&models[child].class, self.settings.pluralize);
                let preferred = format!("{children}By{}", models[child].navigations[nav].name);
                pending.push((child, nav, preferred, true));
            }
            for lookup in self.lookups.reverse_for_parent(&parent_table) {
                let covered = self
                    .lookups
                    .ambiguous_referring_to(&parent_table)
                    .any(|a| a.table_name == lookup.child_table);
                if covered {
                    continue;
                }
                let Some(child) = find_model(models, &lookup.child_table) else {
                    continue;
                };
                let Some(nav) = models[child].navigations.iter().position(|n| {
                    !n.ambiguous && n.target_table == parent_table && n.inverse.is_none()
                }) else {
                    continue;
                };
                let preferred = self
                    .inflector
                    .name_collection(&models[child].class, self.settings.pluralize);
                pending.push((child, nav, preferred, false));
            }

            for (child, nav, preferred, ambiguous) in pending {
                let child_class = models[child].class.clone();
                let navigation = &models[child].navigations[nav];
                let inverse = navigation.name.clone();
                let column = navigation.column.clone();
                let foreign_keys = navigation.foreign_keys.clone();

                let name = models[parent].members.claim(
                    preferred,
                    &inverse,
                    &parent_table,
                    diagnostics,
                );
                models[child].navigations[nav].inverse = Some(name.clone());
                models[parent].collections.push(Collection {
                    name,
                    column,
                    child_table: models[child].table.name.clone(),
                    child_class,
                    foreign_keys,
                    inverse,
                    ambiguous,
                    resolver: None,
                });
            }
        }
    }
}

/// Tables that produce code under `settings`, in schema order.
fn eligible_tables<'s>(schema: &'s Schema, settings: &GeneratorSettings) -> Vec<&'s Table> {
    schema
        .tables
        .iter()
        .filter(|table| is_eligible(table, settings))
        .collect()
}

fn is_eligible(table: &Table, settings: &GeneratorSettings) -> bool {
    if settings.is_excluded(&table.name) {
        return false;
    }
    if !settings.target.has_mapping() {
        return true;
    }
    if table.primary_key.is_none() {
        return false;
    }
    // junction tables become plain many-to-many collections, except when the
    // api layer needs them as entities of their own
    !(table.is_many_to_many() && !settings.api_layer)
}

fn find_model(models: &[EntityModel<'_>], table: &str) -> Option<usize> {
    models
        .iter()
        .position(|m| !m.is_view && m.table.name == table)
}

fn property_name(table: &Table, column: &str) -> String {
    table
        .find_column(column)
        .map(|c| c.net_name().to_string())
        .unwrap_or_else(|| column.to_string())
}

fn name_resolvers(model: &mut EntityModel<'_>, diagnostics: &mut Vec<Diagnostic>) {
    let mut resolvers = Members::default();
    for nav in &mut model.navigations {
        let preferred = if nav.ambiguous {
            format!("Get{}By{}", nav.target_class, nav.name)
        } else {
            format!("Get{}", nav.name)
        };
        let qualifier = nav.foreign_keys.first().cloned().unwrap_or_default();
        nav.resolver = Some(resolvers.claim(preferred, &qualifier, &model.table.name, diagnostics));
    }
    for collection in &mut model.collections {
        let preferred = format!("Get{}", collection.name);
        collection.resolver = Some(resolvers.claim(
            preferred,
            &collection.inverse,
            &model.table.name,
            diagnostics,
        ));
    }
}

/// Member names already used inside one generated class.
#[derive(Debug, Default)]
pub(crate) struct Members {
    taken: Vec<String>,
}

impl Members {
    fn new(class: &str) -> Self {
        Self {
            taken: vec![class.to_string()],
        }
    }

    fn reserve(&mut self, name: &str) {
        self.taken.push(name.to_string());
    }

    /// Take `preferred`, or `{preferred}By{qualifier}` when it is already
    /// used, reporting the rename.
    fn claim(
        &mut self,
        preferred: String,
        qualifier: &str,
        table: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        if !self.taken.contains(&preferred) {
            self.taken.push(preferred.clone());
            return preferred;
        }

        let base = format!("{preferred}By{qualifier}");
        let mut name = base.clone();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::AccessorCollision,
            table,
            format!("{preferred} is already a member; using {name}"),
        ));
        self.taken.push(name.clone());
        name
    }
}

pub(crate) struct Property<'a> {
    pub column: &'a Column,
    pub name: String,
    pub ty: String,
}

/// Child-to-parent reference on the table owning the foreign key.
pub(crate) struct Navigation {
    pub name: String,
    /// Raw join column.
    pub column: String,
    pub target_table: String,
    pub target_class: String,
    /// Local key properties.
    pub foreign_keys: Vec<String>,
    pub ambiguous: bool,
    /// Matching collection on the parent, if any.
    pub inverse: Option<String>,
    pub resolver: Option<String>,
}

/// Parent-to-children collection.
pub(crate) struct Collection {
    pub name: String,
    /// Raw join column on the child.
    pub column: String,
    pub child_table: String,
    pub child_class: String,
    /// Key properties on the child.
    pub foreign_keys: Vec<String>,
    /// Navigation on the child pointing back.
    pub inverse: String,
    pub ambiguous: bool,
    pub resolver: Option<String>,
}

pub(crate) struct EntityModel<'a> {
    pub table: &'a Table,
    pub class: String,
    /// Name of the entity set on the data context.
    pub set_name: String,
    pub is_view: bool,
    pub base: Option<String>,
    /// Key properties; empty for derived classes and keyless views.
    pub key: Vec<String>,
    pub properties: Vec<Property<'a>>,
    pub navigations: Vec<Navigation>,
    pub collections: Vec<Collection>,
    members: Members,
}

impl EntityModel<'_> {
    /// Identity property used in resolver filters.
    pub fn key_property(&self) -> &str {
        self.key
            .first()
            .map(String::as_str)
            .unwrap_or(PRIMARY_KEY_ID_NAME)
    }

    /// Name for a local variable holding an instance.
    pub fn variable(&self) -> String {
        variable_name(&self.class)
    }
}

/// What the per-file writers share.
pub(crate) struct Context<'a> {
    pub settings: &'a GeneratorSettings,
    pub lookups: &'a Lookups,
    pub models: &'a [EntityModel<'a>],
}

impl<'a> Context<'a> {
    pub fn namespace(&self) -> &str {
        &self.settings.namespace
    }

    /// The model generated for table `name`.
    pub fn model(&self, name: &str) -> Option<&'a EntityModel<'a>> {
        find_model(self.models, name).map(|i| &self.models[i])
    }

    /// Models of tables, without views.
    pub fn tables(&self) -> impl Iterator<Item = &'a EntityModel<'a>> {
        self.models.iter().filter(|m| !m.is_view)
    }
}

/// camelCase local name for an instance of `class`.
pub(crate) fn variable_name(class: &str) -> String {
    let mut chars = class.chars();
    let name: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "item".to_string(),
    };
    if is_reserved(&name) {
        format!("{RESERVED_ESCAPE}{name}")
    } else {
        name
    }
}

/// Lambda parameter that cannot shadow `outer`.
pub(crate) fn lambda_var(outer: &str) -> &'static str {
    if outer == "x" { "y" } else { "x" }
}

/// A C# string literal.
pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `x => x.A` or `x => new { x.A, x.B }`.
pub(crate) fn member_selector(var: &str, members: &[String]) -> String {
    match members {
        [single] => format!("{var} => {var}.{single}"),
        _ => {
            let list: Vec<String> = members.iter().map(|m| format!("{var}.{m}")).collect();
            format!("{var} => new {{ {} }}", list.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::Provider;
    use crate::error::GenerateError;
    use crate::schema::fixtures::{employees, shop, tickets, users};
    use crate::settings::CodeTarget;
    use pretty_assertions::assert_eq;

    fn api_settings() -> GeneratorSettings {
        GeneratorSettings {
            namespace: "Shop".to_string(),
            api_layer: true,
            ..Default::default()
        }
    }

    fn generate(schema: &Schema, settings: GeneratorSettings) -> Generation {
        Generator::new(schema, settings).unwrap().generate().unwrap()
    }

    fn contents<'g>(generation: &'g Generation, path: &str) -> &'g str {
        &generation
            .file(path)
            .unwrap_or_else(|| panic!("{path} was not generated"))
            .contents
    }

    fn helpdesk() -> Schema {
        Schema {
            tables: vec![users(), tickets()],
            ..Default::default()
        }
    }

    #[test]
    fn test_configuration_errors_fail_fast() {
        let settings = GeneratorSettings {
            target: CodeTarget::Poco,
            api_layer: true,
            ..Default::default()
        };
        assert!(matches!(
            Generator::new(&shop(), settings),
            Err(GenerateError::ApiLayerWithoutMapping(_))
        ));

        let dangling = Schema {
            tables: vec![tickets()],
            ..Default::default()
        };
        assert!(matches!(
            Generator::new(&dangling, GeneratorSettings::default()),
            Err(GenerateError::DanglingForeignKey { .. })
        ));
    }

    #[test]
    fn test_code_first_filters_tables() {
        let mut schema = shop();
        schema.tables.push(Table::new("sysdiagrams"));
        schema
            .tables
            .push(Table::new("AuditLogs").column(Column::new("Message", "text")));

        let generator = Generator::new(&schema, GeneratorSettings::default()).unwrap();
        let names: Vec<_> = generator.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Customers", "Orders", "Products", "VipCustomers"]);

        // the api layer keeps junction tables as entities
        let generator = Generator::new(&schema, api_settings()).unwrap();
        assert!(generator.tables().iter().any(|t| t.name == "OrderProducts"));

        let poco = GeneratorSettings {
            target: CodeTarget::Poco,
            ..Default::default()
        };
        let generator = Generator::new(&schema, poco).unwrap();
        assert_eq!(generator.tables().len(), 6);
        assert!(generator.lookups().is_empty());
    }

    #[test]
    fn test_file_layout() {
        let generation = generate(&shop(), api_settings());
        let paths: Vec<_> = generation.files.iter().map(|f| f.path.as_str()).collect();
        assert!(paths.contains(&"Models/Order.cs"));
        assert!(paths.contains(&"Mapping/OrderMapping.cs"));
        assert!(paths.contains(&"Api/OrderType.cs"));
        assert_eq!(
            &paths[paths.len() - 4..],
            ["DataContext.cs", "Query.cs", "Mutation.cs", "Subscription.cs"]
        );
        assert_eq!(generation.file("Query.cs").unwrap().kind, FileKind::Aggregate);
    }

    #[test]
    fn test_two_keys_to_one_table_get_distinct_resolvers() {
        let generation = generate(&helpdesk(), api_settings());

        let ticket = contents(&generation, "Api/TicketType.cs");
        assert!(ticket.contains("public User GetUserByReportedBy([Parent] Ticket ticket, IDataContext context)"));
        assert!(ticket.contains("public User GetUserByAssignedTo([Parent] Ticket ticket, IDataContext context)"));

        let user = contents(&generation, "Api/UserType.cs");
        assert!(user.contains("GetTicketsByReportedBy([Parent] User user, IDataContext context)"));
        assert!(user.contains("GetTicketsByAssignedTo([Parent] User user, IDataContext context)"));
        assert!(user.contains("return context.Tickets.Where(x => x.AssignedToId == user.Id);"));
        // the plain reverse accessor is covered by the two above
        assert!(!user.contains("GetTickets("));
        assert!(generation.diagnostics.is_empty());
    }

    #[test]
    fn test_self_reference_resolvers() {
        let schema = Schema {
            tables: vec![employees()],
            ..Default::default()
        };
        let generation = generate(&schema, api_settings());
        let api = contents(&generation, "Api/EmployeeType.cs");

        assert_eq!(api.matches("public Employee GetEmployeeByManager(").count(), 1);
        assert_eq!(
            api.matches("public IQueryable<Employee> GetEmployeesByManager(").count(),
            1
        );
        assert_eq!(api.matches("IQueryable<Employee> Get").count(), 1);

        let model = contents(&generation, "Models/Employee.cs");
        assert!(model.contains("public virtual Employee Manager { get; set; }"));
        assert!(model.contains(
            "public virtual ICollection<Employee> EmployeesByManager { get; protected set; }"
        ));
        assert!(!model.contains(" : "));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let schema = shop();
        let first = generate(&schema, api_settings());
        let second = generate(&schema, api_settings());
        assert_eq!(first.files, second.files);

        let again = Generator::new(&schema, api_settings()).unwrap();
        assert_eq!(again.generate().unwrap().files, first.files);
    }

    #[test]
    fn test_unknown_type_becomes_object() {
        let schema = Schema {
            tables: vec![
                Table::new("Shapes")
                    .column(Column::new("Id", "int"))
                    .column(Column::new("Outline", "tsvector").nullable())
                    .with_primary_key(&["Id"]),
            ],
            provider: Provider::PostgreSql,
            ..Default::default()
        };
        let generation = generate(&schema, GeneratorSettings::default());

        assert!(contents(&generation, "Models/Shape.cs").contains("public object Outline { get; set; }"));
        assert_eq!(generation.diagnostics.len(), 1);
        assert_eq!(generation.diagnostics[0].kind, DiagnosticKind::UnknownDataType);
        assert_eq!(generation.diagnostics[0].table, "Shapes");
    }

    #[test]
    fn test_placeholder_mapping_is_reported() {
        let schema = Schema {
            tables: vec![
                Table::new("Readings")
                    .column(Column::new("Id", "int"))
                    .column(Column::new("Payload", "sql_variant"))
                    .column(Column::new("Node", "hierarchyid"))
                    .with_primary_key(&["Id"]),
            ],
            provider: Provider::SqlServer,
            ..Default::default()
        };
        let generation = generate(&schema, GeneratorSettings::default());

        let model = contents(&generation, "Models/Reading.cs");
        assert!(model.contains("public object Payload { get; set; }"));
        assert!(model.contains("public object Node { get; set; }"));
        let unknown: Vec<_> = generation
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnknownDataType)
            .collect();
        assert_eq!(unknown.len(), 2);

        // a custom map handing back the placeholder is no different
        let generator = Generator::new(&schema, GeneratorSettings::default())
            .unwrap()
            .with_type_map(|_: &Column| Some(MappedType::placeholder()));
        assert_eq!(generator.generate().unwrap().diagnostics.len(), 3);
    }

    #[test]
    fn test_inheritance_is_not_a_relationship() {
        let generation = generate(&shop(), api_settings());

        let vip = contents(&generation, "Models/VipCustomer.cs");
        assert!(vip.contains("public class VipCustomer : Customer"));
        assert!(!vip.contains("public int Id"));
        assert!(!vip.contains("virtual Customer"));

        let customer = contents(&generation, "Models/Customer.cs");
        assert!(!customer.contains("VipCustomer"));
        assert!(!contents(&generation, "Api/CustomerType.cs").contains("VipCustomer"));
        assert!(!contents(&generation, "DataContext.cs").contains(".HasMany(x => x.VipCustomers)"));
    }

    #[test]
    fn test_accessor_collision_is_disambiguated() {
        let reviews = Table::new("Reviews")
            .column(Column::new("Id", "int"))
            .column(Column::new("Author", "int"))
            .column(Column::new("Editor", "int"))
            .with_primary_key(&["Id"])
            .with_foreign_key(&["Author"], "Users")
            .with_foreign_key(&["Editor"], "Users");
        let schema = Schema {
            tables: vec![users(), reviews],
            ..Default::default()
        };
        let generation = generate(&schema, api_settings());

        let model = contents(&generation, "Models/Review.cs");
        assert!(model.contains("public virtual User User { get; set; }"));
        assert!(model.contains("public virtual User UserByEditor { get; set; }"));
        assert!(
            generation
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::AccessorCollision)
        );
    }

    #[test]
    fn test_class_name_collision_keeps_later_table() {
        let keyed = |name: &str, extra: &str| {
            Table::new(name)
                .column(Column::new("Id", "int"))
                .column(Column::new(extra, "int"))
                .with_primary_key(&["Id"])
        };
        let schema = Schema {
            tables: vec![
                keyed("order_items", "Quantity"),
                users(),
                keyed("OrderItems", "Amount"),
            ],
            ..Default::default()
        };
        let generation = generate(&schema, api_settings());

        let entities: Vec<_> = generation
            .files
            .iter()
            .filter(|f| f.kind == FileKind::Entity)
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(entities, vec!["Models/OrderItem.cs", "Models/User.cs"]);

        let model = contents(&generation, "Models/OrderItem.cs");
        assert!(model.contains("public int Amount { get; set; }"));
        assert!(!model.contains("Quantity"));

        let context = contents(&generation, "DataContext.cs");
        assert_eq!(context.matches("EntitySet<OrderItem> OrderItems { get; }").count(), 1);
        assert_eq!(context.matches("EntitySet<OrderItem> OrderItems { get; set; }").count(), 1);
        assert_eq!(contents(&generation, "Query.cs").matches("GetOrderItems(").count(), 1);
        assert_eq!(contents(&generation, "Mutation.cs").matches("AddOrderItemAsync(").count(), 1);
        assert_eq!(
            contents(&generation, "Subscription.cs").matches("OnOrderItemAdded(").count(),
            1
        );
        assert_eq!(
            generation
                .diagnostics
                .iter()
                .filter(|d| d.kind == DiagnosticKind::NameCollision)
                .count(),
            1
        );
    }

    #[test]
    fn test_poco_has_no_mapping() {
        let settings = GeneratorSettings {
            target: CodeTarget::Poco,
            ..Default::default()
        };
        let generation = generate(&shop(), settings);
        assert!(generation.files.iter().all(|f| f.kind == FileKind::Entity));
        let customer = contents(&generation, "Models/Customer.cs");
        assert!(!customer.contains("ICollection"));
        assert!(contents(&generation, "Models/VipCustomer.cs").contains("public virtual Customer Customer"));
    }

    #[test]
    fn test_views_are_generated_on_request() {
        let mut schema = shop();
        schema.views.push(
            Table::new("CustomerTotals")
                .column(Column::new("CustomerId", "int"))
                .column(Column::new("Total", "decimal(18,2)").nullable()),
        );

        let generation = generate(&schema, api_settings());
        assert!(generation.file("Models/CustomerTotal.cs").is_none());

        let settings = GeneratorSettings {
            include_views: true,
            ..api_settings()
        };
        let generation = generate(&schema, settings);
        assert!(generation.file("Models/CustomerTotal.cs").is_some());
        assert!(contents(&generation, "Mapping/CustomerTotalMapping.cs").contains("ToView(\"CustomerTotals\");"));
        assert!(generation.file("Api/CustomerTotalType.cs").is_none());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(variable_name("OrderItem"), "orderItem");
        assert_eq!(variable_name("Event"), "@event");
        assert_eq!(lambda_var("x"), "y");
        assert_eq!(quote(r#"a"b"#), r#""a\"b""#);
        assert_eq!(
            member_selector("x", &["A".to_string(), "B".to_string()]),
            "x => new { x.A, x.B }"
        );
    }
}
