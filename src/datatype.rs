//! Database column types to generated-language type names.

use crate::ddl::Provider;
use crate::schema::Column;

/// How a mapped type behaves with respect to nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Value type; a nullable column gets a `?` suffix.
    Value,
    /// String-like, never wrapped.
    String,
    /// Array-like, never wrapped.
    Array,
    /// Any other reference type, never wrapped.
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub name: String,
    pub kind: TypeKind,
}

impl MappedType {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    fn value(name: &str) -> Self {
        Self::new(name, TypeKind::Value)
    }

    fn string() -> Self {
        Self::new("string", TypeKind::String)
    }

    fn bytes() -> Self {
        Self::new("byte[]", TypeKind::Array)
    }

    /// The untyped placeholder used when nothing else fits.
    pub fn placeholder() -> Self {
        Self::new("object", TypeKind::Reference)
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == "object"
    }

    /// Type name as written on a property of a column that may be null.
    pub fn render(&self, nullable: bool) -> String {
        if nullable && self.kind == TypeKind::Value {
            format!("{}?", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Maps a column's declared type. `None`, or the placeholder itself, means
/// the type is unknown; callers substitute [`MappedType::placeholder`] and
/// report it.
pub trait DataTypeMap {
    fn map(&self, column: &Column) -> Option<MappedType>;
}

/// Default mapping onto CLR-style type names, per provider.
#[derive(Debug, Clone, Copy)]
pub struct ClrTypeMap {
    provider: Provider,
}

impl ClrTypeMap {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn map_type(&self, declared: &str) -> Option<MappedType> {
        let lower = declared.trim().to_lowercase();
        if let Some(element) = lower.strip_suffix("[]") {
            let inner = self.map_type(element)?;
            return Some(MappedType::new(&format!("{}[]", inner.name), TypeKind::Array));
        }

        let base = lower.split('(').next().unwrap_or(&lower).trim();
        let args = type_arguments(&lower);

        let specific = match self.provider {
            Provider::SqlServer => map_sqlserver_type(base),
            Provider::PostgreSql => map_postgres_type(base),
            Provider::MySql => map_mysql_type(base, &args),
            Provider::Oracle => map_oracle_type(base, &args),
            Provider::Sqlite => map_sqlite_type(base),
            Provider::Generic => None,
        };
        specific
            .or_else(|| map_generic_type(base))
            .or_else(|| map_spatial_type(base))
            // `int unsigned`, `varchar character set utf8`
            .or_else(|| {
                let first = base.split_whitespace().next()?;
                (first != base).then(|| self.map_type(first)).flatten()
            })
    }
}

impl<F> DataTypeMap for F
where
    F: Fn(&Column) -> Option<MappedType>,
{
    fn map(&self, column: &Column) -> Option<MappedType> {
        self(column)
    }
}

impl DataTypeMap for ClrTypeMap {
    fn map(&self, column: &Column) -> Option<MappedType> {
        self.map_type(&column.data_type)
    }
}

/// Numeric arguments of a declared type: `decimal(18,2)` gives `[18, 2]`.
fn type_arguments(declared: &str) -> Vec<u32> {
    let Some(open) = declared.find('(') else {
        return Vec::new();
    };
    let close = declared.rfind(')').unwrap_or(declared.len());
    declared
        .get(open + 1..close)
        .unwrap_or("")
        .split(',')
        .filter_map(|arg| arg.trim().parse().ok())
        .collect()
}

fn map_sqlserver_type(base: &str) -> Option<MappedType> {
    Some(match base {
        "tinyint" => MappedType::value("byte"),
        "bit" => MappedType::value("bool"),
        "money" | "smallmoney" => MappedType::value("decimal"),
        "float" => MappedType::value("double"),
        "datetime" | "datetime2" | "smalldatetime" => MappedType::value("DateTime"),
        "datetimeoffset" => MappedType::value("DateTimeOffset"),
        "nchar" | "nvarchar" | "ntext" | "xml" | "sysname" => MappedType::string(),
        "uniqueidentifier" => MappedType::value("Guid"),
        "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => MappedType::bytes(),
        _ => return None,
    })
}

fn map_postgres_type(base: &str) -> Option<MappedType> {
    Some(match base {
        "int4" | "serial" | "serial4" => MappedType::value("int"),
        "int8" | "bigserial" | "serial8" => MappedType::value("long"),
        "int2" | "smallserial" | "serial2" => MappedType::value("short"),
        "float4" => MappedType::value("float"),
        "float8" => MappedType::value("double"),
        "money" => MappedType::value("decimal"),
        "citext" | "json" | "jsonb" | "xml" | "inet" | "cidr" | "macaddr" => MappedType::string(),
        "timestamptz" | "timestamp with time zone" => MappedType::value("DateTimeOffset"),
        "timestamp without time zone" => MappedType::value("DateTime"),
        "timetz" | "interval" => MappedType::value("TimeSpan"),
        "bytea" => MappedType::bytes(),
        _ => return None,
    })
}

fn map_mysql_type(base: &str, args: &[u32]) -> Option<MappedType> {
    Some(match base {
        // TINYINT(1) is the conventional boolean
        "tinyint" if args.first() == Some(&1) => MappedType::value("bool"),
        "tinyint" => MappedType::value("sbyte"),
        "mediumint" => MappedType::value("int"),
        "bit" => MappedType::value("bool"),
        "year" => MappedType::value("short"),
        "longtext" | "mediumtext" | "tinytext" | "enum" | "set" | "json" => MappedType::string(),
        "blob" | "longblob" | "mediumblob" | "tinyblob" | "binary" | "varbinary" => {
            MappedType::bytes()
        }
        _ => return None,
    })
}

fn map_oracle_type(base: &str, args: &[u32]) -> Option<MappedType> {
    Some(match base {
        "number" => match args {
            [_, scale, ..] if *scale > 0 => MappedType::value("decimal"),
            [precision, ..] if *precision == 1 => MappedType::value("bool"),
            [precision, ..] if *precision <= 9 => MappedType::value("int"),
            [precision, ..] if *precision <= 18 => MappedType::value("long"),
            _ => MappedType::value("decimal"),
        },
        "varchar2" | "nvarchar2" | "nchar" | "clob" | "nclob" | "long" => MappedType::string(),
        "date" => MappedType::value("DateTime"),
        "binary_float" => MappedType::value("float"),
        "binary_double" => MappedType::value("double"),
        "raw" | "long raw" => MappedType::bytes(),
        _ => return None,
    })
}

fn map_sqlite_type(base: &str) -> Option<MappedType> {
    Some(match base {
        // SQLite integers are 64-bit
        "integer" => MappedType::value("long"),
        "real" => MappedType::value("double"),
        _ => return None,
    })
}

fn map_generic_type(base: &str) -> Option<MappedType> {
    Some(match base {
        "int" | "integer" => MappedType::value("int"),
        "bigint" => MappedType::value("long"),
        "smallint" => MappedType::value("short"),
        "real" => MappedType::value("float"),
        "float" | "double" | "double precision" => MappedType::value("double"),
        "decimal" | "numeric" => MappedType::value("decimal"),
        "varchar" | "nvarchar" | "character varying" | "char" | "nchar" | "character" | "text"
        | "string" => {
            MappedType::string()
        }
        "timestamp" | "datetime" | "date" => MappedType::value("DateTime"),
        "time" => MappedType::value("TimeSpan"),
        "boolean" | "bool" => MappedType::value("bool"),
        "blob" => MappedType::bytes(),
        "uuid" => MappedType::value("Guid"),
        _ => return None,
    })
}

fn map_spatial_type(base: &str) -> Option<MappedType> {
    match base {
        "geometry" | "sdo_geometry" => Some(MappedType::new("Geometry", TypeKind::Reference)),
        "geography" | "sdo_geography" => Some(MappedType::new("Geography", TypeKind::Reference)),
        _ => None,
    }
}
