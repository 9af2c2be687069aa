//! SQL DDL to schema model loading.

mod lexer;
mod parser;
mod provider;

pub use parser::{DdlError, parse_ddl};
pub use provider::Provider;
