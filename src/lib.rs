pub mod datatype;
pub mod ddl;
pub mod emit;
pub mod error;
pub mod inflect;
pub mod naming;
pub mod resolve;
pub mod schema;
pub mod settings;
pub mod synth;
pub mod validate;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use datatype::{ClrTypeMap, DataTypeMap, MappedType};
pub use ddl::{Provider, parse_ddl};
pub use error::{Diagnostic, DiagnosticKind, GenerateError, LoadError};
pub use schema::Schema;
pub use settings::{CodeTarget, GeneratorSettings};
pub use synth::{FileKind, GeneratedFile, Generation, Generator};
pub use validate::{Report, validate, validate_with};

/// Read a schema from JSON (when the text starts with `{`) or a DDL script.
pub fn load_schema(input: &str, provider: Option<Provider>) -> Result<Schema, LoadError> {
    if input.trim_start().starts_with('{') {
        let mut schema = Schema::from_json(input)?;
        if let Some(provider) = provider {
            schema.provider = provider;
        }
        Ok(schema)
    } else {
        Ok(parse_ddl(input, provider)?)
    }
}

fn parse_settings(settings: Option<&str>) -> Result<GeneratorSettings, String> {
    match settings {
        Some(toml) => GeneratorSettings::from_toml(toml).map_err(|e| e.to_string()),
        None => Ok(GeneratorSettings::default()),
    }
}

#[derive(Serialize)]
struct GenerationOutput<'a> {
    files: &'a [GeneratedFile],
    diagnostics: Vec<String>,
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Generate code from a DDL script or JSON schema. Returns the files and
/// diagnostics as JSON.
#[wasm_bindgen(js_name = "generateCode")]
pub fn generate_code(source: &str, settings: Option<String>) -> Result<String, String> {
    let settings = parse_settings(settings.as_deref())?;
    let schema = load_schema(source, None).map_err(|e| e.to_string())?;
    let generation = Generator::new(&schema, settings)
        .and_then(|generator| generator.generate())
        .map_err(|e| e.to_string())?;

    let output = GenerationOutput {
        files: &generation.files,
        diagnostics: generation.diagnostics.iter().map(ToString::to_string).collect(),
    };
    serde_json::to_string(&output).map_err(|e| e.to_string())
}

/// Check a schema against the naming conventions. Returns the report text,
/// empty when everything passes.
#[wasm_bindgen(js_name = "validateSchema")]
pub fn validate_schema(source: &str, settings: Option<String>) -> Result<String, String> {
    let settings = parse_settings(settings.as_deref())?;
    let schema = load_schema(source, None).map_err(|e| e.to_string())?;
    let report = validate(&schema, &settings).map_err(|e| e.to_string())?;
    Ok(report.to_string())
}
