use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use schemacraft::{
    CodeTarget, Generator, GeneratorSettings, Provider, Schema, load_schema, validate,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "schemacraft")]
#[command(version, about = "Generate entity, mapping and API code from a database schema")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate source files from a DDL script or JSON schema
    Generate {
        /// Schema input (`.json` or a SQL DDL script)
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "generated")]
        output: PathBuf,

        /// Settings file (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// SQL dialect of the input: sqlserver, postgresql, mysql, sqlite, oracle
        #[arg(long, value_parser = parse_provider)]
        provider: Option<Provider>,

        /// Output target: poco, code-first
        #[arg(long, value_parser = parse_target)]
        target: Option<CodeTarget>,

        /// Also generate the API layer
        #[arg(long)]
        api: bool,

        /// Also generate views
        #[arg(long)]
        views: bool,
    },
    /// Check a schema against the naming conventions
    Validate {
        /// Schema input (`.json` or a SQL DDL script)
        input: PathBuf,

        /// Settings file (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long, value_parser = parse_provider)]
        provider: Option<Provider>,
    },
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    Provider::from_str(s).ok_or_else(|| format!("unknown provider: {s}"))
}

fn parse_target(s: &str) -> Result<CodeTarget, String> {
    CodeTarget::from_str(s).ok_or_else(|| format!("unknown target: {s}"))
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Command::Generate {
            input,
            output,
            config,
            provider,
            target,
            api,
            views,
        } => {
            let overrides = Overrides { target, api, views };
            generate(&input, &output, config.as_deref(), provider, overrides)
        }
        Command::Validate {
            input,
            config,
            provider,
        } => run_validate(&input, config.as_deref(), provider),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("schemacraft=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Overrides {
    target: Option<CodeTarget>,
    api: bool,
    views: bool,
}

fn read_schema(path: &Path, provider: Option<Provider>) -> Result<Schema, String> {
    let input = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    load_schema(&input, provider).map_err(|e| format!("{}: {e}", path.display()))
}

fn read_settings(config: Option<&Path>) -> Result<GeneratorSettings, String> {
    let Some(path) = config else {
        return Ok(GeneratorSettings::default());
    };
    let source =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    GeneratorSettings::from_toml(&source).map_err(|e| format!("{}: {e}", path.display()))
}

fn load_settings(config: Option<&Path>, overrides: Overrides) -> Result<GeneratorSettings, String> {
    let mut settings = read_settings(config)?;
    if let Some(target) = overrides.target {
        settings.target = target;
    }
    settings.api_layer |= overrides.api;
    settings.include_views |= overrides.views;
    Ok(settings)
}

fn generate(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    provider: Option<Provider>,
    overrides: Overrides,
) -> Result<(), String> {
    let schema = read_schema(input, provider)?;
    let settings = load_settings(config, overrides)?;
    let generation = Generator::new(&schema, settings)
        .and_then(|generator| generator.generate())
        .map_err(|e| e.to_string())?;

    for file in &generation.files {
        let path = output.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        fs::write(&path, &file.contents)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        debug!(path = %path.display(), "wrote file");
    }
    info!(
        files = generation.files.len(),
        diagnostics = generation.diagnostics.len(),
        output = %output.display(),
        "generation finished"
    );
    Ok(())
}

fn run_validate(
    input: &Path,
    config: Option<&Path>,
    provider: Option<Provider>,
) -> Result<(), String> {
    let schema = read_schema(input, provider)?;
    let settings = read_settings(config)?;
    let report = validate(&schema, &settings).map_err(|e| e.to_string())?;
    print!("{report}");
    if report.has_critical() {
        process::exit(2);
    }
    Ok(())
}
