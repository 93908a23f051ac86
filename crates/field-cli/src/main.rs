mod store;

use clap::{Parser, Subcommand};
use field_spec::{
    Field, FieldDefinition, FieldRegistry, definition_schema, projection_schema,
    resolve_visibility,
};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable naming the datastore file when `--store` is absent.
const STORE_ENV: &str = "CARBON_FIELDS_STORE";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Field definition helper",
    long_about = "Builds fields from JSON definitions, projects them for the rendering layer and persists values to a JSON datastore file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON projection of every defined field.
    Inspect {
        /// Path to a JSON array of field definitions.
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        /// Optional datastore file to load values from (falls back to CARBON_FIELDS_STORE).
        #[arg(long, value_name = "STORE")]
        store: Option<PathBuf>,
    },
    /// Apply submitted form input and persist every field.
    Save {
        /// Path to a JSON array of field definitions.
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        /// JSON object of submitted values keyed by field name.
        #[arg(long, value_name = "INPUT")]
        input: PathBuf,
        /// Datastore file to write (falls back to CARBON_FIELDS_STORE).
        #[arg(long, value_name = "STORE")]
        store: Option<PathBuf>,
    },
    /// Print a JSON Schema for field projections or definitions.
    Schema {
        /// Emit the definition schema instead of the projection schema.
        #[arg(long)]
        definition: bool,
    },
    /// Print which fields are visible for the given sibling values.
    Visibility {
        /// Path to a JSON array of field definitions.
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        /// JSON object of values keyed by base name.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { fields, store } => run_inspect(fields, store),
        Command::Save {
            fields,
            input,
            store,
        } => run_save(fields, input, store),
        Command::Schema { definition } => run_schema(definition),
        Command::Visibility { fields, values } => run_visibility(fields, values),
    }
}

fn run_inspect(fields_path: PathBuf, store_path: Option<PathBuf>) -> CliResult<()> {
    let registry = FieldRegistry::default();
    let mut fields = build_fields(&registry, &fields_path)?;

    let store_path = resolve_store_path(store_path);
    if let Some(path) = &store_path {
        let datastore = Arc::new(store::load(path)?);
        for field in fields.iter_mut() {
            field.set_datastore(datastore.clone(), true);
        }
    }

    let projections = fields
        .iter_mut()
        .map(|field| field.to_json(store_path.is_some()))
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::to_string_pretty(&projections)?);
    Ok(())
}

fn run_save(
    fields_path: PathBuf,
    input_path: PathBuf,
    store_path: Option<PathBuf>,
) -> CliResult<()> {
    let store_path = resolve_store_path(store_path)
        .ok_or("a datastore file is required; pass --store or set CARBON_FIELDS_STORE")?;
    let registry = FieldRegistry::default();
    let mut fields = build_fields(&registry, &fields_path)?;

    let input: Value = read_json(&input_path)?;
    let input = input
        .as_object()
        .ok_or("form input must be a JSON object keyed by field name")?;

    let datastore = Arc::new(store::load(&store_path)?);
    for field in fields.iter_mut() {
        field.set_datastore(datastore.clone(), true);
        field.set_value_from_input(input);
        field.save()?;
        debug!(name = field.name(), "field saved");
    }

    store::write(&store_path, &datastore)?;
    info!(path = %store_path.display(), fields = fields.len(), "datastore written");
    println!("Saved {} field(s) to {}", fields.len(), store_path.display());
    Ok(())
}

fn run_schema(definition: bool) -> CliResult<()> {
    let schema = if definition {
        definition_schema()
    } else {
        projection_schema()
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_visibility(fields_path: PathBuf, values_path: PathBuf) -> CliResult<()> {
    let registry = FieldRegistry::default();
    let fields = build_fields(&registry, &fields_path)?;
    let values: Value = read_json(&values_path)?;
    let values = values
        .as_object()
        .ok_or("values must be a JSON object keyed by base name")?;

    let visibility = resolve_visibility(&fields, values);
    println!("{}", serde_json::to_string_pretty(&visibility)?);
    Ok(())
}

fn build_fields(registry: &FieldRegistry, path: &Path) -> CliResult<Vec<Field>> {
    let definitions: Vec<FieldDefinition> = read_json(path)?;
    Ok(registry.build_all(&definitions)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err).into())
}

fn resolve_store_path(store: Option<PathBuf>) -> Option<PathBuf> {
    store.or_else(|| {
        env::var(STORE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
}
