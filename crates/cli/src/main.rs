use clap::{Parser, Subcommand};
use cdf_core::config::{default_namespace, resolve_code_tables_dir};
use cdf_core::{Cohort, CoreConfig, RawInput, Transformer};
use fhir::{CodeCollection, CodeSystem};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cdf")]
#[command(about = "Cohort data to FHIR derivation CLI")]
struct Cli {
    /// Directory of external code tables replacing the embedded ones
    #[arg(long, global = true)]
    code_tables_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the documents of one participant file
    Derive {
        /// Participant JSON file
        file: PathBuf,
        /// Cohort the participant belongs to (lifelines or rotterdam)
        #[arg(long, value_parser = parse_cohort)]
        cohort: Cohort,
        /// UUID namespace for bundle ids
        #[arg(long)]
        namespace: Option<Uuid>,
        /// Print a transaction bundle instead of the bare documents
        #[arg(long)]
        bundle: bool,
    },
    /// Look up a code
    Code {
        /// Code system (snomed, loinc, ucum, manchet, fhirv3)
        #[arg(value_parser = parse_code_system)]
        system: CodeSystem,
        /// Code id within the system
        id: String,
    },
    /// List the default document targets of a cohort
    Targets {
        #[arg(long, value_parser = parse_cohort)]
        cohort: Cohort,
    },
}

fn parse_cohort(name: &str) -> Result<Cohort, String> {
    Cohort::parse(name).map_err(|e| e.to_string())
}

fn parse_code_system(name: &str) -> Result<CodeSystem, String> {
    CodeSystem::parse(name).ok_or_else(|| format!("unknown code system '{name}'"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cdf=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code_tables_dir = resolve_code_tables_dir(cli.code_tables_dir)?;

    match cli.command {
        Some(Commands::Derive {
            file,
            cohort,
            namespace,
            bundle,
        }) => {
            let cfg = CoreConfig::new(
                cohort,
                namespace.unwrap_or_else(default_namespace),
                code_tables_dir,
            )?;
            let transformer = Transformer::new(Arc::new(cfg))?;
            let raw = RawInput::load(&file)?;
            let output = if bundle {
                transformer.transform_to_bundle(raw)?
            } else {
                let documents = transformer.transform(raw)?;
                serde_json::to_value(documents)?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::Code { system, id }) => {
            let codes = match &code_tables_dir {
                Some(dir) => CodeCollection::from_dir(dir)?,
                None => CodeCollection::embedded()?,
            };
            let code = codes.get(system, &id)?;
            println!("{}", serde_json::to_string_pretty(code)?);
        }
        Some(Commands::Targets { cohort }) => {
            for target in cohort.targets() {
                println!("{}", target.name());
            }
        }
        None => {
            println!("No command given. Run with --help for usage.");
        }
    }

    Ok(())
}
