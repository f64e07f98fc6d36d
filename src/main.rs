//! Batch runner: transforms every participant file of a folder into a transaction bundle.
//!
//! Settings come from the environment (optionally via `.env`):
//! - `CDF_COHORT` (required): `lifelines` or `rotterdam`
//! - `CDF_INPUT_DIR`: participant JSON files, default `input`
//! - `CDF_OUTPUT_DIR`: bundle files, default `output`
//! - `CDF_NAMESPACE`: UUID namespace for bundle ids
//! - `CDF_CODE_TABLES_DIR`: external code tables replacing the embedded ones

use anyhow::Context;
use cdf_core::config::{namespace_from_env_value, resolve_code_tables_dir};
use cdf_core::constants::BUNDLE_FILE_SUFFIX;
use cdf_core::{Cohort, CoreConfig, RawInput, Transformer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cdf=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cohort = Cohort::parse(&std::env::var("CDF_COHORT").context("CDF_COHORT must be set")?)?;
    let input_dir = PathBuf::from(std::env::var("CDF_INPUT_DIR").unwrap_or_else(|_| "input".into()));
    let output_dir =
        PathBuf::from(std::env::var("CDF_OUTPUT_DIR").unwrap_or_else(|_| "output".into()));
    let namespace = namespace_from_env_value(std::env::var("CDF_NAMESPACE").ok())?;
    let code_tables_dir =
        resolve_code_tables_dir(std::env::var("CDF_CODE_TABLES_DIR").ok().map(PathBuf::from))?;

    let cfg = Arc::new(CoreConfig::new(cohort, namespace, code_tables_dir)?);
    match cfg.code_tables_dir() {
        Some(dir) => tracing::info!("++ Using code tables from {}", dir.display()),
        None => tracing::info!("++ Using embedded code tables"),
    }
    let transformer = Transformer::new(cfg)?;

    tracing::info!("++ Transforming {} participants from {}", cohort, input_dir.display());

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let files = participant_files(&input_dir)?;
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for path in &files {
        match transform_file(&transformer, path, &output_dir) {
            Ok(written) => {
                tracing::debug!(file = %written.display(), "bundle written");
                succeeded += 1;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), "participant failed: {e:#}");
                failed += 1;
            }
        }
    }

    tracing::info!(succeeded, failed, "batch finished");
    println!("{succeeded} participant(s) transformed, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} of {} participant(s) failed", files.len());
    }
    Ok(())
}

/// `*.json` files of `dir`, sorted by path.
fn participant_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `<output_dir>/<stem>.bundle.json`
fn bundle_path(input: &Path, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("{} has no usable file name", input.display()))?;
    Ok(output_dir.join(format!("{stem}.{BUNDLE_FILE_SUFFIX}")))
}

fn transform_file(
    transformer: &Transformer,
    input: &Path,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let raw = RawInput::load(input)?;
    let bundle = transformer.transform_to_bundle(raw)?;
    let path = bundle_path(input, output_dir)?;
    fs::write(&path, serde_json::to_string_pretty(&bundle)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
