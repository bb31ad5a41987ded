//! Helpers shared by the subcommands.

use std::path::Path;

use anyhow::{Context, bail};
use faceid_gallery::Gallery;
use faceid_verify::ServiceConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Cli;

/// Loads a request file, YAML unless the extension is `.json`.
pub fn load_request<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content).with_context(|| format!("parse {path}"))?,
        _ => serde_yaml::from_str(&content).with_context(|| format!("parse {path}"))?,
    };
    Ok(result)
}

/// Builds the service config for a gallery directory.
///
/// The dimension comes from, in order: the `--config` file, `dim`, the
/// matrix already saved in `gallery`, then `fallback_dim`. An explicit
/// `dim` that disagrees with the config file is an error.
pub fn resolve_config(
    cli: &Cli,
    gallery: &Path,
    dim: Option<usize>,
    fallback_dim: Option<usize>,
) -> anyhow::Result<ServiceConfig> {
    if let Some(path) = cli.config.as_deref() {
        let cfg = ServiceConfig::load(Path::new(path))
            .with_context(|| format!("load config {path}"))?;
        if let Some(d) = dim {
            if d != cfg.dim {
                bail!("--dim {} conflicts with dim {} in {}", d, cfg.dim, path);
            }
        }
        return Ok(cfg);
    }

    let stored = Gallery::stored_dim(gallery)
        .with_context(|| format!("read gallery header in {}", gallery.display()))?;
    let Some(dim) = dim.or(stored).or(fallback_dim) else {
        bail!(
            "gallery dimension unknown for {}: pass --dim or --config",
            gallery.display()
        );
    };

    let cfg = ServiceConfig::new(dim);
    cfg.validate()?;
    Ok(cfg)
}

/// Opens an existing gallery.
pub fn open_gallery(dir: &Path, cfg: &ServiceConfig) -> anyhow::Result<Gallery> {
    Gallery::open(dir, cfg.gallery_config())
        .with_context(|| format!("open gallery {}", dir.display()))
}

/// Prints a value as pretty JSON or YAML.
pub fn output_result<T: Serialize>(value: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(value)?
    } else {
        serde_yaml::to_string(value)?
    };
    println!("{}", output.trim_end());
    Ok(())
}

pub fn print_verbose(cli: &Cli, message: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", message);
    }
}
