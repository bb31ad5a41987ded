//! `faceid enroll`: append identities to a gallery directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use faceid_gallery::{Enrollment, Gallery};
use serde::Serialize;
use tracing::info;

use super::{load_request, output_result, print_verbose, resolve_config};
use crate::Cli;

/// Enrolls a list of `{name, vector, attributes}` entries.
#[derive(Args)]
pub struct EnrollCommand {
    /// Gallery directory
    #[arg(long)]
    gallery: PathBuf,

    /// Enrollment file (YAML or JSON list)
    #[arg(short = 'f', long = "file")]
    file: String,

    /// Embedding dimension, for a new gallery without --config
    #[arg(long)]
    dim: Option<usize>,
}

#[derive(Serialize)]
struct EnrollResult {
    enrolled: usize,
    index_ids: Vec<usize>,
    size: usize,
}

impl EnrollCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let entries: Vec<Enrollment> = load_request(&self.file)?;
        let first_dim = entries.first().map(|e| e.vector.len());
        let cfg = resolve_config(cli, &self.gallery, self.dim, first_dim)?;

        let gallery = Gallery::open_or_create(&self.gallery, cfg.gallery_config())
            .with_context(|| format!("open gallery {}", self.gallery.display()))?;
        print_verbose(
            cli,
            &format!("gallery {} holds {} entries", self.gallery.display(), gallery.size()),
        );

        let index_ids = gallery.enroll(&entries)?;
        gallery
            .save(&self.gallery)
            .with_context(|| format!("save gallery {}", self.gallery.display()))?;
        info!("enrolled {} identities into {}", index_ids.len(), self.gallery.display());

        output_result(
            &EnrollResult {
                enrolled: index_ids.len(),
                index_ids,
                size: gallery.size(),
            },
            cli.json,
        )
    }
}
