//! `faceid info`: describe a gallery directory.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use faceid_vecstore::IndexKind;
use serde::Serialize;

use super::{open_gallery, output_result, resolve_config};
use crate::Cli;

#[derive(Args)]
pub struct InfoCommand {
    /// Gallery directory
    #[arg(long)]
    gallery: PathBuf,
}

#[derive(Serialize)]
struct GalleryInfo {
    path: String,
    dim: usize,
    size: usize,
    revoked: usize,
    /// Distinct names with at least one active entry.
    identities: usize,
    index: IndexKind,
}

impl InfoCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = resolve_config(cli, &self.gallery, None, None)?;
        let gallery = open_gallery(&self.gallery, &cfg)?;

        let view = gallery.read();
        let identities = view
            .records()
            .iter()
            .filter(|r| !r.revoked)
            .map(|r| r.name.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let revoked = view.records().iter().filter(|r| r.revoked).count();

        output_result(
            &GalleryInfo {
                path: self.gallery.display().to_string(),
                dim: view.dim(),
                size: view.size(),
                revoked,
                identities,
                index: gallery.index_kind().clone(),
            },
            cli.json,
        )
    }
}
