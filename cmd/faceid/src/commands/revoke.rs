//! `faceid revoke`: tombstone one entry and save.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use super::{open_gallery, resolve_config};
use crate::Cli;

#[derive(Args)]
pub struct RevokeCommand {
    /// Gallery directory
    #[arg(long)]
    gallery: PathBuf,

    /// index_id to revoke
    #[arg(long)]
    id: usize,
}

impl RevokeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = resolve_config(cli, &self.gallery, None, None)?;
        let gallery = open_gallery(&self.gallery, &cfg)?;

        let (_, record) = gallery.get(self.id)?;
        if !gallery.revoke(self.id)? {
            warn!("index_id {} ({}) already revoked", self.id, record.name);
            return Ok(());
        }
        gallery
            .save(&self.gallery)
            .with_context(|| format!("save gallery {}", self.gallery.display()))?;
        info!("revoked index_id {} ({})", self.id, record.name);

        if cli.json {
            println!("{}", serde_json::json!({ "revoked": self.id, "name": record.name }));
        } else {
            println!("revoked {} ({})", self.id, record.name);
        }
        Ok(())
    }
}
