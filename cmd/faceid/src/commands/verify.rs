//! `faceid verify`: identify query embeddings.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use faceid_sightlog::{SightLog, SightRecord};
use faceid_verify::{Verdict, VerificationService};
use tracing::info;

use super::{load_request, open_gallery, output_result, print_verbose, resolve_config};
use crate::Cli;

/// Prints one label per query, `unknown` when nothing passes the threshold.
#[derive(Args)]
pub struct VerifyCommand {
    /// Gallery directory
    #[arg(long)]
    gallery: PathBuf,

    /// Query file (YAML or JSON list of vectors)
    #[arg(short = 'f', long = "file")]
    file: String,

    /// Candidates fetched per query (overrides config file)
    #[arg(long)]
    top_k: Option<usize>,

    /// Maximum Euclidean distance accepted (overrides config file)
    #[arg(long)]
    threshold: Option<f32>,

    /// Append sighting records to this JSONL file
    #[arg(long)]
    log: Option<PathBuf>,
}

impl VerifyCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = resolve_config(cli, &self.gallery, None, None)?;
        if let Some(k) = self.top_k {
            cfg.top_k = k;
        }
        if let Some(t) = self.threshold {
            cfg.threshold = t;
        }
        cfg.validate()?;

        let queries: Vec<Vec<f32>> = load_request(&self.file)?;
        let gallery = Arc::new(open_gallery(&self.gallery, &cfg)?);
        print_verbose(
            cli,
            &format!(
                "verifying {} queries against {} entries (top_k {}, threshold {})",
                queries.len(),
                gallery.size(),
                cfg.top_k,
                cfg.threshold
            ),
        );

        let svc = VerificationService::from_config(gallery, &cfg);
        let verdicts = svc.verify_detailed(&queries, cfg.top_k, cfg.threshold)?;

        if let Some(path) = &self.log {
            let log = SightLog::new(path);
            log.extend(verdicts.iter().map(sighting))?;
            let n = log.flush()?;
            info!("logged {} sightings to {}", n, path.display());
        }

        if cli.json {
            return output_result(&verdicts, true);
        }
        for v in &verdicts {
            println!("{}", v.decision);
        }
        Ok(())
    }
}

fn sighting(v: &Verdict) -> SightRecord {
    SightRecord::new(v.decision.to_string(), v.index_id, v.distance)
}
