//! Cache warm-up: build every pipe bundle ahead of the first request.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use sluice::asset::AssetType;
use sluice::logger::ProgressLine;
use sluice::{PipelineConfig, Router, debug, log};

/// One bundle to build.
struct Job {
    ty: AssetType,
    target: String,
}

/// Resolve every bundle of every type; fails if any bundle fails.
pub fn build_all(config: PipelineConfig) -> Result<Vec<PathBuf>> {
    let started = Instant::now();
    let router = Router::new(config).context("failed to start router")?;
    let registry = router.snapshot();

    let jobs: Vec<Job> = AssetType::ALL
        .into_iter()
        .flat_map(|ty| {
            registry.pipes(ty).map(move |pipe| Job {
                ty,
                target: pipe.bundle_path(),
            })
        })
        .collect();

    if jobs.is_empty() {
        log!("build"; "no pipes configured");
        return Ok(Vec::new());
    }

    let count = |ty: AssetType| jobs.iter().filter(|job| job.ty == ty).count();
    let progress = ProgressLine::new(&[
        ("css", count(AssetType::Style)),
        ("js", count(AssetType::Script)),
    ]);

    let results: Vec<(String, Result<PathBuf>)> = jobs
        .par_iter()
        .map(|job| {
            let result = router
                .resolve(&job.target)
                .map_err(anyhow::Error::from)
                .and_then(|artifact| artifact.ok_or_else(|| anyhow!("no pipe for {}", job.target)));
            progress.inc(job.ty.extension());
            (job.target.clone(), result)
        })
        .collect();
    progress.finish();

    let mut artifacts = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (target, result) in results {
        match result {
            Ok(artifact) => {
                debug!("build"; "{} => {}", target, artifact.display());
                artifacts.push(artifact);
            }
            Err(err) => {
                log!("error"; "{}: {:#}", target, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} bundles failed", failed, artifacts.len() + failed));
    }

    for artifact in &artifacts {
        println!("{}", artifact.display());
    }
    log!(
        "build"; "{} bundles in {:.2?} ({})",
        artifacts.len(),
        started.elapsed(),
        router.pipeline().cache().dir().display()
    );
    Ok(artifacts)
}
