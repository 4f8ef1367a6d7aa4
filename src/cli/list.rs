//! Asset listing for templates and scripts.

use anyhow::{Context, Result};
use sluice::asset::AssetType;
use sluice::{PipelineConfig, Router};

use super::ListArgs;

/// Print servable paths with cache busters, or the registry as JSON.
pub fn run_list(args: &ListArgs, config: PipelineConfig) -> Result<()> {
    let router = Router::new(config).context("failed to start router")?;
    for line in listing(args, &router)? {
        println!("{line}");
    }
    Ok(())
}

fn listing(args: &ListArgs, router: &Router) -> Result<Vec<String>> {
    if args.json {
        let json = serde_json::to_string_pretty(&*router.snapshot())?;
        return Ok(vec![json]);
    }

    let types: Vec<AssetType> = match args.ty {
        Some(ty) => vec![ty],
        None => AssetType::ALL.to_vec(),
    };

    let mut lines = Vec::new();
    for ty in types {
        let pipes: Vec<String> = if args.pipes.is_empty() {
            router.config().pipes(ty).iter().map(|(name, _)| name.to_string()).collect()
        } else {
            args.pipes.clone()
        };
        for path in router.assets_for(&pipes, ty) {
            let buster = router.cache_buster(&path);
            lines.push(format!("/{path}{buster}"));
        }
    }
    Ok(lines)
}
