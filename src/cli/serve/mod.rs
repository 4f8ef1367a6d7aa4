//! HTTP host for the router.
//!
//! Every request goes to the [`Router`] first. Unmatched requests fall
//! through to the public directory, then to a 404.

mod lifecycle;
mod path;
mod response;

use std::sync::Arc;

use anyhow::{Context, Result};
use sluice::{PipelineConfig, Router, debug, log};
use tiny_http::{Method, Request, Server};

/// Build the router, bind and serve until Ctrl+C.
pub fn serve(config: PipelineConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    lifecycle::register_shutdown(Arc::clone(&server))?;

    let workers = config.serve.workers;
    let router = Arc::new(Router::new(config).context("failed to start router")?);
    let registry = router.snapshot();
    log!(
        "serve";
        "http://{} ({} assets from {})",
        addr,
        registry.servable_paths().len(),
        router.config().root.display()
    );

    run_request_loop(&server, &router, workers)
}

fn run_request_loop(server: &Server, router: &Arc<Router>, workers: usize) -> Result<()> {
    // Builds block their worker, so requests are served from a pool
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("failed to create request pool")?;

    for request in server.incoming_requests() {
        let router = Arc::clone(router);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &router) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, router: &Router) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_unavailable(request);
    }
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let url = request.url().to_string();
    let if_modified_since = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("If-Modified-Since"))
        .map(|h| h.value.to_string());

    match router.call(&url, if_modified_since.as_deref()) {
        Ok(Some(asset)) => {
            debug!("serve"; "{} {} => {}", asset.status, url, asset.artifact.display());
            if router.take_cache_busted() {
                log!("cache"; "rebuilt {}", url);
            }
            response::respond_asset(request, asset)
        }
        Ok(None) => match path::resolve_path(&url, &router.config().serve.public) {
            Some(file) => response::respond_file(request, &file),
            None => response::respond_not_found(request),
        },
        Err(err) => {
            log!("error"; "{}: {}", url, err);
            response::respond_error(request, &err)
        }
    }
}
