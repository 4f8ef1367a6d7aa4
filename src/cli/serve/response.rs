//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use sluice::AssetResponse;
use sluice::utils::mime::types::PLAIN;
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a resolved asset (200 or 304).
pub fn respond_asset(request: Request, asset: AssetResponse) -> Result<()> {
    let mut headers = Vec::with_capacity(asset.headers.len());
    for (name, value) in &asset.headers {
        headers.push(make_header(name, value)?);
    }

    let length = asset.body.len();
    let response = Response::new(
        StatusCode(asset.status),
        headers,
        asset.body.as_slice(),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Respond with a static file from the public directory.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = sluice::utils::mime::from_path(path);
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, PLAIN, b"405 Method Not Allowed".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with a pipeline failure (500).
pub fn respond_error(request: Request, error: &sluice::PipelineError) -> Result<()> {
    let body = format!("500 Internal Server Error\n\n{error}\n");
    send_body(request, 500, PLAIN, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
