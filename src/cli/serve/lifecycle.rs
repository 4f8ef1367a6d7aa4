//! Server lifecycle: binding and graceful shutdown.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Result, anyhow};
use sluice::log;
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Set once Ctrl+C has been received.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Server to unblock on Ctrl+C.
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Bind to `interface:base_port`, trying the next ports when taken.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(String::new, |err| err.to_string())
    ))
}

/// Install the Ctrl+C handler for `server`.
///
/// The handler flags shutdown and unblocks the request loop; requests
/// already accepted are answered with 503.
pub fn register_shutdown(server: Arc<Server>) -> Result<()> {
    let _ = SERVER.set(server);
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        if let Some(server) = SERVER.get() {
            log!("serve"; "shutting down...");
            server.unblock();
        }
    })
    .map_err(|err| anyhow!("failed to set Ctrl+C handler: {}", err))
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
