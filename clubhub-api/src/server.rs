//! HTTP server lifecycle

use crate::api::build_router;
use crate::state::AppState;
use anyhow::Result;
use clubhub_core::ShutdownCoordinator;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct ClubHubServer {
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_allow_any_origin: bool,
}

impl ClubHubServer {
    pub fn new(state: Arc<AppState>, addr: SocketAddr, cors_allow_any_origin: bool) -> Self {
        Self {
            state,
            addr,
            cors_allow_any_origin,
        }
    }

    /// Serve until `shutdown` fires, then drain in-flight requests for at most its
    /// grace period, or not at all once an immediate shutdown is requested
    pub async fn run(self, shutdown: Arc<ShutdownCoordinator>) -> Result<()> {
        let router = build_router(self.state, self.cors_allow_any_origin);

        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %listener.local_addr()?, "ClubHub API listening");

        let signal = shutdown.clone();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.wait_for_shutdown().await });
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            finished = &mut server => {
                finished??;
                return Ok(());
            }
            _ = shutdown.wait_for_shutdown() => {}
        }

        let abandon = tokio::select! {
            drained = tokio::time::timeout(shutdown.timeout(), &mut server) => match drained {
                Ok(finished) => {
                    finished??;
                    false
                }
                Err(_) => {
                    warn!(grace = ?shutdown.timeout(), "Grace period elapsed with requests in flight");
                    true
                }
            },
            _ = shutdown.wait_for_immediate() => {
                warn!("Immediate shutdown requested, dropping in-flight requests");
                true
            }
        };

        if abandon {
            server.abort();
        }
        Ok(())
    }
}
