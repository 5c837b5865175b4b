//! In-memory stand-in for the MockAPI project the taskdeck client talks to.
//! Serves `/users` and `/tasks` with the same query-string semantics,
//! including the 404 answer for filtered listings with no rows.

use std::net::SocketAddr;

use tokio::net::TcpListener;

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod store;

pub use config::Config;
pub use routes::create_router;
pub use store::MockState;

/// Bind `addr` and serve in a background task, returning the bound address.
/// Binding port 0 picks a free port.
pub async fn spawn(state: MockState, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let app = create_router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("mock server stopped: {}", e);
        }
    });

    tracing::info!("Mock API listening on {}", local);
    Ok(local)
}
