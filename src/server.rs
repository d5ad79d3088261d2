use crate::handlers::{route, AppState};
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

/// Bind `addr` and serve until `shutdown` resolves.
///
/// Returns the bound address (useful with port 0) and the server future.
pub fn bind(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = Result<(), hyper::Error>>), hyper::Error> {
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req| route(req, state.clone())))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();

    Ok((local_addr, server.with_graceful_shutdown(shutdown)))
}

/// Bind on `addr` and run the server on a background task.
pub fn spawn(addr: SocketAddr, state: AppState) -> Result<SocketAddr, hyper::Error> {
    let (local_addr, server) = bind(addr, state, std::future::pending())?;

    tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok(local_addr)
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
