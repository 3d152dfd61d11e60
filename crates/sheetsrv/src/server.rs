use std::io;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sheets_http::client::HttpClient;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::AppState;
use crate::handlers::debug::{debug_sheets, health};
use crate::handlers::transactions::{delete_transaction, edit_transaction};

/// Build the router with all `/api` routes.
pub fn build_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: HttpClient,
{
    let api = Router::new()
        .route("/delete-transaction", post(delete_transaction::<C>))
        .route("/edit-transaction", post(edit_transaction::<C>))
        .route("/debug-sheets", get(debug_sheets::<C>))
        .route("/health", get(health::<C>));

    Router::new()
        .nest("/api", api)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cors policy accepting any origin with credentials.
///
/// A literal `*` origin can't be combined with credentials, so the request's
/// origin, method and headers are mirrored back instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Serve the router until a shutdown signal is received.
pub async fn serve(listener: TcpListener, router: Router) -> io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(%e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(%e, "failed to listen for sigterm");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down");
}
