use crate::api::handlers::auth;
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
};
use secrecy::SecretString;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the served application: documented routes, the request gate and
/// the shared request layers.
pub fn app(auth_state: Arc<auth::AuthState>, pool: PgPool) -> Router {
    let (router, _openapi) = router().split_for_parts();
    router
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth::request_gate,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if the signing key is unusable, the database is unreachable or
/// the listener cannot be bound.
pub async fn new(
    port: u16,
    dsn: String,
    jwt_secret: SecretString,
    auth_config: auth::AuthConfig,
) -> Result<()> {
    // No key, no server: this runs before anything is bound.
    let codec = auth::TokenCodec::new(&jwt_secret).context("Invalid session signing key")?;

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let credentials = Arc::new(auth::PgCredentialStore::new(pool.clone()));
    let auth_state = Arc::new(auth::AuthState::new(auth_config, codec, credentials));

    spawn_limiter_sweep(auth_state.clone());

    let app = app(auth_state, pool);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {err}");
        }
        info!("Gracefully shutdown");
    })
    .await?;

    Ok(())
}

/// Periodically drop expired login attempt records so the map stays bounded.
fn spawn_limiter_sweep(auth_state: Arc<auth::AuthState>) {
    let period = auth_state.limiter().window().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            auth_state.limiter().sweep_expired();
            debug!(
                tracked = auth_state.limiter().tracked_clients(),
                "Login limiter sweep finished"
            );
        }
    });
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
