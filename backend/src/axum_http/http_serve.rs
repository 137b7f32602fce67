use crate::{
    auth::AccessControl,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{revocations::RevocationPostgres, users::UserPostgres},
    },
    payments::stripe_client::StripeClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let access_control = Arc::new(AccessControl::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
        Arc::new(RevocationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
    ));

    let stripe_client = match config.stripe.as_ref() {
        Some(stripe) => Some(Arc::new(StripeClient::new(
            stripe.secret_key.clone(),
            stripe.webhook_secret.clone(),
            &config.app.base_url,
        ))),
        None => {
            warn!("http_serve: Stripe secrets not set, billing endpoints will be unavailable");
            None
        }
    };

    let api = Router::new()
        .nest(
            "/auth",
            routers::auth::routes(Arc::clone(&db_pool), Arc::clone(&access_control)),
        )
        .nest("/public", routers::public::routes(Arc::clone(&db_pool)))
        .nest("/protected", routers::protected::routes(Arc::clone(&db_pool)))
        .nest("/trainers", routers::trainers::routes(Arc::clone(&db_pool)))
        .nest(
            "/billing",
            routers::billing::routes(Arc::clone(&db_pool), stripe_client),
        )
        .nest("/admin", routers::admin_classes::routes(Arc::clone(&db_pool)))
        .route("/healthz", get(default_routers::health_check));

    let app = Router::new()
        .nest("/api", api)
        .route("/healthz", get(default_routers::health_check))
        .fallback(default_routers::not_found)
        .layer(Extension(access_control))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(cors_layer(config.app.cors_allowed_origin.as_deref())?)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let layer = match allowed_origin {
        Some(origin) => layer.allow_origin(AllowOrigin::exact(origin.parse::<HeaderValue>()?)),
        None => layer.allow_origin(Any),
    };

    Ok(layer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(?err, "http_serve: failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(?err, "http_serve: failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_configured_origin() {
        assert!(cors_layer(Some("https://gym.example.com")).is_ok());
        assert!(cors_layer(None).is_ok());
    }

    #[test]
    fn cors_rejects_unparseable_origin() {
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
