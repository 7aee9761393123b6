use anyhow::Context;
use axum::Router;
use axum::extract::State;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tracing::info;

mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

#[cfg(all(test, feature = "integration_test"))]
mod integration_test;

/// Session signing keys plus the optional GitHub OAuth app settings
pub struct AuthConfig {
    pub keys: api::session::TokenKeys,
    pub github: Option<api::auth::GithubConfig>,
}

/// Application state shared by every route handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub auth: AuthConfig,
}

pub type AppState = State<Arc<SharedData>>;

/// Assembles the full application router around the given shared state
fn application_router(shared_data: Arc<SharedData>) -> Router {
    let router = Router::new()
        .nest("/auth", api::auth::auth_routes())
        .nest("/users", api::user::user_routes())
        .nest("/todos", api::todo::task_routes())
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data);

    logging::attach_tracing_http(router)
}

/// Reads the GitHub OAuth app settings out of the environment. GitHub sign-in stays
/// disabled unless all three settings are present.
fn github_config_from_env() -> Option<api::auth::GithubConfig> {
    let client_id = env::var(app_env::GITHUB_CLIENT_ID).ok()?;
    let client_secret = env::var(app_env::GITHUB_CLIENT_SECRET).ok()?;
    let redirect_url = env::var(app_env::GITHUB_REDIRECT_URL).ok()?;

    Some(api::auth::GithubConfig {
        client_id,
        client_secret,
        redirect_url,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let env_filter = logging::init_env_filter();
    let otel_exporters = match (
        env::var(app_env::OTEL_SPAN_EXPORT_URL),
        env::var(app_env::OTEL_METRIC_EXPORT_URL),
    ) {
        (Ok(span_url), Ok(metric_url)) => Some(logging::init_exporters(&span_url, &metric_url)),
        _ => None,
    };
    logging::setup_logging_and_tracing(env_filter, otel_exporters);

    let db_url = env::var(app_env::DB_URL)
        .with_context(|| format!("reading {} from the environment", app_env::DB_URL))?;
    let connection_pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&db_url)
        .await
        .context("connecting to the database")?;
    sqlx::migrate!()
        .run(&connection_pool)
        .await
        .context("applying database migrations")?;

    let jwt_secret = env::var(app_env::JWT_SECRET)
        .with_context(|| format!("reading {} from the environment", app_env::JWT_SECRET))?;
    let github = github_config_from_env();
    if github.is_none() {
        info!("GitHub sign-in is disabled. Set the GitHub OAuth app settings to enable it.");
    }

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(connection_pool),
        auth: AuthConfig {
            keys: api::session::TokenKeys::from_secret(jwt_secret.as_bytes()),
            github,
        },
    });

    let router = application_router(shared_data);

    info!("Starting server.");
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .context("binding the server port")?;
    axum::serve(listener, router)
        .await
        .context("running the HTTP server")?;

    Ok(())
}
