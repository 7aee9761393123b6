use crate::api::session::TokenKeys;
use crate::{AuthConfig, SharedData, app_env, persistence};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use axum::response::Response;
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::env;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tower::ServiceExt;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    /// Drops databases left behind by previous test runs
    async fn clear_old_dbs(conn: &mut PgConnection) {
        let test_dbs = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'test_db%'",
        )
        .fetch_all(&mut *conn)
        .await;
        let test_dbs = match test_dbs {
            Ok(results) => results.into_iter().map(|row| row.get::<String, _>(0)),
            Err(error) => {
                println!(
                    "Warning: failed to look up old test databases. You may need to delete them manually. Error: {error}"
                );
                return;
            }
        };

        for db in test_dbs {
            let result = sqlx::query(format!("DROP DATABASE {}", db).as_str())
                .execute(&mut *conn)
                .await;
            if result.is_err() {
                println!(
                    "Warning: failed to drop old test database {}, you may need to do it manually.",
                    db
                );
            }
        }
    }

    async fn create(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        let mut rng = thread_rng();
        let db_id: u32 = rng.gen_range(10_000..99_999);
        let db_name = format!("test_db_{}", db_id);

        sqlx::query(format!("CREATE DATABASE {}", db_name).as_str())
            .execute(conn)
            .await?;

        Ok(Self { db_name })
    }
}

/// Creates a fresh database for a test, applies the app's migrations to it, and hands
/// the resulting connection pool to the test.
///
/// Expects that the TEST_DB_URL environment variable is populated
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL).expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );
        let test_db = {
            let mut initial_conn = PgConnection::connect(&pg_connection_base_url)
                .await
                .expect("Test failure - could not create initial connection to provision database.");
            TestDatabase::clear_old_dbs(&mut initial_conn).await;
            let test_db = match TestDatabase::create(&mut initial_conn).await {
                Ok(tdb) => tdb,
                Err(db_err) => panic!("Failed to start test database: {}", db_err),
            };
            initial_conn.close().await.ok();

            test_db
        };

        let sqlx_pool =
            PgPool::connect(format!("{}/{}", pg_connection_base_url, test_db.db_name).as_str())
                .await
                .expect("Could not connect to the provisioned test database");
        sqlx::migrate!()
            .run(&sqlx_pool)
            .await
            .expect("Could not apply migrations to the test database");

        test_fn(sqlx_pool).await;
    });
}

/// Builds the full application router around the given database pool, with GitHub
/// sign-in disabled
pub fn test_router(db: PgPool) -> Router {
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
        auth: AuthConfig {
            keys: TokenKeys::from_secret(b"integration test signing key"),
            github: None,
        },
    });

    crate::application_router(shared_data)
}

/// Fires a single request at the app, optionally carrying a bearer token and a JSON body
pub async fn send_request(
    router: Router,
    method: Method,
    uri: &str,
    bearer_token: Option<&str>,
    json_body: Option<serde_json::Value>,
) -> Response {
    let mut request_builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer_token {
        request_builder =
            request_builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match json_body {
        Some(body_content) => request_builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body_content.to_string())),
        None => request_builder.body(Body::empty()),
    }
    .expect("Could not build test request");

    router
        .oneshot(request)
        .await
        .expect("The request failed outright")
}
