/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Secret used to sign and verify the JWTs handed out on sign-in
pub const JWT_SECRET: &str = "JWT_SECRET";

/// OAuth app client ID for GitHub sign-in. GitHub sign-in is disabled when unset.
pub const GITHUB_CLIENT_ID: &str = "GITHUB_CLIENT_ID";
/// OAuth app client secret for GitHub sign-in
pub const GITHUB_CLIENT_SECRET: &str = "GITHUB_CLIENT_SECRET";
/// Redirect URL registered with the GitHub OAuth app, pointing at /auth/github/callback
pub const GITHUB_REDIRECT_URL: &str = "GITHUB_REDIRECT_URL";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
