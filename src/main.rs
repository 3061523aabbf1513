use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use notecode_api::config;
use notecode_api::database::DatabaseManager;
use notecode_api::handlers::protected::{files, test};
use notecode_api::middleware::{jwt_auth_middleware, resolve_user_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting NoteCode API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("🚀 NoteCode API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    DatabaseManager::close_all().await;
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router {
    use axum::middleware;
    use axum::routing::{patch, post};

    Router::new()
        .route("/api/test", get(test::get))
        .route("/api/files", post(files::create))
        .route("/api/files/user/:user_id", get(files::list_by_user))
        .route(
            "/api/files/:id",
            get(files::get).patch(files::patch).delete(files::delete),
        )
        .route("/api/files/:id/code", patch(files::patch_code))
        .route("/api/files/:id/algo", patch(files::patch_algo))
        // Gate order: bearer token verification runs first, then subject
        // resolution; either layer short-circuits with a terminal response
        .layer(middleware::from_fn(resolve_user_middleware))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "NoteCode API",
        "version": version,
        "description": "Authenticated storage for user-owned code snippets",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "test": "/api/test (protected)",
            "files": "/api/files, /api/files/:id[/code|/algo], /api/files/user/:userId (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable"
                })),
            )
        }
    }
}
