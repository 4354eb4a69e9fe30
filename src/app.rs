use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, TokenAuthority};
use crate::config::{AppConfig, MAX_JWT_EXPIRY_HOURS};
use crate::database::Gateway;
use crate::handlers::{protected, public};
use crate::metrics::MetricsSink;
use crate::middleware::{http_logger, jwt_auth_middleware, request_tracker};

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Gateway>,
    pub tokens: Arc<TokenAuthority>,
    pub metrics: Arc<dyn MetricsSink>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the token authority to the same gateway the handlers use.
    pub fn new<G: Gateway + 'static>(
        gateway: Arc<G>,
        metrics: Arc<dyn MetricsSink>,
        config: AppConfig,
    ) -> Result<Self, AuthError> {
        let hours = config.security.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS);
        let ttl = chrono::Duration::hours(hours as i64);
        let tokens = TokenAuthority::new(gateway.clone(), gateway.clone(), &config.security.jwt_secret, ttl)?;

        Ok(Self {
            db: gateway,
            tokens: Arc::new(tokens),
            metrics,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(franchise_routes())
        .merge(order_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), request_tracker));

    if state.config.api.enable_request_logging {
        app = app.layer(from_fn_with_state(state.clone(), http_logger));
    }

    app.layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth", post(public::auth::register_post).put(public::auth::login_put))
        .route("/api/order/menu", get(public::menu::menu_get))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth", delete(auth::logout_delete))
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/auth/:id", put(auth::user_put))
}

fn franchise_routes() -> Router<AppState> {
    use protected::franchise;

    Router::new()
        .route(
            "/api/franchise",
            get(franchise::franchise_list_get).post(franchise::franchise_post),
        )
        // the same segment is a user id for GET and a franchise id for DELETE
        .route(
            "/api/franchise/:id",
            get(franchise::user_franchises_get).delete(franchise::franchise_delete),
        )
        .route("/api/franchise/:id/store", post(franchise::store_post))
        .route("/api/franchise/:id/store/:store_id", delete(franchise::store_delete))
}

fn order_routes() -> Router<AppState> {
    use protected::order;

    Router::new()
        .route("/api/order", get(order::orders_get).post(order::order_post))
        .route("/api/order/menu", put(order::menu_put))
        .route("/api/order/menu/:id", put(order::menu_item_put))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    let headers = [AUTHORIZATION, CONTENT_TYPE];

    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "JWT Pizza Service",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "endpoints": {
                "auth": "/api/auth[/me|/:user_id]",
                "menu": "/api/order/menu (public read)",
                "order": "/api/order (protected)",
                "franchise": "/api/franchise[/:id[/store[/:store_id]]] (protected)",
                "health": "/health",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "timestamp": now
                })),
            )
        }
    }
}
