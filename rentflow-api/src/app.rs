/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use rentflow_api::{app::AppState, config::Config};
/// use rentflow_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = rentflow_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rentflow_shared::auth::middleware::authenticate;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                        # Banner (public)
/// ├── GET  /health                  # Health check (public)
/// ├── /auth/
/// │   ├── POST /signup              # public
/// │   └── POST /signin              # public
/// ├── /vehicles/
/// │   ├── GET    /                  # public
/// │   ├── GET    /:id               # public
/// │   ├── POST   /                  # admin
/// │   ├── PUT    /:id               # admin
/// │   └── DELETE /:id               # admin
/// ├── /users/
/// │   ├── GET    /                  # admin
/// │   ├── PUT    /:id               # self or admin
/// │   └── DELETE /:id               # admin
/// └── /bookings/
///     ├── POST /                    # authenticated
///     ├── GET  /                    # authenticated
///     ├── PUT  /:id/cancel          # owner
///     └── PUT  /:id/return          # admin
/// ```
///
/// Role checks happen in the handlers; the bearer token layer only
/// establishes who the caller is.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request timeout (tower-http TimeoutLayer, 408 rendered as `ApiError`)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/signin", post(routes::auth::signin))
        .route("/vehicles", get(routes::vehicles::list_vehicles))
        .route("/vehicles/:id", get(routes::vehicles::get_vehicle));

    let protected_routes = Router::new()
        .route("/vehicles", post(routes::vehicles::create_vehicle))
        .route(
            "/vehicles/:id",
            put(routes::vehicles::update_vehicle).delete(routes::vehicles::delete_vehicle),
        )
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/:id",
            put(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route(
            "/bookings",
            post(routes::bookings::create_booking).get(routes::bookings::list_bookings),
        )
        .route("/bookings/:id/cancel", put(routes::bookings::cancel_booking))
        .route("/bookings/:id/return", put(routes::bookings::return_booking))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(Duration::from_secs(3600))
    };

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    with_request_timeout(router, state.config.request_timeout()).with_state(state)
}

/// Bounds every request by `timeout`, answering 408 in the error envelope
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(timeout_envelope))
}

/// TimeoutLayer replies with a bare 408; give it a JSON body
async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!("Request timed out");

    ApiError::Timeout("Request timed out".to_string()).into_response()
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects the caller's
/// [`AuthContext`](rentflow_shared::auth::middleware::AuthContext) into the
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(
        user_id = auth_context.user_id,
        role = auth_context.role.as_str(),
        "Request authenticated"
    );

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

async fn route_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": "Route not found",
            "path": uri.path(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_slow_request_gets_timeout_envelope() {
        let router: Router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_request_timeout(router, Duration::from_millis(20));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let json = read_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Request timed out");
    }

    #[tokio::test]
    async fn test_fast_request_passes_through() {
        let router: Router = Router::new().route("/fast", get(|| async { "done" }));
        let app = with_request_timeout(router, Duration::from_secs(5));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
