/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::InMemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(InMemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::jwt_auth_layer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use taskboard_shared::{
    auth::password::HashingParams,
    events::{ActivityNotifier, EventBroadcaster},
    services::{IdentityService, IdentitySettings, MembershipManager, Reporting, TaskWorkflow},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every field
/// is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    pub identity: IdentityService,

    pub members: MembershipManager,

    pub workflow: TaskWorkflow,

    pub reporting: Reporting,

    /// Durable notifications plus live fan-out
    pub notifier: ActivityNotifier,

    pub config: Arc<Config>,
}

impl AppState {
    /// Wires services over `store` with production hashing cost
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self::with_hashing(store, config, HashingParams::default())
    }

    /// Same as [`AppState::new`] with explicit Argon2id parameters
    pub fn with_hashing(store: Arc<dyn Store>, config: Config, hashing: HashingParams) -> Self {
        let identity = IdentityService::new(
            store.clone(),
            IdentitySettings {
                jwt_secret: config.jwt.secret.clone(),
                token_ttl: Duration::seconds(config.jwt.expires_seconds),
                hashing,
            },
        );
        let broadcaster = Arc::new(EventBroadcaster::new(config.stream.queue_capacity));

        Self {
            identity,
            members: MembershipManager::new(store.clone()),
            workflow: TaskWorkflow::new(store.clone()),
            reporting: Reporting::new(store.clone()),
            notifier: ActivityNotifier::new(store.clone(), broadcaster),
            store,
            config: Arc::new(config),
        }
    }

    pub fn invitation_ttl(&self) -> Duration {
        Duration::seconds(self.config.invitations.ttl_seconds)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── POST  /auth/register
///     ├── POST  /auth/login
///     ├── GET   /projects                      (authenticated below here)
///     ├── POST  /projects
///     ├── POST  /projects/:id/invite
///     ├── POST  /projects/:id/join
///     ├── GET   /projects/:id/report
///     ├── GET   /projects/:id/tasks
///     ├── POST  /projects/:id/tasks
///     ├── PATCH /tasks/:id/move
///     ├── GET   /tasks/:id/history
///     ├── GET   /notifications
///     ├── POST  /notifications/:id/read
///     └── GET   /notifications/stream          (SSE)
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/:id/invite", post(routes::projects::create_invitation))
        .route("/projects/:id/join", post(routes::projects::join_project))
        .route("/projects/:id/report", get(routes::projects::project_report))
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/:id/move", patch(routes::tasks::move_task))
        .route("/tasks/:id/history", get(routes::tasks::task_history))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route(
            "/notifications/stream",
            get(routes::notifications::stream_notifications),
        )
        .route(
            "/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
