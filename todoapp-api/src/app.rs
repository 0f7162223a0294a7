//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todoapp_api::{app::{build_router, AppState}, config::Config};
//! use todoapp_shared::{db::pool::create_pool, mail::LogMailer, store::RecordStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = create_pool(config.database.clone()).await?;
//! let state = AppState::new(RecordStore::new(pool), config, Arc::new(LogMailer));
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use todoapp_shared::{
    auth::{identity::IdentityResolver, session::SessionManager},
    mail::{Email, Mailer},
    store::RecordStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub sessions: SessionManager,
    pub resolver: IdentityResolver,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(store: RecordStore, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let sessions = SessionManager::new(store.clone(), config.session.clone());
        let resolver = IdentityResolver::new(sessions.clone(), store.clone(), config.target_policy);
        Self {
            store,
            sessions,
            resolver,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Mails a verification link for `key` to `to`
    ///
    /// Delivery failures are logged; the triggering request still succeeds
    /// and the user can ask for a new key.
    pub async fn send_verification(&self, to: &str, key: &str) {
        let mail = &self.config.mail;
        let email = Email::verification(&mail.reply, to, &mail.public_base_url, key);
        if let Err(e) = self.mailer.send(email).await {
            warn!(error = %e, "Verification email not sent");
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── /health
/// └── /v1/
///     ├── /users                      POST signup
///     │   ├── /me                     GET | PUT | DELETE
///     │   └── /:id                    GET | PUT | DELETE (superuser override)
///     ├── /auth/
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   ├── GET  /me
///     │   ├── GET  /sessions
///     │   └── DELETE /sessions/others
///     ├── /verify-email/
///     │   ├── POST /resend
///     │   └── POST /:key
///     └── /todo-lists                 GET | POST
///         └── /:list_id               PUT | DELETE
///             └── /tasks              GET | POST
///                 └── /:task_id       PUT | DELETE
/// ```
///
/// Authentication is per handler through the [`Caller`](crate::extract::Caller)
/// extractor.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let user_routes = Router::new()
        .route("/", post(routes::users::signup))
        .route(
            "/me",
            get(routes::users::read)
                .put(routes::users::update)
                .delete(routes::users::delete),
        )
        .route(
            "/:id",
            get(routes::users::read)
                .put(routes::users::update)
                .delete(routes::users::delete),
        );

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::auth::me))
        .route("/sessions", get(routes::auth::sessions))
        .route(
            "/sessions/others",
            axum::routing::delete(routes::auth::close_other_sessions),
        );

    let verify_routes = Router::new()
        .route("/resend", post(routes::verify::resend))
        .route("/:key", post(routes::verify::verify));

    let list_routes = Router::new()
        .route(
            "/",
            get(routes::todo_lists::list).post(routes::todo_lists::create),
        )
        .route(
            "/:list_id",
            put(routes::todo_lists::update).delete(routes::todo_lists::delete),
        )
        .route(
            "/:list_id/tasks",
            get(routes::tasks::list).post(routes::tasks::create),
        )
        .route(
            "/:list_id/tasks/:task_id",
            put(routes::tasks::update).delete(routes::tasks::delete),
        );

    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/auth", auth_routes)
        .nest("/verify-email", verify_routes)
        .nest("/todo-lists", list_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: any origin, no credentials
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
