mod handlers;
pub mod middleware;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::store::Store;
use middleware::ServerConfig;

/// Router with an open, unauthenticated configuration.
pub fn create_router(store: Store) -> Router {
    create_router_with_config(store, ServerConfig::disabled())
}

pub fn create_router_with_config(store: Store, config: ServerConfig) -> Router {
    let api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        .route("/projects/{id}/select", post(handlers::select_project))
        .route("/projects/{id}/tasks", get(handlers::list_project_tasks))
        .route("/projects/{id}/sprints", get(handlers::list_project_sprints))
        .route("/projects/{id}/board", get(handlers::project_board))
        .route("/projects/{id}/backlog", get(handlers::project_backlog))
        // Tasks
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}", get(handlers::get_task))
        .route("/tasks/{id}", put(handlers::update_task))
        .route("/tasks/{id}", delete(handlers::delete_task))
        // Sprints
        .route("/sprints", get(handlers::list_sprints))
        .route("/sprints", post(handlers::create_sprint))
        .route("/sprints/{id}", get(handlers::get_sprint))
        .route("/sprints/{id}", put(handlers::update_sprint))
        .route("/sprints/{id}", delete(handlers::delete_sprint))
        .route("/sprints/{id}/start", post(handlers::start_sprint))
        .route("/sprints/{id}/select", post(handlers::select_sprint))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users", post(handlers::create_user))
        .route("/users/{id}", get(handlers::get_user))
        .route("/users/{id}", put(handlers::update_user))
        .route("/users/{id}", delete(handlers::delete_user))
        // Selection
        .route("/selection", get(handlers::get_selection))
        // Analytics
        .route(
            "/analytics/projects/{id}/velocity",
            get(handlers::project_velocity),
        )
        .route(
            "/analytics/sprints/{id}/progress",
            get(handlers::sprint_progress),
        )
        .route(
            "/analytics/sprints/{id}/burndown",
            get(handlers::sprint_burndown),
        )
        // Bulk data
        .route("/export", get(handlers::export_data))
        .route("/import", post(handlers::import_data))
        // Sketched in the product but never built out; stable placeholders
        .route(
            "/comments",
            get(handlers::placeholder).post(handlers::placeholder),
        )
        .route(
            "/comments/{id}",
            get(handlers::placeholder)
                .put(handlers::placeholder)
                .delete(handlers::placeholder),
        )
        .route(
            "/attachments",
            get(handlers::placeholder).post(handlers::placeholder),
        )
        .route(
            "/attachments/{id}",
            get(handlers::placeholder)
                .put(handlers::placeholder)
                .delete(handlers::placeholder),
        )
        // Health
        .route("/health", get(handlers::health));

    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let mut router = Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    if let Some(limiter) = config.rate_limiter.clone() {
        router = router.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }
    if config.api_key.is_some() {
        router = router.layer(from_fn_with_state(
            config.clone(),
            middleware::auth_middleware,
        ));
    }

    router.with_state(store)
}
