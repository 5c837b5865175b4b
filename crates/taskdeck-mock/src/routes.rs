use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{tasks as task_handlers, users as user_handlers};
use crate::store::MockState;

pub fn create_router(state: MockState) -> Router {
    let user_routes = Router::new()
        .route(
            "/",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route(
            "/:id",
            get(user_handlers::get_user).delete(user_handlers::delete_user),
        );

    let task_routes = Router::new()
        .route(
            "/",
            get(task_handlers::list_tasks).post(task_handlers::create_task),
        )
        .route(
            "/:id",
            put(task_handlers::update_task)
                .get(task_handlers::get_task)
                .delete(task_handlers::delete_task),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
