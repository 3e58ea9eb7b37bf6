use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use crate::handlers::movement::{create_movement, delete_movement, list_movements, update_movement};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(list_movements).post(create_movement))
        .route("/movements/{id}", put(update_movement))
        .route("/movements/{id}", delete(delete_movement))
        .route_layer(middleware::from_fn(require_auth))
}
