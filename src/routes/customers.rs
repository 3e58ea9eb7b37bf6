use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use crate::handlers::customer::{create_customer, delete_customer, list_customers, update_customer};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", put(update_customer))
        .route("/customers/{id}", delete(delete_customer))
        .route_layer(middleware::from_fn(require_auth))
}
