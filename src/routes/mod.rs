pub mod customers;
pub mod movements;
pub mod stats;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(customers::routes())
        .merge(movements::routes())
        .merge(stats::routes())
}
