use axum::{middleware, routing::get, Router};

use crate::handlers::stats::{
    get_balance, get_customer_distribution, get_customer_transactions, get_monthly,
    get_purchase_series, get_sale_series, get_summary, get_top_customers,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/statistics/summary", get(get_summary))
        .route("/statistics/monthly", get(get_monthly))
        .route("/statistics/purchases", get(get_purchase_series))
        .route("/statistics/sales", get(get_sale_series))
        .route("/statistics/customers/top", get(get_top_customers))
        .route(
            "/statistics/customers/transactions",
            get(get_customer_transactions),
        )
        .route(
            "/statistics/customers/distribution",
            get(get_customer_distribution),
        )
        .route("/statistics/balance", get(get_balance))
        .route_layer(middleware::from_fn(require_auth))
}
