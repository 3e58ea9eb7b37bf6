use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::dtos::customer::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::customer::CustomerRow;
use crate::state::AppState;

pub async fn list_customers(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = sqlx::query_as::<_, CustomerRow>(
        r#"SELECT id, name, customer_type, created_at
           FROM customers
           WHERE created_by = $1
           ORDER BY name ASC"#,
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(customers.into_iter().map(to_response).collect()))
}

pub async fn create_customer(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }

    let customer = sqlx::query_as::<_, CustomerRow>(
        r#"INSERT INTO customers (name, customer_type, created_by)
           VALUES ($1, $2, $3)
           RETURNING id, name, customer_type, created_at"#,
    )
    .bind(req.name.trim())
    .bind(req.customer_type.as_str())
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(customer))))
}

pub async fn update_customer(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("Customer name cannot be empty"));
        }
    }

    let customer = sqlx::query_as::<_, CustomerRow>(
        r#"UPDATE customers SET
               name = COALESCE($1, name),
               customer_type = COALESCE($2, customer_type)
           WHERE id = $3 AND created_by = $4
           RETURNING id, name, customer_type, created_at"#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.customer_type.map(|t| t.as_str()))
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("No customer with that id"))?;

    Ok(Json(to_response(customer)))
}

pub async fn delete_customer(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    // Deleting a customer that ledger rows still point at would silently
    // break rankings and joined reads, so it is refused outright.
    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movements WHERE customer_id = $1)")
            .bind(id)
            .fetch_one(&db_pool)
            .await?;

    if referenced {
        return Err(AppError::conflict(
            "Cannot delete a customer with existing movements",
        ));
    }

    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("No customer with that id"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn to_response(row: CustomerRow) -> CustomerResponse {
    CustomerResponse {
        id: row.id,
        name: row.name,
        customer_type: row.customer_type,
        created_at: row.created_at,
    }
}
