use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgExecutor;

use crate::dtos::movement::{MovementPayload, MovementResponse};
use crate::error::{map_invoice_constraint, AppError, FieldError};
use crate::middleware::auth::AuthContext;
use crate::models::movement::{derive_amounts, MovementRow, MovementType};
use crate::state::AppState;
use crate::validation::movement::{validate, AdjustmentInput, MovementInput, PurchaseInput, SaleInput};

const JOINED_SELECT: &str = r#"
    SELECT m.id, m.date, m.movement_type, m.invoice_number, m.customer_id,
           c.name AS customer_name, m.unit_price, m.quantity_in, m.quantity_out,
           m.stock_after, m.gross_amount, m.tax, m.total_with_tax,
           m.net_profit, m.gross_profit, m.created_at, m.updated_at
    FROM movements m
    LEFT JOIN customers c ON m.customer_id = c.id
"#;

pub async fn list_movements(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<MovementResponse>>, AppError> {
    let query = format!("{JOINED_SELECT} WHERE m.created_by = $1 ORDER BY m.date ASC, m.id ASC");
    let rows = sqlx::query_as::<_, MovementRow>(&query)
        .bind(auth.user_id)
        .fetch_all(&db_pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            MovementResponse::from_row(row)
                .ok_or_else(|| AppError::internal("Unknown movement type in storage"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

pub async fn create_movement(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<MovementPayload>,
) -> Result<(StatusCode, Json<MovementResponse>), AppError> {
    let input = validate(&payload).map_err(AppError::field_errors)?;

    check_customer_reference(&db_pool, auth.user_id, &input).await?;
    check_invoice_available(&db_pool, auth.user_id, &input, None).await?;

    // Insert and joined re-read run in one transaction; any failure after a
    // partial write rolls back the whole operation.
    let mut tx = db_pool.begin().await?;

    let id = insert_movement(&mut tx, auth.user_id, &input)
        .await
        .map_err(map_invoice_constraint)?;

    let row = fetch_joined(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::internal("Inserted movement vanished before re-read"))?;

    tx.commit().await?;

    tracing::info!(
        movement_id = id,
        movement_type = input.movement_type().as_str(),
        owner = auth.user_id,
        "Movement created"
    );

    let response = MovementResponse::from_row(row)
        .ok_or_else(|| AppError::internal("Unknown movement type in storage"))?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_movement(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<MovementPayload>,
) -> Result<Json<MovementResponse>, AppError> {
    let input = validate(&payload).map_err(AppError::field_errors)?;

    check_customer_reference(&db_pool, auth.user_id, &input).await?;
    check_invoice_available(&db_pool, auth.user_id, &input, Some(id)).await?;

    let mut tx = db_pool.begin().await?;

    let updated = replace_movement(&mut tx, auth.user_id, id, &input)
        .await
        .map_err(map_invoice_constraint)?;
    if !updated {
        return Err(AppError::not_found("No movement with that id"));
    }

    let row = fetch_joined(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::internal("Updated movement vanished before re-read"))?;

    tx.commit().await?;

    let response = MovementResponse::from_row(row)
        .ok_or_else(|| AppError::internal("Unknown movement type in storage"))?;
    Ok(Json(response))
}

pub async fn delete_movement(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    // Hard delete. Later rows keep their recorded stock_after untouched;
    // an adjustment is how operators re-anchor the level afterwards.
    let result = sqlx::query("DELETE FROM movements WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("No movement with that id"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Purchase/sale movements must reference a customer that exists for this
/// owner. Reads tolerate dangling references, writes do not.
async fn check_customer_reference(
    db_pool: &sqlx::PgPool,
    owner_id: i64,
    input: &MovementInput,
) -> Result<(), AppError> {
    let Some(customer_id) = input.customer_id() else {
        return Ok(());
    };

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND created_by = $2)",
    )
    .bind(customer_id)
    .bind(owner_id)
    .fetch_one(db_pool)
    .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::field_errors(vec![FieldError::new(
            "customer_id",
            "Customer does not exist",
        )]))
    }
}

/// Proactive uniqueness predicate. The partial unique index remains the
/// authoritative gate under concurrent submissions; both paths surface the
/// same duplicate-invoice error.
async fn check_invoice_available(
    db_pool: &sqlx::PgPool,
    owner_id: i64,
    input: &MovementInput,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let Some(invoice_number) = input.invoice_number() else {
        return Ok(());
    };

    let taken: bool = sqlx::query_scalar(
        r#"SELECT EXISTS(
               SELECT 1 FROM movements
               WHERE created_by = $1
                 AND invoice_number = $2
                 AND movement_type <> 'adjustment'
                 AND ($3::BIGINT IS NULL OR id <> $3)
           )"#,
    )
    .bind(owner_id)
    .bind(invoice_number)
    .bind(exclude_id)
    .fetch_one(db_pool)
    .await?;

    if taken {
        Err(AppError::DuplicateInvoice)
    } else {
        Ok(())
    }
}

async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner_id: i64,
    input: &MovementInput,
) -> Result<i64, sqlx::Error> {
    match input {
        MovementInput::Adjustment(AdjustmentInput { date, stock_after }) => {
            sqlx::query_scalar(
                r#"INSERT INTO movements (date, movement_type, stock_after, created_by)
                   VALUES ($1, $2, $3, $4)
                   RETURNING id"#,
            )
            .bind(date)
            .bind(MovementType::Adjustment.as_str())
            .bind(stock_after)
            .bind(owner_id)
            .fetch_one(&mut **tx)
            .await
        }
        MovementInput::Purchase(PurchaseInput {
            date,
            invoice_number,
            customer_id,
            unit_price,
            quantity_in,
            stock_after,
        }) => {
            let derived = derive_amounts(*unit_price, *quantity_in);
            sqlx::query_scalar(
                r#"INSERT INTO movements
                       (date, movement_type, invoice_number, customer_id, unit_price,
                        quantity_in, stock_after, gross_amount, tax, total_with_tax, created_by)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                   RETURNING id"#,
            )
            .bind(date)
            .bind(MovementType::Purchase.as_str())
            .bind(invoice_number)
            .bind(customer_id)
            .bind(unit_price)
            .bind(quantity_in)
            .bind(stock_after)
            .bind(derived.gross_amount)
            .bind(derived.tax)
            .bind(derived.total_with_tax)
            .bind(owner_id)
            .fetch_one(&mut **tx)
            .await
        }
        MovementInput::Sale(SaleInput {
            date,
            invoice_number,
            customer_id,
            unit_price,
            quantity_out,
            net_profit,
            gross_profit,
            stock_after,
        }) => {
            let derived = derive_amounts(*unit_price, *quantity_out);
            sqlx::query_scalar(
                r#"INSERT INTO movements
                       (date, movement_type, invoice_number, customer_id, unit_price,
                        quantity_out, stock_after, gross_amount, tax, total_with_tax,
                        net_profit, gross_profit, created_by)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                   RETURNING id"#,
            )
            .bind(date)
            .bind(MovementType::Sale.as_str())
            .bind(invoice_number)
            .bind(customer_id)
            .bind(unit_price)
            .bind(quantity_out)
            .bind(stock_after)
            .bind(derived.gross_amount)
            .bind(derived.tax)
            .bind(derived.total_with_tax)
            .bind(net_profit)
            .bind(gross_profit)
            .bind(owner_id)
            .fetch_one(&mut **tx)
            .await
        }
    }
}

/// Full-replacement update: every domain column is rewritten, inapplicable
/// ones nulled, derived ones recomputed. Returns false when no owned row
/// matched.
async fn replace_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner_id: i64,
    id: i64,
    input: &MovementInput,
) -> Result<bool, sqlx::Error> {
    let result = match input {
        MovementInput::Adjustment(AdjustmentInput { date, stock_after }) => {
            sqlx::query(
                r#"UPDATE movements SET
                       date = $1,
                       movement_type = $2,
                       stock_after = $3,
                       invoice_number = NULL,
                       customer_id = NULL,
                       unit_price = NULL,
                       quantity_in = NULL,
                       quantity_out = NULL,
                       gross_amount = NULL,
                       tax = NULL,
                       total_with_tax = NULL,
                       net_profit = NULL,
                       gross_profit = NULL,
                       updated_at = NOW()
                   WHERE id = $4 AND created_by = $5"#,
            )
            .bind(date)
            .bind(MovementType::Adjustment.as_str())
            .bind(stock_after)
            .bind(id)
            .bind(owner_id)
            .execute(&mut **tx)
            .await?
        }
        MovementInput::Purchase(PurchaseInput {
            date,
            invoice_number,
            customer_id,
            unit_price,
            quantity_in,
            stock_after,
        }) => {
            let derived = derive_amounts(*unit_price, *quantity_in);
            sqlx::query(
                r#"UPDATE movements SET
                       date = $1,
                       movement_type = $2,
                       invoice_number = $3,
                       customer_id = $4,
                       unit_price = $5,
                       quantity_in = $6,
                       quantity_out = NULL,
                       stock_after = $7,
                       gross_amount = $8,
                       tax = $9,
                       total_with_tax = $10,
                       net_profit = NULL,
                       gross_profit = NULL,
                       updated_at = NOW()
                   WHERE id = $11 AND created_by = $12"#,
            )
            .bind(date)
            .bind(MovementType::Purchase.as_str())
            .bind(invoice_number)
            .bind(customer_id)
            .bind(unit_price)
            .bind(quantity_in)
            .bind(stock_after)
            .bind(derived.gross_amount)
            .bind(derived.tax)
            .bind(derived.total_with_tax)
            .bind(id)
            .bind(owner_id)
            .execute(&mut **tx)
            .await?
        }
        MovementInput::Sale(SaleInput {
            date,
            invoice_number,
            customer_id,
            unit_price,
            quantity_out,
            net_profit,
            gross_profit,
            stock_after,
        }) => {
            let derived = derive_amounts(*unit_price, *quantity_out);
            sqlx::query(
                r#"UPDATE movements SET
                       date = $1,
                       movement_type = $2,
                       invoice_number = $3,
                       customer_id = $4,
                       unit_price = $5,
                       quantity_in = NULL,
                       quantity_out = $6,
                       stock_after = $7,
                       gross_amount = $8,
                       tax = $9,
                       total_with_tax = $10,
                       net_profit = $11,
                       gross_profit = $12,
                       updated_at = NOW()
                   WHERE id = $13 AND created_by = $14"#,
            )
            .bind(date)
            .bind(MovementType::Sale.as_str())
            .bind(invoice_number)
            .bind(customer_id)
            .bind(unit_price)
            .bind(quantity_out)
            .bind(stock_after)
            .bind(derived.gross_amount)
            .bind(derived.tax)
            .bind(derived.total_with_tax)
            .bind(net_profit)
            .bind(gross_profit)
            .bind(id)
            .bind(owner_id)
            .execute(&mut **tx)
            .await?
        }
    };

    Ok(result.rows_affected() > 0)
}

async fn fetch_joined<'e, E>(executor: E, id: i64) -> Result<Option<MovementRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("{JOINED_SELECT} WHERE m.id = $1");
    sqlx::query_as::<_, MovementRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}
