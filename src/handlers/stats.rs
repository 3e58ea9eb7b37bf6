//! Read-only statistics over the movement ledger. Every query is scoped by
//! the authenticated owner; empty windows come back as zero totals and empty
//! series rather than errors.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use crate::dtos::stats::{
    BalanceResponse, CustomerRankEntry, CustomerSideActivity, CustomerTransactionsResponse,
    DistributionEntry, MonthlyBucket, MonthlyStatsResponse, Period, SideSeriesPoint, StatsQuery,
    SummaryResponse, TopCustomersResponse, WindowTotals,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

/// Rounded percentage of a whole; 0 when the whole is empty so an empty
/// window never divides by zero.
fn pct(part: f64, whole: f64) -> i64 {
    if whole > 0.0 {
        (part / whole * 100.0).round() as i64
    } else {
        0
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(FromRow)]
struct SideTotalsRow {
    purchase_count: i64,
    purchase_amount: f64,
    sale_count: i64,
    sale_amount: f64,
}

async fn current_stock(db_pool: &PgPool, owner_id: i64) -> Result<f64, AppError> {
    // The ledger trusts each row's recorded stock level; "current" is simply
    // the most recently created movement's value.
    let stock: Option<Option<f64>> = sqlx::query_scalar(
        r#"SELECT stock_after FROM movements
           WHERE created_by = $1
           ORDER BY date DESC, id DESC
           LIMIT 1"#,
    )
    .bind(owner_id)
    .fetch_optional(db_pool)
    .await?;

    Ok(stock.flatten().unwrap_or(0.0))
}

pub async fn get_summary(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SummaryResponse>, AppError> {
    let totals = sqlx::query_as::<_, SideTotalsRow>(
        r#"SELECT
               COUNT(CASE WHEN movement_type = 'purchase' THEN 1 END) AS purchase_count,
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN gross_amount ELSE 0 END), 0) AS purchase_amount,
               COUNT(CASE WHEN movement_type = 'sale' THEN 1 END) AS sale_count,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN gross_amount ELSE 0 END), 0) AS sale_amount
           FROM movements
           WHERE created_by = $1"#,
    )
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    let customer_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE created_by = $1")
            .bind(auth.user_id)
            .fetch_one(&db_pool)
            .await?;

    let stock = current_stock(&db_pool, auth.user_id).await?;
    let whole = totals.purchase_amount + totals.sale_amount;

    Ok(Json(SummaryResponse {
        purchase_count: totals.purchase_count,
        purchase_amount: totals.purchase_amount,
        sale_count: totals.sale_count,
        sale_amount: totals.sale_amount,
        current_stock: stock,
        customer_count,
        difference: totals.sale_amount - totals.purchase_amount,
        purchase_pct: pct(totals.purchase_amount, whole),
        sale_pct: pct(totals.sale_amount, whole),
    }))
}

#[derive(FromRow)]
struct MonthBucketRow {
    month: String,
    month_index: i32,
    purchase_amount: f64,
    sale_amount: f64,
    kilos_in: f64,
    kilos_out: f64,
}

pub async fn get_monthly(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<MonthlyStatsResponse>, AppError> {
    let cutoff = params.period.cutoff(today());

    let buckets = sqlx::query_as::<_, MonthBucketRow>(
        r#"SELECT
               TO_CHAR(date, 'Mon') AS month,
               EXTRACT(MONTH FROM date)::INT AS month_index,
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN gross_amount ELSE 0 END), 0) AS purchase_amount,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN gross_amount ELSE 0 END), 0) AS sale_amount,
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN quantity_in ELSE 0 END), 0) AS kilos_in,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN quantity_out ELSE 0 END), 0) AS kilos_out
           FROM movements
           WHERE created_by = $1
             AND date >= $2
             AND movement_type IN ('purchase', 'sale')
           GROUP BY TO_CHAR(date, 'Mon'), EXTRACT(MONTH FROM date)
           ORDER BY EXTRACT(MONTH FROM date)"#,
    )
    .bind(auth.user_id)
    .bind(cutoff)
    .fetch_all(&db_pool)
    .await?;

    let totals = sqlx::query_as::<_, SideTotalsRow>(
        r#"SELECT
               COUNT(CASE WHEN movement_type = 'purchase' THEN 1 END) AS purchase_count,
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN gross_amount ELSE 0 END), 0) AS purchase_amount,
               COUNT(CASE WHEN movement_type = 'sale' THEN 1 END) AS sale_count,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN gross_amount ELSE 0 END), 0) AS sale_amount
           FROM movements
           WHERE created_by = $1
             AND date >= $2
             AND movement_type IN ('purchase', 'sale')"#,
    )
    .bind(auth.user_id)
    .bind(cutoff)
    .fetch_one(&db_pool)
    .await?;

    let whole = totals.purchase_amount + totals.sale_amount;

    Ok(Json(MonthlyStatsResponse {
        monthly: buckets
            .into_iter()
            .map(|b| MonthlyBucket {
                month: b.month,
                month_index: b.month_index,
                purchase_amount: b.purchase_amount,
                sale_amount: b.sale_amount,
                kilos_in: b.kilos_in,
                kilos_out: b.kilos_out,
            })
            .collect(),
        totals: WindowTotals {
            purchase_amount: totals.purchase_amount,
            sale_amount: totals.sale_amount,
            purchase_count: totals.purchase_count,
            sale_count: totals.sale_count,
            purchase_pct: pct(totals.purchase_amount, whole),
            sale_pct: pct(totals.sale_amount, whole),
        },
    }))
}

#[derive(FromRow)]
struct SideSeriesRow {
    month: String,
    amount: f64,
    kilos: f64,
}

async fn side_series(
    db_pool: &PgPool,
    owner_id: i64,
    cutoff: NaiveDate,
    movement_type: &str,
    kilos_column: &str,
) -> Result<Vec<SideSeriesPoint>, AppError> {
    let query = format!(
        r#"SELECT
               TO_CHAR(date, 'Mon') AS month,
               COALESCE(SUM(gross_amount), 0) AS amount,
               COALESCE(SUM({kilos_column}), 0) AS kilos
           FROM movements
           WHERE created_by = $1 AND date >= $2 AND movement_type = $3
           GROUP BY TO_CHAR(date, 'Mon'), EXTRACT(MONTH FROM date)
           ORDER BY EXTRACT(MONTH FROM date)"#
    );

    let rows = sqlx::query_as::<_, SideSeriesRow>(&query)
        .bind(owner_id)
        .bind(cutoff)
        .bind(movement_type)
        .fetch_all(db_pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| SideSeriesPoint {
            month: r.month,
            amount: r.amount,
            kilos: r.kilos,
        })
        .collect())
}

pub async fn get_purchase_series(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<Vec<SideSeriesPoint>>, AppError> {
    let cutoff = params.period.cutoff(today());
    side_series(&db_pool, auth.user_id, cutoff, "purchase", "quantity_in")
        .await
        .map(Json)
}

pub async fn get_sale_series(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<Vec<SideSeriesPoint>>, AppError> {
    let cutoff = params.period.cutoff(today());
    side_series(&db_pool, auth.user_id, cutoff, "sale", "quantity_out")
        .await
        .map(Json)
}

#[derive(FromRow, Clone)]
struct CustomerAggRow {
    name: String,
    customer_type: String,
    amount: f64,
    kilos: f64,
    transaction_count: i64,
}

async fn customer_aggregates(
    db_pool: &PgPool,
    owner_id: i64,
    cutoff: NaiveDate,
    movement_type: &str,
    kilos_column: &str,
) -> Result<Vec<CustomerAggRow>, AppError> {
    let query = format!(
        r#"SELECT
               c.name,
               c.customer_type,
               COALESCE(SUM(m.gross_amount), 0) AS amount,
               COALESCE(SUM(m.{kilos_column}), 0) AS kilos,
               COUNT(*) AS transaction_count
           FROM movements m
           JOIN customers c ON m.customer_id = c.id
           WHERE m.movement_type = $3
             AND m.created_by = $1
             AND m.date >= $2
           GROUP BY c.name, c.customer_type"#
    );

    sqlx::query_as::<_, CustomerAggRow>(&query)
        .bind(owner_id)
        .bind(cutoff)
        .bind(movement_type)
        .fetch_all(db_pool)
        .await
        .map_err(AppError::db)
}

pub async fn get_top_customers(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<TopCustomersResponse>, AppError> {
    let cutoff = params.period.cutoff(today());
    let rows = customer_aggregates(&db_pool, auth.user_id, cutoff, "sale", "quantity_out").await?;

    let total_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let total_kilos: f64 = rows.iter().map(|r| r.kilos).sum();

    let mut by_amount: Vec<CustomerRankEntry> = rows
        .iter()
        .map(|r| CustomerRankEntry {
            name: r.name.clone(),
            customer_type: r.customer_type.clone(),
            amount: r.amount,
            kilos: r.kilos,
            transaction_count: r.transaction_count,
            share_pct: pct(r.amount, total_amount),
        })
        .collect();
    by_amount.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    let mut by_kilos: Vec<CustomerRankEntry> = rows
        .iter()
        .map(|r| CustomerRankEntry {
            name: r.name.clone(),
            customer_type: r.customer_type.clone(),
            amount: r.amount,
            kilos: r.kilos,
            transaction_count: r.transaction_count,
            share_pct: pct(r.kilos, total_kilos),
        })
        .collect();
    by_kilos.sort_by(|a, b| b.kilos.total_cmp(&a.kilos));

    // No top-N cutoff at this level; truncation is a presentation concern.
    Ok(Json(TopCustomersResponse { by_amount, by_kilos }))
}

pub async fn get_customer_transactions(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<CustomerTransactionsResponse>, AppError> {
    let cutoff = params.period.cutoff(today());

    let purchase_rows =
        customer_aggregates(&db_pool, auth.user_id, cutoff, "purchase", "quantity_in").await?;
    let sale_rows =
        customer_aggregates(&db_pool, auth.user_id, cutoff, "sale", "quantity_out").await?;

    Ok(Json(CustomerTransactionsResponse {
        purchases: side_activity(purchase_rows),
        sales: side_activity(sale_rows),
    }))
}

fn side_activity(rows: Vec<CustomerAggRow>) -> Vec<CustomerSideActivity> {
    let whole: f64 = rows.iter().map(|r| r.transaction_count as f64).sum();
    let mut activity: Vec<CustomerSideActivity> = rows
        .into_iter()
        .map(|r| CustomerSideActivity {
            share_pct: pct(r.transaction_count as f64, whole),
            name: r.name,
            customer_type: r.customer_type,
            transaction_count: r.transaction_count,
            total_amount: r.amount,
            total_kilos: r.kilos,
        })
        .collect();
    activity.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
    activity
}

#[derive(FromRow)]
struct DistributionRow {
    customer_type: String,
    count: i64,
}

pub async fn get_customer_distribution(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<DistributionEntry>>, AppError> {
    let rows = sqlx::query_as::<_, DistributionRow>(
        r#"SELECT customer_type, COUNT(*) AS count
           FROM customers
           WHERE created_by = $1
           GROUP BY customer_type
           ORDER BY COUNT(*) DESC"#,
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    let whole: f64 = rows.iter().map(|r| r.count as f64).sum();

    Ok(Json(
        rows.into_iter()
            .map(|r| DistributionEntry {
                share_pct: pct(r.count as f64, whole),
                customer_type: r.customer_type,
                count: r.count,
            })
            .collect(),
    ))
}

#[derive(FromRow)]
struct BalanceRow {
    kilos_in: f64,
    kilos_out: f64,
    purchase_amount: f64,
    sale_amount: f64,
}

pub async fn get_balance(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<BalanceResponse>, AppError> {
    let cutoff = Period::Annual.cutoff(today());

    let balance = sqlx::query_as::<_, BalanceRow>(
        r#"SELECT
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN quantity_in ELSE 0 END), 0) AS kilos_in,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN quantity_out ELSE 0 END), 0) AS kilos_out,
               COALESCE(SUM(CASE WHEN movement_type = 'purchase' THEN gross_amount ELSE 0 END), 0) AS purchase_amount,
               COALESCE(SUM(CASE WHEN movement_type = 'sale' THEN gross_amount ELSE 0 END), 0) AS sale_amount
           FROM movements
           WHERE created_by = $1 AND date >= $2"#,
    )
    .bind(auth.user_id)
    .bind(cutoff)
    .fetch_one(&db_pool)
    .await?;

    let stock = current_stock(&db_pool, auth.user_id).await?;
    let total_kilos = balance.kilos_in + balance.kilos_out;
    let total_amount = balance.purchase_amount + balance.sale_amount;

    Ok(Json(BalanceResponse {
        current_stock: stock,
        kilos_in: balance.kilos_in,
        kilos_out: balance.kilos_out,
        kilos_in_pct: pct(balance.kilos_in, total_kilos),
        kilos_out_pct: pct(balance.kilos_out, total_kilos),
        purchase_amount: balance.purchase_amount,
        sale_amount: balance.sale_amount,
        purchase_pct: pct(balance.purchase_amount, total_amount),
        sale_pct: pct(balance.sale_amount, total_amount),
    }))
}

#[cfg(test)]
mod tests {
    use super::pct;

    #[test]
    fn pct_is_zero_safe() {
        assert_eq!(pct(0.0, 0.0), 0);
        assert_eq!(pct(500.0, 0.0), 0);
    }

    #[test]
    fn pct_rounds_to_nearest_integer() {
        assert_eq!(pct(1.0, 3.0), 33);
        assert_eq!(pct(2.0, 3.0), 67);
        assert_eq!(pct(1.0, 8.0), 13);
    }

    #[test]
    fn split_sums_to_one_hundred_when_both_sides_nonzero() {
        for (purchases, sales) in [(500_000.0, 240_000.0), (1.0, 2.0), (3.0, 3.0)] {
            let whole = purchases + sales;
            let split = pct(purchases, whole) + pct(sales, whole);
            assert!((99..=101).contains(&split), "split {split}");
        }
        // Exact halves land on 50/50.
        assert_eq!(pct(5.0, 10.0) + pct(5.0, 10.0), 100);
    }
}
