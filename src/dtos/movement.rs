use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::movement::{MovementRow, MovementType};

/// Raw candidate payload for create and update. Every field is optional at
/// the transport level; the validator decides which combination is legal
/// for the declared movement type.
#[derive(Debug, Clone, Deserialize)]
pub struct MovementPayload {
    pub date: Option<NaiveDate>,
    pub movement_type: Option<MovementType>,
    pub invoice_number: Option<String>,
    pub customer_id: Option<i64>,
    pub unit_price: Option<f64>,
    pub quantity_in: Option<f64>,
    pub quantity_out: Option<f64>,
    pub stock_after: Option<f64>,
    pub net_profit: Option<f64>,
    pub gross_profit: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub movement_type: MovementType,
    pub invoice_number: Option<String>,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub unit_price: Option<f64>,
    pub quantity_in: Option<f64>,
    pub quantity_out: Option<f64>,
    pub stock_after: Option<f64>,
    pub gross_amount: Option<f64>,
    pub tax: Option<f64>,
    pub total_with_tax: Option<f64>,
    pub net_profit: Option<f64>,
    pub gross_profit: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MovementResponse {
    pub fn from_row(row: MovementRow) -> Option<Self> {
        let movement_type = MovementType::from_db(&row.movement_type)?;
        Some(Self {
            id: row.id,
            date: row.date,
            movement_type,
            invoice_number: row.invoice_number,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            unit_price: row.unit_price,
            quantity_in: row.quantity_in,
            quantity_out: row.quantity_out,
            stock_after: row.stock_after,
            gross_amount: row.gross_amount,
            tax: row.tax,
            total_with_tax: row.total_with_tax,
            net_profit: row.net_profit,
            gross_profit: row.gross_profit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
