use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fixed value-added tax rate. Applied to the unit price, not the line
/// total — this mirrors how the business has always quoted prices.
pub const VAT_RATE: f64 = 0.19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Purchase,
    Sale,
    Adjustment,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Adjustment => "adjustment",
        }
    }

    /// Parses the TEXT column value. The schema CHECK constraint keeps the
    /// column within these three values.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "purchase" => Some(MovementType::Purchase),
            "sale" => Some(MovementType::Sale),
            "adjustment" => Some(MovementType::Adjustment),
            _ => None,
        }
    }
}

/// A movement row joined with its customer's display name. The LEFT JOIN
/// tolerates a customer that no longer resolves; the name is just NULL then.
#[derive(Debug, FromRow)]
pub struct MovementRow {
    pub id: i64,
    pub date: NaiveDate,
    pub movement_type: String,
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

/// Write-time derived monetary fields for priced movements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedAmounts {
    pub gross_amount: f64,
    pub tax: f64,
    pub total_with_tax: f64,
}

/// `quantity` is kilos received for a purchase, kilos dispatched for a sale.
pub fn derive_amounts(unit_price: f64, quantity: f64) -> DerivedAmounts {
    let tax = unit_price * VAT_RATE;
    DerivedAmounts {
        gross_amount: unit_price * quantity,
        tax,
        total_with_tax: unit_price + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_purchase_amounts() {
        let d = derive_amounts(500.0, 1000.0);
        assert_eq!(d.gross_amount, 500_000.0);
        assert!((d.tax - 95.0).abs() < 1e-9);
        assert!((d.total_with_tax - 595.0).abs() < 1e-9);
    }

    #[test]
    fn total_with_tax_is_unit_price_plus_tax() {
        for price in [1.0, 37.5, 600.0, 12_345.67] {
            let d = derive_amounts(price, 400.0);
            assert!((d.total_with_tax - (price + price * VAT_RATE)).abs() < 1e-9);
            assert!((d.gross_amount - price * 400.0).abs() < 1e-6);
        }
    }

    #[test]
    fn movement_type_round_trips_through_db_text() {
        for t in [
            MovementType::Purchase,
            MovementType::Sale,
            MovementType::Adjustment,
        ] {
            assert_eq!(MovementType::from_db(t.as_str()), Some(t));
        }
        assert_eq!(MovementType::from_db("transfer"), None);
    }
}
