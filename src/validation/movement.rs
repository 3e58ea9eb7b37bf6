//! Per-type movement validation.
//!
//! A movement payload has one of three mutually exclusive shapes keyed by
//! `movement_type`. Validation collects every field problem instead of
//! stopping at the first, and on success hands back a typed input the
//! persistence layer can match on exhaustively.

use chrono::NaiveDate;

use crate::dtos::movement::MovementPayload;
use crate::error::FieldError;
use crate::models::movement::MovementType;

/// A payload that passed the per-type state machine. Derived fields
/// (gross amount, tax, total) are computed later; they are never inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementInput {
    Purchase(PurchaseInput),
    Sale(SaleInput),
    Adjustment(AdjustmentInput),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseInput {
    pub date: NaiveDate,
    pub invoice_number: String,
    pub customer_id: i64,
    pub unit_price: f64,
    pub quantity_in: f64,
    pub stock_after: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    pub date: NaiveDate,
    pub invoice_number: String,
    pub customer_id: i64,
    pub unit_price: f64,
    pub quantity_out: f64,
    pub net_profit: f64,
    pub gross_profit: f64,
    pub stock_after: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentInput {
    pub date: NaiveDate,
    pub stock_after: f64,
}

impl MovementInput {
    pub fn movement_type(&self) -> MovementType {
        match self {
            MovementInput::Purchase(_) => MovementType::Purchase,
            MovementInput::Sale(_) => MovementType::Sale,
            MovementInput::Adjustment(_) => MovementType::Adjustment,
        }
    }

    pub fn invoice_number(&self) -> Option<&str> {
        match self {
            MovementInput::Purchase(p) => Some(&p.invoice_number),
            MovementInput::Sale(s) => Some(&s.invoice_number),
            MovementInput::Adjustment(_) => None,
        }
    }

    pub fn customer_id(&self) -> Option<i64> {
        match self {
            MovementInput::Purchase(p) => Some(p.customer_id),
            MovementInput::Sale(s) => Some(s.customer_id),
            MovementInput::Adjustment(_) => None,
        }
    }
}

/// Validates a candidate payload. Pure: the only stateful check (invoice
/// uniqueness) lives with the persistence layer.
pub fn validate(payload: &MovementPayload) -> Result<MovementInput, Vec<FieldError>> {
    let movement_type = match payload.movement_type {
        Some(t) => t,
        None => {
            return Err(vec![FieldError::new(
                "movement_type",
                "movement_type is required",
            )])
        }
    };

    match movement_type {
        MovementType::Purchase => validate_purchase(payload),
        MovementType::Sale => validate_sale(payload),
        MovementType::Adjustment => validate_adjustment(payload),
    }
}

fn validate_purchase(payload: &MovementPayload) -> Result<MovementInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = require_date(&mut errors, payload.date);
    let invoice_number = require_text(&mut errors, "invoice_number", payload.invoice_number.as_deref());
    let customer_id = require_customer(&mut errors, payload.customer_id);
    let unit_price = require_positive(&mut errors, "unit_price", payload.unit_price);
    let quantity_in = require_positive(&mut errors, "quantity_in", payload.quantity_in);
    let stock_after = optional_non_negative(&mut errors, payload.stock_after);

    forbid(&mut errors, "quantity_out", payload.quantity_out.is_some(), "purchase");
    forbid(&mut errors, "net_profit", payload.net_profit.is_some(), "purchase");
    forbid(&mut errors, "gross_profit", payload.gross_profit.is_some(), "purchase");

    match (date, invoice_number, customer_id, unit_price, quantity_in) {
        (Some(date), Some(invoice_number), Some(customer_id), Some(unit_price), Some(quantity_in))
            if errors.is_empty() =>
        {
            Ok(MovementInput::Purchase(PurchaseInput {
                date,
                invoice_number,
                customer_id,
                unit_price,
                quantity_in,
                stock_after,
            }))
        }
        _ => Err(errors),
    }
}

fn validate_sale(payload: &MovementPayload) -> Result<MovementInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = require_date(&mut errors, payload.date);
    let invoice_number = require_text(&mut errors, "invoice_number", payload.invoice_number.as_deref());
    let customer_id = require_customer(&mut errors, payload.customer_id);
    let unit_price = require_positive(&mut errors, "unit_price", payload.unit_price);
    let quantity_out = require_positive(&mut errors, "quantity_out", payload.quantity_out);
    let net_profit = require_number(&mut errors, "net_profit", payload.net_profit);
    let gross_profit = require_number(&mut errors, "gross_profit", payload.gross_profit);
    let stock_after = optional_non_negative(&mut errors, payload.stock_after);

    forbid(&mut errors, "quantity_in", payload.quantity_in.is_some(), "sale");

    match (
        date,
        invoice_number,
        customer_id,
        unit_price,
        quantity_out,
        net_profit,
        gross_profit,
    ) {
        (
            Some(date),
            Some(invoice_number),
            Some(customer_id),
            Some(unit_price),
            Some(quantity_out),
            Some(net_profit),
            Some(gross_profit),
        ) if errors.is_empty() => Ok(MovementInput::Sale(SaleInput {
            date,
            invoice_number,
            customer_id,
            unit_price,
            quantity_out,
            net_profit,
            gross_profit,
            stock_after,
        })),
        _ => Err(errors),
    }
}

fn validate_adjustment(payload: &MovementPayload) -> Result<MovementInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = require_date(&mut errors, payload.date);

    // An adjustment carries nothing but the authoritative stock level.
    forbid(&mut errors, "invoice_number", payload.invoice_number.is_some(), "adjustment");
    forbid(&mut errors, "customer_id", payload.customer_id.is_some(), "adjustment");
    forbid(&mut errors, "unit_price", payload.unit_price.is_some(), "adjustment");
    forbid(&mut errors, "quantity_in", payload.quantity_in.is_some(), "adjustment");
    forbid(&mut errors, "quantity_out", payload.quantity_out.is_some(), "adjustment");
    forbid(&mut errors, "net_profit", payload.net_profit.is_some(), "adjustment");
    forbid(&mut errors, "gross_profit", payload.gross_profit.is_some(), "adjustment");

    let stock_after = match payload.stock_after {
        None => {
            errors.push(FieldError::new("stock_after", "stock_after is required"));
            None
        }
        Some(v) if v < 0.0 => {
            errors.push(FieldError::new("stock_after", "stock_after must be 0 or greater"));
            None
        }
        Some(v) => Some(v),
    };

    match (date, stock_after) {
        (Some(date), Some(stock_after)) if errors.is_empty() => {
            Ok(MovementInput::Adjustment(AdjustmentInput { date, stock_after }))
        }
        _ => Err(errors),
    }
}

fn require_date(errors: &mut Vec<FieldError>, value: Option<NaiveDate>) -> Option<NaiveDate> {
    if value.is_none() {
        errors.push(FieldError::new("date", "date is required"));
    }
    value
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

fn require_customer(errors: &mut Vec<FieldError>, value: Option<i64>) -> Option<i64> {
    if value.is_none() {
        errors.push(FieldError::new("customer_id", "customer_id is required"));
    }
    value
}

/// Required strictly-positive number. Zero fails the positivity constraint
/// rather than counting as "provided".
fn require_positive(errors: &mut Vec<FieldError>, field: &str, value: Option<f64>) -> Option<f64> {
    match value {
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
        Some(v) if v <= 0.0 || !v.is_finite() => {
            errors.push(FieldError::new(field, format!("{field} must be greater than 0")));
            None
        }
        Some(v) => Some(v),
    }
}

/// Required number with no sign constraint (operator-supplied profit figures
/// may legitimately be zero or negative).
fn require_number(errors: &mut Vec<FieldError>, field: &str, value: Option<f64>) -> Option<f64> {
    match value {
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
        Some(v) if !v.is_finite() => {
            errors.push(FieldError::new(field, format!("{field} must be a number")));
            None
        }
        Some(v) => Some(v),
    }
}

fn optional_non_negative(errors: &mut Vec<FieldError>, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v < 0.0 || !v.is_finite() => {
            errors.push(FieldError::new("stock_after", "stock_after must be 0 or greater"));
            None
        }
        other => other,
    }
}

fn forbid(errors: &mut Vec<FieldError>, field: &str, populated: bool, type_name: &str) {
    if populated {
        errors.push(FieldError::new(
            field,
            format!("{field} is not allowed for {type_name} movements"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn purchase_payload() -> MovementPayload {
        MovementPayload {
            date: Some(date()),
            movement_type: Some(MovementType::Purchase),
            invoice_number: Some("F-100".to_string()),
            customer_id: Some(7),
            unit_price: Some(500.0),
            quantity_in: Some(1000.0),
            quantity_out: None,
            stock_after: Some(1000.0),
            net_profit: None,
            gross_profit: None,
        }
    }

    fn sale_payload() -> MovementPayload {
        MovementPayload {
            date: Some(date()),
            movement_type: Some(MovementType::Sale),
            invoice_number: Some("F-101".to_string()),
            customer_id: Some(7),
            unit_price: Some(600.0),
            quantity_in: None,
            quantity_out: Some(400.0),
            stock_after: Some(600.0),
            net_profit: Some(10_000.0),
            gross_profit: Some(12_000.0),
        }
    }

    fn adjustment_payload() -> MovementPayload {
        MovementPayload {
            date: Some(date()),
            movement_type: Some(MovementType::Adjustment),
            invoice_number: None,
            customer_id: None,
            unit_price: None,
            quantity_in: None,
            quantity_out: None,
            stock_after: Some(2500.0),
            net_profit: None,
            gross_profit: None,
        }
    }

    fn fields_of(result: Result<MovementInput, Vec<FieldError>>) -> Vec<String> {
        result.unwrap_err().into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_valid_purchase() {
        match validate(&purchase_payload()) {
            Ok(MovementInput::Purchase(p)) => {
                assert_eq!(p.invoice_number, "F-100");
                assert_eq!(p.quantity_in, 1000.0);
                assert_eq!(p.stock_after, Some(1000.0));
            }
            other => panic!("expected purchase, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_sale() {
        match validate(&sale_payload()) {
            Ok(MovementInput::Sale(s)) => {
                assert_eq!(s.quantity_out, 400.0);
                assert_eq!(s.net_profit, 10_000.0);
            }
            other => panic!("expected sale, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_adjustment() {
        match validate(&adjustment_payload()) {
            Ok(MovementInput::Adjustment(a)) => assert_eq!(a.stock_after, 2500.0),
            other => panic!("expected adjustment, got {other:?}"),
        }
    }

    #[test]
    fn purchase_requires_each_field_by_name() {
        let cases: Vec<(&str, Box<dyn Fn(&mut MovementPayload)>)> = vec![
            ("date", Box::new(|p| p.date = None)),
            ("invoice_number", Box::new(|p| p.invoice_number = None)),
            ("customer_id", Box::new(|p| p.customer_id = None)),
            ("unit_price", Box::new(|p| p.unit_price = None)),
            ("quantity_in", Box::new(|p| p.quantity_in = None)),
        ];
        for (field, mutate) in cases {
            let mut payload = purchase_payload();
            mutate(&mut payload);
            let fields = fields_of(validate(&payload));
            assert_eq!(fields, vec![field.to_string()], "missing {field}");
        }
    }

    #[test]
    fn purchase_forbids_sale_fields() {
        let mut payload = purchase_payload();
        payload.quantity_out = Some(10.0);
        payload.net_profit = Some(1.0);
        payload.gross_profit = Some(2.0);
        let fields = fields_of(validate(&payload));
        assert!(fields.contains(&"quantity_out".to_string()));
        assert!(fields.contains(&"net_profit".to_string()));
        assert!(fields.contains(&"gross_profit".to_string()));
    }

    #[test]
    fn sale_requires_profit_fields_and_forbids_quantity_in() {
        let mut payload = sale_payload();
        payload.net_profit = None;
        payload.gross_profit = None;
        payload.quantity_in = Some(5.0);
        let fields = fields_of(validate(&payload));
        assert!(fields.contains(&"net_profit".to_string()));
        assert!(fields.contains(&"gross_profit".to_string()));
        assert!(fields.contains(&"quantity_in".to_string()));
    }

    #[test]
    fn adjustment_rejects_every_populated_domain_field() {
        let cases: Vec<(&str, Box<dyn Fn(&mut MovementPayload)>)> = vec![
            ("invoice_number", Box::new(|p| p.invoice_number = Some("F-1".into()))),
            ("customer_id", Box::new(|p| p.customer_id = Some(1))),
            ("unit_price", Box::new(|p| p.unit_price = Some(10.0))),
            ("quantity_in", Box::new(|p| p.quantity_in = Some(10.0))),
            ("quantity_out", Box::new(|p| p.quantity_out = Some(10.0))),
            ("net_profit", Box::new(|p| p.net_profit = Some(10.0))),
            ("gross_profit", Box::new(|p| p.gross_profit = Some(10.0))),
        ];
        for (field, mutate) in cases {
            let mut payload = adjustment_payload();
            mutate(&mut payload);
            let fields = fields_of(validate(&payload));
            assert_eq!(fields, vec![field.to_string()], "populated {field}");
        }
    }

    #[test]
    fn adjustment_requires_non_negative_stock() {
        let mut payload = adjustment_payload();
        payload.stock_after = None;
        assert_eq!(fields_of(validate(&payload)), vec!["stock_after".to_string()]);

        let mut payload = adjustment_payload();
        payload.stock_after = Some(-1.0);
        assert_eq!(fields_of(validate(&payload)), vec!["stock_after".to_string()]);

        let mut payload = adjustment_payload();
        payload.stock_after = Some(0.0);
        assert!(validate(&payload).is_ok());
    }

    #[test]
    fn zero_fails_positivity_not_presence() {
        let mut payload = purchase_payload();
        payload.unit_price = Some(0.0);
        let errors = validate(&payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "unit_price");
        assert!(errors[0].message.contains("greater than 0"));
    }

    #[test]
    fn blank_invoice_number_counts_as_missing() {
        let mut payload = sale_payload();
        payload.invoice_number = Some("   ".to_string());
        assert_eq!(fields_of(validate(&payload)), vec!["invoice_number".to_string()]);
    }

    #[test]
    fn negative_stock_after_rejected_on_priced_movements() {
        let mut payload = purchase_payload();
        payload.stock_after = Some(-5.0);
        assert_eq!(fields_of(validate(&payload)), vec!["stock_after".to_string()]);
    }

    #[test]
    fn missing_movement_type_is_named() {
        let mut payload = purchase_payload();
        payload.movement_type = None;
        assert_eq!(fields_of(validate(&payload)), vec!["movement_type".to_string()]);
    }

    #[test]
    fn validation_is_idempotent() {
        let valid = sale_payload();
        assert_eq!(validate(&valid), validate(&valid));

        let mut invalid = sale_payload();
        invalid.unit_price = Some(0.0);
        invalid.quantity_in = Some(3.0);
        assert_eq!(validate(&invalid), validate(&invalid));
    }

    #[test]
    fn all_errors_reported_at_once() {
        let payload = MovementPayload {
            date: None,
            movement_type: Some(MovementType::Purchase),
            invoice_number: None,
            customer_id: None,
            unit_price: None,
            quantity_in: None,
            quantity_out: None,
            stock_after: None,
            net_profit: None,
            gross_profit: None,
        };
        let errors = validate(&payload).unwrap_err();
        assert_eq!(errors.len(), 5);
    }
}
