use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::customer::CustomerType;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub customer_type: CustomerType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub customer_type: Option<CustomerType>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub customer_type: String,
    pub created_at: DateTime<Utc>,
}
