use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Business,
    Individual,
}

impl CustomerType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerType::Business => "business",
            CustomerType::Individual => "individual",
        }
    }
}

#[derive(Debug, FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub customer_type: String,
    pub created_at: DateTime<Utc>,
}
