use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trailing window over which statistics are computed, measured from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Monthly,
    Quarterly,
    Annual,
}

impl Default for Period {
    fn default() -> Self {
        Period::Annual
    }
}

impl Period {
    pub fn months(self) -> u32 {
        match self {
            Period::Monthly => 1,
            Period::Quarterly => 3,
            Period::Annual => 12,
        }
    }

    /// First date inside the window.
    pub fn cutoff(self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub purchase_count: i64,
    pub purchase_amount: f64,
    pub sale_count: i64,
    pub sale_amount: f64,
    pub current_stock: f64,
    pub customer_count: i64,
    /// Sales amount minus purchases amount, all time.
    pub difference: f64,
    pub purchase_pct: i64,
    pub sale_pct: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub month_index: i32,
    pub purchase_amount: f64,
    pub sale_amount: f64,
    pub kilos_in: f64,
    pub kilos_out: f64,
}

#[derive(Debug, Serialize)]
pub struct WindowTotals {
    pub purchase_amount: f64,
    pub sale_amount: f64,
    pub purchase_count: i64,
    pub sale_count: i64,
    pub purchase_pct: i64,
    pub sale_pct: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyStatsResponse {
    pub monthly: Vec<MonthlyBucket>,
    pub totals: WindowTotals,
}

/// One month of a single-side (purchases-only or sales-only) series.
#[derive(Debug, Serialize)]
pub struct SideSeriesPoint {
    pub month: String,
    pub amount: f64,
    pub kilos: f64,
}

#[derive(Debug, Serialize)]
pub struct CustomerRankEntry {
    pub name: String,
    pub customer_type: String,
    pub amount: f64,
    pub kilos: f64,
    pub transaction_count: i64,
    /// Share of the window total for the ranking metric, rounded.
    pub share_pct: i64,
}

#[derive(Debug, Serialize)]
pub struct TopCustomersResponse {
    pub by_amount: Vec<CustomerRankEntry>,
    pub by_kilos: Vec<CustomerRankEntry>,
}

#[derive(Debug, Serialize)]
pub struct CustomerSideActivity {
    pub name: String,
    pub customer_type: String,
    pub transaction_count: i64,
    pub total_amount: f64,
    pub total_kilos: f64,
    /// Share of the side's transaction count, rounded.
    pub share_pct: i64,
}

#[derive(Debug, Serialize)]
pub struct CustomerTransactionsResponse {
    pub purchases: Vec<CustomerSideActivity>,
    pub sales: Vec<CustomerSideActivity>,
}

#[derive(Debug, Serialize)]
pub struct DistributionEntry {
    pub customer_type: String,
    pub count: i64,
    pub share_pct: i64,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub current_stock: f64,
    pub kilos_in: f64,
    pub kilos_out: f64,
    pub kilos_in_pct: i64,
    pub kilos_out_pct: i64,
    pub purchase_amount: f64,
    pub sale_amount: f64,
    pub purchase_pct: i64,
    pub sale_pct: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_window_lengths() {
        assert_eq!(Period::Monthly.months(), 1);
        assert_eq!(Period::Quarterly.months(), 3);
        assert_eq!(Period::Annual.months(), 12);
        assert_eq!(Period::default(), Period::Annual);
    }

    #[test]
    fn cutoff_walks_back_calendar_months() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            Period::Monthly.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
        );
        assert_eq!(
            Period::Quarterly.cutoff(today),
            NaiveDate::from_ymd_opt(2023, 12, 15).unwrap()
        );
        assert_eq!(
            Period::Annual.cutoff(today),
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
        );
    }

    #[test]
    fn cutoff_clamps_at_month_ends() {
        // March 31 minus one month lands on February's last day.
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            Period::Monthly.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn period_deserializes_lowercase() {
        let q: StatsQuery = serde_json::from_str(r#"{"period":"quarterly"}"#).unwrap();
        assert_eq!(q.period, Period::Quarterly);
        let q: StatsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.period, Period::Annual);
    }
}
