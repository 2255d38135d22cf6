use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// OrderRecord – one row of the order export
// ---------------------------------------------------------------------------

/// A single order line item (one row of the source table).
///
/// `order_id` repeats across line items of the same order and
/// `customer_unique_id` repeats across a customer's orders.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub purchase_timestamp: NaiveDateTime,
    pub order_id: String,
    pub customer_unique_id: String,
    pub order_status: String,
    /// Missing in some exports; such rows never match a category selection.
    pub product_category_name: Option<String>,
    pub price: Option<f64>,
    /// Running revenue total carried on every row of the export.
    pub total_revenue: Option<f64>,
}

impl OrderRecord {
    /// Calendar day of the purchase, used for range filtering and daily buckets.
    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_timestamp.date()
    }
}

// ---------------------------------------------------------------------------
// OrderDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with the selector options pre-computed.
///
/// Loaded once and then shared read-only (behind an `Arc`) by every render.
#[derive(Debug, Clone, Default)]
pub struct OrderDataset {
    /// All rows in file order.
    pub orders: Vec<OrderRecord>,
    /// Distinct statuses in first-appearance order.
    pub statuses: Vec<String>,
    /// Distinct (non-missing) categories in first-appearance order.
    pub categories: Vec<String>,
    /// Earliest and latest purchase date, `None` when there are no rows.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl OrderDataset {
    /// Build selector indices from the loaded rows.
    pub fn from_orders(orders: Vec<OrderRecord>) -> Self {
        let mut statuses = Vec::new();
        let mut categories = Vec::new();
        let mut seen_status: HashSet<&str> = HashSet::new();
        let mut seen_category: HashSet<&str> = HashSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for order in &orders {
            if seen_status.insert(&order.order_status) {
                statuses.push(order.order_status.clone());
            }
            if let Some(cat) = &order.product_category_name {
                if seen_category.insert(cat) {
                    categories.push(cat.clone());
                }
            }
            let day = order.purchase_date();
            date_bounds = Some(match date_bounds {
                None => (day, day),
                Some((lo, hi)) => (lo.min(day), hi.max(day)),
            });
        }

        OrderDataset {
            orders,
            statuses,
            categories,
            date_bounds,
        }
    }

    /// Calendar years covered by the data, for bounding date pickers.
    pub fn year_range(&self) -> Option<RangeInclusive<i32>> {
        self.date_bounds.map(|(lo, hi)| lo.year()..=hi.year())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
