use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::filter::{FilteredView, Granularity};

// ---------------------------------------------------------------------------
// Aggregate outputs
// ---------------------------------------------------------------------------

/// Every number the dashboard shows, computed from one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    /// Max of the `total_revenue` column (a running total in the export), not a price sum.
    pub total_revenue: f64,
    pub total_orders: usize,
    pub total_customers: usize,
    pub average_order_value: f64,
    /// Price sum per period start, ascending.
    pub sales_over_time: Vec<(NaiveDate, f64)>,
    /// Distinct order count per period start, ascending.
    pub orders_over_time: Vec<(NaiveDate, usize)>,
    /// Row count per status, descending.
    pub orders_by_status: Vec<(String, usize)>,
    /// Price sum per category, descending, top-N only.
    pub revenue_by_category: Vec<(String, f64)>,
    /// Row count per category, descending, top-N only.
    pub orders_by_category: Vec<(String, usize)>,
    /// Rows in the filtered view.
    pub row_count: usize,
}

impl DashboardMetrics {
    /// Sum of `sales_over_time`, equal to the view's price total for either granularity.
    pub fn price_total(&self) -> f64 {
        self.sales_over_time.iter().map(|(_, v)| v).sum()
    }
}

/// First day of the bucket containing `day`.
pub fn period_start(day: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => day,
        Granularity::Monthly => day.with_day(1).unwrap_or(day),
    }
}

/// Compute KPIs and grouped summaries for a filtered view.
///
/// An empty view yields zeros and empty tables.
pub fn aggregate(view: &FilteredView<'_>, granularity: Granularity, top_n: usize) -> DashboardMetrics {
    if view.is_empty() {
        return DashboardMetrics::default();
    }

    let mut total_revenue: Option<f64> = None;
    let mut order_ids: HashSet<&str> = HashSet::new();
    let mut customers: HashSet<&str> = HashSet::new();

    let mut sales: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut orders_per_period: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();

    // Status counts keep first-appearance order so the stable sort below
    // resolves ties by it.
    let mut status_slot: HashMap<&str, usize> = HashMap::new();
    let mut status_counts: Vec<(String, usize)> = Vec::new();

    let mut category_revenue: BTreeMap<&str, f64> = BTreeMap::new();
    let mut category_rows: BTreeMap<&str, usize> = BTreeMap::new();

    for order in view.iter() {
        if let Some(rev) = order.total_revenue {
            total_revenue = Some(total_revenue.map_or(rev, |cur| cur.max(rev)));
        }
        order_ids.insert(&order.order_id);
        customers.insert(&order.customer_unique_id);

        let period = period_start(order.purchase_date(), granularity);
        *sales.entry(period).or_default() += order.price.unwrap_or(0.0);
        orders_per_period
            .entry(period)
            .or_default()
            .insert(&order.order_id);

        let slot = *status_slot.entry(&order.order_status).or_insert_with(|| {
            status_counts.push((order.order_status.clone(), 0));
            status_counts.len() - 1
        });
        status_counts[slot].1 += 1;

        if let Some(cat) = order.product_category_name.as_deref() {
            *category_revenue.entry(cat).or_default() += order.price.unwrap_or(0.0);
            *category_rows.entry(cat).or_default() += 1;
        }
    }

    let total_revenue = total_revenue.unwrap_or(0.0);
    let total_orders = order_ids.len();
    let average_order_value = if total_orders > 0 {
        total_revenue / total_orders as f64
    } else {
        0.0
    };

    status_counts.sort_by(|a, b| b.1.cmp(&a.1));

    DashboardMetrics {
        total_revenue,
        total_orders,
        total_customers: customers.len(),
        average_order_value,
        sales_over_time: sales.into_iter().collect(),
        orders_over_time: orders_per_period
            .into_iter()
            .map(|(period, ids)| (period, ids.len()))
            .collect(),
        orders_by_status: status_counts,
        revenue_by_category: top_descending(category_revenue, top_n, |a, b| b.total_cmp(a)),
        orders_by_category: top_descending(category_rows, top_n, |a, b| b.cmp(a)),
        row_count: view.len(),
    }
}

/// Sort a name-keyed table by value (stable, so ties stay in name order) and keep the first `n`.
fn top_descending<V, F>(table: BTreeMap<&str, V>, n: usize, mut cmp: F) -> Vec<(String, V)>
where
    F: FnMut(&V, &V) -> std::cmp::Ordering,
{
    let mut rows: Vec<(String, V)> = table
        .into_iter()
        .map(|(name, v)| (name.to_string(), v))
        .collect();
    rows.sort_by(|a, b| cmp(&a.1, &b.1));
    rows.truncate(n);
    rows
}
