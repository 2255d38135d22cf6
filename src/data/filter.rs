use std::collections::BTreeSet;
use std::fmt;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::model::{OrderDataset, OrderRecord};

// ---------------------------------------------------------------------------
// Selection: the user's current filter choices
// ---------------------------------------------------------------------------

/// Time-bucketing resolution for the two time series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    /// Selector order.
    pub const ALL: [Granularity; 2] = [Granularity::Monthly, Granularity::Daily];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Monthly => write!(f, "Monthly"),
            Granularity::Daily => write!(f, "Daily"),
        }
    }
}

/// Filter selection, re-derived on every interaction.
///
/// An empty `statuses` or `categories` set means "no filter" for that column.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Inclusive calendar-date bounds.
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub statuses: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl Selection {
    /// Everything selected: full date range, monthly buckets, no set filters.
    ///
    /// A dataset without rows has no date bounds; both ends then fall on today.
    pub fn for_dataset(dataset: &OrderDataset) -> Self {
        let (start, end) = dataset.date_bounds.unwrap_or_else(|| {
            let today = Local::now().date_naive();
            (today, today)
        });
        Selection {
            start,
            end,
            granularity: Granularity::default(),
            statuses: BTreeSet::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Keep the date bounds inside the dataset's observed range and ordered.
    pub fn clamp_to(&mut self, dataset: &OrderDataset) {
        if self.start > self.end {
            std::mem::swap(&mut self.start, &mut self.end);
        }
        if let Some((lo, hi)) = dataset.date_bounds {
            self.start = self.start.clamp(lo, hi);
            self.end = self.end.clamp(lo, hi);
        }
    }

    /// Whether a single row passes every active predicate.
    pub fn matches(&self, order: &OrderRecord) -> bool {
        let day = order.purchase_date();
        if day < self.start || day > self.end {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&order.order_status) {
            return false;
        }
        if !self.categories.is_empty() {
            // A missing category never matches an explicit category selection.
            match &order.product_category_name {
                Some(cat) if self.categories.contains(cat) => {}
                _ => return false,
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Return indices of orders that pass the selection, in dataset order.
pub fn filtered_indices(dataset: &OrderDataset, selection: &Selection) -> Vec<usize> {
    dataset
        .orders
        .iter()
        .enumerate()
        .filter(|(_, order)| selection.matches(order))
        .map(|(i, _)| i)
        .collect()
}

/// Read-only projection of the dataset rows matching a selection.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a OrderDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a OrderDataset, selection: &Selection) -> Self {
        FilteredView {
            dataset,
            indices: filtered_indices(dataset, selection),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a OrderRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.orders[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
