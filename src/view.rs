use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::aggregate::{DashboardMetrics, aggregate};
use crate::data::filter::{FilteredView, Granularity, Selection};
use crate::data::model::OrderDataset;

// ---------------------------------------------------------------------------
// View model: everything the UI draws, already formatted
// ---------------------------------------------------------------------------

/// A KPI tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

/// What a chart's y values measure, for tooltip formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Money,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: &'static str,
    pub kind: ValueKind,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: &'static str,
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub title: String,
    pub granularity: Granularity,
    /// Total revenue, shown on its own row.
    pub headline: Metric,
    /// Orders, customers and average order value, shown as one row.
    pub secondary: Vec<Metric>,
    pub line_charts: Vec<LineChart>,
    /// Category rankings and the status breakdown, minus any suppressed ones.
    pub bar_charts: Vec<BarChart>,
    /// Rows that passed the filter.
    pub row_count: usize,
    pub metrics: DashboardMetrics,
}

pub const SALES_OVER_TIME: &str = "Sales Over Time";
pub const ORDERS_OVER_TIME: &str = "Number of Orders Over Time";
pub const TOP_CATEGORIES_BY_REVENUE: &str = "Top 10 Categories by Revenue";
pub const TOP_CATEGORIES_BY_ORDERS: &str = "Top 10 Categories by Number of Orders";
pub const ORDERS_BY_STATUS: &str = "Orders by Status";

/// Run filter → aggregate → present for one selection.
///
/// Pure: the dataset is only read, and the same inputs always give the same view.
pub fn render(dataset: &OrderDataset, selection: &Selection, config: &DashboardConfig) -> ViewModel {
    let view = FilteredView::new(dataset, selection);
    let metrics = aggregate(&view, selection.granularity, config.top_n);
    log::debug!(
        "rendered {} of {} rows ({} orders, price total {:.2})",
        metrics.row_count,
        dataset.len(),
        metrics.total_orders,
        metrics.price_total()
    );
    present(metrics, selection, config)
}

/// Map computed metrics to tiles and charts.
pub fn present(metrics: DashboardMetrics, selection: &Selection, config: &DashboardConfig) -> ViewModel {
    let symbol = config.currency_symbol.as_str();

    let headline = Metric {
        label: "Total Revenue",
        value: format_currency(metrics.total_revenue, symbol),
    };
    let secondary = vec![
        Metric {
            label: "Total Orders",
            value: metrics.total_orders.to_string(),
        },
        Metric {
            label: "Total Customers",
            value: metrics.total_customers.to_string(),
        },
        Metric {
            label: "Avg Order Value",
            value: format_currency(metrics.average_order_value, symbol),
        },
    ];

    let line_charts = vec![
        LineChart {
            title: SALES_OVER_TIME,
            kind: ValueKind::Money,
            points: metrics.sales_over_time.clone(),
        },
        LineChart {
            title: ORDERS_OVER_TIME,
            kind: ValueKind::Count,
            points: as_float(&metrics.orders_over_time),
        },
    ];

    let mut bar_charts = Vec::new();
    if selection.categories.len() != 1 {
        bar_charts.push(BarChart {
            title: TOP_CATEGORIES_BY_REVENUE,
            bars: metrics.revenue_by_category.clone(),
        });
        bar_charts.push(BarChart {
            title: TOP_CATEGORIES_BY_ORDERS,
            bars: as_float(&metrics.orders_by_category),
        });
    }
    if selection.statuses.len() != 1 {
        bar_charts.push(BarChart {
            title: ORDERS_BY_STATUS,
            bars: as_float(&metrics.orders_by_status),
        });
    }

    ViewModel {
        title: config.title.clone(),
        granularity: selection.granularity,
        headline,
        secondary,
        line_charts,
        bar_charts,
        row_count: metrics.row_count,
        metrics,
    }
}

/// Write the view as pretty-printed JSON (File → Export summary…).
pub fn write_summary(view: &ViewModel, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, view).context("writing summary JSON")?;
    writer.flush().context("flushing summary JSON")?;
    Ok(())
}

fn as_float<K: Clone>(rows: &[(K, usize)]) -> Vec<(K, f64)> {
    rows.iter().map(|(k, n)| (k.clone(), *n as f64)).collect()
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `1234567.891` → `R$ 1,234,567.89` for symbol `"R$ "`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let formatted = add_thousands_separator(&format!("{:.2}", value.abs()));
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{symbol}{formatted}")
    } else {
        format!("{symbol}{formatted}")
    }
}

/// Insert `,` every three digits of the integer part of a plain decimal string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let len = integer_part.len();
    let mut result = String::with_capacity(len + len / 3 + 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    if let Some(dec) = decimal_part {
        result.push('.');
        result.push_str(dec);
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::fixtures::sample_dataset;

    fn titles(view: &ViewModel) -> Vec<&'static str> {
        view.bar_charts.iter().map(|c| c.title).collect()
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0, "R$ "), "R$ 0.00");
        assert_eq!(format_currency(999.999, "R$ "), "R$ 1,000.00");
        assert_eq!(format_currency(13591643.7, "R$ "), "R$ 13,591,643.70");
        assert_eq!(format_currency(-1234.5, "$"), "-$1,234.50");
        assert_eq!(format_currency(-0.001, "$"), "$0.00");
    }

    #[test]
    fn full_selection_shows_everything() {
        let ds = sample_dataset();
        let view = render(&ds, &Selection::for_dataset(&ds), &DashboardConfig::default());

        assert_eq!(view.title, "E-commerce Sales Dashboard");
        assert_eq!(view.headline.label, "Total Revenue");
        assert_eq!(view.headline.value, "R$ 120.00");
        let tiles: Vec<(&str, &str)> = view
            .secondary
            .iter()
            .map(|m| (m.label, m.value.as_str()))
            .collect();
        assert_eq!(
            tiles,
            vec![
                ("Total Orders", "5"),
                ("Total Customers", "4"),
                ("Avg Order Value", "R$ 24.00")
            ]
        );
        assert_eq!(view.row_count, 6);
        assert_eq!(view.line_charts.len(), 2);
        assert_eq!(view.line_charts[0].kind, ValueKind::Money);
        assert_eq!(view.line_charts[1].title, ORDERS_OVER_TIME);
        assert_eq!(view.line_charts[1].kind, ValueKind::Count);
        assert_eq!(view.line_charts[1].points[0].1, 2.0);
        assert_eq!(
            titles(&view),
            vec![TOP_CATEGORIES_BY_REVENUE, TOP_CATEGORIES_BY_ORDERS, ORDERS_BY_STATUS]
        );
    }

    #[test]
    fn single_category_hides_category_charts() {
        let ds = sample_dataset();
        let mut sel = Selection::for_dataset(&ds);
        sel.categories = BTreeSet::from(["books".to_string()]);
        let view = render(&ds, &sel, &DashboardConfig::default());

        assert_eq!(titles(&view), vec![ORDERS_BY_STATUS]);
        assert_eq!(view.line_charts.len(), 2);
        assert_eq!(view.secondary.len(), 3);
        assert_eq!(view.secondary[0].value, "2");
        assert_eq!(view.row_count, 2);
    }

    #[test]
    fn single_status_hides_status_chart() {
        let ds = sample_dataset();
        let mut sel = Selection::for_dataset(&ds);
        sel.statuses = BTreeSet::from(["delivered".to_string()]);
        let view = render(&ds, &sel, &DashboardConfig::default());
        assert_eq!(
            titles(&view),
            vec![TOP_CATEGORIES_BY_REVENUE, TOP_CATEGORIES_BY_ORDERS]
        );

        sel.statuses.insert("shipped".to_string());
        sel.categories = BTreeSet::from(["books".to_string(), "toys".to_string()]);
        let view = render(&ds, &sel, &DashboardConfig::default());
        assert_eq!(titles(&view).len(), 3);
    }

    #[test]
    fn date_range_without_rows_renders_empty() {
        let ds = sample_dataset();
        let mut sel = Selection::for_dataset(&ds);
        sel.start = NaiveDate::from_ymd_opt(2017, 1, 6).unwrap();
        sel.end = NaiveDate::from_ymd_opt(2017, 1, 19).unwrap();
        let view = render(&ds, &sel, &DashboardConfig::default());

        assert_eq!(view.row_count, 0);
        assert_eq!(view.headline.value, "R$ 0.00");
        assert_eq!(view.secondary[0].value, "0");
        assert_eq!(view.secondary[1].value, "0");
        assert_eq!(view.secondary[2].value, "R$ 0.00");
        assert!(view.line_charts.iter().all(|c| c.points.is_empty()));
        assert!(view.bar_charts.iter().all(|c| c.bars.is_empty()));
        assert_eq!(view.bar_charts.len(), 3);
    }

    #[test]
    fn rendering_does_not_touch_the_dataset() {
        let ds = sample_dataset();
        let before = ds.orders.clone();
        let sel = Selection::for_dataset(&ds);
        let first = render(&ds, &sel, &DashboardConfig::default());
        let second = render(&ds, &sel, &DashboardConfig::default());
        assert_eq!(first, second);
        assert_eq!(ds.orders, before);
    }

    #[test]
    fn view_model_serializes() {
        let ds = sample_dataset();
        let view = render(&ds, &Selection::for_dataset(&ds), &DashboardConfig::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["headline"]["value"], "R$ 120.00");
        assert_eq!(json["granularity"], "Monthly");
        assert_eq!(json["row_count"], 6);
        assert_eq!(json["line_charts"][1]["kind"], "Count");
        assert_eq!(json["line_charts"][0]["points"][0][0], "2017-01-01");
    }

    #[test]
    fn summary_export_round_trips_as_json() {
        let ds = sample_dataset();
        let view = render(&ds, &Selection::for_dataset(&ds), &DashboardConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary(&view, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["metrics"]["total_orders"], 5);
        assert_eq!(json["bar_charts"].as_array().unwrap().len(), 3);
    }
}
