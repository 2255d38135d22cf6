use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart as PlotBarChart, GridMark, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::filter::Granularity;
use crate::view::{BarChart, LineChart, ValueKind};

const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

/// Plot x-coordinate for a calendar day.
pub fn day_to_x(day: NaiveDate) -> f64 {
    day.num_days_from_ce() as f64
}

/// Axis / tooltip label for an x-coordinate, empty if it is not a valid day.
pub fn x_to_label(x: f64, granularity: Granularity) -> String {
    let Some(day) = NaiveDate::from_num_days_from_ce_opt(x.round() as i32) else {
        return String::new();
    };
    match granularity {
        Granularity::Monthly => day.format("%Y-%m").to_string(),
        Granularity::Daily => day.format("%Y-%m-%d").to_string(),
    }
}

/// Tooltip text for a y value: counts as whole numbers, money with cents.
pub fn format_value(kind: ValueKind, value: f64) -> String {
    match kind {
        ValueKind::Count => format!("{}", value.round() as i64),
        ValueKind::Money => format!("{value:.2}"),
    }
}

// ---------------------------------------------------------------------------
// Time-series line chart
// ---------------------------------------------------------------------------

/// Render one time series. Points are drawn as markers too so a
/// single-period series is still visible.
pub fn line_chart(ui: &mut Ui, chart: &LineChart, granularity: Granularity) {
    let coords: Vec<[f64; 2]> = chart
        .points
        .iter()
        .map(|(day, value)| [day_to_x(*day), *value])
        .collect();

    let kind = chart.kind;
    Plot::new(chart.title)
        .height(CHART_HEIGHT)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            x_to_label(mark.value, granularity)
        })
        .label_formatter(move |_name: &str, point: &PlotPoint| {
            format!(
                "{}\n{}",
                x_to_label(point.x, granularity),
                format_value(kind, point.y)
            )
        })
        .include_y(0.0)
        .allow_scroll(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let points: PlotPoints = coords.iter().copied().collect();
            plot_ui.line(
                Line::new(points)
                    .name(chart.title)
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            let markers: PlotPoints = coords.iter().copied().collect();
            plot_ui.points(Points::new(markers).radius(3.0).color(Color32::LIGHT_BLUE));
        });
}

// ---------------------------------------------------------------------------
// Categorical bar chart
// ---------------------------------------------------------------------------

/// Render a ranked table as bars at x = 0, 1, 2, … labelled by name.
pub fn bar_chart(ui: &mut Ui, chart: &BarChart, colors: &ColorMap) {
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Bar::new(i as f64, *value)
                .name(label)
                .fill(colors.color_for(label))
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = chart.bars.iter().map(|(label, _)| label.clone()).collect();

    Plot::new(chart.title)
        .height(CHART_HEIGHT)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            bar_label(&labels, mark.value)
        })
        .include_y(0.0)
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(PlotBarChart::new(bars).name(chart.title));
        });
}

/// Label for the bar at an integer x, empty between bars.
fn bar_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}
