use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{Granularity, Selection};
use crate::data::loader::load_file;
use crate::data::model::OrderDataset;
use crate::view::{ViewModel, render};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file is loaded). Never mutated after load.
    pub dataset: Option<Arc<OrderDataset>>,

    /// Current filter choices.
    pub selection: Option<Selection>,

    /// Output of the last full render.
    pub view: Option<ViewModel>,

    /// Stable colours for status and category bars.
    pub status_colors: ColorMap,
    pub category_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            selection: None,
            view: None,
            status_colors: ColorMap::default(),
            category_colors: ColorMap::default(),
            status_message: None,
        }
    }

    /// Load an order export from disk and make it the active dataset.
    ///
    /// On error the previous dataset (if any) stays active.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let dataset = load_file(path)?;
        log::info!(
            "Loaded {} order rows from {} ({} statuses, {} categories)",
            dataset.len(),
            path.display(),
            dataset.statuses.len(),
            dataset.categories.len()
        );
        if dataset.is_empty() {
            log::warn!("{} contains no order rows", path.display());
        }
        self.set_dataset(dataset);
        Ok(())
    }

    /// Ingest a newly loaded dataset and reset the selection to "everything".
    pub fn set_dataset(&mut self, dataset: OrderDataset) {
        self.status_colors = ColorMap::new(&dataset.statuses);
        self.category_colors = ColorMap::new(&dataset.categories);
        self.selection = Some(Selection::for_dataset(&dataset));
        self.dataset = Some(Arc::new(dataset));
        self.status_message = None;
        self.refresh();
    }

    /// Re-run the whole filter → aggregate → present pipeline.
    pub fn refresh(&mut self) {
        self.view = match (&self.dataset, &self.selection) {
            (Some(ds), Some(sel)) => Some(render(ds, sel, &self.config)),
            _ => None,
        };
    }

    /// Apply `f` to the selection, keep it within the dataset, then re-render.
    fn update_selection(&mut self, f: impl FnOnce(&mut Selection)) {
        let (Some(ds), Some(sel)) = (&self.dataset, &mut self.selection) else {
            return;
        };
        f(sel);
        sel.clamp_to(ds);
        self.refresh();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.update_selection(|sel| {
            sel.start = start;
            sel.end = end;
        });
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.update_selection(|sel| sel.granularity = granularity);
    }

    /// Add or remove one status from the status filter.
    pub fn toggle_status(&mut self, status: &str) {
        self.update_selection(|sel| toggle(&mut sel.statuses, status));
    }

    /// Add or remove one category from the category filter.
    pub fn toggle_category(&mut self, category: &str) {
        self.update_selection(|sel| toggle(&mut sel.categories, category));
    }

    /// Empty both set filters (i.e. show every status and category).
    pub fn clear_filters(&mut self) {
        self.update_selection(|sel| {
            sel.statuses.clear();
            sel.categories.clear();
        });
    }
}

fn toggle(set: &mut std::collections::BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
