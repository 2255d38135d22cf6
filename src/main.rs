mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;
mod view;

use anyhow::{Context, Result, anyhow};
use app::SalesDashboardApp;
use config::{DashboardConfig, Startup, USAGE};
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = match DashboardConfig::from_env()? {
        Startup::PrintHelp => {
            println!("{USAGE}");
            return Ok(());
        }
        Startup::Run(config) => config,
    };

    let mut state = AppState::new(config.clone());
    // A dataset named at startup must load; the dashboard cannot start without it.
    if let Some(path) = &config.data_path {
        state
            .load_path(path)
            .context("cannot start without the requested dataset")?;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("UI error: {e}"))
}
