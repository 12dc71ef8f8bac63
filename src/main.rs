mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::MarketingLensApp;
use eframe::egui;
use marketing_lens::config::DashboardConfig;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring invalid configuration: {e:#}");
            DashboardConfig::default()
        }
    };

    let mut state = AppState::new(config);
    // Optional dataset to open on startup.
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        state.load_path(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Marketing Lens – Campaign Dashboard",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(MarketingLensApp::new(state)))
        }),
    )
}
