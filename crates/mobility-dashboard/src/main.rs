#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use mobility_dashboard::MobilityDashboardApp;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("Failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };
    // Keep the runtime alive for the lifetime of the UI; tasks spawn onto it
    // via its handle.
    let _guard = rt.enter();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Mobility Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Mobility Dashboard",
        native_options,
        Box::new(|cc| Ok(Box::new(MobilityDashboardApp::new(cc)))),
    )
}
