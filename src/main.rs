pub mod catalog;
pub mod config;
pub mod input;
pub mod launcher;
pub mod status;
pub mod thumbnail;
pub mod ui;
pub mod wheel;

use crate::catalog::Catalog;
use crate::config::LauncherConfig;
use crate::input::{EventMerger, InputHandle, InputSettings};
use crate::status::NetworkMonitor;
use crate::ui::CarouselApp;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = LauncherConfig::default_path();
    let config = LauncherConfig::load_or_create(&config_path).await?;

    let catalog = Catalog::scan(&config.apps_dir, &config.entry_point)
        .await
        .map_err(|e| eyre!("Failed to scan applications: {}", e))?;

    let (event_sender, event_receiver) = mpsc::channel(config.input.queue_capacity.max(1));

    // Samplers degrade to idle without GPIO, so only thread spawning can fail here
    let input_handle = InputHandle::spawn(InputSettings::from(&config.input), event_sender)
        .map_err(|e| eyre!("Failed to spawn input samplers: {}", e))?;

    let network_monitor = NetworkMonitor::spawn(
        Duration::from_secs(config.status.network_poll_secs.max(1)),
        config.status.probe_target.clone(),
    );
    let network = network_monitor.subscribe();

    info!("Starting launcher UI");
    let native_options = native_options(&config);
    let result = eframe::run_native(
        "Carousel",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(CarouselApp::new(
                cc,
                config,
                catalog,
                EventMerger::new(event_receiver),
                network,
            )))
        }),
    );

    input_handle.shutdown();
    network_monitor.shutdown().await;
    info!("Launcher stopped");

    result.map_err(|e| eyre!("UI terminated with error: {}", e))
}

fn native_options(config: &LauncherConfig) -> eframe::NativeOptions {
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("Carousel")
        .with_inner_size([config.screen.width, config.screen.height])
        .with_fullscreen(config.fullscreen);
    native_options
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
