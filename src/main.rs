#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod actuator;
mod app;
mod audio_device;
mod audio_input;
mod audio_io;
mod error;
mod loudness;
mod replay;
mod settings;
mod transform;
mod ui;

use crate::app::SonoliftApp;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_title("Sonolift"),
        ..Default::default()
    };

    let run_result = eframe::run_native(
        "Sonolift",
        native_options,
        Box::new(|cc| {
            let app = SonoliftApp::new(cc)?;
            Ok(Box::new(app))
        }),
    );

    if let Err(e) = run_result {
        return Err(anyhow::anyhow!("Eframe run error: {}", e));
    }

    Ok(())
}
