use crate::app::SonoliftApp;
use crate::ui;
use egui::{CentralPanel, RichText, TopBottomPanel};

pub fn draw_main_view(app: &mut SonoliftApp, ctx: &egui::Context) {
    TopBottomPanel::top("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let state = if app.is_running() { "Listening" } else { "Stopped" };
            ui.label(RichText::new(state).monospace().strong());
            ui.separator();
            ui.label(
                RichText::new(format!("Loudness: {:.3}", app.displayed_loudness)).monospace(),
            );
            ui.separator();
            ui.label(RichText::new(format!("Height: {:.2}", app.platform.position.y)).monospace());
        });
    });

    ui::draw_options_panel(app, ctx);

    CentralPanel::default().show(ctx, |ui| {
        ui::draw_platform_view(app, ui);
    });
}
