// src/ui/options_view.rs

use crate::actuator::{ActuatorConfig, Direction};
use crate::app::SonoliftApp;
use egui::{Button, ComboBox, DragValue, Grid, RichText, SidePanel, TextEdit, Ui};

const SAMPLE_RATES: [u32; 4] = [44100, 48000, 88200, 96000];

fn optional_label(value: Option<&str>) -> String {
    value.unwrap_or("Default").to_string()
}

pub fn draw_options_panel(app: &mut SonoliftApp, ctx: &egui::Context) {
    let mut start_clicked = false;
    let mut stop_clicked = false;
    let mut host_changed = false;
    let running = app.is_running();

    SidePanel::left("options_panel")
        .resizable(false)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading("Audio Input");
            ui.add_space(6.0);

            ui.add_enabled_ui(!running, |ui| {
                let host_text = optional_label(app.settings.host_name.as_deref());
                ComboBox::from_label("Host")
                    .selected_text(host_text)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(app.settings.host_name.is_none(), "Default").clicked() {
                            app.settings.host_name = None;
                            host_changed = true;
                        }
                        for name in &app.host_names {
                            let selected = app.settings.host_name.as_ref() == Some(name);
                            if ui.selectable_label(selected, name).clicked() {
                                app.settings.host_name = Some(name.clone());
                                host_changed = true;
                            }
                        }
                    });

                let device_text = app
                    .settings
                    .input_device
                    .clone()
                    .unwrap_or_else(|| "First available".to_string());
                ComboBox::from_label("Device")
                    .selected_text(device_text)
                    .width(180.0)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut app.settings.input_device, None, "First available");
                        for name in &app.input_devices {
                            ui.selectable_value(&mut app.settings.input_device, Some(name.clone()), name);
                        }
                    });
                if app.input_devices.is_empty() {
                    ui.label("No input devices found");
                }

                let rate_text = app
                    .settings
                    .sample_rate
                    .map(|sr| format!("{} Hz", sr))
                    .unwrap_or_else(|| "Default".to_string());
                ComboBox::from_label("Sample Rate")
                    .selected_text(rate_text)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut app.settings.sample_rate, None, "Default");
                        for sr in SAMPLE_RATES {
                            ui.selectable_value(&mut app.settings.sample_rate, Some(sr), format!("{} Hz", sr));
                        }
                    });

                ui.add_space(4.0);
                ui.label("Replay WAV instead of microphone:");
                ui.add(TextEdit::singleline(&mut app.replay_path_text).hint_text("path/to/file.wav"));
            });

            ui.separator();
            ui.heading("Platform");
            ui.add_space(6.0);

            ui.add_enabled_ui(!running, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Raise preset").clicked() {
                        app.settings.actuator = ActuatorConfig::raising();
                    }
                    if ui.button("Lower preset").clicked() {
                        app.settings.actuator = ActuatorConfig::lowering();
                    }
                });
                draw_actuator_fields(ui, &mut app.settings.actuator);
            });

            ui.separator();
            ui.horizontal(|ui| {
                if ui.add_enabled(!running, Button::new("Start")).clicked() {
                    start_clicked = true;
                }
                if ui.add_enabled(app.actuator.is_some(), Button::new("Stop")).clicked() {
                    stop_clicked = true;
                }
            });

            if let Some(status) = &app.status {
                ui.add_space(4.0);
                ui.label(RichText::new(status).color(ui.visuals().warn_fg_color));
            }
        });

    if host_changed {
        app.settings.input_device = None;
        app.refresh_input_devices();
    }
    if stop_clicked {
        app.stop();
    }
    if start_clicked {
        app.start();
    }
}

fn draw_actuator_fields(ui: &mut Ui, config: &mut ActuatorConfig) {
    Grid::new("actuator_fields")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Active direction");
            ComboBox::from_id_salt("active_direction")
                .selected_text(config.active_direction.to_string())
                .show_ui(ui, |ui| {
                    for direction in [Direction::Up, Direction::Down] {
                        ui.selectable_value(&mut config.active_direction, direction, direction.to_string());
                    }
                });
            ui.end_row();

            ui.label("Volume threshold");
            ui.add(DragValue::new(&mut config.volume_threshold).speed(0.001).range(0.0..=1.0));
            ui.end_row();

            ui.label("Sensitivity");
            ui.add(DragValue::new(&mut config.sensitivity).speed(0.01).range(0.0..=100.0));
            ui.end_row();

            ui.label("Rise speed");
            ui.add(DragValue::new(&mut config.rise_speed).speed(0.05).range(0.0..=50.0).suffix(" u/s"));
            ui.end_row();

            ui.label("Lower speed");
            ui.add(DragValue::new(&mut config.lower_speed).speed(0.05).range(0.0..=50.0).suffix(" u/s"));
            ui.end_row();

            ui.label("Min offset");
            ui.add(DragValue::new(&mut config.min_offset).speed(0.05));
            ui.end_row();

            ui.label("Max offset");
            ui.add(DragValue::new(&mut config.max_offset).speed(0.05));
            ui.end_row();
        });
}
