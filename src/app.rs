// src/app.rs
use crate::actuator::VolumeGatedActuator;
use crate::audio_device;
use crate::audio_input::AudioInput;
use crate::audio_io::{CaptureOptions, CpalInput};
use crate::replay::WavReplayInput;
use crate::settings::{self, AppSettings};
use crate::transform::{Transform, Vec3};
use crate::ui;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

pub type SceneActuator = VolumeGatedActuator<Box<dyn AudioInput>>;

/// Height the platform spawns at in the scene.
pub const SPAWN_HEIGHT: f32 = 0.0;

pub struct SonoliftApp {
    pub settings: AppSettings,
    pub host_names: Vec<String>,
    pub input_devices: Vec<String>,
    /// Text of the replay path field; only copied into the settings on start.
    pub replay_path_text: String,
    pub actuator: Option<SceneActuator>,
    pub platform: Transform,
    /// Last initialize or configuration problem, shown in the side panel.
    pub status: Option<String>,
    pub displayed_loudness: f32,
}

impl SonoliftApp {
    pub fn new(_cc: &eframe::CreationContext) -> Result<Self> {
        let settings = settings::load_settings();
        let replay_path_text = settings
            .replay_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut app = Self {
            settings,
            host_names: audio_device::get_host_names(),
            input_devices: Vec::new(),
            replay_path_text,
            actuator: None,
            platform: Transform::at(Vec3::new(0.0, SPAWN_HEIGHT, 0.0)),
            status: None,
            displayed_loudness: 0.0,
        };
        app.refresh_input_devices();
        if app.settings.auto_start {
            app.start();
        }
        Ok(app)
    }

    pub fn is_running(&self) -> bool {
        self.actuator.as_ref().is_some_and(|a| a.is_active())
    }

    pub fn refresh_input_devices(&mut self) {
        let host_id = audio_device::resolve_host_id(self.settings.host_name.as_deref());
        self.input_devices = match audio_device::get_input_devices(host_id) {
            Ok(devices) => devices.into_iter().map(|(name, _)| name).collect(),
            Err(e) => {
                warn!("Failed to list input devices: {}", e);
                Vec::new()
            }
        };
    }

    fn make_input(&self) -> Box<dyn AudioInput> {
        match &self.settings.replay_file {
            Some(path) => Box::new(WavReplayInput::new(path.clone())),
            None => Box::new(CpalInput::new(CaptureOptions {
                host_id: audio_device::resolve_host_id(self.settings.host_name.as_deref()),
                sample_rate: self.settings.sample_rate,
                buffer_size: self.settings.buffer_size,
                history_seconds: self.settings.capture_seconds,
            })),
        }
    }

    /// Puts the platform back at its spawn height and starts a fresh
    /// actuator on it.
    pub fn start(&mut self) {
        self.stop();
        let trimmed = self.replay_path_text.trim();
        self.settings.replay_file = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));

        self.platform.position.y = SPAWN_HEIGHT;
        let preferred = match self.settings.replay_file {
            Some(_) => None,
            None => self.settings.input_device.clone(),
        };
        let mut actuator = match VolumeGatedActuator::new(self.settings.actuator.clone(), self.make_input()) {
            Ok(actuator) => actuator.with_preferred_device(preferred),
            Err(e) => {
                warn!("{}", e);
                self.status = Some(e.to_string());
                return;
            }
        };
        self.status = match actuator.initialize(self.platform.position.y) {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        };
        self.actuator = Some(actuator);
    }

    pub fn stop(&mut self) {
        if let Some(mut actuator) = self.actuator.take() {
            actuator.shutdown();
            info!("actuator stopped");
        }
        self.displayed_loudness = 0.0;
    }
}

impl eframe::App for SonoliftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt);

        if let Some(actuator) = self.actuator.as_mut() {
            actuator.tick(dt, &mut self.platform);
            self.displayed_loudness = (self.displayed_loudness * 0.95).max(actuator.last_loudness());
        }

        // Ticks are driven by frames, so keep frames coming.
        ctx.request_repaint();

        ui::draw_main_view(self, ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop();
        settings::save_settings(&self.settings);
    }
}
