// src/actuator.rs

//! The volume-gated actuator: moves a platform toward one bound while the
//! microphone is loud and back toward the other bound while it is quiet.
use crate::audio_input::{AudioInput, StreamHandle};
use crate::error::{ActuatorError, ActuatorResult};
use crate::loudness::{self, WINDOW_SIZE};
use crate::transform::PositionSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Vertical direction of travel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    #[inline]
    fn sign(self) -> f32 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Raise on sound"),
            Direction::Down => write!(f, "Lower on sound"),
        }
    }
}

/// Tuning for one actuator. Offsets are relative to the rest position
/// captured at [`VolumeGatedActuator::initialize`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Loudness the signal has to exceed to count as "sound".
    pub volume_threshold: f32,
    /// Gain applied to the mean amplitude before the threshold compare.
    pub sensitivity: f32,
    /// Upward speed in units per second.
    pub rise_speed: f32,
    /// Downward speed in units per second.
    pub lower_speed: f32,
    pub min_offset: f32,
    pub max_offset: f32,
    /// Where the platform heads while loud. It heads the other way while quiet.
    pub active_direction: Direction,
}

impl ActuatorConfig {
    /// Platform that sinks while there is sound and comes back up in silence.
    pub fn lowering() -> Self {
        Self {
            volume_threshold: 0.05,
            sensitivity: 2.0,
            rise_speed: 2.0,
            lower_speed: 3.0,
            min_offset: -3.0,
            max_offset: 0.0,
            active_direction: Direction::Down,
        }
    }

    /// Platform that rises while there is sound and settles back in silence.
    pub fn raising() -> Self {
        Self {
            volume_threshold: 0.05,
            sensitivity: 2.0,
            rise_speed: 3.0,
            lower_speed: 2.0,
            min_offset: 0.0,
            max_offset: 3.0,
            active_direction: Direction::Up,
        }
    }

    pub fn validate(&self) -> ActuatorResult<()> {
        let fields = [
            ("volume_threshold", self.volume_threshold),
            ("sensitivity", self.sensitivity),
            ("rise_speed", self.rise_speed),
            ("lower_speed", self.lower_speed),
            ("min_offset", self.min_offset),
            ("max_offset", self.max_offset),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ActuatorError::InvalidConfig(format!("{} must be finite", name)));
        }
        if self.sensitivity < 0.0 || self.rise_speed < 0.0 || self.lower_speed < 0.0 {
            return Err(ActuatorError::InvalidConfig(
                "sensitivity and speeds must not be negative".into(),
            ));
        }
        if self.min_offset > self.max_offset {
            return Err(ActuatorError::InvalidConfig(format!(
                "min_offset ({}) is above max_offset ({})",
                self.min_offset, self.max_offset
            )));
        }
        Ok(())
    }

    pub fn speed(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Up => self.rise_speed,
            Direction::Down => self.lower_speed,
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self::raising()
    }
}

/// Per-run state, recreated on every successful initialize.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorState {
    pub rest_position: f32,
    pub current_position: f32,
    /// Direction of the last movement.
    pub direction: Direction,
}

impl ActuatorState {
    fn at_rest(rest_position: f32, config: &ActuatorConfig) -> Self {
        Self {
            rest_position,
            current_position: rest_position,
            direction: config.active_direction.opposite(),
        }
    }

    /// Absolute `(lower, upper)` limits for this run.
    pub fn bounds(&self, config: &ActuatorConfig) -> (f32, f32) {
        (
            self.rest_position + config.min_offset,
            self.rest_position + config.max_offset,
        )
    }
}

/// One control step. Movement toward the target bound only happens while
/// that bound has not been reached; the clamp afterwards always runs.
fn step(config: &ActuatorConfig, state: &mut ActuatorState, loudness: f32, dt: f32) {
    let (lower, upper) = state.bounds(config);
    let active = loudness > config.volume_threshold;
    let heading = if active {
        config.active_direction
    } else {
        config.active_direction.opposite()
    };
    let short_of_bound = match heading {
        Direction::Up => state.current_position < upper,
        Direction::Down => state.current_position > lower,
    };
    if short_of_bound {
        state.current_position += heading.sign() * config.speed(heading) * dt.max(0.0);
        state.direction = heading;
    }
    state.current_position = state.current_position.clamp(lower, upper);
}

/// Drives a position from microphone loudness.
///
/// Until [`initialize`](Self::initialize) succeeds, and after
/// [`shutdown`](Self::shutdown), the actuator is inert and ticks do nothing.
pub struct VolumeGatedActuator<I: AudioInput> {
    config: ActuatorConfig,
    input: I,
    preferred_device: Option<String>,
    stream: Option<StreamHandle>,
    state: Option<ActuatorState>,
    last_loudness: f32,
}

impl<I: AudioInput> VolumeGatedActuator<I> {
    pub fn new(config: ActuatorConfig, input: I) -> ActuatorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            input,
            preferred_device: None,
            stream: None,
            state: None,
            last_loudness: 0.0,
        })
    }

    /// Capture from the named device when it exists instead of the first one.
    pub fn with_preferred_device(mut self, device: Option<String>) -> Self {
        self.preferred_device = device;
        self
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&ActuatorState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some() && self.state.is_some()
    }

    /// Loudness seen by the most recent tick.
    pub fn last_loudness(&self) -> f32 {
        self.last_loudness
    }

    #[cfg(test)]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Records `rest_position` and acquires the capture device.
    ///
    /// Any failure leaves the actuator inert; the host keeps running.
    pub fn initialize(&mut self, rest_position: f32) -> ActuatorResult<()> {
        self.shutdown();

        let devices = match self.input.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Failed to enumerate audio input devices: {}", e);
                return Err(e.into());
            }
        };
        if devices.is_empty() {
            warn!("No microphone detected, actuator stays inert");
            return Err(ActuatorError::DeviceUnavailable);
        }

        let device = match &self.preferred_device {
            Some(name) if devices.contains(name) => name.clone(),
            Some(name) => {
                warn!(preferred = %name, fallback = %devices[0], "preferred input device missing");
                devices[0].clone()
            }
            None => devices[0].clone(),
        };

        let handle = match self.input.start_capture(&device) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(device = %device, "Failed to start capture: {}", e);
                return Err(e.into());
            }
        };

        self.stream = Some(handle);
        self.state = Some(ActuatorState::at_rest(rest_position, &self.config));
        self.last_loudness = 0.0;
        info!(
            device = %device,
            rest_position,
            direction = ?self.config.active_direction,
            "actuator initialized"
        );
        Ok(())
    }

    /// Applies one step to the internal position using `window` as the
    /// audio input. Returns the new position, or `None` while inert.
    pub fn tick_window(&mut self, window: Option<&[f32]>, dt: f32) -> Option<f32> {
        if self.stream.is_none() {
            return None;
        }
        let state = self.state.as_mut()?;
        self.last_loudness = loudness::loudness(window, self.config.sensitivity);
        step(&self.config, state, self.last_loudness, dt);
        Some(state.current_position)
    }

    /// Per-frame entry point: reads the latest window from the input, takes
    /// the current height from `sink`, steps, and writes the height back.
    pub fn tick<S: PositionSink + ?Sized>(&mut self, dt: f32, sink: &mut S) {
        let Some(handle) = self.stream else {
            return;
        };
        let window = self.input.read_latest_samples(handle, WINDOW_SIZE);
        let position = sink.position();
        if let Some(state) = self.state.as_mut() {
            state.current_position = position.y;
        }
        if let Some(y) = self.tick_window(window.as_deref(), dt) {
            sink.set_position(position.with_y(y));
        }
    }

    /// Releases the capture device. Safe to call any number of times.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.stream.take() {
            self.input.stop_capture(handle);
            debug!("actuator released its audio input");
        }
        self.state = None;
        self.last_loudness = 0.0;
    }
}

impl<I: AudioInput> Drop for VolumeGatedActuator<I> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_input::testing::FakeInput;
    use crate::transform::{Transform, Vec3};
    use proptest::prelude::*;

    const DT: f32 = 0.1;

    fn started(config: ActuatorConfig, rest: f32) -> VolumeGatedActuator<FakeInput> {
        let mut actuator = VolumeGatedActuator::new(config, FakeInput::with_device("mic")).unwrap();
        actuator.initialize(rest).unwrap();
        actuator
    }

    fn window(level: f32) -> Vec<f32> {
        vec![level; WINDOW_SIZE]
    }

    #[test]
    fn loud_input_lowers_at_lower_speed_then_holds() {
        let mut actuator = started(ActuatorConfig::lowering(), 0.0);
        let loud = window(0.04);

        for i in 1..10 {
            let y = actuator.tick_window(Some(&loud), DT).unwrap();
            assert!((y + 0.3 * i as f32).abs() < 1e-4, "tick {}: {}", i, y);
        }
        for _ in 0..5 {
            actuator.tick_window(Some(&loud), DT);
        }
        assert_eq!(actuator.state().unwrap().current_position, -3.0);
        assert_eq!(actuator.state().unwrap().direction, Direction::Down);
        assert!((actuator.last_loudness() - 0.08).abs() < 1e-6);
    }

    #[test]
    fn quiet_input_returns_to_rest_at_rise_speed() {
        let mut actuator = started(ActuatorConfig::lowering(), 1.0);
        let loud = window(0.5);
        for _ in 0..40 {
            actuator.tick_window(Some(&loud), DT);
        }
        assert_eq!(actuator.state().unwrap().current_position, -2.0);

        let quiet = window(0.0);
        let y = actuator.tick_window(Some(&quiet), DT).unwrap();
        assert!((y - (-2.0 + 0.2)).abs() < 1e-5);
        assert_eq!(actuator.state().unwrap().direction, Direction::Up);

        for _ in 0..40 {
            actuator.tick_window(Some(&quiet), DT);
        }
        assert_eq!(actuator.state().unwrap().current_position, 1.0);
    }

    #[test]
    fn raising_variant_mirrors_lowering() {
        let mut actuator = started(ActuatorConfig::raising(), 0.0);
        let y = actuator.tick_window(Some(&window(0.1)), DT).unwrap();
        assert!((y - 0.3).abs() < 1e-6);

        let y = actuator.tick_window(Some(&window(0.0)), DT).unwrap();
        assert!((y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn threshold_is_strict() {
        let mut config = ActuatorConfig::raising();
        config.sensitivity = 1.0;
        config.volume_threshold = 0.5;
        let mut actuator = started(config, 0.0);
        let y = actuator.tick_window(Some(&window(0.5)), DT).unwrap();
        assert_eq!(y, 0.0);
    }

    #[test]
    fn missing_window_counts_as_silence() {
        let mut actuator = started(ActuatorConfig::lowering(), 0.0);
        actuator.tick_window(Some(&window(1.0)), DT);
        let before = actuator.state().unwrap().current_position;
        let after = actuator.tick_window(None, DT).unwrap();
        assert_eq!(actuator.last_loudness(), 0.0);
        assert!(after > before);
    }

    #[test]
    fn straddling_the_threshold_jitters() {
        let mut actuator = started(ActuatorConfig::raising(), 0.0);
        let loud = window(0.1);
        let quiet = window(0.0);
        let mut heights = Vec::new();
        for i in 0..6 {
            let w = if i % 2 == 0 { &loud } else { &quiet };
            heights.push(actuator.tick_window(Some(w), DT).unwrap());
        }
        for pair in heights.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn no_device_leaves_actuator_inert() {
        let mut actuator =
            VolumeGatedActuator::new(ActuatorConfig::lowering(), FakeInput::without_devices()).unwrap();
        let result = actuator.initialize(0.0);
        assert!(matches!(result, Err(ActuatorError::DeviceUnavailable)));
        assert!(!actuator.is_active());

        let mut sink = Transform::at(Vec3::new(1.0, 2.0, 3.0));
        for _ in 0..10 {
            actuator.tick(DT, &mut sink);
        }
        assert_eq!(sink.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(actuator.tick_window(Some(&window(1.0)), DT).is_none());
    }

    #[test]
    fn tick_moves_only_y() {
        let mut input = FakeInput::with_device("mic");
        input.set_level(0.2);
        let mut actuator = VolumeGatedActuator::new(ActuatorConfig::raising(), input).unwrap();
        let mut sink = Transform::at(Vec3::new(4.0, 1.0, -2.0));
        actuator.initialize(sink.position.y).unwrap();

        actuator.tick(0.5, &mut sink);
        assert_eq!(sink.position, Vec3::new(4.0, 2.5, -2.0));
    }

    #[test]
    fn tick_follows_external_moves_of_the_sink() {
        let mut input = FakeInput::with_device("mic");
        input.set_level(0.0);
        let mut actuator = VolumeGatedActuator::new(ActuatorConfig::raising(), input).unwrap();
        let mut sink = Transform::default();
        actuator.initialize(0.0).unwrap();

        sink.position.y = 10.0;
        actuator.tick(DT, &mut sink);
        assert_eq!(sink.position.y, 3.0);
    }

    #[test]
    fn unfilled_capture_reads_as_silence() {
        let mut actuator =
            VolumeGatedActuator::new(ActuatorConfig::raising(), FakeInput::with_device("mic")).unwrap();
        let mut sink = Transform::default();
        actuator.initialize(0.0).unwrap();
        actuator.tick(DT, &mut sink);
        assert_eq!(sink.position.y, 0.0);
        assert_eq!(actuator.last_loudness(), 0.0);
    }

    #[test]
    fn preferred_device_is_used_when_present() {
        let mut input = FakeInput::with_device("built-in");
        input.devices.push("usb".into());
        let mut actuator = VolumeGatedActuator::new(ActuatorConfig::raising(), input)
            .unwrap()
            .with_preferred_device(Some("usb".into()));
        actuator.initialize(0.0).unwrap();
        assert_eq!(actuator.input().started_on, vec!["usb".to_string()]);
    }

    #[test]
    fn missing_preferred_device_falls_back_to_first() {
        let mut actuator =
            VolumeGatedActuator::new(ActuatorConfig::raising(), FakeInput::with_device("built-in"))
                .unwrap()
                .with_preferred_device(Some("usb".into()));
        actuator.initialize(0.0).unwrap();
        assert_eq!(actuator.input().started_on, vec!["built-in".to_string()]);
    }

    #[test]
    fn shutdown_then_initialize_matches_fresh_instance() {
        let mut reused = started(ActuatorConfig::lowering(), 0.5);
        for _ in 0..7 {
            reused.tick_window(Some(&window(0.3)), DT);
        }
        reused.shutdown();
        assert!(!reused.is_active());
        assert_eq!(reused.input().stops.get(), 1);
        reused.initialize(0.5).unwrap();

        let mut fresh = started(ActuatorConfig::lowering(), 0.5);
        assert_eq!(reused.state(), fresh.state());

        let levels = [0.3, 0.3, 0.0, 0.2, 0.0, 0.0, 0.4];
        for level in levels {
            let w = window(level);
            assert_eq!(reused.tick_window(Some(&w), DT), fresh.tick_window(Some(&w), DT));
        }
    }

    #[test]
    fn reinitialize_releases_previous_capture() {
        let mut actuator = started(ActuatorConfig::raising(), 0.0);
        actuator.initialize(2.0).unwrap();
        assert_eq!(actuator.input().stops.get(), 1);
        assert_eq!(actuator.state().unwrap().rest_position, 2.0);
    }

    #[test]
    fn drop_releases_the_device() {
        let input = FakeInput::with_device("mic");
        let stops = input.stops.clone();
        let mut actuator = VolumeGatedActuator::new(ActuatorConfig::raising(), input).unwrap();
        actuator.initialize(0.0).unwrap();
        drop(actuator);
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut actuator = started(ActuatorConfig::raising(), 0.0);
        actuator.shutdown();
        actuator.shutdown();
        assert_eq!(actuator.input().stops.get(), 1);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut inverted = ActuatorConfig::raising();
        inverted.min_offset = 1.0;
        inverted.max_offset = -1.0;
        assert!(matches!(
            VolumeGatedActuator::new(inverted, FakeInput::default()),
            Err(ActuatorError::InvalidConfig(_))
        ));

        let mut nan = ActuatorConfig::lowering();
        nan.sensitivity = f32::NAN;
        assert!(nan.validate().is_err());

        let mut negative = ActuatorConfig::lowering();
        negative.rise_speed = -1.0;
        assert!(negative.validate().is_err());

        assert!(ActuatorConfig::lowering().validate().is_ok());
        assert!(ActuatorConfig::raising().validate().is_ok());
    }

    fn any_config() -> impl Strategy<Value = ActuatorConfig> {
        (
            0.0f32..0.5,
            0.0f32..5.0,
            0.0f32..10.0,
            0.0f32..10.0,
            -5.0f32..0.0,
            0.0f32..5.0,
            any::<bool>(),
        )
            .prop_map(|(threshold, sensitivity, rise, lower, min, max, up)| ActuatorConfig {
                volume_threshold: threshold,
                sensitivity,
                rise_speed: rise,
                lower_speed: lower,
                min_offset: min,
                max_offset: max,
                active_direction: if up { Direction::Up } else { Direction::Down },
            })
    }

    proptest! {
        #[test]
        fn position_stays_within_bounds(
            config in any_config(),
            rest in -100.0f32..100.0,
            ticks in prop::collection::vec((0.0f32..1.0, 0.0f32..0.5), 1..200),
        ) {
            let mut actuator = started(config.clone(), rest);
            let (lower, upper) = actuator.state().unwrap().bounds(&config);
            for (level, dt) in ticks {
                let y = actuator.tick_window(Some(&window(level)), dt).unwrap();
                prop_assert!(y >= lower && y <= upper, "{} outside [{}, {}]", y, lower, upper);
            }
        }

        #[test]
        fn loud_input_approaches_active_bound_monotonically(
            config in any_config(),
            ticks in 1usize..100,
        ) {
            let mut actuator = started(config.clone(), 0.0);
            let level = 1.0;
            let loudness = level * config.sensitivity;
            prop_assume!(loudness > config.volume_threshold);

            let mut previous = 0.0f32;
            for _ in 0..ticks {
                let y = actuator.tick_window(Some(&window(level)), DT).unwrap();
                match config.active_direction {
                    Direction::Up => prop_assert!(y >= previous),
                    Direction::Down => prop_assert!(y <= previous),
                }
                previous = y;
            }
        }
    }
}
