//! The stage: in-process presentation state driven by named actions.
//!
//! Every tier of the presentation (core, visual, motion, particle, pulse,
//! sound, memory, log, utils) is exposed as actions in the registry so that
//! sequences and voice bindings can reach it by id. Timed effects (message
//! expiry, color flash revert) run as tokio tasks and are skipped when no
//! runtime is present.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lux_core::action::{Action, ActionResult, InMemoryActionRegistry};
use lux_core::clock::Clock;
use lux_core::error::DomainError;
use lux_script::application::scheduler::CueScheduler;
use lux_script::domain::sequence::Cue;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Base rotation speed; `motion.double_speed` applies a multiplier to it.
pub const BASE_ROTATION_SPEED: f64 = 0.01;

/// Audio cue played by `sound.pulse`.
pub const PULSE_SOUND: &str = "pulseSound";

/// Volume `sound.pulse` plays at.
pub const PULSE_SOUND_VOLUME: f32 = 0.5;

/// Name of the sample sequence run by `payload.core_sequence`.
pub const CORE_SEQUENCE: &str = "coreSequence";

/// How long an emitted message stays fully visible.
pub const MESSAGE_VISIBLE: Duration = Duration::from_secs(5);

/// Fade-out time after which an emitted message is removed.
pub const MESSAGE_FADE: Duration = Duration::from_secs(1);

/// How long `visual.flash` shows its random color before reverting to cyan.
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

const MINI_SPIRALS_PER_SPAWN: u32 = 5;

/// Phrases bound at startup, with the action each one triggers.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("reset", "core.reset"),
    ("pulse", "pulse.trigger"),
    ("run sequence", "payload.core_sequence"),
    ("what time is it", "utils.time"),
    ("pause", "motion.pause"),
    ("resume", "motion.resume"),
    ("toggle particles", "particle.toggle"),
    ("toggle orbs", "memory.toggle_orbs"),
];

/// An RGB color. Valid channels lie in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Color {
    /// The resting color of the stage.
    pub const CYAN: Self = Self {
        r: 0.0,
        g: 1.0,
        b: 1.0,
    };
    /// Warm highlight used by the sample sequence.
    pub const AMBER: Self = Self {
        r: 1.0,
        g: 0.5,
        b: 0.0,
    };

    /// Returns `true` if every channel is within `0.0..=1.0`. NaN is out of
    /// range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|channel| (0.0..=1.0).contains(channel))
    }

    fn random() -> Self {
        Self {
            r: rand::random(),
            g: rand::random(),
            b: rand::random(),
        }
    }
}

/// Playback options for an audio cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundOptions {
    /// Playback volume, `0.0..=1.0`.
    pub volume: f32,
    /// Whether the cue repeats until stopped.
    pub looped: bool,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looped: false,
        }
    }
}

/// An audio cue that is currently playing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayingSound {
    /// Audio cue id.
    pub id: String,
    /// Options it was started with.
    pub options: SoundOptions,
}

/// A message on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMessage {
    /// Unique per stage; identifies the message for its expiry.
    pub id: u64,
    /// Displayed text.
    pub text: String,
}

/// Snapshot of everything the stage shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StageState {
    /// Color of the spiral and the mini spirals.
    pub color: Color,
    /// Spiral rotation per frame.
    pub rotation_speed: f64,
    /// Whether animation is halted.
    pub paused: bool,
    /// Whether the main spiral is shown.
    pub spiral_visible: bool,
    /// Whether the particle field is shown instead of the spiral.
    pub particles_visible: bool,
    /// Whether the pulse ring is shown.
    pub pulse_visible: bool,
    /// Mini spirals spawned so far.
    pub mini_spirals: u32,
    /// Whether the mini spirals are shown.
    pub mini_spirals_visible: bool,
    /// Whether the memory orbs are shown.
    pub orbs_visible: bool,
    /// Audio cues currently playing.
    pub playing: Vec<PlayingSound>,
    /// Messages currently on screen, oldest first.
    pub messages: Vec<StageMessage>,
}

impl StageState {
    /// Texts of the messages on screen, oldest first.
    #[must_use]
    pub fn message_texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self {
            color: Color::CYAN,
            rotation_speed: BASE_ROTATION_SPEED,
            paused: false,
            spiral_visible: true,
            particles_visible: false,
            pulse_visible: false,
            mini_spirals: 0,
            mini_spirals_visible: false,
            orbs_visible: false,
            playing: Vec::new(),
            messages: Vec::new(),
        }
    }
}

fn lock(state: &Mutex<StageState>) -> MutexGuard<'_, StageState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared stage state. Every operation is synchronous and takes the lock
/// only for the duration of the update.
pub struct Stage {
    state: Arc<Mutex<StageState>>,
    clock: Arc<dyn Clock>,
    next_message: AtomicU64,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl Stage {
    /// Creates a stage in its resting state. `clock` supplies the time for
    /// `utils.time`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StageState::default())),
            clock,
            next_message: AtomicU64::new(0),
        }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StageState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, StageState> {
        lock(&self.state)
    }

    // Applies `update` after `delay` unless the stage has been dropped.
    fn after(&self, delay: Duration, update: impl FnOnce(&mut StageState) + Send + 'static) {
        let Ok(runtime) = Handle::try_current() else {
            debug!("no async runtime; timed stage update skipped");
            return;
        };
        let state = Arc::downgrade(&self.state);
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(state) = state.upgrade() {
                update(&mut lock(&state));
            }
        });
    }

    /// Hides every overlay and message and shows the main spiral. Color and
    /// motion are left as they are.
    pub fn reset(&self) {
        let mut state = self.state();
        state.messages.clear();
        state.particles_visible = false;
        state.spiral_visible = true;
        state.pulse_visible = false;
        state.mini_spirals_visible = false;
        state.orbs_visible = false;
        info!(tier = "core", "interface reset");
    }

    /// Logs the current state.
    pub fn log_state(&self) {
        let state = self.state();
        info!(
            tier = "core",
            spiral_visible = state.spiral_visible,
            particles_visible = state.particles_visible,
            pulse_visible = state.pulse_visible,
            mini_spirals_visible = state.mini_spirals_visible,
            orbs_visible = state.orbs_visible,
            speed = state.rotation_speed,
            paused = state.paused,
            "current state"
        );
    }

    /// Recolors the spiral and mini spirals.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a channel is outside
    /// `0.0..=1.0`; the color is left unchanged.
    pub fn set_color(&self, color: Color) -> Result<(), DomainError> {
        if !color.is_valid() {
            warn!(tier = "visual", r = color.r, g = color.g, b = color.b, "invalid color values");
            return Err(DomainError::Validation(format!(
                "color channels must be within 0..=1, got ({}, {}, {})",
                color.r, color.g, color.b
            )));
        }
        self.state().color = color;
        info!(tier = "visual", r = color.r, g = color.g, b = color.b, "color set");
        Ok(())
    }

    /// Shows a random color for [`FLASH_DURATION`], then returns to cyan.
    pub fn flash(&self) {
        let color = Color::random();
        self.state().color = color;
        info!(tier = "visual", r = color.r, g = color.g, b = color.b, "color flashed");
        self.after(FLASH_DURATION, |state| {
            state.color = Color::CYAN;
            debug!(tier = "visual", "flash reverted");
        });
    }

    /// Sets rotation speed to `multiplier` times [`BASE_ROTATION_SPEED`].
    pub fn set_speed(&self, multiplier: f64) {
        let speed = BASE_ROTATION_SPEED * multiplier;
        self.state().rotation_speed = speed;
        info!(tier = "motion", speed, "rotation speed set");
    }

    /// Halts animation.
    pub fn pause(&self) {
        self.state().paused = true;
        info!(tier = "motion", "animation paused");
    }

    /// Restarts animation.
    pub fn resume(&self) {
        self.state().paused = false;
        info!(tier = "motion", "animation resumed");
    }

    /// Adds `count` mini spirals and shows them.
    pub fn spawn_mini(&self, count: u32) {
        let mut state = self.state();
        state.mini_spirals = state.mini_spirals.saturating_add(count);
        state.mini_spirals_visible = true;
        info!(tier = "particle", count, "spawned mini spirals");
    }

    /// Swaps between the particle field and the main spiral.
    pub fn toggle_particles(&self) {
        let mut state = self.state();
        state.particles_visible = !state.particles_visible;
        state.spiral_visible = !state.particles_visible;
        info!(tier = "particle", on = state.particles_visible, "particles toggled");
    }

    /// Shows the pulse ring.
    pub fn trigger_pulse(&self) {
        self.state().pulse_visible = true;
        info!(tier = "pulse", "pulse triggered");
    }

    /// Starts an audio cue. Playing a cue that is already playing restarts
    /// it with the new options.
    pub fn play(&self, sound: &str, options: SoundOptions) {
        let mut state = self.state();
        state.playing.retain(|playing| playing.id != sound);
        state.playing.push(PlayingSound {
            id: sound.to_owned(),
            options,
        });
        info!(
            tier = "sound",
            sound,
            volume = options.volume,
            looped = options.looped,
            "playing"
        );
    }

    /// Stops an audio cue. Stopping a cue that is not playing does nothing.
    pub fn stop(&self, sound: &str) {
        let mut state = self.state();
        let before = state.playing.len();
        state.playing.retain(|playing| playing.id != sound);
        if state.playing.len() != before {
            info!(tier = "sound", sound, "stopped");
        }
    }

    /// Flips the memory orbs' visibility.
    pub fn toggle_orbs(&self) {
        let mut state = self.state();
        state.orbs_visible = !state.orbs_visible;
        info!(tier = "memory", on = state.orbs_visible, "memory orbs toggled");
    }

    /// Shows a message on stage. It is removed after [`MESSAGE_VISIBLE`]
    /// plus [`MESSAGE_FADE`].
    pub fn emit(&self, text: impl Into<String>) {
        let text = text.into();
        let id = self.next_message.fetch_add(1, Ordering::Relaxed);
        info!(tier = "log", message = %text, "message emitted");
        self.state().messages.push(StageMessage { id, text });
        self.after(MESSAGE_VISIBLE + MESSAGE_FADE, move |state| {
            state.messages.retain(|message| message.id != id);
        });
    }

    /// Emits the current wall-clock time.
    pub fn announce_time(&self) {
        let time = self.clock.time_of_day();
        info!(tier = "utils", %time, "current time");
        self.emit(format!("Time: {time}"));
    }
}

fn stage_action(stage: &Arc<Stage>, apply: fn(&Stage)) -> impl Action + 'static {
    let stage = Arc::clone(stage);
    move || -> ActionResult {
        apply(&stage);
        Ok(())
    }
}

fn validated_stage_action(
    stage: &Arc<Stage>,
    apply: fn(&Stage) -> Result<(), DomainError>,
) -> impl Action + 'static {
    let stage = Arc::clone(stage);
    move || -> ActionResult {
        apply(&stage)?;
        Ok(())
    }
}

/// Registers every stage action in `registry`.
pub fn register_stage_actions(registry: &InMemoryActionRegistry, stage: &Arc<Stage>) {
    let actions: [(&str, fn(&Stage)); 14] = [
        ("core.reset", Stage::reset),
        ("core.state", Stage::log_state),
        ("visual.flash", Stage::flash),
        ("motion.double_speed", |s| s.set_speed(2.0)),
        ("motion.pause", Stage::pause),
        ("motion.resume", Stage::resume),
        ("particle.spawn_mini", |s| s.spawn_mini(MINI_SPIRALS_PER_SPAWN)),
        ("particle.toggle", Stage::toggle_particles),
        ("pulse.trigger", Stage::trigger_pulse),
        ("sound.pulse", |s| {
            s.play(
                PULSE_SOUND,
                SoundOptions {
                    volume: PULSE_SOUND_VOLUME,
                    looped: false,
                },
            );
        }),
        ("sound.stop_pulse", |s| s.stop(PULSE_SOUND)),
        ("memory.toggle_orbs", Stage::toggle_orbs),
        ("log.sequence_complete", |s| {
            s.emit(format!("Sequence complete: {CORE_SEQUENCE}"));
        }),
        ("utils.time", Stage::announce_time),
    ];
    for (id, apply) in actions {
        registry.register(id, stage_action(stage, apply));
    }

    let colors: [(&str, fn(&Stage) -> Result<(), DomainError>); 2] = [
        ("visual.amber", |s| s.set_color(Color::AMBER)),
        ("visual.cyan", |s| s.set_color(Color::CYAN)),
    ];
    for (id, apply) in colors {
        registry.register(id, validated_stage_action(stage, apply));
    }
}

/// Registers actions that start sequences. They hold only a weak reference
/// to the scheduler, which itself owns the registry.
pub fn register_payload_actions(registry: &InMemoryActionRegistry, scheduler: &Arc<CueScheduler>) {
    let scheduler = Arc::downgrade(scheduler);
    registry.register("payload.core_sequence", move || -> ActionResult {
        let scheduler = scheduler.upgrade().ok_or("scheduler has shut down")?;
        scheduler.run(CORE_SEQUENCE)?;
        Ok(())
    });
}

/// Cues of the sample sequence.
#[must_use]
pub fn core_sequence() -> Vec<Cue> {
    vec![
        Cue::new("core.reset", 0),
        Cue::new("visual.amber", 1000),
        Cue::new("motion.double_speed", 2000),
        Cue::new("particle.spawn_mini", 3000),
        Cue::new("pulse.trigger", 4000),
        Cue::new("sound.pulse", 4000),
        Cue::new("log.sequence_complete", 5000),
    ]
}
