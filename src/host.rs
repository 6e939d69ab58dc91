//! Frame host: drives the simulation from display frames
//!
//! Owns the game state and the collaborators the simulation never sees
//! directly. Each frame runs a bounded number of fixed-step ticks, then
//! dispatches the resulting events to audio, the shell and persistence.

use crate::Viewport;
use crate::audio::AudioSink;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{KeyValueStore, SaveRecord, clear_run, load_run, save_run};
use crate::settings::Settings;
use crate::sim::{
    ChoiceError, GameEvent, GameState, RunConfig, RunOutcome, TickInput, UpgradeKind, tick,
};
use crate::tuning::Tuning;

/// Longest wall-clock gap a single frame may simulate
const MAX_FRAME_SECONDS: f32 = 0.1;

/// Page-level hooks (game-over screen, currency display)
pub trait ShellCallbacks {
    fn on_game_over(&mut self, score: u64, victory: bool, level: u32);
    fn on_currency_gained(&mut self, amount: u32);
}

/// Shell that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullShell;

impl ShellCallbacks for NullShell {
    fn on_game_over(&mut self, _score: u64, _victory: bool, _level: u32) {}
    fn on_currency_gained(&mut self, _amount: u32) {}
}

/// Whether the frame callback should be rescheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Stop,
}

pub struct FrameHost<A: AudioSink, K: KeyValueStore, S: ShellCallbacks> {
    state: GameState,
    config: RunConfig,
    tuning: Tuning,
    settings: Settings,
    record: SaveRecord,
    audio: A,
    store: K,
    shell: S,
    accumulator: f32,
    last_time_ms: Option<f64>,
    /// One-shot requests waiting for the next tick
    pending_skill: bool,
    pending_pause: bool,
}

impl<A: AudioSink, K: KeyValueStore, S: ShellCallbacks> FrameHost<A, K, S> {
    pub fn new(config: RunConfig, tuning: Tuning, mut audio: A, store: K, shell: S) -> Self {
        let settings = Settings::load(&store);
        let record = SaveRecord::load(&store);
        audio.set_volume(settings.effective_volume());
        log::info!(
            "Starting run with seed {} (best score {})",
            config.seed,
            record.best_score
        );
        Self {
            state: GameState::with_config(config, tuning.clone()),
            config,
            tuning,
            settings,
            record,
            audio,
            store,
            shell,
            accumulator: 0.0,
            last_time_ms: None,
            pending_skill: false,
            pending_pause: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn record(&self) -> &SaveRecord {
        &self.record
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Advance by the wall-clock time since the previous frame
    pub fn frame(&mut self, now_ms: f64, input: &TickInput) -> FrameStatus {
        if self.state.phase.is_ended() {
            return FrameStatus::Stop;
        }

        let elapsed = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_time_ms = Some(now_ms);
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_SECONDS);
        self.pending_skill |= input.skill;
        self.pending_pause |= input.pause;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let tick_input = TickInput {
                skill: std::mem::take(&mut self.pending_skill),
                pause: std::mem::take(&mut self.pending_pause),
                ..input.clone()
            };
            let events = tick(&mut self.state, &tick_input, SIM_DT);
            self.dispatch(events);
            self.accumulator -= SIM_DT;
            substeps += 1;

            if self.state.phase.is_ended() {
                self.accumulator = 0.0;
                return FrameStatus::Stop;
            }
        }
        // Drop any backlog the substep cap left behind
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        FrameStatus::Continue
    }

    /// Pick offer `index` while paused for a level-up or treasure
    pub fn choose_upgrade(&mut self, index: usize) -> Result<UpgradeKind, ChoiceError> {
        let mut events = Vec::new();
        let chosen = crate::sim::choose_upgrade(&mut self.state, index, &mut events)?;
        log::info!("Chose {}", chosen.name());
        self.dispatch(events);
        Ok(chosen)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.state.resize(viewport);
    }

    /// Throw the current run away and start a fresh one
    pub fn restart(&mut self, seed: u64) {
        self.config.seed = seed;
        self.state = GameState::with_config(self.config, self.tuning.clone());
        self.accumulator = 0.0;
        self.last_time_ms = None;
        self.pending_skill = false;
        self.pending_pause = false;
        clear_run(&mut self.store);
        log::info!("Restarted with seed {seed}");
    }

    /// Snapshot the run when the page is hidden
    pub fn suspend(&mut self) {
        if !self.state.phase.is_ended() {
            save_run(&mut self.store, &self.state);
        }
        self.last_time_ms = None;
    }

    /// Continue a snapshotted run; returns whether one was found
    pub fn resume(&mut self) -> bool {
        self.last_time_ms = None;
        self.accumulator = 0.0;
        match load_run(&self.store) {
            Some(mut state) => {
                state.resize(self.config.viewport);
                self.state = state;
                true
            }
            None => false,
        }
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.audio.set_volume(settings.effective_volume());
        settings.save(&mut self.store);
        self.settings = settings;
    }

    fn dispatch(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::Sound(effect) => {
                    if !self.settings.muted {
                        self.audio.play(effect);
                    }
                }
                GameEvent::CurrencyGained(amount) => {
                    self.record.add_coins(amount);
                    self.shell.on_currency_gained(amount);
                }
                GameEvent::RunEnded {
                    outcome,
                    score,
                    level,
                } => {
                    if self.record.record_run(score) {
                        log::info!("New best score: {score}");
                    }
                    self.record.save(&mut self.store);
                    clear_run(&mut self.store);
                    self.shell
                        .on_game_over(score, outcome == RunOutcome::Victory, level);
                }
                GameEvent::BossWarning { final_boss } => {
                    log::debug!("Boss warning (final: {final_boss})");
                }
                _ => {}
            }
        }
    }
}
