//! Audio capability and procedurally generated sound effects
//!
//! The simulation only ever names an effect; an `AudioSink` decides whether
//! and how to play it. No external files needed.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Weapons fired
    Shoot,
    /// Projectile struck an enemy or crate
    Hit,
    EnemyDeath,
    BossDeath,
    PlayerHurt,
    Dodge,
    Pickup,
    Heal,
    LevelUp,
    Treasure,
    BossWarning,
    /// Bomb crate or boss volley
    Explosion,
    CrateBreak,
    /// Active skill pulse
    Nova,
    Victory,
    GameOver,
}

/// Fire-and-forget playback. Implementations must never block and may drop sounds.
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Apply the effective volume (0.0 - 1.0, 0 mutes)
    fn set_volume(&mut self, _volume: f32) {}
}

/// Silent sink for headless runs, tests and platforms without audio
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator voice with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    pub freq: f32,
    /// Frequency glided to over the tone's duration (None = steady)
    pub glide_to: Option<f32>,
    pub gain: f32,
    /// Start offset in seconds
    pub delay: f64,
    pub duration: f64,
}

const fn tone(wave: Waveform, freq: f32, gain: f32, duration: f64) -> Tone {
    Tone {
        wave,
        freq,
        glide_to: None,
        gain,
        delay: 0.0,
        duration,
    }
}

const fn glide(wave: Waveform, freq: f32, to: f32, gain: f32, duration: f64) -> Tone {
    Tone {
        wave,
        freq,
        glide_to: Some(to),
        gain,
        delay: 0.0,
        duration,
    }
}

/// Rising or falling arpeggio of short tones
fn arpeggio(wave: Waveform, freqs: &[f32], step: f64, gain: f32, duration: f64) -> Vec<Tone> {
    freqs
        .iter()
        .enumerate()
        .map(|(i, &freq)| Tone {
            delay: i as f64 * step,
            ..tone(wave, freq, gain, duration)
        })
        .collect()
}

impl SoundEffect {
    /// Voices that make up this effect
    pub fn tones(self) -> Vec<Tone> {
        use Waveform::*;
        match self {
            SoundEffect::Shoot => vec![glide(Square, 880.0, 440.0, 0.08, 0.06)],
            SoundEffect::Hit => vec![tone(Triangle, 300.0, 0.2, 0.05)],
            SoundEffect::EnemyDeath => vec![
                glide(Sawtooth, 400.0, 80.0, 0.25, 0.15),
                tone(Sine, 60.0, 0.2, 0.1),
            ],
            SoundEffect::BossDeath => vec![
                glide(Sawtooth, 200.0, 25.0, 0.5, 0.9),
                glide(Sine, 80.0, 30.0, 0.5, 1.0),
                tone(Square, 1500.0, 0.15, 0.15),
            ],
            SoundEffect::PlayerHurt => vec![glide(Sine, 150.0, 60.0, 0.6, 0.15)],
            SoundEffect::Dodge => vec![glide(Triangle, 600.0, 1200.0, 0.2, 0.1)],
            SoundEffect::Pickup => arpeggio(Sine, &[900.0, 1200.0], 0.04, 0.15, 0.08),
            SoundEffect::Heal => arpeggio(Sine, &[500.0, 650.0, 800.0], 0.06, 0.2, 0.15),
            SoundEffect::LevelUp => arpeggio(Triangle, &[400.0, 500.0, 600.0, 800.0], 0.1, 0.3, 0.4),
            SoundEffect::Treasure => {
                arpeggio(Triangle, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08, 0.25, 0.3)
            }
            SoundEffect::BossWarning => vec![
                glide(Sawtooth, 60.0, 50.0, 0.4, 0.6),
                Tone {
                    delay: 0.3,
                    ..glide(Sawtooth, 60.0, 45.0, 0.4, 0.6)
                },
            ],
            SoundEffect::Explosion => vec![
                glide(Sawtooth, 100.0, 30.0, 0.5, 0.4),
                tone(Square, 1500.0, 0.2, 0.1),
            ],
            SoundEffect::CrateBreak => vec![
                glide(Sine, 80.0, 40.0, 0.5, 0.25),
                tone(Square, 400.0, 0.25, 0.2),
            ],
            SoundEffect::Nova => vec![glide(Sine, 600.0, 200.0, 0.3, 0.4)],
            SoundEffect::Victory => arpeggio(Triangle, &[500.0, 600.0, 700.0, 800.0, 1000.0, 1200.0], 0.12, 0.3, 0.4),
            SoundEffect::GameOver => arpeggio(Sine, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3, 0.3),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect, Tone, Waveform};

    /// Web Audio backed sink
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume: 0.8 }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn create_osc(&self, ctx: &AudioContext, tone: &Tone) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match tone.wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            });
            osc.frequency().set_value(tone.freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn voice(&self, ctx: &AudioContext, tone: &Tone) {
            let Some((osc, gain)) = self.create_osc(ctx, tone) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;

            gain.gain().set_value_at_time(self.volume * tone.gain, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + tone.duration)
                .ok();
            if let Some(to) = tone.glide_to {
                osc.frequency().set_value_at_time(tone.freq, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(to, t + tone.duration)
                    .ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration * 1.2).ok();
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in effect.tones() {
                self.voice(ctx, &tone);
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }
}
