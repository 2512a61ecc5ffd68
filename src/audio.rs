//! Audio seam and Web Audio backend
//!
//! The simulation fires effects into an [`AudioSink`] and never waits on it.
//! On the web, effects are synthesized procedurally - no external files needed!

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player ship fires a laser
    PlayerShoot,
    /// An invader fires a laser
    InvaderShoot,
    /// Player laser destroys an invader
    InvaderKilled,
    /// Invader laser hits the player
    PlayerDeath,
}

/// Fire-and-forget effect sink.
///
/// Implementations must tolerate being called before their backing
/// resource is ready by silently doing nothing.
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink that drops every effect (headless runs, audio unavailable)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};

    /// Web Audio synthesizer
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
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
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Set master volume (0.0 - 1.0)
        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn master_volume(&self) -> f32 {
            self.master_volume
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        /// Create an oscillator routed through a gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Player shot - short rising zap
        fn play_player_shoot(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.frequency().set_value_at_time(900.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(1600.0, t + 0.06)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Invader shot - low falling blip
        fn play_invader_shoot(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency().set_value_at_time(300.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(120.0, t + 0.12)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        /// Invader destroyed - crackle over a bass thump
        fn play_invader_killed(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.35, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.18)
                    .ok();
                osc.frequency().set_value_at_time(100.0, t).ok();
                osc.frequency().set_value_at_time(3000.0, t + 0.01).ok();
                osc.frequency().set_value_at_time(200.0, t + 0.03).ok();
                osc.frequency().set_value_at_time(2200.0, t + 0.05).ok();
                osc.frequency().set_value_at_time(80.0, t + 0.1).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.2).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }

        /// Player hit - long boom with a high crack
        fn play_player_death(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                .ok();
            osc.frequency().set_value_at_time(100.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(25.0, t + 0.6)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.7).ok();

            if let Some((osc2, gain2)) = self.create_osc(ctx, 1500.0, OscillatorType::Square) {
                gain2.gain().set_value_at_time(vol * 0.2, t).ok();
                gain2
                    .gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc2.start().ok();
                osc2.stop_with_when(t + 0.15).ok();
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::PlayerShoot => self.play_player_shoot(ctx, vol),
                SoundEffect::InvaderShoot => self.play_invader_shoot(ctx, vol),
                SoundEffect::InvaderKilled => self.play_invader_killed(ctx, vol),
                SoundEffect::PlayerDeath => self.play_player_death(ctx, vol),
            }
        }
    }
}
