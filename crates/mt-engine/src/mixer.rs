//! Main playback engine.
//!
//! The engine owns one [`TrackChain`] per track, the master bus, the clip
//! source table and the transport. Scheduling happens in [`Engine::play`];
//! [`Engine::render_frame`] only walks pre-built state and never allocates.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use mt_ir::{
    db_to_linear, recompute_effective_gains, timeline_duration, AssetBuffer, ClipId,
    EffectChainState, EqBand, EqPreset, ExpanderParam, LimiterParam, MasterLimiterParam,
    MasterSettings, NoiseReductionSettings, Track, TrackId,
};

use crate::chain::TrackChain;
use crate::config::EngineConfig;
use crate::error::GraphError;
use crate::frame::Frame;
use crate::param_timeline::EnvelopeShape;
use crate::processor::Processor;
use crate::processors::filter::{self, Filter};
use crate::processors::limiter::{self, Limiter};
use crate::processors::eq_band;
use crate::transport::{PlaybackState, Transport};
use crate::voice::{Voice, VoiceSchedule};

/// A clip's decoded source and the track it plays on.
#[derive(Clone, Debug)]
pub struct ClipSource {
    pub track_id: TrackId,
    pub asset: Arc<AssetBuffer>,
}

/// Master bus: 3-band EQ, limiter, output gain.
struct MasterBus {
    settings: MasterSettings,
    eq: [Filter; 3],
    limiter: Limiter,
    volume: f32,
    output_gain: f32,
}

impl MasterBus {
    fn new(sample_rate: u32, volume: f32) -> Self {
        let mut bus = Self {
            settings: MasterSettings::default(),
            eq: EqBand::ALL.map(eq_band),
            limiter: Limiter::new(),
            volume,
            output_gain: volume,
        };
        for f in &mut bus.eq {
            f.init(sample_rate);
        }
        bus.limiter.init(sample_rate);
        bus.apply(MasterSettings::default());
        bus
    }

    fn apply(&mut self, settings: MasterSettings) {
        for band in EqBand::ALL {
            self.set_eq(band, settings.eq.get(band));
        }
        let lim = settings.limiter;
        self.set_limiter(MasterLimiterParam::Threshold, lim.threshold);
        self.set_limiter(MasterLimiterParam::Release, lim.release);
        self.set_limiter(MasterLimiterParam::Ceiling, lim.ceiling);
    }

    fn set_eq(&mut self, band: EqBand, db: f32) {
        self.settings.eq.set(band, db);
        self.eq[band as usize].set_param(filter::GAIN_DB, db);
    }

    fn set_limiter(&mut self, param: MasterLimiterParam, value: f32) {
        self.settings.limiter.set(param, value);
        match param {
            MasterLimiterParam::Threshold => self.limiter.set_param(limiter::THRESHOLD, value),
            MasterLimiterParam::Release => self.limiter.set_param(limiter::RELEASE, value),
            MasterLimiterParam::Ceiling => self.update_output_gain(),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
        self.update_output_gain();
    }

    fn update_output_gain(&mut self) {
        self.output_gain = self.volume * db_to_linear(self.settings.limiter.ceiling);
    }

    #[inline]
    fn process(&mut self, frame: &mut Frame) {
        for f in &mut self.eq {
            f.process(frame);
        }
        self.limiter.process(frame);
        frame.scale(self.output_gain);
    }

    fn reset(&mut self) {
        for f in &mut self.eq {
            f.reset();
        }
        self.limiter.reset();
    }
}

/// The main playback engine.
pub struct Engine {
    config: EngineConfig,
    chains: Vec<TrackChain>,
    sources: BTreeMap<ClipId, ClipSource>,
    master: MasterBus,
    transport: Transport,
    /// Frames rendered since creation.
    clock: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            master: MasterBus::new(config.sample_rate, config.master_volume),
            config,
            chains: Vec::new(),
            sources: BTreeMap::new(),
            transport: Transport::default(),
            clock: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Engine sample clock in frames.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Engine time in seconds.
    pub fn now(&self) -> f64 {
        self.clock as f64 / self.config.sample_rate as f64
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn current_time(&self) -> f64 {
        self.transport.current_time
    }

    pub fn duration(&self) -> f64 {
        self.transport.duration
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    // --- Tracks ---

    /// Materialize the chain for a track.
    pub fn add_track(&mut self, track: &Track) -> Result<(), GraphError> {
        if self.chain(track.id).is_some() {
            return Err(GraphError::DuplicateTrack(track.id));
        }
        self.chains.push(TrackChain::new(track, self.config.sample_rate));
        log::debug!("track {} chain created", track.id);
        self.apply_gains();
        Ok(())
    }

    /// Disconnect a track's chain and release every source it plays.
    pub fn remove_track(&mut self, id: TrackId) -> Result<(), GraphError> {
        let idx = self.chain_index(id)?;
        self.chains[idx].disconnect();
        self.chains.remove(idx);
        self.sources.retain(|_, s| s.track_id != id);
        log::debug!("track {} chain removed", id);
        self.apply_gains();
        Ok(())
    }

    pub fn chain(&self, id: TrackId) -> Option<&TrackChain> {
        self.chains.iter().find(|c| c.track_id == id)
    }

    pub fn chains(&self) -> &[TrackChain] {
        &self.chains
    }

    fn chain_index(&self, id: TrackId) -> Result<usize, GraphError> {
        self.chains
            .iter()
            .position(|c| c.track_id == id)
            .ok_or(GraphError::UnknownTrack(id))
    }

    fn chain_mut(&mut self, id: TrackId) -> Result<&mut TrackChain, GraphError> {
        let idx = self.chain_index(id)?;
        Ok(&mut self.chains[idx])
    }

    /// Resolve solo/mute into every chain's input gain.
    pub fn apply_gains(&mut self) {
        let flags: Vec<_> = self.chains.iter().map(|c| c.mix()).collect();
        let gains = recompute_effective_gains(&flags);
        for (chain, gain) in self.chains.iter_mut().zip(gains) {
            chain.set_input_gain(gain);
        }
    }

    /// Effective input gain of every track, in track order.
    pub fn effective_gains(&self) -> Vec<(TrackId, f32)> {
        let flags: Vec<_> = self.chains.iter().map(|c| c.mix()).collect();
        self.chains
            .iter()
            .map(|c| c.track_id)
            .zip(recompute_effective_gains(&flags))
            .collect()
    }

    pub fn set_track_volume(&mut self, id: TrackId, volume: f32) -> Result<(), GraphError> {
        self.chain_mut(id)?.mix_mut().volume = volume.clamp(0.0, 1.0);
        self.apply_gains();
        Ok(())
    }

    pub fn set_track_mute(&mut self, id: TrackId, mute: bool) -> Result<(), GraphError> {
        self.chain_mut(id)?.mix_mut().mute = mute;
        self.apply_gains();
        Ok(())
    }

    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) -> Result<(), GraphError> {
        self.chain_mut(id)?.mix_mut().solo = solo;
        self.apply_gains();
        Ok(())
    }

    pub fn set_track_pan(&mut self, id: TrackId, pan: f32) -> Result<(), GraphError> {
        self.chain_mut(id)?.set_pan(pan);
        Ok(())
    }

    pub fn set_track_eq(&mut self, id: TrackId, band: EqBand, db: f32) -> Result<(), GraphError> {
        self.chain_mut(id)?.set_eq(band, db);
        Ok(())
    }

    pub fn set_track_eq_preset(&mut self, id: TrackId, preset: EqPreset) -> Result<(), GraphError> {
        let chain = self.chain_mut(id)?;
        let gains = preset.gains();
        for band in EqBand::ALL {
            chain.set_eq(band, gains.get(band));
        }
        Ok(())
    }

    pub fn set_track_limiter(
        &mut self,
        id: TrackId,
        param: LimiterParam,
        value: f32,
    ) -> Result<(), GraphError> {
        self.chain_mut(id)?.set_limiter(param, value);
        Ok(())
    }

    pub fn set_track_expander(
        &mut self,
        id: TrackId,
        param: ExpanderParam,
        value: f32,
    ) -> Result<(), GraphError> {
        self.chain_mut(id)?.set_expander(param, value);
        Ok(())
    }

    /// Replace noise-reduction settings; rebuilds because the sub-flags
    /// decide which filter stages exist.
    pub fn set_track_noise_reduction(
        &mut self,
        id: TrackId,
        settings: NoiseReductionSettings,
    ) -> Result<(), GraphError> {
        self.update_effects(id, |e| e.noise_reduction = settings)
    }

    pub fn set_track_eq_enabled(&mut self, id: TrackId, on: bool) -> Result<(), GraphError> {
        self.update_effects(id, |e| e.eq_enabled = on)
    }

    pub fn set_track_limiter_enabled(&mut self, id: TrackId, on: bool) -> Result<(), GraphError> {
        self.update_effects(id, |e| e.limiter_enabled = on)
    }

    pub fn set_track_expander_enabled(&mut self, id: TrackId, on: bool) -> Result<(), GraphError> {
        self.update_effects(id, |e| e.expander_enabled = on)
    }

    pub fn set_track_noise_reduction_enabled(
        &mut self,
        id: TrackId,
        on: bool,
    ) -> Result<(), GraphError> {
        self.update_effects(id, |e| e.noise_reduction_enabled = on)
    }

    /// Replace a track's whole effect state and rebuild its chain.
    pub fn set_track_effects(
        &mut self,
        id: TrackId,
        effects: &EffectChainState,
    ) -> Result<(), GraphError> {
        self.chain_mut(id)?.apply_effects(effects);
        Ok(())
    }

    fn update_effects(
        &mut self,
        id: TrackId,
        f: impl FnOnce(&mut EffectChainState),
    ) -> Result<(), GraphError> {
        let chain = self.chain_mut(id)?;
        let mut effects = *chain.effects();
        f(&mut effects);
        chain.apply_effects(&effects);
        Ok(())
    }

    // --- Master bus ---

    pub fn master_settings(&self) -> &MasterSettings {
        &self.master.settings
    }

    pub fn master_volume(&self) -> f32 {
        self.master.volume
    }

    pub fn set_master_eq(&mut self, band: EqBand, db: f32) {
        self.master.set_eq(band, db);
    }

    pub fn set_master_limiter(&mut self, param: MasterLimiterParam, value: f32) {
        self.master.set_limiter(param, value);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master.set_volume(volume);
    }

    pub fn set_master_settings(&mut self, settings: MasterSettings) {
        self.master.apply(settings);
    }

    // --- Clip sources ---

    /// Attach a decoded source to a clip on `track`.
    pub fn register_clip(
        &mut self,
        track: TrackId,
        clip: ClipId,
        asset: Arc<AssetBuffer>,
    ) -> Result<(), GraphError> {
        self.chain_index(track)?;
        self.sources.insert(clip, ClipSource { track_id: track, asset });
        Ok(())
    }

    /// Forget a clip's source and stop its voice. Returns `false` if the
    /// clip had no source.
    pub fn release_clip(&mut self, clip: ClipId) -> bool {
        let Some(source) = self.sources.remove(&clip) else {
            return false;
        };
        if let Ok(chain) = self.chain_mut(source.track_id) {
            chain.release_voice(clip);
        }
        true
    }

    pub fn has_source(&self, clip: ClipId) -> bool {
        self.sources.contains_key(&clip)
    }

    /// Rewrite the sustain level of a clip's active voice.
    pub fn set_clip_level(&mut self, clip: ClipId, level: f32) -> Result<(), GraphError> {
        let track = self.sources.get(&clip).ok_or(GraphError::UnknownClip(clip))?.track_id;
        if let Some(voice) = self.chain_mut(track)?.voice_mut(clip) {
            voice.set_level(level);
        }
        Ok(())
    }

    /// Number of voices currently scheduled across all tracks.
    pub fn active_voices(&self) -> usize {
        self.chains.iter().map(|c| c.voices().iter().filter(|v| !v.is_finished()).count()).sum()
    }

    // --- Transport ---

    /// Recompute the timeline duration from the clip layout.
    pub fn calculate_duration(&mut self, tracks: &[Track]) -> f64 {
        self.transport.duration = timeline_duration(tracks);
        self.transport.duration
    }

    pub fn playback_rate(&self) -> f64 {
        self.transport.playback_rate
    }

    /// Set the playback rate. Takes effect on the next `play`.
    pub fn set_playback_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.transport.playback_rate = rate;
        }
    }

    /// Schedule every clip that ends after `start_time` and start the
    /// transport. Returns `false` (no-op) when already playing.
    pub fn play(&mut self, tracks: &[Track], start_time: f64) -> bool {
        if self.is_playing() {
            return false;
        }
        self.calculate_duration(tracks);
        let start = self.transport.seek(start_time);

        let sr = self.config.sample_rate as f64;
        let rate = self.transport.playback_rate;
        let anchor = self.clock;
        let now = self.now();
        let mut scheduled = 0usize;

        for track in tracks {
            let Ok(idx) = self.chain_index(track.id) else {
                log::warn!("track {} has no chain, skipping its clips", track.id);
                continue;
            };
            for clip in &track.clips {
                let clip_end = clip.end_time();
                if clip_end <= start {
                    continue;
                }
                let Some(source) = self.sources.get(&clip.id) else {
                    log::warn!("clip {} ({}) has no source, skipping", clip.id, clip.file_id);
                    continue;
                };
                let asset = Arc::clone(&source.asset);
                let asset_sr = asset.sample_rate as f64;

                let delay = (clip.start_time - start).max(0.0) / rate;
                let play_duration = clip_end - start.max(clip.start_time);
                let source_offset = clip.offset + (start - clip.start_time).max(0.0);

                let start_frame = anchor + libm::round(delay * sr) as u64;
                let end_frame = start_frame + libm::round(play_duration / rate * sr) as u64;
                let schedule = VoiceSchedule {
                    start_frame,
                    end_frame,
                    source_position: source_offset * asset_sr,
                    increment: asset_sr / sr * rate,
                };
                let true_start = now + (clip.start_time - start) / rate;
                let shape = EnvelopeShape {
                    true_start,
                    true_end: true_start + clip.duration / rate,
                    fade_in: clip.fade_in / rate,
                    fade_out: clip.fade_out / rate,
                };
                log::debug!(
                    "clip {} scheduled at frame {} for {} frames",
                    clip.id,
                    start_frame,
                    end_frame - start_frame
                );
                self.chains[idx].add_voice(Voice::new(
                    clip.id,
                    asset,
                    schedule,
                    shape,
                    clip.gain_linear(),
                ));
                scheduled += 1;
            }
        }

        self.transport.state = PlaybackState::Playing;
        log::info!("play from {:.3}s: {} clips scheduled", start, scheduled);
        true
    }

    fn drop_voices(&mut self) {
        for chain in &mut self.chains {
            chain.clear_voices();
        }
    }

    /// Stop every voice and keep the playhead. Returns `false` when not playing.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.drop_voices();
        self.transport.state = PlaybackState::Paused;
        log::info!("paused at {:.3}s", self.transport.current_time);
        true
    }

    /// Stop every voice and rewind to zero.
    pub fn stop(&mut self) {
        self.drop_voices();
        self.transport.state = PlaybackState::Stopped;
        self.transport.current_time = 0.0;
        log::info!("stopped");
    }

    /// Move the playhead. While playing this stops and reschedules.
    pub fn seek(&mut self, tracks: &[Track], time: f64) {
        if self.is_playing() {
            self.drop_voices();
            self.transport.state = PlaybackState::Paused;
            let target = self.transport.seek(time);
            self.play(tracks, target);
        } else {
            self.transport.seek(time);
        }
    }

    /// Advance the transport by `dt` seconds. Returns `true` when the end
    /// of the timeline was reached and playback stopped.
    pub fn tick(&mut self, dt: f64) -> bool {
        let finished = self.transport.advance(dt);
        if finished {
            self.drop_voices();
            log::info!("reached end of timeline");
        }
        finished
    }

    /// Clear every processor's internal state.
    pub fn reset(&mut self) {
        for chain in &mut self.chains {
            chain.reset();
        }
        self.master.reset();
    }

    // --- Rendering ---

    /// Generate one frame of audio. The sample clock always advances.
    #[cfg(feature = "alloc_check")]
    pub fn render_frame(&mut self) -> Frame {
        assert_no_alloc::assert_no_alloc(|| self.mix_frame())
    }

    /// Generate one frame of audio. The sample clock always advances.
    #[cfg(not(feature = "alloc_check"))]
    pub fn render_frame(&mut self) -> Frame {
        self.mix_frame()
    }

    #[inline]
    fn mix_frame(&mut self) -> Frame {
        let clock = self.clock;
        let now = self.now();
        let mut out = Frame::silence();
        for chain in &mut self.chains {
            out.mix(chain.render(clock, now));
        }
        self.master.process(&mut out);
        self.clock += 1;
        out
    }

    /// Fill `frames` from the render path.
    pub fn render_into(&mut self, frames: &mut [Frame]) {
        for f in frames {
            *f = self.render_frame();
        }
    }

    /// Render `count` frames into a new vector.
    pub fn render_frames(&mut self, count: usize) -> Vec<Frame> {
        let mut out = alloc::vec![Frame::silence(); count];
        self.render_into(&mut out);
        out
    }
}
