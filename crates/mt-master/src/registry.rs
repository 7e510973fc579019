//! Track and clip registry.
//!
//! The registry owns the timeline model and keeps the engine in step with
//! it: every structural edit or mixer change goes through here so the model
//! stays authoritative and the engine mirrors it.

use std::sync::Arc;

use mt_engine::Engine;
use mt_ir::{
    db_to_linear, palette_color, AssetBuffer, AssetMeta, Clip, ClipId, EffectChainState, EqBand,
    EqPreset, ExpanderParam, LimiterParam, NoiseReductionSettings, Track, TrackId,
};

use crate::error::ControllerError;

/// The clip focused for automation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub track: TrackId,
    pub clip: ClipId,
}

pub struct Registry {
    tracks: Vec<Track>,
    max_tracks: usize,
    next_track_id: u32,
    next_clip_id: u32,
    selection: Option<Selection>,
}

impl Registry {
    pub fn new(max_tracks: usize) -> Self {
        Self { tracks: Vec::new(), max_tracks, next_track_id: 1, next_clip_id: 1, selection: None }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, ControllerError> {
        self.tracks.iter_mut().find(|t| t.id == id).ok_or(ControllerError::UnknownTrack(id))
    }

    fn clip_mut(&mut self, track: TrackId, clip: ClipId) -> Result<&mut Clip, ControllerError> {
        self.track_mut(track)?.clip_mut(clip).ok_or(ControllerError::UnknownClip(clip))
    }

    /// Find a clip anywhere on the timeline.
    pub fn find_clip(&self, clip: ClipId) -> Option<(&Track, &Clip)> {
        self.tracks.iter().find_map(|t| t.clip(clip).map(|c| (t, c)))
    }

    pub fn max_tracks(&self) -> usize {
        self.max_tracks
    }

    // --- Tracks ---

    /// Create a track and its engine chain. Fails without mutating anything
    /// when the track limit is reached.
    pub fn add_track(&mut self, engine: &mut Engine, name: Option<&str>) -> Result<TrackId, ControllerError> {
        if self.tracks.len() >= self.max_tracks {
            return Err(ControllerError::CapacityExceeded(self.max_tracks));
        }
        let id = TrackId(self.next_track_id);
        let name = name.map(str::to_string).unwrap_or_else(|| format!("Track {}", id.0));
        let track = Track::new(id, &name, palette_color(id.0 as usize - 1));
        engine.add_track(&track)?;
        self.next_track_id += 1;
        self.tracks.push(track);
        log::debug!("added track {} ({})", id, name);
        Ok(id)
    }

    /// Tear down the engine chain, then drop the track.
    pub fn remove_track(&mut self, engine: &mut Engine, id: TrackId) -> Result<Track, ControllerError> {
        let idx = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ControllerError::UnknownTrack(id))?;
        engine.remove_track(id)?;
        let track = self.tracks.remove(idx);
        if self.selection.is_some_and(|s| s.track == id) {
            self.selection = None;
        }
        log::debug!("removed track {}", id);
        Ok(track)
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<(), ControllerError> {
        self.track_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Remove every track.
    pub fn clear(&mut self, engine: &mut Engine) {
        for track in std::mem::take(&mut self.tracks) {
            if let Err(e) = engine.remove_track(track.id) {
                log::warn!("clearing track {}: {}", track.id, e);
            }
        }
        self.selection = None;
    }

    // --- Clips ---

    /// Place an asset on a track at `start_time`. The clip spans the whole
    /// asset with no offset, fades or gain. An asset with no audio cannot be
    /// placed.
    pub fn add_clip(
        &mut self,
        engine: &mut Engine,
        track: TrackId,
        meta: &AssetMeta,
        buffer: Arc<AssetBuffer>,
        start_time: f64,
    ) -> Result<ClipId, ControllerError> {
        self.track_mut(track)?;
        if meta.duration <= 0.0 {
            return Err(ControllerError::EmptyAsset(meta.id.clone()));
        }
        let id = ClipId(self.next_clip_id);
        engine.register_clip(track, id, buffer)?;
        self.next_clip_id += 1;
        let clip = Clip::new(id, meta.id.clone(), &meta.name, start_time.max(0.0), meta.duration);
        self.track_mut(track)?.clips.push(clip);
        log::debug!("added clip {} ({}) to track {} at {:.3}s", id, meta.id, track, start_time);
        Ok(id)
    }

    /// Release the clip's source, then drop the clip.
    pub fn remove_clip(
        &mut self,
        engine: &mut Engine,
        track: TrackId,
        clip: ClipId,
    ) -> Result<Clip, ControllerError> {
        let t = self.track_mut(track)?;
        let idx = t.clips.iter().position(|c| c.id == clip).ok_or(ControllerError::UnknownClip(clip))?;
        engine.release_clip(clip);
        let removed = self.track_mut(track)?.clips.remove(idx);
        if self.selection == Some(Selection { track, clip }) {
            self.selection = None;
        }
        Ok(removed)
    }

    /// Set clip gain in dB and update the sounding voice, if any.
    pub fn set_clip_gain(
        &mut self,
        engine: &mut Engine,
        track: TrackId,
        clip: ClipId,
        db: f32,
    ) -> Result<(), ControllerError> {
        self.clip_mut(track, clip)?.gain = db;
        if engine.has_source(clip) {
            engine.set_clip_level(clip, db_to_linear(db))?;
        }
        Ok(())
    }

    pub fn move_clip(&mut self, track: TrackId, clip: ClipId, start_time: f64) -> Result<(), ControllerError> {
        self.clip_mut(track, clip)?.start_time = start_time.max(0.0);
        Ok(())
    }

    pub fn set_clip_fades(
        &mut self,
        track: TrackId,
        clip: ClipId,
        fade_in: f64,
        fade_out: f64,
    ) -> Result<(), ControllerError> {
        let c = self.clip_mut(track, clip)?;
        c.fade_in = fade_in.max(0.0);
        c.fade_out = fade_out.max(0.0);
        Ok(())
    }

    pub fn set_clip_offset(&mut self, track: TrackId, clip: ClipId, offset: f64) -> Result<(), ControllerError> {
        self.clip_mut(track, clip)?.offset = offset.max(0.0);
        Ok(())
    }

    pub fn set_clip_duration(&mut self, track: TrackId, clip: ClipId, duration: f64) -> Result<(), ControllerError> {
        if duration > 0.0 {
            self.clip_mut(track, clip)?.duration = duration;
        }
        Ok(())
    }

    // --- Selection ---

    pub fn select_clip(&mut self, track: TrackId, clip: ClipId) -> Result<(), ControllerError> {
        self.clip_mut(track, clip)?;
        self.selection = Some(Selection { track, clip });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selected(&self) -> Option<Selection> {
        self.selection
    }

    // --- Mixer ---

    pub fn set_volume(&mut self, engine: &mut Engine, id: TrackId, volume: f32) -> Result<(), ControllerError> {
        let volume = volume.clamp(0.0, 1.0);
        self.track_mut(id)?.volume = volume;
        engine.set_track_volume(id, volume)?;
        Ok(())
    }

    pub fn set_mute(&mut self, engine: &mut Engine, id: TrackId, mute: bool) -> Result<(), ControllerError> {
        self.track_mut(id)?.mute = mute;
        engine.set_track_mute(id, mute)?;
        Ok(())
    }

    pub fn set_solo(&mut self, engine: &mut Engine, id: TrackId, solo: bool) -> Result<(), ControllerError> {
        self.track_mut(id)?.solo = solo;
        engine.set_track_solo(id, solo)?;
        Ok(())
    }

    pub fn set_pan(&mut self, engine: &mut Engine, id: TrackId, pan: f32) -> Result<(), ControllerError> {
        let pan = pan.clamp(-1.0, 1.0);
        self.track_mut(id)?.pan = pan;
        engine.set_track_pan(id, pan)?;
        Ok(())
    }

    // --- Effects ---

    pub fn set_eq(&mut self, engine: &mut Engine, id: TrackId, band: EqBand, db: f32) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.eq.set(band, db);
        engine.set_track_eq(id, band, db)?;
        Ok(())
    }

    /// Apply a named preset (flat, phone, clear, wall).
    pub fn set_eq_preset(&mut self, engine: &mut Engine, id: TrackId, name: &str) -> Result<(), ControllerError> {
        let preset: EqPreset = name.parse()?;
        self.track_mut(id)?.effects.eq = preset.gains();
        engine.set_track_eq_preset(id, preset)?;
        Ok(())
    }

    pub fn set_limiter(
        &mut self,
        engine: &mut Engine,
        id: TrackId,
        param: LimiterParam,
        value: f32,
    ) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.limiter.set(param, value);
        engine.set_track_limiter(id, param, value)?;
        Ok(())
    }

    pub fn set_expander(
        &mut self,
        engine: &mut Engine,
        id: TrackId,
        param: ExpanderParam,
        value: f32,
    ) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.expander.set(param, value);
        engine.set_track_expander(id, param, value)?;
        Ok(())
    }

    pub fn set_noise_reduction(
        &mut self,
        engine: &mut Engine,
        id: TrackId,
        settings: NoiseReductionSettings,
    ) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.noise_reduction = settings;
        engine.set_track_noise_reduction(id, settings)?;
        Ok(())
    }

    pub fn set_eq_enabled(&mut self, engine: &mut Engine, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.eq_enabled = on;
        engine.set_track_eq_enabled(id, on)?;
        Ok(())
    }

    pub fn set_limiter_enabled(&mut self, engine: &mut Engine, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.limiter_enabled = on;
        engine.set_track_limiter_enabled(id, on)?;
        Ok(())
    }

    pub fn set_expander_enabled(&mut self, engine: &mut Engine, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.expander_enabled = on;
        engine.set_track_expander_enabled(id, on)?;
        Ok(())
    }

    pub fn set_noise_reduction_enabled(
        &mut self,
        engine: &mut Engine,
        id: TrackId,
        on: bool,
    ) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects.noise_reduction_enabled = on;
        engine.set_track_noise_reduction_enabled(id, on)?;
        Ok(())
    }

    /// Replace a track's whole effect state.
    pub fn set_effects(
        &mut self,
        engine: &mut Engine,
        id: TrackId,
        effects: EffectChainState,
    ) -> Result<(), ControllerError> {
        self.track_mut(id)?.effects = effects;
        engine.set_track_effects(id, &effects)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_engine::EngineConfig;
    use mt_ir::{AudioBuffer, FileId, StageKind, TRACK_PALETTE};

    fn setup(max: usize) -> (Registry, Engine) {
        (Registry::new(max), Engine::new(EngineConfig::default()))
    }

    fn asset(id: &str, seconds: f64) -> (AssetMeta, Arc<AssetBuffer>) {
        let frames = (seconds * 100.0) as usize;
        let buffer = AssetBuffer::new(100, AudioBuffer::new(1, frames));
        (buffer.describe(FileId::from(id), id, ""), Arc::new(buffer))
    }

    #[test]
    fn tracks_get_monotonic_ids_names_and_colors() {
        let (mut reg, mut engine) = setup(30);
        let a = reg.add_track(&mut engine, None).unwrap();
        let b = reg.add_track(&mut engine, Some("Voice")).unwrap();
        reg.remove_track(&mut engine, a).unwrap();
        let c = reg.add_track(&mut engine, None).unwrap();
        assert_eq!((a, b, c), (TrackId(1), TrackId(2), TrackId(3)));
        assert_eq!(reg.track(b).unwrap().name, "Voice");
        assert_eq!(reg.track(c).unwrap().name, "Track 3");
        assert_eq!(reg.track(c).unwrap().color, TRACK_PALETTE[2]);
        assert_eq!(reg.track(b).unwrap().volume, 0.8);
    }

    #[test]
    fn capacity_is_enforced_without_mutation() {
        let (mut reg, mut engine) = setup(2);
        reg.add_track(&mut engine, None).unwrap();
        reg.add_track(&mut engine, None).unwrap();
        let err = reg.add_track(&mut engine, None).unwrap_err();
        assert!(matches!(err, ControllerError::CapacityExceeded(2)));
        assert_eq!(reg.tracks().len(), 2);
        assert_eq!(engine.chains().len(), 2);
        reg.remove_track(&mut engine, TrackId(1)).unwrap();
        assert_eq!(reg.add_track(&mut engine, None).unwrap(), TrackId(3));
    }

    #[test]
    fn add_clip_takes_asset_duration_and_registers_source() {
        let (mut reg, mut engine) = setup(30);
        let t = reg.add_track(&mut engine, None).unwrap();
        let (meta, buffer) = asset("kick", 2.5);
        let c = reg.add_clip(&mut engine, t, &meta, buffer, 1.0).unwrap();
        let clip = reg.track(t).unwrap().clip(c).unwrap();
        assert_eq!(clip.duration, 2.5);
        assert_eq!(clip.start_time, 1.0);
        assert_eq!((clip.offset, clip.gain, clip.fade_in, clip.fade_out), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(clip.name, "kick");
        assert!(engine.has_source(c));
    }

    #[test]
    fn clip_on_unknown_track_is_rejected() {
        let (mut reg, mut engine) = setup(30);
        let (meta, buffer) = asset("a", 1.0);
        let err = reg.add_clip(&mut engine, TrackId(4), &meta, buffer, 0.0).unwrap_err();
        assert!(matches!(err, ControllerError::UnknownTrack(TrackId(4))));
    }

    #[test]
    fn empty_asset_is_rejected() {
        let (mut reg, mut engine) = setup(30);
        let t = reg.add_track(&mut engine, None).unwrap();
        let (meta, buffer) = asset("blank", 0.0);
        let err = reg.add_clip(&mut engine, t, &meta, buffer, 0.0).unwrap_err();
        assert!(matches!(err, ControllerError::EmptyAsset(ref f) if f.as_str() == "blank"));
        assert!(reg.track(t).unwrap().clips.is_empty());
        assert!(!engine.has_source(ClipId(1)));
    }

    #[test]
    fn removing_releases_engine_resources_and_selection() {
        let (mut reg, mut engine) = setup(30);
        let t = reg.add_track(&mut engine, None).unwrap();
        let (meta, buffer) = asset("a", 1.0);
        let c = reg.add_clip(&mut engine, t, &meta, buffer, 0.0).unwrap();
        reg.select_clip(t, c).unwrap();
        reg.remove_clip(&mut engine, t, c).unwrap();
        assert!(!engine.has_source(c));
        assert_eq!(reg.selected(), None);
        assert!(matches!(reg.remove_clip(&mut engine, t, c), Err(ControllerError::UnknownClip(_))));

        let (meta, buffer) = asset("b", 1.0);
        let c2 = reg.add_clip(&mut engine, t, &meta, buffer, 0.0).unwrap();
        reg.select_clip(t, c2).unwrap();
        reg.remove_track(&mut engine, t).unwrap();
        assert!(!engine.has_source(c2));
        assert!(engine.chain(t).is_none());
        assert_eq!(reg.selected(), None);
    }

    #[test]
    fn effect_edits_keep_model_and_engine_in_step() {
        let (mut reg, mut engine) = setup(30);
        let t = reg.add_track(&mut engine, None).unwrap();
        reg.set_eq_preset(&mut engine, t, "wall").unwrap();
        reg.set_eq_enabled(&mut engine, t, true).unwrap();
        reg.set_expander_enabled(&mut engine, t, true).unwrap();
        reg.set_limiter(&mut engine, t, LimiterParam::Threshold, -3.0).unwrap();

        let model = reg.track(t).unwrap().effects;
        assert_eq!(&model, engine.chain(t).unwrap().effects());
        assert_eq!(model.eq.low, 24.0);
        assert!(engine.chain(t).unwrap().stages().contains(&StageKind::Expander));
        assert!(matches!(
            reg.set_eq_preset(&mut engine, t, "radio"),
            Err(ControllerError::UnknownPreset(_))
        ));
    }

    #[test]
    fn clip_edits() {
        let (mut reg, mut engine) = setup(30);
        let t = reg.add_track(&mut engine, None).unwrap();
        let (meta, buffer) = asset("a", 3.0);
        let c = reg.add_clip(&mut engine, t, &meta, buffer, 0.0).unwrap();
        reg.move_clip(t, c, -2.0).unwrap();
        reg.set_clip_fades(t, c, 0.5, 0.25).unwrap();
        reg.set_clip_offset(t, c, 1.0).unwrap();
        reg.set_clip_gain(&mut engine, t, c, -6.0).unwrap();
        let clip = reg.track(t).unwrap().clip(c).unwrap();
        assert_eq!(clip.start_time, 0.0);
        assert_eq!((clip.fade_in, clip.fade_out), (0.5, 0.25));
        assert_eq!(clip.offset, 1.0);
        assert_eq!(clip.gain, -6.0);
    }

    #[test]
    fn clear_removes_everything() {
        let (mut reg, mut engine) = setup(30);
        reg.add_track(&mut engine, None).unwrap();
        reg.add_track(&mut engine, None).unwrap();
        reg.clear(&mut engine);
        assert!(reg.tracks().is_empty());
        assert!(engine.chains().is_empty());
    }
}
