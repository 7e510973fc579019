//! Headless controller for the multitrack engine.
//!
//! Owns the timeline model, automation, undo history, assets and the engine,
//! and provides one API for project restore, editing, playback and offline
//! rendering that the CLI and tests share.

mod assets;
mod error;
mod history;
mod realtime;
mod registry;

use std::collections::BTreeMap;
use std::sync::Arc;

use mt_engine::Engine;
use mt_ir::{
    ClipId, EqBand, ExpanderParam, FileId, Interpolation, KeyframeId, KeyframeMap, KeyframeStore,
    KeyframeUpdate, LimiterParam, MasterLimiterParam, NoiseReductionSettings, Parameter, Snapshot,
    Track, TrackId,
};

// Re-export common types so callers don't need mt-ir/mt-engine directly.
pub use mt_audio::{AudioError, AudioOutput, CpalOutput, MemoryOutput};
pub use mt_engine::{EngineConfig, Frame, PlaybackState};
pub use mt_formats::{ClipDocument, FormatError, ProjectDocument, TrackDocument};

pub use assets::AssetLibrary;
pub use error::ControllerError;
pub use history::History;
pub use realtime::{open_default_output, run_realtime};
pub use registry::{Registry, Selection};

/// Transport state and automation output of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    /// The transport reached the end during this tick.
    pub finished: bool,
    /// Automation values pushed to the selected clip's controls.
    pub automation: Vec<(Parameter, f64)>,
}

/// Outcome of restoring a project document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestoreReport {
    pub tracks: usize,
    pub clips: usize,
    /// Tracks beyond the track limit.
    pub skipped_tracks: usize,
    /// Clips whose asset was not in the library, by file id.
    pub missing_assets: Vec<FileId>,
    /// Keyframes that were invalid or pointed at a clip that was not restored.
    pub dropped_keyframes: usize,
}

/// Headless multitrack controller.
pub struct Controller {
    config: EngineConfig,
    engine: Engine,
    registry: Registry,
    keyframes: KeyframeStore,
    history: History,
    assets: AssetLibrary,
    project_name: String,
    zoom: f64,
}

impl Controller {
    pub fn new(config: EngineConfig) -> Self {
        let mut controller = Self {
            engine: Engine::new(config),
            registry: Registry::new(config.max_tracks),
            keyframes: KeyframeStore::new(),
            history: History::new(config.history_capacity),
            assets: AssetLibrary::new(),
            project_name: "Untitled".to_string(),
            zoom: 100.0,
            config,
        };
        controller.save_history();
        controller
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tracks(&self) -> &[Track] {
        self.registry.tracks()
    }

    pub fn keyframes(&self) -> &KeyframeStore {
        &self.keyframes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetLibrary {
        &mut self.assets
    }

    /// Peak-normalize an asset to `target_db` and hand the new buffer to
    /// every clip placed from it. Returns the applied gain in dB, or None
    /// for a silent asset.
    pub fn normalize_asset(&mut self, file: &FileId, target_db: f32) -> Result<Option<f32>, ControllerError> {
        if !self.assets.contains(file) {
            return Err(ControllerError::MissingAsset(file.clone()));
        }
        let Some(gain) = self.assets.normalize(file, target_db) else {
            return Ok(None);
        };
        let buffer = self.assets.buffer(file).cloned().ok_or_else(|| ControllerError::MissingAsset(file.clone()))?;

        // Sounding voices hold the old buffer; reschedule them.
        let resume = self.engine.pause();
        for track in self.registry.tracks() {
            for clip in track.clips.iter().filter(|c| &c.file_id == file) {
                self.engine.register_clip(track.id, clip.id, Arc::clone(&buffer))?;
            }
        }
        if resume {
            self.play();
        }
        Ok(Some(gain))
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn set_project_name(&mut self, name: &str) {
        self.project_name = name.to_string();
    }

    // --- Tracks and clips ---

    pub fn add_track(&mut self, name: Option<&str>) -> Result<TrackId, ControllerError> {
        self.registry.add_track(&mut self.engine, name)
    }

    /// Remove a track; its clips' automation goes with it.
    pub fn remove_track(&mut self, id: TrackId) -> Result<(), ControllerError> {
        let track = self.registry.remove_track(&mut self.engine, id)?;
        for clip in &track.clips {
            self.keyframes.clear_clip(clip.id);
        }
        self.engine.calculate_duration(self.registry.tracks());
        Ok(())
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<(), ControllerError> {
        self.registry.rename_track(id, name)
    }

    /// Place a library asset on a track.
    pub fn add_clip(&mut self, track: TrackId, file: &FileId, start_time: f64) -> Result<ClipId, ControllerError> {
        let meta = self.assets.meta(file).cloned().ok_or_else(|| ControllerError::MissingAsset(file.clone()))?;
        let buffer = self
            .assets
            .buffer(file)
            .cloned()
            .ok_or_else(|| ControllerError::MissingAsset(file.clone()))?;
        let id = self.registry.add_clip(&mut self.engine, track, &meta, buffer, start_time)?;
        self.engine.calculate_duration(self.registry.tracks());
        Ok(id)
    }

    pub fn remove_clip(&mut self, track: TrackId, clip: ClipId) -> Result<(), ControllerError> {
        self.registry.remove_clip(&mut self.engine, track, clip)?;
        self.keyframes.clear_clip(clip);
        self.engine.calculate_duration(self.registry.tracks());
        Ok(())
    }

    pub fn move_clip(&mut self, track: TrackId, clip: ClipId, start_time: f64) -> Result<(), ControllerError> {
        self.registry.move_clip(track, clip, start_time)?;
        self.engine.calculate_duration(self.registry.tracks());
        Ok(())
    }

    pub fn set_clip_gain(&mut self, track: TrackId, clip: ClipId, db: f32) -> Result<(), ControllerError> {
        self.registry.set_clip_gain(&mut self.engine, track, clip, db)
    }

    pub fn set_clip_fades(
        &mut self,
        track: TrackId,
        clip: ClipId,
        fade_in: f64,
        fade_out: f64,
    ) -> Result<(), ControllerError> {
        self.registry.set_clip_fades(track, clip, fade_in, fade_out)
    }

    pub fn set_clip_offset(&mut self, track: TrackId, clip: ClipId, offset: f64) -> Result<(), ControllerError> {
        self.registry.set_clip_offset(track, clip, offset)
    }

    pub fn select_clip(&mut self, track: TrackId, clip: ClipId) -> Result<(), ControllerError> {
        self.registry.select_clip(track, clip)
    }

    pub fn clear_selection(&mut self) {
        self.registry.clear_selection();
    }

    // --- Mixer and effects ---

    pub fn set_track_volume(&mut self, id: TrackId, volume: f32) -> Result<(), ControllerError> {
        self.registry.set_volume(&mut self.engine, id, volume)
    }

    pub fn set_track_mute(&mut self, id: TrackId, mute: bool) -> Result<(), ControllerError> {
        self.registry.set_mute(&mut self.engine, id, mute)
    }

    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) -> Result<(), ControllerError> {
        self.registry.set_solo(&mut self.engine, id, solo)
    }

    pub fn set_track_pan(&mut self, id: TrackId, pan: f32) -> Result<(), ControllerError> {
        self.registry.set_pan(&mut self.engine, id, pan)
    }

    pub fn set_track_eq(&mut self, id: TrackId, band: EqBand, db: f32) -> Result<(), ControllerError> {
        self.registry.set_eq(&mut self.engine, id, band, db)
    }

    pub fn set_track_eq_preset(&mut self, id: TrackId, name: &str) -> Result<(), ControllerError> {
        self.registry.set_eq_preset(&mut self.engine, id, name)
    }

    pub fn set_track_eq_enabled(&mut self, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.registry.set_eq_enabled(&mut self.engine, id, on)
    }

    pub fn set_track_limiter(&mut self, id: TrackId, param: LimiterParam, value: f32) -> Result<(), ControllerError> {
        self.registry.set_limiter(&mut self.engine, id, param, value)
    }

    pub fn set_track_limiter_enabled(&mut self, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.registry.set_limiter_enabled(&mut self.engine, id, on)
    }

    pub fn set_track_expander(
        &mut self,
        id: TrackId,
        param: ExpanderParam,
        value: f32,
    ) -> Result<(), ControllerError> {
        self.registry.set_expander(&mut self.engine, id, param, value)
    }

    pub fn set_track_expander_enabled(&mut self, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.registry.set_expander_enabled(&mut self.engine, id, on)
    }

    pub fn set_track_noise_reduction(
        &mut self,
        id: TrackId,
        settings: NoiseReductionSettings,
    ) -> Result<(), ControllerError> {
        self.registry.set_noise_reduction(&mut self.engine, id, settings)
    }

    pub fn set_track_noise_reduction_enabled(&mut self, id: TrackId, on: bool) -> Result<(), ControllerError> {
        self.registry.set_noise_reduction_enabled(&mut self.engine, id, on)
    }

    pub fn set_master_eq(&mut self, band: EqBand, db: f32) {
        self.engine.set_master_eq(band, db);
    }

    pub fn set_master_limiter(&mut self, param: MasterLimiterParam, value: f32) {
        self.engine.set_master_limiter(param, value);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.engine.set_master_volume(volume);
    }

    // --- Automation ---

    fn require_clip(&self, clip: ClipId) -> Result<(), ControllerError> {
        self.registry.find_clip(clip).map(|_| ()).ok_or(ControllerError::UnknownClip(clip))
    }

    pub fn add_keyframe(
        &mut self,
        clip: ClipId,
        parameter: Parameter,
        time: f64,
        value: f64,
        interpolation: Interpolation,
    ) -> Result<KeyframeId, ControllerError> {
        self.require_clip(clip)?;
        let id = self.keyframes.add_keyframe(clip, parameter, time, value, interpolation)?;
        self.save_history();
        Ok(id)
    }

    pub fn remove_keyframe(&mut self, clip: ClipId, parameter: &Parameter, id: KeyframeId) -> bool {
        let removed = self.keyframes.remove_keyframe(clip, parameter, id);
        if removed {
            self.save_history();
        }
        removed
    }

    pub fn update_keyframe(
        &mut self,
        clip: ClipId,
        parameter: &Parameter,
        id: KeyframeId,
        update: KeyframeUpdate,
    ) -> Result<bool, ControllerError> {
        let updated = self.keyframes.update_keyframe(clip, parameter, id, update)?;
        if updated {
            self.save_history();
        }
        Ok(updated)
    }

    /// Copy every curve of `source` onto `target`, shifted by `offset`.
    pub fn copy_clip_keyframes(&mut self, source: ClipId, target: ClipId, offset: f64) -> Result<(), ControllerError> {
        self.require_clip(target)?;
        self.keyframes.copy_clip_keyframes(source, target, offset);
        self.save_history();
        Ok(())
    }

    pub fn clear_clip_keyframes(&mut self, clip: ClipId) {
        self.keyframes.clear_clip(clip);
        self.save_history();
    }

    pub fn clear_parameter_keyframes(&mut self, clip: ClipId, parameter: &Parameter) {
        self.keyframes.clear_parameter(clip, parameter);
        self.save_history();
    }

    /// Sample the selected clip's volume, pan and gain curves at the
    /// playhead and push in-range values to the matching controls.
    fn apply_automation(&mut self) -> Result<Vec<(Parameter, f64)>, ControllerError> {
        let mut applied = Vec::new();
        let Some(sel) = self.registry.selected() else {
            return Ok(applied);
        };
        let Some(track) = self.registry.track(sel.track) else {
            return Ok(applied);
        };
        let Some(clip) = track.clip(sel.clip) else {
            return Ok(applied);
        };
        let Some(rel) = clip.local_time(self.engine.current_time()) else {
            return Ok(applied);
        };
        let (volume, pan, gain) = (track.volume, track.pan, clip.gain);

        for parameter in Parameter::PLAYBACK {
            let manual = match parameter {
                Parameter::Volume => volume as f64,
                Parameter::Pan => pan as f64,
                _ => gain as f64,
            };
            let sampled = self.keyframes.value_at_time_in_range(sel.clip, &parameter, rel, manual);
            if !sampled.in_range {
                continue;
            }
            let v = sampled.value as f32;
            match parameter {
                Parameter::Volume => self.registry.set_volume(&mut self.engine, sel.track, v)?,
                Parameter::Pan => self.registry.set_pan(&mut self.engine, sel.track, v)?,
                _ => self.registry.set_clip_gain(&mut self.engine, sel.track, sel.clip, v)?,
            }
            applied.push((parameter, sampled.value));
        }
        Ok(applied)
    }

    // --- Transport ---

    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.engine.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    /// Start playback from the playhead. No-op while playing.
    pub fn play(&mut self) -> bool {
        let from = self.engine.current_time();
        self.engine.play(self.registry.tracks(), from)
    }

    pub fn pause(&mut self) -> bool {
        self.engine.pause()
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn seek(&mut self, time: f64) {
        self.engine.calculate_duration(self.registry.tracks());
        self.engine.seek(self.registry.tracks(), time);
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.engine.set_playback_rate(rate);
    }

    /// Advance the transport by `dt` seconds and run automation.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let finished = self.engine.tick(dt);
        let automation = if self.engine.is_playing() {
            self.apply_automation().unwrap_or_else(|e| {
                log::warn!("automation: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };
        TickReport {
            current_time: self.engine.current_time(),
            duration: self.engine.duration(),
            playing: self.engine.is_playing(),
            finished,
            automation,
        }
    }

    /// Render one tick's worth of frames into `buf`, then tick.
    pub fn render_tick(&mut self, buf: &mut Vec<Frame>) -> TickReport {
        let frames = self.config.frames_per_tick();
        buf.resize(frames, Frame::silence());
        self.engine.render_into(buf);
        self.tick(frames as f64 / self.config.sample_rate as f64)
    }

    // --- Offline rendering ---

    /// Render `count` frames without touching the transport.
    pub fn render_frames(&mut self, count: usize) -> Vec<Frame> {
        self.engine.render_frames(count)
    }

    /// Play from `start` until the end of the timeline and collect the output.
    pub fn render_timeline(&mut self, start: f64) -> Vec<Frame> {
        self.stop();
        self.seek(start);
        self.play();
        let mut out = Vec::new();
        let mut buf = Vec::new();
        while self.is_playing() {
            let report = self.render_tick(&mut buf);
            out.extend_from_slice(&buf);
            if report.finished {
                break;
            }
        }
        out
    }

    /// Render the timeline to 16-bit stereo WAV bytes.
    pub fn render_to_wav(&mut self, start: f64) -> Vec<u8> {
        let frames = self.render_timeline(start);
        mt_formats::frames_to_wav(&frames, self.config.sample_rate)
    }

    // --- History ---

    /// Record automation and playhead as an undo step.
    pub fn save_history(&mut self) {
        let snapshot = Snapshot { keyframes: self.keyframes.to_map(), current_time: self.engine.current_time() };
        self.history.save(snapshot);
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.load_snapshot(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.load_snapshot(&snapshot);
                true
            }
            None => false,
        }
    }

    fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.history.set_restoring(true);
        let dropped = self.keyframes.load_map(&snapshot.keyframes);
        if dropped > 0 {
            log::warn!("{} keyframes dropped while restoring history", dropped);
        }
        self.seek(snapshot.current_time);
        self.history.set_restoring(false);
    }

    // --- Projects ---

    /// Replace the session with a project document. Assets must already be
    /// in the library; clips whose asset is missing are skipped and reported.
    pub fn restore_project(&mut self, doc: &ProjectDocument) -> Result<RestoreReport, ControllerError> {
        self.stop();
        self.registry.clear(&mut self.engine);
        self.keyframes.clear();
        self.project_name = doc.project_name.clone();
        self.zoom = doc.zoom;
        self.engine.set_master_settings(doc.effect_settings);

        let mut report = RestoreReport::default();
        let mut clip_ids: BTreeMap<u32, ClipId> = BTreeMap::new();

        for track_doc in &doc.tracks {
            let name = (!track_doc.name.is_empty()).then_some(track_doc.name.as_str());
            let id = match self.registry.add_track(&mut self.engine, name) {
                Ok(id) => id,
                Err(ControllerError::CapacityExceeded(max)) => {
                    log::warn!("track limit {} reached, skipping track {:?}", max, track_doc.name);
                    report.skipped_tracks += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.tracks += 1;
            self.registry.set_volume(&mut self.engine, id, track_doc.volume)?;
            self.registry.set_mute(&mut self.engine, id, track_doc.mute)?;
            self.registry.set_solo(&mut self.engine, id, track_doc.solo)?;
            self.registry.set_pan(&mut self.engine, id, track_doc.pan)?;
            self.registry.set_effects(&mut self.engine, id, track_doc.effects)?;

            for clip_doc in &track_doc.clips {
                let (Some(meta), Some(buffer)) =
                    (self.assets.meta(&clip_doc.file_id), self.assets.buffer(&clip_doc.file_id))
                else {
                    log::warn!("asset {} not found, skipping clip {}", clip_doc.file_id, clip_doc.id);
                    report.missing_assets.push(clip_doc.file_id.clone());
                    continue;
                };
                let (meta, buffer) = (meta.clone(), buffer.clone());
                let clip = match self.registry.add_clip(&mut self.engine, id, &meta, buffer, clip_doc.start_time) {
                    Ok(clip) => clip,
                    Err(ControllerError::EmptyAsset(file)) => {
                        log::warn!("asset {} holds no audio, skipping clip {}", file, clip_doc.id);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                self.registry.set_clip_duration(id, clip, clip_doc.duration)?;
                self.registry.set_clip_offset(id, clip, clip_doc.offset)?;
                self.registry.set_clip_fades(id, clip, clip_doc.fade_in, clip_doc.fade_out)?;
                self.registry.set_clip_gain(&mut self.engine, id, clip, clip_doc.gain)?;
                clip_ids.insert(clip_doc.id, clip);
                report.clips += 1;
            }
        }

        if let Some(map) = &doc.keyframes {
            let mut remapped = KeyframeMap::new();
            for (old, curves) in map {
                match clip_ids.get(&old.0) {
                    Some(&new) => {
                        remapped.insert(new, curves.clone());
                    }
                    None => report.dropped_keyframes += curves.values().map(Vec::len).sum::<usize>(),
                }
            }
            report.dropped_keyframes += self.keyframes.load_map(&remapped);
        }

        self.engine.calculate_duration(self.registry.tracks());
        self.history.clear();
        self.save_history();
        log::info!(
            "restored project {:?}: {} tracks, {} clips, {} missing assets",
            self.project_name,
            report.tracks,
            report.clips,
            report.missing_assets.len()
        );
        Ok(report)
    }

    /// Export the session in the persisted document shape.
    pub fn to_project(&self) -> ProjectDocument {
        let tracks = self
            .registry
            .tracks()
            .iter()
            .map(|t| TrackDocument {
                id: t.id.0,
                name: t.name.clone(),
                volume: t.volume,
                mute: t.mute,
                solo: t.solo,
                pan: t.pan,
                effects: t.effects,
                clips: t
                    .clips
                    .iter()
                    .map(|c| ClipDocument {
                        id: c.id.0,
                        file_id: c.file_id.clone(),
                        start_time: c.start_time,
                        duration: c.duration,
                        offset: c.offset,
                        gain: c.gain,
                        fade_in: c.fade_in,
                        fade_out: c.fade_out,
                    })
                    .collect(),
            })
            .collect();
        let keyframes = self.keyframes.to_map();
        ProjectDocument {
            project_name: self.project_name.clone(),
            sample_rate: self.config.sample_rate,
            tracks,
            audio_files: self.assets.metas(),
            effect_settings: *self.engine.master_settings(),
            zoom: self.zoom,
            keyframes: (!keyframes.is_empty()).then_some(keyframes),
            ..ProjectDocument::default()
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_ir::{AssetBuffer, AudioBuffer};

    const SR: u32 = 1000;

    fn controller() -> Controller {
        let config = EngineConfig { sample_rate: SR, tick_hz: 100, master_volume: 1.0, ..EngineConfig::default() };
        let mut c = Controller::new(config);
        let buffer = AssetBuffer::new(SR, AudioBuffer::from_planes(&[vec![0.25; 4 * SR as usize]]));
        c.assets_mut().insert(FileId::from("tone"), "tone", "sfx", buffer);
        c
    }

    fn with_clip(c: &mut Controller, start: f64) -> (TrackId, ClipId) {
        let t = c.add_track(None).unwrap();
        let clip = c.add_clip(t, &FileId::from("tone"), start).unwrap();
        (t, clip)
    }

    #[test]
    fn new_controller_has_initial_snapshot() {
        let c = controller();
        assert_eq!(c.history().len(), 1);
        assert!(!c.history().can_undo());
    }

    #[test]
    fn missing_asset_is_an_error() {
        let mut c = controller();
        let t = c.add_track(None).unwrap();
        assert!(matches!(
            c.add_clip(t, &FileId::from("nope"), 0.0),
            Err(ControllerError::MissingAsset(_))
        ));
    }

    #[test]
    fn keyframe_edits_are_undoable() {
        let mut c = controller();
        let (_, clip) = with_clip(&mut c, 0.0);
        c.add_keyframe(clip, Parameter::Volume, 0.0, 0.0, Interpolation::Linear).unwrap();
        c.add_keyframe(clip, Parameter::Volume, 2.0, 1.0, Interpolation::Linear).unwrap();
        assert_eq!(c.keyframes().value_at_time(clip, &Parameter::Volume, 1.0, 0.8), 0.5);

        assert!(c.undo());
        assert_eq!(c.keyframes().parameter_keyframes(clip, &Parameter::Volume).len(), 1);
        assert!(c.undo());
        assert!(!c.keyframes().has_keyframes(clip, None));
        assert!(!c.undo());

        assert!(c.redo());
        assert!(c.redo());
        assert_eq!(c.keyframes().parameter_keyframes(clip, &Parameter::Volume).len(), 2);
        assert!(!c.redo());
        assert_eq!(c.history().len(), 3);
    }

    #[test]
    fn keyframes_on_unknown_clip_are_rejected() {
        let mut c = controller();
        let err = c.add_keyframe(ClipId(42), Parameter::Pan, 0.0, 0.0, Interpolation::Step).unwrap_err();
        assert!(matches!(err, ControllerError::UnknownClip(ClipId(42))));
        let (_, clip) = with_clip(&mut c, 0.0);
        let err = c.add_keyframe(clip, Parameter::Pan, -1.0, 0.0, Interpolation::Step).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidKeyframe(_)));
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn undo_restores_playhead() {
        let mut c = controller();
        let (_, clip) = with_clip(&mut c, 0.0);
        c.seek(1.5);
        c.add_keyframe(clip, Parameter::Gain, 0.0, -3.0, Interpolation::Linear).unwrap();
        c.seek(3.0);
        c.add_keyframe(clip, Parameter::Gain, 1.0, 0.0, Interpolation::Linear).unwrap();
        c.undo();
        assert_eq!(c.current_time(), 1.5);
    }

    #[test]
    fn automation_drives_selected_clip_controls() {
        let mut c = controller();
        let (t, clip) = with_clip(&mut c, 1.0);
        c.add_keyframe(clip, Parameter::Volume, 0.0, 0.2, Interpolation::Linear).unwrap();
        c.add_keyframe(clip, Parameter::Volume, 1.0, 0.6, Interpolation::Linear).unwrap();
        c.select_clip(t, clip).unwrap();
        c.play();

        // Before the clip: nothing applied, manual value kept.
        let report = c.tick(0.5);
        assert!(report.automation.is_empty());
        assert_eq!(c.tracks()[0].volume, 0.8);

        // Half-way through the curve.
        let report = c.tick(1.0);
        let (p, v) = &report.automation[0];
        assert_eq!(p, &Parameter::Volume);
        assert!((v - 0.4).abs() < 1e-9);
        assert!((c.tracks()[0].volume - 0.4).abs() < 1e-6);

        // Past the last keyframe: out of range, value stays.
        let report = c.tick(1.0);
        assert!(report.automation.is_empty());
        assert!((c.tracks()[0].volume - 0.4).abs() < 1e-6);
    }

    #[test]
    fn unselected_clips_are_not_automated() {
        let mut c = controller();
        let (_, clip) = with_clip(&mut c, 0.0);
        c.add_keyframe(clip, Parameter::Pan, 0.0, -1.0, Interpolation::Step).unwrap();
        c.add_keyframe(clip, Parameter::Pan, 2.0, 1.0, Interpolation::Step).unwrap();
        c.play();
        let report = c.tick(0.5);
        assert!(report.automation.is_empty());
        assert_eq!(c.tracks()[0].pan, 0.0);
    }

    #[test]
    fn render_timeline_runs_to_the_end() {
        let mut c = controller();
        with_clip(&mut c, 0.0);
        let frames = c.render_timeline(0.0);
        assert!(!c.is_playing());
        assert_eq!(c.current_time(), 0.0);
        assert!(frames.len() >= 4 * SR as usize);
        assert!(frames.len() <= 4 * SR as usize + c.config().frames_per_tick());
    }

    #[test]
    fn removing_a_clip_drops_its_automation() {
        let mut c = controller();
        let (t, clip) = with_clip(&mut c, 0.0);
        c.add_keyframe(clip, Parameter::Volume, 0.0, 0.5, Interpolation::Linear).unwrap();
        c.remove_clip(t, clip).unwrap();
        assert!(!c.keyframes().has_keyframes(clip, None));
        assert_eq!(c.duration(), 0.0);
    }

    #[test]
    fn normalize_reaches_sounding_clips() {
        let mut c = controller();
        with_clip(&mut c, 0.0);
        c.set_master_limiter(MasterLimiterParam::Threshold, 0.0);
        c.play();
        let before = c.render_frames(10)[9].left;
        assert!(before > 0.0);

        let gain = c.normalize_asset(&FileId::from("tone"), 0.0).unwrap().unwrap();
        assert!((gain - 12.04).abs() < 0.01);
        assert!(c.is_playing());
        let after = c.render_frames(1)[0].left;
        assert!((after - 4.0 * before).abs() < 1e-3, "{} vs {}", after, before);
    }

    #[test]
    fn normalize_unknown_or_silent_asset() {
        let mut c = controller();
        assert!(matches!(
            c.normalize_asset(&FileId::from("nope"), 0.0),
            Err(ControllerError::MissingAsset(_))
        ));
        let quiet = AssetBuffer::new(SR, AudioBuffer::new(1, 100));
        c.assets_mut().insert(FileId::from("quiet"), "quiet", "", quiet);
        assert_eq!(c.normalize_asset(&FileId::from("quiet"), 0.0).unwrap(), None);
    }

    #[test]
    fn empty_asset_cannot_be_placed() {
        let mut c = controller();
        let empty = AssetBuffer::new(SR, AudioBuffer::from_planes(&[Vec::new()]));
        c.assets_mut().insert(FileId::from("empty"), "empty", "", empty);
        let t = c.add_track(None).unwrap();
        assert!(matches!(c.add_clip(t, &FileId::from("empty"), 0.0), Err(ControllerError::EmptyAsset(_))));
        assert!(c.tracks()[0].clips.is_empty());
    }
}
