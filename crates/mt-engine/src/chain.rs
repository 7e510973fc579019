//! Runtime state of one track's signal chain.

use alloc::boxed::Box;
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use slotmap::SecondaryMap;

use mt_ir::{
    ChainGraph, EffectChainState, EqBand, ExpanderParam, LimiterParam, MixFlags, NodeId,
    StageKind, Track, TrackId, MAX_STAGES,
};

use crate::frame::Frame;
use crate::processor::Processor;
use crate::processors::{self, expander, filter, gain, limiter, panner};
use crate::voice::Voice;

/// A track's voices, stage processors and wiring.
pub struct TrackChain {
    pub track_id: TrackId,
    mix: MixFlags,
    pan: f32,
    effects: EffectChainState,
    graph: ChainGraph,
    processors: SecondaryMap<NodeId, Box<dyn Processor>>,
    order: ArrayVec<NodeId, MAX_STAGES>,
    voices: Vec<Voice>,
}

fn eq_stage(band: EqBand) -> StageKind {
    match band {
        EqBand::Low => StageKind::EqLow,
        EqBand::Mid => StageKind::EqMid,
        EqBand::High => StageKind::EqHigh,
    }
}

impl TrackChain {
    /// Materialize every stage for a track and wire the enabled ones.
    pub fn new(track: &Track, sample_rate: u32) -> Self {
        let graph = ChainGraph::new();
        let mut procs = SecondaryMap::new();
        for kind in StageKind::ORDER {
            if let Some(mut p) = processors::create_processor(kind) {
                p.init(sample_rate);
                procs.insert(graph.node(kind), p);
            }
        }
        let mut chain = Self {
            track_id: track.id,
            mix: track.mix_flags(),
            pan: 0.0,
            effects: track.effects,
            graph,
            processors: procs,
            order: ArrayVec::new(),
            voices: Vec::new(),
        };
        chain.set_pan(track.pan);
        chain.apply_effects(&track.effects);
        chain
    }

    pub fn mix(&self) -> MixFlags {
        self.mix
    }

    pub fn mix_mut(&mut self) -> &mut MixFlags {
        &mut self.mix
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn effects(&self) -> &EffectChainState {
        &self.effects
    }

    pub fn graph(&self) -> &ChainGraph {
        &self.graph
    }

    /// Stage kinds in current processing order.
    pub fn stages(&self) -> ArrayVec<StageKind, MAX_STAGES> {
        self.order.iter().filter_map(|&id| self.graph.kind(id)).collect()
    }

    fn set_stage_param(&mut self, kind: StageKind, param: u16, value: f32) {
        if let Some(p) = self.processors.get_mut(self.graph.node(kind)) {
            p.set_param(param, value);
        }
    }

    /// Drop every connection and reconnect the enabled stages in order.
    pub fn rebuild(&mut self) {
        self.graph.rebuild(self.effects.stage_flags());
        self.order = self.graph.processing_order();
        log::debug!(
            "track {} chain rebuilt: {} stages, {} connections",
            self.track_id,
            self.order.len(),
            self.graph.connections().len()
        );
    }

    /// Unwire the chain entirely (track removal).
    pub fn disconnect(&mut self) {
        self.voices.clear();
        self.graph.disconnect_all();
        self.order.clear();
    }

    /// Push every parameter of `effects` into the processors and rewire.
    pub fn apply_effects(&mut self, effects: &EffectChainState) {
        self.effects = *effects;
        for band in EqBand::ALL {
            self.set_stage_param(eq_stage(band), filter::GAIN_DB, effects.eq.get(band));
        }
        let lim = effects.limiter;
        self.set_stage_param(StageKind::Limiter, limiter::THRESHOLD, lim.threshold);
        self.set_stage_param(StageKind::Limiter, limiter::RATIO, lim.ratio);
        self.set_stage_param(StageKind::Limiter, limiter::RELEASE, lim.release);
        let exp = effects.expander;
        self.set_stage_param(StageKind::Expander, expander::THRESHOLD, exp.threshold);
        self.set_stage_param(StageKind::Expander, expander::RATIO, exp.ratio);
        self.set_stage_param(StageKind::Expander, expander::ATTACK, exp.attack);
        self.set_stage_param(StageKind::Expander, expander::RELEASE, exp.release);
        let nr = effects.noise_reduction;
        self.set_stage_param(StageKind::Highpass, filter::FREQUENCY, nr.highpass_frequency);
        self.set_stage_param(StageKind::Highpass, filter::Q, nr.highpass_resonance);
        self.set_stage_param(StageKind::Lowpass, filter::FREQUENCY, nr.lowpass_frequency);
        self.set_stage_param(StageKind::Lowpass, filter::Q, nr.lowpass_resonance);
        self.rebuild();
    }

    /// Set the resolved (solo/mute applied) gain of the input stage.
    pub fn set_input_gain(&mut self, value: f32) {
        self.set_stage_param(StageKind::Input, gain::GAIN, value);
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
        self.set_stage_param(StageKind::Pan, panner::PAN, self.pan);
    }

    pub fn set_eq(&mut self, band: EqBand, db: f32) {
        self.effects.eq.set(band, db);
        self.set_stage_param(eq_stage(band), filter::GAIN_DB, db);
    }

    pub fn set_limiter(&mut self, param: LimiterParam, value: f32) {
        self.effects.limiter.set(param, value);
        let id = match param {
            LimiterParam::Threshold => limiter::THRESHOLD,
            LimiterParam::Release => limiter::RELEASE,
            LimiterParam::Ratio => limiter::RATIO,
        };
        self.set_stage_param(StageKind::Limiter, id, value);
    }

    pub fn set_expander(&mut self, param: ExpanderParam, value: f32) {
        self.effects.expander.set(param, value);
        let id = match param {
            ExpanderParam::Threshold => expander::THRESHOLD,
            ExpanderParam::Ratio => expander::RATIO,
            ExpanderParam::Attack => expander::ATTACK,
            ExpanderParam::Release => expander::RELEASE,
        };
        self.set_stage_param(StageKind::Expander, id, value);
    }

    // --- Voices ---

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn add_voice(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Stop and drop every voice.
    pub fn clear_voices(&mut self) {
        self.voices.clear();
    }

    /// Stop the voice playing `clip`, if any.
    pub fn release_voice(&mut self, clip: mt_ir::ClipId) {
        self.voices.retain(|v| v.clip_id != clip);
    }

    pub fn voice_mut(&mut self, clip: mt_ir::ClipId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.clip_id == clip)
    }

    /// Reset every processor's internal state.
    pub fn reset(&mut self) {
        for (_, p) in self.processors.iter_mut() {
            p.reset();
        }
    }

    /// Render one frame through the chain.
    #[inline]
    pub fn render(&mut self, clock: u64, now: f64) -> Frame {
        let mut frame = Frame::silence();
        for voice in &mut self.voices {
            frame.mix(voice.render(clock, now));
        }
        for &id in &self.order {
            if let Some(p) = self.processors.get_mut(id) {
                p.process(&mut frame);
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_ir::palette_color;

    fn track() -> Track {
        Track::new(TrackId(1), "Track 1", palette_color(0))
    }

    #[test]
    fn default_chain_is_gain_pan_out() {
        let chain = TrackChain::new(&track(), 48000);
        assert_eq!(chain.stages().as_slice(), [StageKind::Input, StageKind::Pan, StageKind::Output]);
    }

    #[test]
    fn enabling_effects_inserts_stages_in_order() {
        let mut t = track();
        t.effects.limiter_enabled = true;
        t.effects.expander_enabled = true;
        t.effects.noise_reduction_enabled = true;
        t.effects.noise_reduction.lowpass_enabled = true;
        let chain = TrackChain::new(&t, 48000);
        assert_eq!(
            chain.stages().as_slice(),
            [
                StageKind::Input,
                StageKind::Expander,
                StageKind::Lowpass,
                StageKind::Pan,
                StageKind::Limiter,
                StageKind::Output,
            ]
        );
    }

    #[test]
    fn idle_chain_renders_silence() {
        let mut chain = TrackChain::new(&track(), 48000);
        chain.set_input_gain(0.8);
        assert_eq!(chain.render(0, 0.0), Frame::silence());
    }

    #[test]
    fn disconnect_clears_wiring() {
        let mut chain = TrackChain::new(&track(), 48000);
        chain.disconnect();
        assert!(chain.graph().connections().is_empty());
        assert!(chain.stages().is_empty());
    }
}
