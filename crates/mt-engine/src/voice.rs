//! Voice: one scheduled playback of a clip source.

use alloc::sync::Arc;
use mt_ir::{AssetBuffer, ClipId};

use crate::frame::Frame;
use crate::param_timeline::{EnvelopeShape, ParamTimeline};

/// Where and how fast a voice reads its source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSchedule {
    /// First engine frame that sounds.
    pub start_frame: u64,
    /// Engine frame at which the voice stops (exclusive).
    pub end_frame: u64,
    /// Initial read position in source frames.
    pub source_position: f64,
    /// Source frames advanced per engine frame.
    pub increment: f64,
}

/// A single voice producing audio from a clip's asset.
#[derive(Clone, Debug)]
pub struct Voice {
    pub clip_id: ClipId,
    source: Arc<AssetBuffer>,
    schedule: VoiceSchedule,
    position: f64,
    shape: EnvelopeShape,
    envelope: ParamTimeline,
    finished: bool,
}

impl Voice {
    pub fn new(
        clip_id: ClipId,
        source: Arc<AssetBuffer>,
        schedule: VoiceSchedule,
        shape: EnvelopeShape,
        level: f32,
    ) -> Self {
        Self {
            clip_id,
            source,
            position: schedule.source_position,
            schedule,
            shape,
            envelope: shape.timeline(level),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn schedule(&self) -> &VoiceSchedule {
        &self.schedule
    }

    pub fn envelope(&self) -> &ParamTimeline {
        &self.envelope
    }

    /// Rewrite the envelope with a new sustain level, keeping its anchors.
    pub fn set_level(&mut self, level: f32) {
        self.envelope = self.shape.timeline(level);
    }

    /// Render the frame at engine frame `clock` (engine time `now` seconds).
    #[inline]
    pub fn render(&mut self, clock: u64, now: f64) -> Frame {
        if self.finished || clock < self.schedule.start_frame {
            return Frame::silence();
        }
        if clock >= self.schedule.end_frame {
            self.finished = true;
            return Frame::silence();
        }

        let buffer = &self.source.buffer;
        let frames = buffer.frames();
        if self.position >= frames as f64 {
            self.finished = true;
            return Frame::silence();
        }

        let idx = self.position as usize;
        let frac = (self.position - idx as f64) as f32;
        let read = |ch: u16| {
            let a = buffer.sample(ch, idx);
            let b = buffer.sample(ch, idx + 1);
            a + (b - a) * frac
        };
        let left = read(0);
        let right = if buffer.channels() > 1 { read(1) } else { left };

        let mut out = Frame::new(left, right);
        out.scale(self.envelope.value_at(now));
        self.position += self.schedule.increment;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_ir::AudioBuffer;

    fn ramp_asset() -> Arc<AssetBuffer> {
        let data: alloc::vec::Vec<f32> = (0..8).map(|i| i as f32 / 8.0).collect();
        Arc::new(AssetBuffer::new(8, AudioBuffer::from_planes(&[data])))
    }

    fn flat(start: u64, end: u64, increment: f64) -> Voice {
        let schedule = VoiceSchedule { start_frame: start, end_frame: end, source_position: 0.0, increment };
        let shape = EnvelopeShape { true_start: -1.0, true_end: 100.0, fade_in: 0.0, fade_out: 0.0 };
        Voice::new(ClipId(1), ramp_asset(), schedule, shape, 1.0)
    }

    #[test]
    fn silent_before_start() {
        let mut v = flat(2, 10, 1.0);
        assert_eq!(v.render(0, 0.0), Frame::silence());
        assert_eq!(v.render(1, 0.0), Frame::silence());
        assert_eq!(v.render(2, 0.0), Frame::mono(0.0));
        assert_eq!(v.render(3, 0.0), Frame::mono(0.125));
    }

    #[test]
    fn half_speed_interpolates() {
        let mut v = flat(0, 10, 0.5);
        v.render(0, 0.0);
        let f = v.render(1, 0.0);
        assert!((f.left - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn stops_at_end_frame() {
        let mut v = flat(0, 2, 1.0);
        v.render(0, 0.0);
        v.render(1, 0.0);
        assert_eq!(v.render(2, 0.0), Frame::silence());
        assert!(v.is_finished());
    }

    #[test]
    fn stops_when_source_runs_out() {
        let mut v = flat(0, 100, 1.0);
        for clock in 0..8 {
            v.render(clock, 0.0);
        }
        assert_eq!(v.render(8, 0.0), Frame::silence());
        assert!(v.is_finished());
    }

    #[test]
    fn set_level_rescales_envelope() {
        let mut v = flat(0, 10, 1.0);
        v.set_level(0.5);
        v.render(0, 0.0);
        let f = v.render(1, 0.0);
        assert!((f.right - 0.0625).abs() < 1e-6);
        assert_eq!(v.envelope().points().len(), 1);
    }
}
