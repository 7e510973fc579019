//! Allocation-free render path tests.
//!
//! These tests verify that `Engine::render_frame()` does not allocate
//! once playback is scheduled. They render several seconds of a session
//! with every effect stage switched on, through fades, automation-driven
//! control changes and clip boundaries.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use std::sync::Arc;

use mt_engine::{Engine, EngineConfig, Frame};
use mt_ir::{palette_color, AssetBuffer, AudioBuffer, Clip, ClipId, FileId, Track, TrackId};

const SR: u32 = 44100;

fn noise(seconds: u32, channels: usize) -> Arc<AssetBuffer> {
    let plane: Vec<f32> = (0..SR * seconds).map(|i| ((i * 7919) % 2000) as f32 / 1000.0 - 1.0).collect();
    let planes = vec![plane; channels];
    Arc::new(AssetBuffer::new(SR, AudioBuffer::from_planes(&planes)))
}

/// Build `tracks` tracks with two clips each, optionally with every stage on.
fn session(tracks: u32, effects: bool) -> (Engine, Vec<Track>) {
    let mut engine = Engine::new(EngineConfig { sample_rate: SR, ..EngineConfig::default() });
    let mono = noise(2, 1);
    let stereo = noise(3, 2);

    let mut list = Vec::new();
    for id in 1..=tracks {
        let mut track = Track::new(TrackId(id), "t", palette_color(id as usize - 1));
        track.pan = if id % 2 == 0 { -0.5 } else { 0.7 };
        track.effects.eq_enabled = effects;
        track.effects.limiter_enabled = effects;
        track.effects.expander_enabled = effects;
        track.effects.noise_reduction_enabled = effects;
        track.effects.noise_reduction.lowpass_enabled = effects;
        track.effects.eq.low = 4.0;
        track.effects.eq.high = -6.0;
        engine.add_track(&track).unwrap();

        for (n, (asset, start)) in [(&mono, 0.25), (&stereo, 1.5)].into_iter().enumerate() {
            let clip_id = ClipId(id * 10 + n as u32);
            engine.register_clip(track.id, clip_id, Arc::clone(asset)).unwrap();
            let mut clip = Clip::new(clip_id, FileId::from("noise"), "noise", start, asset.duration());
            clip.fade_in = 0.3;
            clip.fade_out = 0.4;
            clip.gain = -3.0;
            track.clips.push(clip);
        }
        list.push(track);
    }
    (engine, list)
}

/// Render `duration_frames` frames, aborting on any heap allocation.
fn assert_render_alloc_free(engine: &mut Engine, duration_frames: usize) {
    let mut buf = vec![Frame::silence(); 512];
    assert_no_alloc(|| {
        let mut left = duration_frames;
        while left > 0 {
            let n = left.min(buf.len());
            engine.render_into(&mut buf[..n]);
            left -= n;
        }
    });
}

#[test]
fn dry_session_alloc_free() {
    let (mut engine, tracks) = session(4, false);
    engine.play(&tracks, 0.0);
    assert_render_alloc_free(&mut engine, SR as usize * 5);
}

#[test]
fn full_chain_alloc_free() {
    let (mut engine, tracks) = session(8, true);
    engine.play(&tracks, 0.0);
    assert_render_alloc_free(&mut engine, SR as usize * 5);
}

#[test]
fn control_changes_between_blocks_alloc_free() {
    let (mut engine, tracks) = session(4, true);
    engine.play(&tracks, 0.5);
    for step in 0..20 {
        // Control changes happen between blocks, outside the render path.
        let level = 0.5 + step as f32 / 40.0;
        engine.set_clip_level(ClipId(20), level).unwrap();
        engine.set_track_pan(TrackId(1), level - 0.5).unwrap();
        assert_render_alloc_free(&mut engine, SR as usize / 10);
    }
}

#[test]
fn silent_engine_alloc_free() {
    let (mut engine, _) = session(2, true);
    assert_render_alloc_free(&mut engine, SR as usize);
}
