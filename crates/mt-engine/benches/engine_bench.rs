use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mt_engine::{Engine, EngineConfig};
use mt_ir::{palette_color, AssetBuffer, AudioBuffer, Clip, ClipId, FileId, Track, TrackId};

fn build_session(tracks: u32, effects: bool) -> (Engine, Vec<Track>) {
    let mut engine = Engine::new(EngineConfig::default());
    let sr = engine.sample_rate();
    let noise: Vec<f32> = (0..sr * 10).map(|i| ((i * 7919) % 2000) as f32 / 1000.0 - 1.0).collect();
    let asset = Arc::new(AssetBuffer::new(sr, AudioBuffer::from_planes(&[noise.clone(), noise])));

    let mut list = Vec::new();
    for id in 1..=tracks {
        let mut track = Track::new(TrackId(id), "bench", palette_color(id as usize - 1));
        track.effects.eq_enabled = effects;
        track.effects.limiter_enabled = effects;
        track.effects.expander_enabled = effects;
        track.effects.eq.low = 3.0;
        engine.add_track(&track).unwrap();
        let clip_id = ClipId(id);
        engine.register_clip(track.id, clip_id, Arc::clone(&asset)).unwrap();
        let mut clip = Clip::new(clip_id, FileId::from("noise"), "noise", 0.0, 10.0);
        clip.fade_in = 0.5;
        track.clips.push(clip);
        list.push(track);
    }
    (engine, list)
}

fn bench_render(c: &mut Criterion) {
    for (name, tracks, effects) in [("render_8_dry", 8, false), ("render_8_fx", 8, true)] {
        c.bench_function(name, |b| {
            let (mut engine, list) = build_session(tracks, effects);
            engine.play(&list, 0.0);
            let mut buf = vec![mt_engine::Frame::silence(); 1024];
            b.iter(|| {
                engine.render_into(&mut buf);
                black_box(&buf);
            });
        });
    }
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
