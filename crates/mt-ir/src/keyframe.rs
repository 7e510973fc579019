//! Per-clip, per-parameter automation curves.
//!
//! Each `(clip, parameter)` pair owns a sequence of keyframes kept sorted by
//! `(time, insertion sequence)`. Times are relative to the clip start.
//! Evaluation never extrapolates: outside `[first.time, last.time]` the
//! caller-supplied default is returned.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::curve::{interpolate, Interpolation};
use crate::track::ClipId;

/// Search radius used when picking a keyframe under the cursor.
pub const NEAREST_THRESHOLD: f64 = 0.1;

/// An automatable clip parameter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Parameter {
    Volume,
    Pan,
    Gain,
    Other(String),
}

impl Parameter {
    /// Parameters sampled by the transport during playback.
    pub const PLAYBACK: [Parameter; 3] = [Parameter::Volume, Parameter::Pan, Parameter::Gain];

    pub fn as_str(&self) -> &str {
        match self {
            Parameter::Volume => "volume",
            Parameter::Pan => "pan",
            Parameter::Gain => "gain",
            Parameter::Other(name) => name,
        }
    }
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        match name {
            "volume" => Parameter::Volume,
            "pan" => Parameter::Pan,
            "gain" => Parameter::Gain,
            other => Parameter::Other(String::from(other)),
        }
    }
}

impl From<String> for Parameter {
    fn from(name: String) -> Self {
        match name.as_str() {
            "volume" | "pan" | "gain" => Parameter::from(name.as_str()),
            _ => Parameter::Other(name),
        }
    }
}

impl From<Parameter> for String {
    fn from(p: Parameter) -> Self {
        match p {
            Parameter::Other(name) => name,
            known => String::from(known.as_str()),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyframe identifier, unique within one store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub u64);

/// An automation control point.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub id: KeyframeId,
    /// Seconds from the clip start.
    pub time: f64,
    pub value: f64,
    /// Curve from this keyframe to the next one.
    pub interpolation: Interpolation,
    seq: u64,
}

/// Partial edit applied by [`KeyframeStore::update_keyframe`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyframeUpdate {
    pub time: Option<f64>,
    pub value: Option<f64>,
    pub interpolation: Option<Interpolation>,
}

/// Result of a range-aware evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampled {
    /// Whether the query time fell inside `[first.time, last.time]`.
    pub in_range: bool,
    pub value: f64,
}

/// Rejected keyframe input.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AutomationError {
    #[error("keyframe time must be finite and non-negative, got {0}")]
    InvalidTime(f64),
    #[error("keyframe value must be finite, got {0}")]
    InvalidValue(f64),
}

/// Persisted keyframe shape: `{id, time, value, interpolation}`.
///
/// Ids are written for reference but re-minted on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeRecord {
    #[serde(skip_deserializing)]
    pub id: KeyframeId,
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
}

/// Persisted form of a whole store: `{clipId: {parameter: [keyframe]}}`.
pub type KeyframeMap = BTreeMap<ClipId, BTreeMap<Parameter, Vec<KeyframeRecord>>>;

type Curves = BTreeMap<Parameter, Vec<Keyframe>>;

/// Owner of every automation curve.
#[derive(Clone, Debug, Default)]
pub struct KeyframeStore {
    clips: BTreeMap<ClipId, Curves>,
    next_id: u64,
    next_seq: u64,
}

fn sort_keyframes(kfs: &mut [Keyframe]) {
    kfs.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.seq.cmp(&b.seq)));
}

fn validate(time: f64, value: f64) -> Result<(), AutomationError> {
    if !time.is_finite() || time < 0.0 {
        return Err(AutomationError::InvalidTime(time));
    }
    if !value.is_finite() {
        return Err(AutomationError::InvalidValue(value));
    }
    Ok(())
}

/// Evaluate a sorted keyframe sequence at `time`.
fn evaluate(kfs: &[Keyframe], time: f64, default: f64) -> Sampled {
    let out_of_range = Sampled { in_range: false, value: default };
    let (Some(first), Some(last)) = (kfs.first(), kfs.last()) else {
        return out_of_range;
    };
    if !(time >= first.time && time <= last.time) {
        return out_of_range;
    }

    // Number of keyframes at or before `time`; at least one given the range check.
    let after = kfs.partition_point(|k| k.time <= time);
    if after == kfs.len() {
        return Sampled { in_range: true, value: last.value };
    }
    let left = &kfs[after - 1];
    let right = &kfs[after];
    let t = (time - left.time) / (right.time - left.time);
    Sampled { in_range: true, value: interpolate(left.interpolation, left.value, right.value, t) }
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self) -> (KeyframeId, u64) {
        self.next_id += 1;
        self.next_seq += 1;
        (KeyframeId(self.next_id), self.next_seq)
    }

    /// Insert a keyframe and keep the sequence sorted.
    pub fn add_keyframe(
        &mut self,
        clip: ClipId,
        parameter: Parameter,
        time: f64,
        value: f64,
        interpolation: Interpolation,
    ) -> Result<KeyframeId, AutomationError> {
        validate(time, value)?;
        let (id, seq) = self.mint();
        let kfs = self.clips.entry(clip).or_default().entry(parameter).or_default();
        kfs.push(Keyframe { id, time, value, interpolation, seq });
        sort_keyframes(kfs);
        Ok(id)
    }

    /// Remove a keyframe. Returns whether it existed.
    pub fn remove_keyframe(&mut self, clip: ClipId, parameter: &Parameter, id: KeyframeId) -> bool {
        let Some(curves) = self.clips.get_mut(&clip) else {
            return false;
        };
        let Some(kfs) = curves.get_mut(parameter) else {
            return false;
        };
        let before = kfs.len();
        kfs.retain(|k| k.id != id);
        let removed = kfs.len() != before;
        if kfs.is_empty() {
            curves.remove(parameter);
        }
        if curves.is_empty() {
            self.clips.remove(&clip);
        }
        removed
    }

    /// Edit a keyframe in place, re-sorting when its time changes.
    ///
    /// Returns `Ok(false)` when the keyframe does not exist.
    pub fn update_keyframe(
        &mut self,
        clip: ClipId,
        parameter: &Parameter,
        id: KeyframeId,
        update: KeyframeUpdate,
    ) -> Result<bool, AutomationError> {
        let Some(kfs) = self.clips.get_mut(&clip).and_then(|c| c.get_mut(parameter)) else {
            return Ok(false);
        };
        let Some(kf) = kfs.iter_mut().find(|k| k.id == id) else {
            return Ok(false);
        };
        validate(update.time.unwrap_or(kf.time), update.value.unwrap_or(kf.value))?;

        if let Some(value) = update.value {
            kf.value = value;
        }
        if let Some(interpolation) = update.interpolation {
            kf.interpolation = interpolation;
        }
        if let Some(time) = update.time {
            if time != kf.time {
                kf.time = time;
                sort_keyframes(kfs);
            }
        }
        Ok(true)
    }

    /// Value of `parameter` at `time`, or `default` outside the curve.
    pub fn value_at_time(&self, clip: ClipId, parameter: &Parameter, time: f64, default: f64) -> f64 {
        self.value_at_time_in_range(clip, parameter, time, default).value
    }

    /// Like [`value_at_time`](Self::value_at_time), also reporting whether
    /// `time` fell inside the curve's span.
    pub fn value_at_time_in_range(
        &self,
        clip: ClipId,
        parameter: &Parameter,
        time: f64,
        default: f64,
    ) -> Sampled {
        evaluate(self.parameter_keyframes(clip, parameter), time, default)
    }

    /// Every curve of a clip.
    pub fn clip_keyframes(&self, clip: ClipId) -> Option<&BTreeMap<Parameter, Vec<Keyframe>>> {
        self.clips.get(&clip)
    }

    /// The sorted keyframes of one curve; empty when absent.
    pub fn parameter_keyframes(&self, clip: ClipId, parameter: &Parameter) -> &[Keyframe] {
        self.clips
            .get(&clip)
            .and_then(|c| c.get(parameter))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clips that own at least one curve.
    pub fn clips(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.clips.keys().copied()
    }

    /// Whether a clip has keyframes, optionally for one parameter only.
    pub fn has_keyframes(&self, clip: ClipId, parameter: Option<&Parameter>) -> bool {
        match parameter {
            Some(p) => !self.parameter_keyframes(clip, p).is_empty(),
            None => self
                .clips
                .get(&clip)
                .is_some_and(|c| c.values().any(|kfs| !kfs.is_empty())),
        }
    }

    /// The keyframe closest to `time`, if one lies strictly within `threshold`.
    pub fn nearest_keyframe(
        &self,
        clip: ClipId,
        parameter: &Parameter,
        time: f64,
        threshold: f64,
    ) -> Option<&Keyframe> {
        let mut best: Option<(&Keyframe, f64)> = None;
        for kf in self.parameter_keyframes(clip, parameter) {
            let distance = (kf.time - time).abs();
            let limit = best.map_or(threshold, |(_, d)| d);
            if distance < limit {
                best = Some((kf, distance));
            }
        }
        best.map(|(kf, _)| kf)
    }

    /// Replace `target`'s curves with a copy of `source`'s, shifted by `offset`.
    ///
    /// Copies get fresh ids. Times that would become negative clamp to 0.
    pub fn copy_clip_keyframes(&mut self, source: ClipId, target: ClipId, offset: f64) {
        let Some(curves) = self.clips.get(&source).cloned() else {
            self.clips.remove(&target);
            return;
        };
        let mut copied = Curves::new();
        for (parameter, kfs) in curves {
            let shifted: Vec<Keyframe> = kfs
                .into_iter()
                .map(|k| {
                    let (id, seq) = self.mint();
                    Keyframe { id, time: (k.time + offset).max(0.0), seq, ..k }
                })
                .collect();
            copied.insert(parameter, shifted);
        }
        for kfs in copied.values_mut() {
            sort_keyframes(kfs);
        }
        self.clips.insert(target, copied);
    }

    /// Drop every curve of a clip.
    pub fn clear_clip(&mut self, clip: ClipId) {
        self.clips.remove(&clip);
    }

    /// Drop one curve of a clip.
    pub fn clear_parameter(&mut self, clip: ClipId, parameter: &Parameter) {
        if let Some(curves) = self.clips.get_mut(&clip) {
            curves.remove(parameter);
            if curves.is_empty() {
                self.clips.remove(&clip);
            }
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Export every curve in the persisted shape.
    pub fn to_map(&self) -> KeyframeMap {
        self.clips
            .iter()
            .map(|(clip, curves)| {
                let curves = curves
                    .iter()
                    .map(|(p, kfs)| {
                        let records = kfs
                            .iter()
                            .map(|k| KeyframeRecord {
                                id: k.id,
                                time: k.time,
                                value: k.value,
                                interpolation: k.interpolation,
                            })
                            .collect();
                        (p.clone(), records)
                    })
                    .collect();
                (*clip, curves)
            })
            .collect()
    }

    /// Clear the store and rebuild it from a persisted map.
    ///
    /// Records with an invalid time or value are dropped; the count of
    /// dropped records is returned.
    pub fn load_map(&mut self, map: &KeyframeMap) -> usize {
        self.clear();
        let mut dropped = 0;
        for (clip, curves) in map {
            for (parameter, records) in curves {
                for r in records {
                    if self
                        .add_keyframe(*clip, parameter.clone(), r.time, r.value, r.interpolation)
                        .is_err()
                    {
                        dropped += 1;
                    }
                }
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ClipId = ClipId(1);
    const B: ClipId = ClipId(2);

    fn store_with(points: &[(f64, f64, Interpolation)]) -> KeyframeStore {
        let mut store = KeyframeStore::new();
        for &(t, v, kind) in points {
            store.add_keyframe(A, Parameter::Volume, t, v, kind).unwrap();
        }
        store
    }

    #[test]
    fn linear_midpoint() {
        let store = store_with(&[(0.0, 0.0, Interpolation::Linear), (2.0, 10.0, Interpolation::Linear)]);
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 1.0, -1.0), 5.0);
    }

    #[test]
    fn outside_span_returns_default() {
        let store = store_with(&[(1.0, 0.2, Interpolation::Linear), (3.0, 0.8, Interpolation::Linear)]);
        for t in [0.0, 0.999, 3.001, 100.0, -1.0, f64::NAN] {
            let s = store.value_at_time_in_range(A, &Parameter::Volume, t, 0.42);
            assert!(!s.in_range, "t = {}", t);
            assert_eq!(s.value, 0.42);
        }
        let s = store.value_at_time_in_range(A, &Parameter::Pan, 2.0, 0.0);
        assert!(!s.in_range);
    }

    #[test]
    fn exact_keyframe_times_return_their_value() {
        for kind in Interpolation::ALL {
            let store = store_with(&[(0.0, 1.0, kind), (1.0, 5.0, kind), (2.5, -3.0, kind)]);
            for (t, v) in [(0.0, 1.0), (1.0, 5.0), (2.5, -3.0)] {
                let s = store.value_at_time_in_range(A, &Parameter::Volume, t, 99.0);
                assert!(s.in_range);
                assert_eq!(s.value, v, "{:?} at {}", kind, t);
            }
        }
    }

    #[test]
    fn step_switches_exactly_at_next_keyframe() {
        let store = store_with(&[(0.0, 1.0, Interpolation::Step), (2.0, 7.0, Interpolation::Linear)]);
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 1.999_999, 0.0), 1.0);
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 2.0, 0.0), 7.0);
    }

    #[test]
    fn segment_uses_left_keyframe_kind() {
        let store = store_with(&[(0.0, 0.0, Interpolation::EaseIn), (1.0, 10.0, Interpolation::Step)]);
        let v = store.value_at_time(A, &Parameter::Volume, 0.5, 0.0);
        assert!((v - 2.5).abs() < 1e-12);
    }

    #[test]
    fn insertion_order_is_irrelevant_to_sorting() {
        let store = store_with(&[(2.0, 10.0, Interpolation::Linear), (0.0, 0.0, Interpolation::Linear)]);
        let times: Vec<f64> = store.parameter_keyframes(A, &Parameter::Volume).iter().map(|k| k.time).collect();
        assert_eq!(times, [0.0, 2.0]);
    }

    #[test]
    fn duplicate_times_resolve_to_later_insert() {
        let store = store_with(&[
            (0.0, 0.0, Interpolation::Linear),
            (1.0, 4.0, Interpolation::Linear),
            (1.0, 6.0, Interpolation::Linear),
            (2.0, 8.0, Interpolation::Linear),
        ]);
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 1.0, 0.0), 6.0);
        // Left segment ends at the first duplicate, right segment starts at the second.
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 0.5, 0.0), 2.0);
        assert_eq!(store.value_at_time(A, &Parameter::Volume, 1.5, 0.0), 7.0);
    }

    #[test]
    fn rejects_invalid_input() {
        let mut store = KeyframeStore::new();
        assert_eq!(
            store.add_keyframe(A, Parameter::Gain, -0.5, 1.0, Interpolation::Linear),
            Err(AutomationError::InvalidTime(-0.5))
        );
        assert!(store.add_keyframe(A, Parameter::Gain, 0.5, f64::INFINITY, Interpolation::Linear).is_err());
        assert!(!store.has_keyframes(A, None));
    }

    #[test]
    fn update_resorts_on_time_change() {
        let mut store = KeyframeStore::new();
        let first = store.add_keyframe(A, Parameter::Pan, 0.0, -1.0, Interpolation::Linear).unwrap();
        store.add_keyframe(A, Parameter::Pan, 1.0, 1.0, Interpolation::Linear).unwrap();
        let update = KeyframeUpdate { time: Some(2.0), ..Default::default() };
        assert_eq!(store.update_keyframe(A, &Parameter::Pan, first, update), Ok(true));
        let kfs = store.parameter_keyframes(A, &Parameter::Pan);
        assert_eq!(kfs[1].id, first);
        assert_eq!(kfs[0].time, 1.0);

        let missing = store.update_keyframe(A, &Parameter::Pan, KeyframeId(999), KeyframeUpdate::default());
        assert_eq!(missing, Ok(false));
        let bad = KeyframeUpdate { time: Some(-1.0), ..Default::default() };
        assert!(store.update_keyframe(A, &Parameter::Pan, first, bad).is_err());
    }

    #[test]
    fn remove_prunes_empty_curves() {
        let mut store = KeyframeStore::new();
        let id = store.add_keyframe(A, Parameter::Volume, 0.0, 1.0, Interpolation::Linear).unwrap();
        assert!(store.has_keyframes(A, Some(&Parameter::Volume)));
        assert!(store.remove_keyframe(A, &Parameter::Volume, id));
        assert!(!store.remove_keyframe(A, &Parameter::Volume, id));
        assert!(!store.has_keyframes(A, None));
        assert_eq!(store.clips().count(), 0);
    }

    #[test]
    fn copy_then_discard_source() {
        let mut store = KeyframeStore::new();
        store.add_keyframe(A, Parameter::Volume, 0.0, 0.1, Interpolation::EaseOut).unwrap();
        store.add_keyframe(A, Parameter::Volume, 1.5, 0.9, Interpolation::Step).unwrap();
        store.add_keyframe(A, Parameter::Pan, 0.25, -0.5, Interpolation::Linear).unwrap();
        let original = store.to_map().remove(&A).unwrap();

        store.copy_clip_keyframes(A, B, 2.0);
        store.clear_clip(A);

        let copied = store.clip_keyframes(B).unwrap();
        assert_eq!(copied.len(), original.len());
        for (param, records) in &original {
            let kfs = &copied[param];
            assert_eq!(kfs.len(), records.len());
            for (k, r) in kfs.iter().zip(records) {
                assert_eq!(k.value, r.value);
                assert_eq!(k.interpolation, r.interpolation);
                assert_eq!(k.time, r.time + 2.0);
                assert_ne!(k.id, r.id);
            }
        }
    }

    #[test]
    fn nearest_respects_threshold() {
        let store = store_with(&[(1.0, 0.0, Interpolation::Linear), (1.15, 1.0, Interpolation::Linear)]);
        let near = store.nearest_keyframe(A, &Parameter::Volume, 1.1, NEAREST_THRESHOLD).unwrap();
        assert_eq!(near.time, 1.15);
        assert!(store.nearest_keyframe(A, &Parameter::Volume, 1.5, NEAREST_THRESHOLD).is_none());
    }

    #[test]
    fn clear_parameter_keeps_other_curves() {
        let mut store = KeyframeStore::new();
        store.add_keyframe(A, Parameter::Volume, 0.0, 1.0, Interpolation::Linear).unwrap();
        store.add_keyframe(A, Parameter::Gain, 0.0, -3.0, Interpolation::Linear).unwrap();
        store.clear_parameter(A, &Parameter::Volume);
        assert!(!store.has_keyframes(A, Some(&Parameter::Volume)));
        assert!(store.has_keyframes(A, Some(&Parameter::Gain)));
    }

    #[test]
    fn persisted_shape() {
        let mut store = KeyframeStore::new();
        store.add_keyframe(ClipId(7), Parameter::from("cutoff"), 0.5, 0.25, Interpolation::EaseIn).unwrap();
        let json = serde_json::to_string(&store.to_map()).unwrap();
        assert_eq!(
            json,
            r#"{"7":{"cutoff":[{"id":1,"time":0.5,"value":0.25,"interpolation":"ease-in"}]}}"#
        );

        let text = r#"{"3":{"volume":[{"id":"3_volume_1700000000","time":1,"value":0.5},
                                 {"id":"x","time":-2,"value":0.1}]}}"#;
        let map: KeyframeMap = serde_json::from_str(text).unwrap();
        let mut restored = KeyframeStore::new();
        assert_eq!(restored.load_map(&map), 1);
        let kfs = restored.parameter_keyframes(ClipId(3), &Parameter::Volume);
        assert_eq!(kfs.len(), 1);
        assert_eq!(kfs[0].interpolation, Interpolation::Linear);
    }
}
