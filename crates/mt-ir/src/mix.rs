//! Solo/mute resolution.

use alloc::vec::Vec;

/// The per-track inputs of the gain recomputation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixFlags {
    pub volume: f32,
    pub mute: bool,
    pub solo: bool,
}

impl Default for MixFlags {
    fn default() -> Self {
        Self { volume: crate::track::DEFAULT_TRACK_VOLUME, mute: false, solo: false }
    }
}

/// Effective gain of every track, in input order.
///
/// With any track soloed, only soloed and unmuted tracks are audible.
/// Otherwise every unmuted track plays at its own volume.
pub fn recompute_effective_gains(tracks: &[MixFlags]) -> Vec<f32> {
    let any_solo = tracks.iter().any(|t| t.solo);
    tracks
        .iter()
        .map(|t| {
            let audible = if any_solo { t.solo && !t.mute } else { !t.mute };
            if audible { t.volume } else { 0.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn flags(volume: f32, mute: bool, solo: bool) -> MixFlags {
        MixFlags { volume, mute, solo }
    }

    #[test]
    fn no_solo_applies_mute() {
        let gains = recompute_effective_gains(&[flags(0.5, false, false), flags(0.9, true, false)]);
        assert_eq!(gains, vec![0.5, 0.0]);
    }

    #[test]
    fn solo_silences_everything_else() {
        let gains = recompute_effective_gains(&[
            flags(0.5, false, false),
            flags(0.7, false, true),
            flags(0.9, true, true),
            flags(0.3, true, false),
        ]);
        assert_eq!(gains, vec![0.0, 0.7, 0.0, 0.0]);
    }

    #[test]
    fn every_soloed_subset_holds() {
        let volumes = [0.1, 0.2, 0.3, 0.4];
        let mutes = [false, true, false, false];
        for mask in 1u32..16 {
            let tracks: Vec<MixFlags> = (0..4)
                .map(|i| flags(volumes[i], mutes[i], mask & (1 << i) != 0))
                .collect();
            let gains = recompute_effective_gains(&tracks);
            for (t, g) in tracks.iter().zip(&gains) {
                if !t.solo {
                    assert_eq!(*g, 0.0, "mask {:04b}", mask);
                } else if !t.mute {
                    assert_eq!(*g, t.volume, "mask {:04b}", mask);
                }
            }
        }
    }

    #[test]
    fn empty_input() {
        assert!(recompute_effective_gains(&[]).is_empty());
    }
}
