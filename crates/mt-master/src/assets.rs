//! Decoded assets addressed by file id.

use std::collections::BTreeMap;
use std::sync::Arc;

use mt_ir::{AssetBuffer, AssetMeta, FileId};

use crate::error::ControllerError;

struct Entry {
    meta: AssetMeta,
    buffer: Arc<AssetBuffer>,
}

/// Asset collaborator: metadata plus shared decoded buffers.
#[derive(Default)]
pub struct AssetLibrary {
    entries: BTreeMap<FileId, Entry>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a decoded asset.
    pub fn insert(&mut self, id: FileId, name: &str, category: &str, buffer: AssetBuffer) -> AssetMeta {
        let meta = buffer.describe(id.clone(), name, category);
        log::debug!(
            "asset {} loaded: {:.3}s, {} ch @ {} Hz",
            id,
            meta.duration,
            meta.number_of_channels,
            meta.sample_rate
        );
        self.entries.insert(id, Entry { meta: meta.clone(), buffer: Arc::new(buffer) });
        meta
    }

    /// Decode WAV bytes and add the result.
    pub fn load_wav(
        &mut self,
        id: FileId,
        name: &str,
        category: &str,
        bytes: &[u8],
    ) -> Result<AssetMeta, ControllerError> {
        let buffer = mt_formats::load_wav(bytes)
            .map_err(|source| ControllerError::DecodeFailure { file: id.clone(), source })?;
        Ok(self.insert(id, name, category, buffer))
    }

    pub fn meta(&self, id: &FileId) -> Option<&AssetMeta> {
        self.entries.get(id).map(|e| &e.meta)
    }

    pub fn buffer(&self, id: &FileId) -> Option<&Arc<AssetBuffer>> {
        self.entries.get(id).map(|e| &e.buffer)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &FileId) -> Option<AssetMeta> {
        self.entries.remove(id).map(|e| e.meta)
    }

    /// Metadata of every asset, ordered by id.
    pub fn metas(&self) -> Vec<AssetMeta> {
        self.entries.values().map(|e| e.meta.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Peak-normalize the library copy of an asset to `target_db`. Returns
    /// the applied gain in dB, or None for a missing or silent asset.
    ///
    /// Placed clips are handed the new buffer by `Controller::normalize_asset`.
    pub fn normalize(&mut self, id: &FileId, target_db: f32) -> Option<f32> {
        let entry = self.entries.get_mut(id)?;
        let gain = Arc::make_mut(&mut entry.buffer).normalize(target_db)?;
        log::info!("asset {} normalized by {:+.2} dB", id, gain);
        Some(gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_ir::AudioBuffer;

    fn tone(amplitude: f32) -> AssetBuffer {
        AssetBuffer::new(1000, AudioBuffer::from_planes(&[vec![amplitude; 500], vec![-amplitude; 500]]))
    }

    #[test]
    fn insert_describes_asset() {
        let mut lib = AssetLibrary::new();
        let meta = lib.insert(FileId::from("a"), "a.wav", "sfx", tone(0.5));
        assert_eq!(meta.duration, 0.5);
        assert_eq!(meta.number_of_channels, 2);
        assert_eq!(lib.meta(&FileId::from("a")), Some(&meta));
        assert!(lib.buffer(&FileId::from("b")).is_none());
    }

    #[test]
    fn decode_failure_names_the_file() {
        let mut lib = AssetLibrary::new();
        let err = lib.load_wav(FileId::from("bad"), "bad", "", b"nope").unwrap_err();
        assert!(matches!(err, ControllerError::DecodeFailure { ref file, .. } if file.as_str() == "bad"));
        assert!(lib.is_empty());
    }

    #[test]
    fn normalize_replaces_library_buffer() {
        let mut lib = AssetLibrary::new();
        lib.insert(FileId::from("a"), "a", "", tone(0.25));
        let gain = lib.normalize(&FileId::from("a"), 0.0).unwrap();
        assert!((gain - 12.04).abs() < 0.01);
        assert!((lib.buffer(&FileId::from("a")).unwrap().buffer.peak() - 1.0).abs() < 1e-5);
        assert!(lib.normalize(&FileId::from("b"), 0.0).is_none());
    }
}
