//! Project document: the persisted shape of a session.
//!
//! Field names and defaults follow the JSON the editor saves. Missing fields
//! fall back to the values the restore path has always assumed, so partial
//! or older documents still load.

use mt_ir::{AssetMeta, EffectChainState, FileId, KeyframeMap, MasterSettings};
use serde::{Deserialize, Serialize};

use crate::FormatError;

/// Document version written by this crate.
pub const PROJECT_VERSION: &str = "1.0";

fn default_version() -> String {
    PROJECT_VERSION.to_string()
}

fn default_project_name() -> String {
    "Untitled".to_string()
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_bit_depth() -> u16 {
    24
}

fn default_zoom() -> f64 {
    100.0
}

fn default_volume() -> f32 {
    1.0
}

/// Top-level project document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,
    #[serde(default)]
    pub tracks: Vec<TrackDocument>,
    #[serde(default)]
    pub audio_files: Vec<AssetMeta>,
    /// Master bus settings.
    #[serde(default)]
    pub effect_settings: MasterSettings,
    /// Timeline zoom in pixels per second.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<KeyframeMap>,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_name: default_project_name(),
            created_at: None,
            updated_at: None,
            sample_rate: default_sample_rate(),
            bit_depth: default_bit_depth(),
            tracks: Vec::new(),
            audio_files: Vec::new(),
            effect_settings: MasterSettings::default(),
            zoom: default_zoom(),
            keyframes: None,
        }
    }
}

/// One track with its mixer state, effect chain and clips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDocument {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub pan: f32,
    #[serde(flatten)]
    pub effects: EffectChainState,
    #[serde(default)]
    pub clips: Vec<ClipDocument>,
}

/// A clip placement referencing an asset by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDocument {
    #[serde(default)]
    pub id: u32,
    pub file_id: FileId,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub offset: f64,
    /// Gain in dB.
    #[serde(default)]
    pub gain: f32,
    #[serde(default)]
    pub fade_in: f64,
    #[serde(default)]
    pub fade_out: f64,
}

impl ProjectDocument {
    /// Parse a project from JSON.
    pub fn parse(json: &str) -> Result<Self, FormatError> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.version != PROJECT_VERSION {
            log::warn!("project version {} differs from {}", doc.version, PROJECT_VERSION);
        }
        Ok(doc)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Asset metadata by id.
    pub fn asset(&self, id: &FileId) -> Option<&AssetMeta> {
        self.audio_files.iter().find(|a| &a.id == id)
    }
}
