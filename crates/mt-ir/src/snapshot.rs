//! Undoable state.

use serde::{Deserialize, Serialize};

use crate::keyframe::KeyframeMap;

/// Everything an undo step restores: automation and the transport position.
///
/// Track and clip structure is deliberately absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub keyframes: KeyframeMap,
    pub current_time: f64,
}
