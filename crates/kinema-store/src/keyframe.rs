use serde::{Deserialize, Serialize};

use kinema_core::value::{blend, PropValue};
use kinema_core::{BezierCurve, Easing};

/// A keyframe: a value recorded for one property at a specific frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFrame {
    pub frame: u32,
    pub value: PropValue,
    /// Easing used when interpolating INTO this keyframe from its predecessor.
    #[serde(default)]
    pub easing_type: Easing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bezier_curve: Option<BezierCurve>,
}

impl KeyFrame {
    pub fn new(frame: u32, value: PropValue) -> Self {
        Self {
            frame,
            value,
            easing_type: Easing::Linear,
            bezier_curve: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing_type = easing;
        self
    }

    pub fn with_curve(mut self, curve: BezierCurve) -> Self {
        self.easing_type = Easing::Custom;
        self.bezier_curve = Some(curve);
        self
    }
}

/// Insert a keyframe or overwrite the value of the one already at `frame`.
///
/// The track stays frame-ascending with unique frames. Overwriting keeps the
/// existing easing. Returns false when the track already held exactly this value.
pub fn upsert(track: &mut Vec<KeyFrame>, frame: u32, value: PropValue) -> bool {
    match track.binary_search_by_key(&frame, |k| k.frame) {
        Ok(idx) => {
            if track[idx].value == value {
                return false;
            }
            track[idx].value = value;
        }
        Err(idx) => track.insert(idx, KeyFrame::new(frame, value)),
    }
    true
}

/// Remove the keyframe at `frame`; returns whether one existed.
pub fn remove(track: &mut Vec<KeyFrame>, frame: u32) -> bool {
    match track.binary_search_by_key(&frame, |k| k.frame) {
        Ok(idx) => {
            track.remove(idx);
            true
        }
        Err(_) => false,
    }
}

/// Record the arrival easing on the keyframe at `frame`; returns whether one existed.
pub fn set_easing(
    track: &mut [KeyFrame],
    frame: u32,
    easing: Easing,
    curve: Option<BezierCurve>,
) -> bool {
    match track.binary_search_by_key(&frame, |k| k.frame) {
        Ok(idx) => {
            track[idx].easing_type = easing;
            track[idx].bezier_curve = curve;
            true
        }
        Err(_) => false,
    }
}

/// Compute the value of a property at `frame` from its sorted keyframes.
///
/// - no keyframes: `None`
/// - a single keyframe, or a keyframe exactly at `frame`: that value, unchanged
/// - before the first / after the last keyframe: clamped to the end value
/// - otherwise the surrounding pair is blended at the eased position, using
///   the easing recorded on the later keyframe
///
/// Pure: used both for playback and for scrubbing previews.
pub fn interpolate(track: &[KeyFrame], frame: f64) -> Option<PropValue> {
    let (first, last) = match track {
        [] => return None,
        [only] => return Some(only.value.clone()),
        [first, .., last] => (first, last),
    };

    if let Some(exact) = track.iter().find(|k| k.frame as f64 == frame) {
        return Some(exact.value.clone());
    }

    let next_idx = track.partition_point(|k| (k.frame as f64) < frame);
    if next_idx == 0 {
        return Some(first.value.clone());
    }
    if next_idx == track.len() {
        return Some(last.value.clone());
    }

    let prev = &track[next_idx - 1];
    let next = &track[next_idx];
    let span = (next.frame - prev.frame) as f64;
    let t = ((frame - prev.frame as f64) / span).clamp(0.0, 1.0);
    let eased = next.easing_type.apply(t, next.bezier_curve.as_ref());
    Some(blend(&prev.value, &next.value, eased))
}
