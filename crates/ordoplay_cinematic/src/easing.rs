// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves applied to shot progress.

use crate::interpolation::Interpolation;
use serde::{Deserialize, Serialize};

/// A key on an authored easing curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Normalized time of the key
    pub time: f32,
    /// Curve value at this key
    pub value: f32,
    /// Incoming slope
    #[serde(default)]
    pub in_tangent: f32,
    /// Outgoing slope
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    /// Create a flat key
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    /// Set tangents
    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

/// Easing curve mapping linear progress to eased progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum EasingCurve {
    /// No easing
    Linear,
    /// Quadratic ease in
    EaseIn,
    /// Quadratic ease out
    EaseOut,
    /// Smoothstep ease in/out
    #[default]
    EaseInOut,
    /// Authored curve, keys sorted by time
    Keys(Vec<CurveKey>),
}

impl EasingCurve {
    /// Evaluate the curve at `t`; `t` is clamped to `[0, 1]`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => t * t * (3.0 - 2.0 * t),
            Self::Keys(keys) => evaluate_keys(keys, t),
        }
    }
}

fn evaluate_keys(keys: &[CurveKey], t: f32) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return t,
    };

    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }

    let next_idx = keys.iter().position(|k| k.time >= t).unwrap_or(keys.len() - 1);
    let a = &keys[next_idx.saturating_sub(1)];
    let b = &keys[next_idx];
    let span = b.time - a.time;
    if span.abs() < 0.0001 {
        return b.value;
    }

    let local = (t - a.time) / span;
    // Tangents are slopes per unit time; Hermite wants them per segment
    Interpolation::hermite(a.value, a.out_tangent * span, b.value, b.in_tangent * span, local)
}
