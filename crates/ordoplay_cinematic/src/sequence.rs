// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence definitions: an ordered shot list plus playback policy.

use crate::error::{CinematicError, Result};
use crate::shot::{Shot, ShotKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An authored cinematic sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceDefinition {
    /// Explicit identifier used for replay policy
    pub id: Option<String>,
    /// Asset name, used when no explicit id is set
    pub name: String,
    /// Shots, played in order
    shots: Vec<Shot>,
    /// Global time-scale multiplier (> 0)
    pub time_scale: f32,
    /// Whether the skip trigger may abort playback
    pub skippable: bool,
    /// Input action that aborts playback
    pub skip_trigger: String,
    /// Disable player input while playing
    pub lock_player_input: bool,
    /// Return control to gameplay when playback ends
    pub hand_off_on_end: bool,
    /// Only play once per save
    pub play_once: bool,
}

impl SequenceDefinition {
    /// Create a new empty sequence
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            shots: Vec::new(),
            time_scale: 1.0,
            skippable: false,
            skip_trigger: "skip".to_string(),
            lock_player_input: true,
            hand_off_on_end: true,
            play_once: false,
        }
    }

    /// Set explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a shot
    pub fn with_shot(mut self, shot: Shot) -> Self {
        self.shots.push(shot);
        self
    }

    /// Append a shot
    pub fn push_shot(&mut self, shot: Shot) {
        self.shots.push(shot);
    }

    /// Identifier used for replay policy: explicit id, else asset name
    pub fn effective_id(&self) -> &str {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => &self.name,
        }
    }

    /// Get all shots in play order
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Get shot count
    pub fn shot_count(&self) -> usize {
        self.shots.len()
    }

    /// Nominal play length in seconds, ignoring skips and frame rounding
    pub fn nominal_duration(&self) -> f32 {
        let raw: f32 = self.shots.iter().map(nominal_shot_length).sum();
        raw / self.time_scale
    }

    /// Check policy and shot timings
    pub fn validate(&self) -> Result<()> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(CinematicError::InvalidTimeScale(self.time_scale));
        }
        self.shots.iter().try_for_each(Shot::validate)
    }

    /// Parse and validate a sequence from RON text
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let sequence: Self = ron::from_str(source)?;
        sequence.validate()?;
        Ok(sequence)
    }

    /// Load and validate a sequence from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let mut sequence = Self::from_ron_str(&source)?;
        if sequence.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sequence.name = stem.to_string();
            }
        }
        Ok(sequence)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

impl Default for SequenceDefinition {
    fn default() -> Self {
        Self::new("")
    }
}

fn nominal_shot_length(shot: &Shot) -> f32 {
    let fades = |shot: &Shot| {
        let count = u8::from(shot.fade.fade_in) + u8::from(shot.fade.fade_out);
        f32::from(count) * shot.fade.duration
    };

    match shot.kind {
        ShotKind::ShowText => shot
            .subtitle
            .as_ref()
            .map(|s| s.lead_in + s.hold + 2.0 * s.fade)
            .unwrap_or(0.0),
        ShotKind::FadeOnly | ShotKind::CameraMove => shot.duration + fades(shot),
        ShotKind::Wait | ShotKind::FocusTarget | ShotKind::PlaySfx => shot.duration,
    }
}
