// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine settings and scene cinematic configuration.
//!
//! Both are plain data loaded from RON:
//! - [`CinematicSettings`]: engine-wide tunables (handoff fade, watchdog timeouts, look blends)
//! - [`SceneCinematicConfig`]: one externally authored scene cinematic

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinematicSettings {
    /// Overlay fade to clear when handing control back to gameplay
    pub handoff_fade_seconds: f32,
    /// Slack added to a known timeline duration before force-stopping
    pub timeout_grace_seconds: f64,
    /// Ceiling used when the timeline duration is unknown
    pub fallback_timeout_seconds: f64,
    /// Per-frame look-at blend during camera moves
    pub move_look_blend: f32,
    /// Per-frame look-at blend during focus shots
    pub focus_look_blend: f32,
}

impl Default for CinematicSettings {
    fn default() -> Self {
        Self {
            handoff_fade_seconds: 0.25,
            timeout_grace_seconds: 0.5,
            fallback_timeout_seconds: 30.0,
            // Fixed per frame, not scaled by delta time
            move_look_blend: 0.9,
            focus_look_blend: 0.15,
        }
    }
}

impl CinematicSettings {
    /// Parse settings from RON text
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Soft timeout for a timeline of the given duration
    pub fn soft_timeout(&self, duration: f64) -> f64 {
        if is_valid_duration(duration) {
            duration + self.timeout_grace_seconds
        } else {
            self.fallback_timeout_seconds
        }
    }
}

/// Whether a timeline duration is finite and positive
pub fn is_valid_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Where the director is searched after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SceneLoadMode {
    /// Load the scene additively and search its root objects
    #[default]
    Additive,
    /// Search the local hierarchy instead of a loaded scene
    Local,
}

/// How the player is placed when the cinematic ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExitPlacement {
    /// Teleport to the current spawn anchor
    #[default]
    Anchor,
    /// Restore the pose captured before playback
    RestoreSnapshot,
}

/// Configuration for a scene-based cinematic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCinematicConfig {
    /// Scene containing the timeline
    pub scene: String,
    /// Replay policy identifier
    pub id: String,
    /// Only play once per save
    pub play_once: bool,
    /// Gameplay objects disabled during playback
    pub disable_objects: Vec<String>,
    /// Spawn anchor registered before playback
    pub exit_anchor: Option<String>,
    /// Player placement on exit
    pub placement: ExitPlacement,
    /// Whether anchor teleports use a screen transition
    pub teleport_with_transition: bool,
    /// Where to search for the director
    pub load_mode: SceneLoadMode,
}

impl SceneCinematicConfig {
    /// Create a config for a scene
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            ..Default::default()
        }
    }

    /// Play once under the given id
    pub fn play_once(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self.play_once = true;
        self
    }

    /// Set objects disabled during playback
    pub fn with_disabled_objects(mut self, objects: &[&str]) -> Self {
        self.disable_objects = objects.iter().map(|o| (*o).to_string()).collect();
        self
    }

    /// Set the exit anchor
    pub fn with_exit_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.exit_anchor = Some(anchor.into());
        self
    }

    /// Set exit placement
    pub fn with_placement(mut self, placement: ExitPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Identifier for replay policy: explicit id, else scene name
    pub fn effective_id(&self) -> &str {
        let id = self.id.trim();
        if id.is_empty() {
            self.scene.trim()
        } else {
            id
        }
    }

    /// Whether a scene reference is set
    pub fn has_scene(&self) -> bool {
        !self.scene.trim().is_empty()
    }

    /// Parse a config from RON text
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }
}

impl Default for SceneCinematicConfig {
    fn default() -> Self {
        Self {
            scene: String::new(),
            id: String::new(),
            play_once: false,
            disable_objects: Vec::new(),
            exit_anchor: None,
            placement: ExitPlacement::Anchor,
            teleport_with_transition: true,
            load_mode: SceneLoadMode::Additive,
        }
    }
}
