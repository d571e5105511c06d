// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shot definitions for cinematic sequences.

use crate::easing::EasingCurve;
use crate::error::{CinematicError, Result};
use crate::interpolation::Pose;
use serde::{Deserialize, Serialize};

/// Field-of-view values below this leave the camera FOV untouched
pub const FOV_UNCHANGED_BELOW: f32 = 1.0;

/// Type of shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShotKind {
    /// Idle for the shot duration
    #[default]
    Wait,
    /// Move the camera along a path or towards a pose
    CameraMove,
    /// Turn the camera towards a target without moving
    FocusTarget,
    /// Show a subtitle line
    ShowText,
    /// Screen fade in and/or out
    FadeOnly,
    /// Fire a one-shot sound effect
    PlaySfx,
}

impl ShotKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wait => "Wait",
            Self::CameraMove => "Camera Move",
            Self::FocusTarget => "Focus Target",
            Self::ShowText => "Show Text",
            Self::FadeOnly => "Fade Only",
            Self::PlaySfx => "Play SFX",
        }
    }

    /// Whether skip input is polled every frame while this shot animates.
    ///
    /// Text and fade shots only observe a skip between shots.
    pub fn polls_skip_per_frame(&self) -> bool {
        !matches!(self, Self::ShowText | Self::FadeOnly)
    }
}

/// Screen fade settings shared by fade-in and fade-out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    /// Fade the overlay from opaque to clear before the shot body
    pub fade_in: bool,
    /// Fade the overlay from clear to opaque after the shot body
    pub fade_out: bool,
    /// Duration of each fade in seconds
    pub duration: f32,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            fade_in: false,
            fade_out: false,
            duration: 0.5,
        }
    }
}

/// Subtitle line and its timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Subtitle {
    /// Text to display
    pub text: String,
    /// Delay before the line appears
    pub lead_in: f32,
    /// Time the line stays fully visible
    pub hold: f32,
    /// Duration of the alpha fade in and out
    pub fade: f32,
}

/// One-shot audio cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfxCue {
    /// Audio clip asset path
    pub clip: String,
    /// Playback volume (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

/// A single timed unit of a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Shot {
    /// Shot name
    pub name: String,
    /// Shot type
    pub kind: ShotKind,
    /// Duration in seconds
    pub duration: f32,
    /// Easing applied to shot progress
    pub easing: EasingCurve,
    /// Pose the camera snaps to when the shot starts
    pub from: Option<Pose>,
    /// Pose the camera moves towards
    pub to: Option<Pose>,
    /// Point the camera keeps turning towards
    pub look_at: Option<[f32; 3]>,
    /// Waypoints; overrides the direct from/to move when present
    pub path: Vec<[f32; 3]>,
    /// Target field of view in degrees (below 1 means unchanged)
    pub target_fov: f32,
    /// Screen fades
    pub fade: FadeSettings,
    /// Subtitle line
    pub subtitle: Option<Subtitle>,
    /// One-shot audio
    pub sfx: Option<SfxCue>,
    /// Hook events fired when the shot starts
    pub start_events: Vec<String>,
    /// Hook events fired when the shot ends
    pub end_events: Vec<String>,
}

impl Shot {
    /// Create a new shot
    pub fn new(name: impl Into<String>, kind: ShotKind, duration: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            duration,
            ..Default::default()
        }
    }

    /// Idle shot
    pub fn wait(name: impl Into<String>, duration: f32) -> Self {
        Self::new(name, ShotKind::Wait, duration)
    }

    /// Camera move towards a pose
    pub fn camera_move(name: impl Into<String>, duration: f32, to: Pose) -> Self {
        let mut shot = Self::new(name, ShotKind::CameraMove, duration);
        shot.to = Some(to);
        shot
    }

    /// Camera move along waypoints
    pub fn camera_path(name: impl Into<String>, duration: f32, path: Vec<[f32; 3]>) -> Self {
        let mut shot = Self::new(name, ShotKind::CameraMove, duration);
        shot.path = path;
        shot
    }

    /// Turn towards a point
    pub fn focus(name: impl Into<String>, duration: f32, target: [f32; 3]) -> Self {
        let mut shot = Self::new(name, ShotKind::FocusTarget, duration);
        shot.look_at = Some(target);
        shot
    }

    /// Subtitle line
    pub fn text(name: impl Into<String>, subtitle: Subtitle) -> Self {
        let mut shot = Self::new(name, ShotKind::ShowText, 0.0);
        shot.subtitle = Some(subtitle);
        shot
    }

    /// Fade-only shot
    pub fn fade(name: impl Into<String>, fade: FadeSettings, duration: f32) -> Self {
        let mut shot = Self::new(name, ShotKind::FadeOnly, duration);
        shot.fade = fade;
        shot
    }

    /// Sound effect followed by a wait
    pub fn sfx(name: impl Into<String>, cue: SfxCue, duration: f32) -> Self {
        let mut shot = Self::new(name, ShotKind::PlaySfx, duration);
        shot.sfx = Some(cue);
        shot
    }

    /// Set easing curve
    pub fn with_easing(mut self, easing: EasingCurve) -> Self {
        self.easing = easing;
        self
    }

    /// Set look-at target
    pub fn with_look_at(mut self, target: [f32; 3]) -> Self {
        self.look_at = Some(target);
        self
    }

    /// Set target field of view
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.target_fov = fov;
        self
    }

    /// Set fades
    pub fn with_fade(mut self, fade: FadeSettings) -> Self {
        self.fade = fade;
        self
    }

    /// Set start pose
    pub fn with_from(mut self, from: Pose) -> Self {
        self.from = Some(from);
        self
    }

    /// Add hook events
    pub fn with_events(mut self, start: &[&str], end: &[&str]) -> Self {
        self.start_events = start.iter().map(|e| (*e).to_string()).collect();
        self.end_events = end.iter().map(|e| (*e).to_string()).collect();
        self
    }

    /// Whether this shot changes the field of view
    pub fn changes_fov(&self) -> bool {
        self.target_fov >= FOV_UNCHANGED_BELOW
    }

    /// Check timing fields are non-negative
    pub fn validate(&self) -> Result<()> {
        let mut timings = vec![("duration", self.duration), ("fade duration", self.fade.duration)];
        if let Some(subtitle) = &self.subtitle {
            timings.push(("subtitle lead-in", subtitle.lead_in));
            timings.push(("subtitle hold", subtitle.hold));
            timings.push(("subtitle fade", subtitle.fade));
        }

        match timings.into_iter().find(|(_, value)| *value < 0.0 || value.is_nan()) {
            Some((field, value)) => Err(CinematicError::NegativeTiming {
                shot: self.name.clone(),
                field,
                value,
            }),
            None => Ok(()),
        }
    }
}
