// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collaborators that report what the engine does through `tracing`.

use ordoplay_cinematic::{
    AudioSink, CallbackResult, CameraRig, CinematicError, FrameClock, GameplayGate, PlayerBody,
    Pose, QuestNotifier, ScreenFader, Shot, ShotHooks, SkipInput, SpawnPositioning, SubtitleSink,
};

/// Logs gameplay object and input toggles
pub struct ConsoleGate;

impl GameplayGate for ConsoleGate {
    fn set_objects_active(&mut self, objects: &[String], active: bool) {
        tracing::info!(?objects, active, "Gameplay objects toggled");
    }

    fn set_player_input_enabled(&mut self, enabled: bool) {
        tracing::info!(enabled, "Player input toggled");
    }
}

/// Remembers the current anchor and logs teleports to it
#[derive(Default)]
pub struct ConsoleSpawn {
    current: Option<String>,
}

impl SpawnPositioning for ConsoleSpawn {
    fn set_current_anchor(&mut self, anchor: &str) -> ordoplay_cinematic::Result<()> {
        tracing::debug!(anchor, "Current spawn anchor set");
        self.current = Some(anchor.to_string());
        Ok(())
    }

    fn teleport_to_current(&mut self, use_transition: bool) -> ordoplay_cinematic::Result<()> {
        let Some(anchor) = &self.current else {
            return Err(CinematicError::AnchorNotFound("<none>".to_string()));
        };
        tracing::info!(anchor = %anchor, use_transition, "Player teleported");
        Ok(())
    }
}

/// Camera that only keeps its state; poses are traced per frame
pub struct ConsoleCamera {
    pose: Pose,
    fov: f32,
}

impl Default for ConsoleCamera {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            fov: 60.0,
        }
    }
}

impl CameraRig for ConsoleCamera {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        tracing::trace!(position = ?pose.position, rotation = ?pose.rotation, "Camera pose");
        self.pose = pose;
    }

    fn fov(&self) -> f32 {
        self.fov
    }

    fn set_fov(&mut self, fov: f32) {
        tracing::trace!(fov, "Camera fov");
        self.fov = fov;
    }
}

/// Fade overlay that logs when it becomes fully opaque or clear
#[derive(Default)]
pub struct ConsoleFader {
    alpha: f32,
}

impl ScreenFader for ConsoleFader {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        if alpha != self.alpha && (alpha <= 0.0 || alpha >= 1.0) {
            tracing::debug!(alpha, "Screen fade settled");
        }
        self.alpha = alpha;
    }
}

/// Prints subtitle lines
#[derive(Default)]
pub struct ConsoleSubtitles {
    showing: bool,
}

impl SubtitleSink for ConsoleSubtitles {
    fn set_text(&mut self, text: &str) {
        tracing::info!("Subtitle: {text}");
        self.showing = true;
    }

    fn set_alpha(&mut self, alpha: f32) {
        tracing::trace!(alpha, "Subtitle alpha");
    }

    fn clear(&mut self) {
        if self.showing {
            tracing::debug!("Subtitle cleared");
        }
        self.showing = false;
    }
}

/// Logs one-shot sounds
pub struct ConsoleAudio;

impl AudioSink for ConsoleAudio {
    fn play_one_shot(&mut self, clip: &str, volume: f32) {
        tracing::info!(clip, volume, "Play one-shot");
    }
}

/// Skip input held from a fixed point in simulated time
pub struct ScheduledSkip {
    clock: FrameClock,
    at: Option<f64>,
}

impl ScheduledSkip {
    /// Skip from `at` seconds; never when `None`
    pub fn new(clock: FrameClock, at: Option<f64>) -> Self {
        Self { clock, at }
    }
}

impl SkipInput for ScheduledSkip {
    fn is_active(&self, _trigger: &str) -> bool {
        self.at.is_some_and(|at| self.clock.now() >= at)
    }
}

/// Logs shot boundaries and their authored events
pub struct ConsoleHooks;

impl ShotHooks for ConsoleHooks {
    fn shot_started(&mut self, index: usize, shot: &Shot) {
        tracing::info!(index, name = %shot.name, kind = shot.kind.name(), "Shot started");
        for event in &shot.start_events {
            tracing::info!(index, event = %event, "Shot event");
        }
    }

    fn shot_ended(&mut self, index: usize, shot: &Shot) {
        for event in &shot.end_events {
            tracing::info!(index, event = %event, "Shot event");
        }
        tracing::debug!(index, name = %shot.name, "Shot ended");
    }
}

/// Player avatar with a collision controller
#[derive(Default)]
pub struct ConsolePlayer {
    pose: Pose,
}

impl PlayerBody for ConsolePlayer {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        tracing::info!(position = ?pose.position, "Player placed");
        self.pose = pose;
    }

    fn has_collision_controller(&self) -> bool {
        true
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        tracing::debug!(enabled, "Player collision toggled");
    }
}

/// Logs quest progression
pub struct ConsoleQuests;

impl QuestNotifier for ConsoleQuests {
    fn cinematic_finished(&mut self, id: &str) -> CallbackResult {
        tracing::info!(id, "Quest progression notified");
        Ok(())
    }
}
