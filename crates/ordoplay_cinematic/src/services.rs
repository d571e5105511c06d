// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collaborator interfaces the engine drives.
//!
//! Everything outside the engine is injected once at construction:
//! - Gameplay: [`GameplayGate`], [`SpawnPositioning`], [`PlaybackPolicyStore`]
//! - Presentation: [`CameraRig`], [`ScreenFader`], [`SubtitleSink`], [`AudioSink`], [`SkipInput`]
//! - Scenes: [`SceneProvider`] and the [`Director`] timelines it hands out
//!
//! Optional collaborators are `Option`s; their absence degrades behavior
//! instead of failing.

use crate::config::SceneLoadMode;
use crate::error::{CallbackResult, Result};
use crate::interpolation::Pose;
use crate::shot::Shot;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Shared single-threaded handle to a collaborator
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a value in a [`Shared`] handle
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Persisted record of which cinematics were already shown
pub trait PlaybackPolicyStore {
    /// Whether the cinematic was already shown
    fn is_seen(&self, id: &str) -> bool;

    /// Record the cinematic as shown and persist
    fn mark_seen(&mut self, id: &str) -> Result<()>;
}

/// Switches gameplay on and off around a cinematic
pub trait GameplayGate {
    /// Activate or deactivate world objects
    fn set_objects_active(&mut self, objects: &[String], active: bool);

    /// Enable or disable player input
    fn set_player_input_enabled(&mut self, enabled: bool);
}

/// Anchor-based player placement
pub trait SpawnPositioning {
    /// Make an anchor the current spawn point
    fn set_current_anchor(&mut self, anchor: &str) -> Result<()>;

    /// Teleport the player to the current anchor
    fn teleport_to_current(&mut self, use_transition: bool) -> Result<()>;
}

/// Camera driven by camera shots
pub trait CameraRig {
    /// Current pose
    fn pose(&self) -> Pose;
    /// Set pose
    fn set_pose(&mut self, pose: Pose);
    /// Current field of view in degrees
    fn fov(&self) -> f32;
    /// Set field of view in degrees
    fn set_fov(&mut self, fov: f32);
}

/// Full-screen fade overlay (alpha 1 is opaque)
pub trait ScreenFader {
    /// Current overlay alpha
    fn alpha(&self) -> f32;
    /// Set overlay alpha
    fn set_alpha(&mut self, alpha: f32);
}

/// Subtitle display
pub trait SubtitleSink {
    /// Set the displayed line
    fn set_text(&mut self, text: &str);
    /// Set line opacity
    fn set_alpha(&mut self, alpha: f32);
    /// Remove the line
    fn clear(&mut self);
}

/// One-shot audio playback
pub trait AudioSink {
    /// Fire and forget a clip
    fn play_one_shot(&mut self, clip: &str, volume: f32);
}

/// Polled skip input
pub trait SkipInput {
    /// Whether the skip trigger is held this frame
    fn is_active(&self, trigger: &str) -> bool;
}

/// Receives shot start/end hooks
pub trait ShotHooks {
    /// Shot is about to run; `shot.start_events` lists its authored events
    fn shot_started(&mut self, index: usize, shot: &Shot);
    /// Shot finished; `shot.end_events` lists its authored events
    fn shot_ended(&mut self, index: usize, shot: &Shot);
}

/// The player avatar, used for snapshot placement
pub trait PlayerBody {
    /// Current pose
    fn pose(&self) -> Pose;
    /// Teleport to a pose
    fn set_pose(&mut self, pose: Pose);
    /// Whether a physical collision controller is attached
    fn has_collision_controller(&self) -> bool {
        false
    }
    /// Enable or disable the collision controller
    fn set_collision_enabled(&mut self, _enabled: bool) {}
    /// Reset any velocity state
    fn zero_velocity(&mut self) {}
}

/// Completion bridge for the older hold-to-skip widget flow
pub trait LegacySkipBridge {
    /// Signal that the cinematic completed
    fn complete(&mut self) -> CallbackResult;
}

/// Quest/mission progression notified when a cinematic finishes
pub trait QuestNotifier {
    /// Cinematic with the given id finished
    fn cinematic_finished(&mut self, id: &str) -> CallbackResult;
}

/// Handle to a scene issued by a [`SceneProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub Uuid);

impl SceneHandle {
    /// Create a new random scene handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// What a timeline does when it reaches its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Stop and emit the stopped notification
    #[default]
    None,
    /// Hold the last frame forever
    Hold,
    /// Restart from the beginning
    Loop,
}

/// Callback run when a director stops
pub type StopListener = Box<dyn FnMut()>;

/// A pre-authored timeline found inside a loaded scene
pub trait Director {
    /// Start playback
    fn play(&mut self);
    /// Stop playback; emits the stopped notification when playing
    fn stop(&mut self);
    /// Whether the timeline is playing
    fn is_playing(&self) -> bool;
    /// Whether the internal playback graph reports done
    fn graph_done(&self) -> bool;
    /// Current playback time in seconds
    fn time(&self) -> f64;
    /// Total duration in seconds; may be non-finite or zero when unknown
    fn duration(&self) -> f64;
    /// Set end-of-timeline behavior
    fn set_wrap_mode(&mut self, mode: WrapMode);
    /// Register the stopped listener, replacing any previous one
    fn subscribe_stopped(&mut self, listener: StopListener);
    /// Remove the stopped listener
    fn unsubscribe_stopped(&mut self);
}

/// Loads and unloads cinematic scenes
pub trait SceneProvider {
    /// Start loading a scene
    fn begin_load(&mut self, scene: &str, mode: SceneLoadMode) -> Result<SceneHandle>;
    /// Whether a load finished
    fn is_loaded(&self, handle: SceneHandle) -> bool;
    /// Directors reachable from the scene's root objects
    fn take_directors(&mut self, handle: SceneHandle) -> Vec<Box<dyn Director>>;
    /// Start unloading a scene
    fn begin_unload(&mut self, handle: SceneHandle);
    /// Whether an unload finished
    fn is_unloaded(&self, handle: SceneHandle) -> bool;
}

/// Gameplay collaborators shared by the runner and the loader
#[derive(Clone)]
pub struct CinematicServices {
    /// Input and world object gate
    pub gate: Shared<dyn GameplayGate>,
    /// Replay policy; persistence is skipped when absent
    pub policy: Option<Shared<dyn PlaybackPolicyStore>>,
    /// Anchor placement; placement is skipped when absent
    pub spawn: Option<Shared<dyn SpawnPositioning>>,
}

impl CinematicServices {
    /// Create services with only a gameplay gate
    pub fn new(gate: Shared<dyn GameplayGate>) -> Self {
        Self {
            gate,
            policy: None,
            spawn: None,
        }
    }

    /// Set the policy store
    pub fn with_policy(mut self, policy: Shared<dyn PlaybackPolicyStore>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set spawn positioning
    pub fn with_spawn(mut self, spawn: Shared<dyn SpawnPositioning>) -> Self {
        self.spawn = Some(spawn);
        self
    }

    /// Whether the id is recorded as seen; false without a store
    pub fn is_seen(&self, id: &str) -> bool {
        self.policy
            .as_ref()
            .is_some_and(|policy| policy.borrow().is_seen(id))
    }

    /// Record the id as seen, logging failures
    pub fn mark_seen(&self, id: &str) {
        let Some(policy) = &self.policy else {
            tracing::debug!(id, "No policy store; seen flag not persisted");
            return;
        };
        if let Err(e) = policy.borrow_mut().mark_seen(id) {
            tracing::error!(id, "Failed to persist seen flag: {e}");
        }
    }
}

/// Presentation collaborators driven by shots
#[derive(Clone)]
pub struct Presentation {
    /// Cinematic camera
    pub camera: Shared<dyn CameraRig>,
    /// Screen fade overlay
    pub fader: Shared<dyn ScreenFader>,
    /// Subtitle line
    pub subtitles: Shared<dyn SubtitleSink>,
    /// One-shot audio
    pub audio: Shared<dyn AudioSink>,
    /// Skip input
    pub skip: Shared<dyn SkipInput>,
    /// Shot hook receiver
    pub hooks: Option<Shared<dyn ShotHooks>>,
}

/// Scene-side collaborators for the loader
#[derive(Clone)]
pub struct SceneServices {
    /// Scene loading
    pub scenes: Shared<dyn SceneProvider>,
    /// Player avatar for snapshot placement
    pub player: Option<Shared<dyn PlayerBody>>,
    /// Older hold-to-skip completion bridge
    pub legacy_skip: Option<Shared<dyn LegacySkipBridge>>,
    /// Quest progression hook
    pub quests: Option<Shared<dyn QuestNotifier>>,
}

impl SceneServices {
    /// Create scene services with only a scene provider
    pub fn new(scenes: Shared<dyn SceneProvider>) -> Self {
        Self {
            scenes,
            player: None,
            legacy_skip: None,
            quests: None,
        }
    }

    /// Set the player body
    pub fn with_player(mut self, player: Shared<dyn PlayerBody>) -> Self {
        self.player = Some(player);
        self
    }

    /// Set the legacy skip bridge
    pub fn with_legacy_skip(mut self, bridge: Shared<dyn LegacySkipBridge>) -> Self {
        self.legacy_skip = Some(bridge);
        self
    }

    /// Set the quest notifier
    pub fn with_quests(mut self, quests: Shared<dyn QuestNotifier>) -> Self {
        self.quests = Some(quests);
        self
    }
}
