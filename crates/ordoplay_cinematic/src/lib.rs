// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cinematic playback engine for OrdoPlay.
//!
//! This crate plays two kinds of cinematics:
//! - In-process shot sequences ([`SequenceRunner`])
//! - Pre-authored timelines inside a sub-scene ([`SceneCinematicLoader`])
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A cooperative frame scheduler that polls futures once per frame
//! - Collaborator traits injected at construction
//! - A seen-flag replay policy persisted with the save game
//! - Racing completion detectors guarded by check-and-set flags

pub mod camera;
pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod interpolation;
pub mod loader;
pub mod policy;
pub mod runner;
pub mod scheduler;
pub mod sequence;
pub mod services;
pub mod shot;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod test_support;

pub use camera::{sample_path, CameraMotion, CameraSample};
pub use config::{CinematicSettings, ExitPlacement, SceneCinematicConfig, SceneLoadMode};
pub use easing::{CurveKey, EasingCurve};
pub use error::{CallbackError, CallbackResult, CinematicError, Result};
pub use events::{FinishedEvent, SubscriptionId};
pub use interpolation::{Interpolation, Pose};
pub use loader::{FinishCallback, LoaderPhase, SceneCinematicLoader};
pub use policy::{seen_flag, FlagCollection, JsonSaveFile, SaveTrigger, SeenFlagStore, SEEN_FLAG_PREFIX};
pub use runner::{PlaybackOutcome, SequenceRunner};
pub use scheduler::{FrameClock, FrameScheduler, FrameTime, TaskHandle, TaskId};
pub use sequence::SequenceDefinition;
pub use services::{
    shared, AudioSink, CameraRig, CinematicServices, Director, GameplayGate, LegacySkipBridge,
    PlaybackPolicyStore, PlayerBody, Presentation, QuestNotifier, SceneHandle, SceneProvider,
    SceneServices, ScreenFader, Shared, ShotHooks, SkipInput, SpawnPositioning, StopListener,
    SubtitleSink, WrapMode,
};
pub use shot::{FadeSettings, SfxCue, Shot, ShotKind, Subtitle};
pub use watchdog::{DirectorProbe, Verdict};
