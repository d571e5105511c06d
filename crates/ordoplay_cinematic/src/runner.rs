// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-process sequence playback.
//!
//! The runner walks a [`SequenceDefinition`] shot by shot on the
//! [`FrameScheduler`]:
//! - skip is polled before every shot, and every frame for shot kinds that
//!   allow it ([`ShotKind::polls_skip_per_frame`])
//! - start/end hooks bracket each shot
//! - on completion control is handed back to gameplay and, for play-once
//!   sequences that were not skipped, the id is marked seen

use crate::camera::{blend_towards_target, CameraMotion};
use crate::config::CinematicSettings;
use crate::events::FinishedEvent;
use crate::interpolation::Interpolation;
use crate::scheduler::{FrameScheduler, TaskHandle};
use crate::sequence::SequenceDefinition;
use crate::services::{CinematicServices, Presentation};
use crate::shot::{Shot, ShotKind};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::Instrument;

/// Progress within this much of a phase's end counts as complete
const PROGRESS_EPSILON: f32 = 1e-4;

/// How a play request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every shot ran
    Completed,
    /// The skip trigger aborted playback
    Skipped,
    /// Play-once sequence already seen; no shots ran
    AlreadySeen,
}

/// Result of one shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShotResult {
    Finished,
    Aborted,
}

#[derive(Default)]
struct RunnerState {
    playing: bool,
    current_shot: Option<usize>,
    last_outcome: Option<PlaybackOutcome>,
    task: Option<TaskHandle>,
}

struct RunnerInner {
    scheduler: FrameScheduler,
    services: CinematicServices,
    presentation: Presentation,
    settings: CinematicSettings,
    state: RefCell<RunnerState>,
    finished: FinishedEvent,
}

/// Plays sequences on a frame scheduler
#[derive(Clone)]
pub struct SequenceRunner {
    inner: Rc<RunnerInner>,
}

impl SequenceRunner {
    /// Create a runner with its collaborators
    pub fn new(
        scheduler: FrameScheduler,
        services: CinematicServices,
        presentation: Presentation,
        settings: CinematicSettings,
    ) -> Self {
        Self {
            inner: Rc::new(RunnerInner {
                scheduler,
                services,
                presentation,
                settings,
                state: RefCell::new(RunnerState::default()),
                finished: FinishedEvent::new(),
            }),
        }
    }

    /// Start playing a sequence.
    ///
    /// Returns `false` without side effects when already playing or when
    /// the sequence fails validation.
    pub fn play(&self, sequence: Rc<SequenceDefinition>) -> bool {
        if self.inner.state.borrow().playing {
            tracing::debug!(id = sequence.effective_id(), "Runner already playing; ignoring play");
            return false;
        }
        if let Err(e) = sequence.validate() {
            tracing::warn!(id = sequence.effective_id(), "Refusing to play invalid sequence: {e}");
            return false;
        }

        let span = tracing::info_span!("sequence", id = %sequence.effective_id());
        let task = self
            .inner
            .scheduler
            .spawn(run_sequence(self.inner.clone(), sequence).instrument(span));

        let mut state = self.inner.state.borrow_mut();
        state.playing = true;
        state.last_outcome = None;
        state.task = Some(task);
        true
    }

    /// Whether a sequence is playing
    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().playing
    }

    /// Index of the shot currently running
    pub fn current_shot(&self) -> Option<usize> {
        self.inner.state.borrow().current_shot
    }

    /// Outcome of the last finished play
    pub fn last_outcome(&self) -> Option<PlaybackOutcome> {
        self.inner.state.borrow().last_outcome
    }

    /// Event fired once per play after handoff
    pub fn finished(&self) -> &FinishedEvent {
        &self.inner.finished
    }
}

async fn run_sequence(inner: Rc<RunnerInner>, sequence: Rc<SequenceDefinition>) {
    let id = sequence.effective_id().to_string();

    let outcome = if sequence.play_once && inner.services.is_seen(&id) {
        tracing::info!("Sequence already seen; skipping to handoff");
        PlaybackOutcome::AlreadySeen
    } else {
        tracing::info!(shots = sequence.shot_count(), "Sequence started");
        if sequence.lock_player_input {
            inner.services.gate.borrow_mut().set_player_input_enabled(false);
        }
        let executor = ShotExecutor {
            scheduler: &inner.scheduler,
            presentation: &inner.presentation,
            settings: &inner.settings,
            sequence: &sequence,
        };
        executor.run_shots(&inner.state).await
    };

    if sequence.hand_off_on_end {
        hand_off(&inner).await;
    }

    if outcome == PlaybackOutcome::Completed && sequence.play_once {
        inner.services.mark_seen(&id);
    }

    {
        let mut state = inner.state.borrow_mut();
        state.playing = false;
        state.current_shot = None;
        state.last_outcome = Some(outcome);
        state.task = None;
    }

    tracing::info!(?outcome, "Sequence finished");
    inner.finished.emit();
}

async fn hand_off(inner: &RunnerInner) {
    let presentation = &inner.presentation;
    presentation.subtitles.borrow_mut().clear();

    let from = presentation.fader.borrow().alpha();
    animate(&inner.scheduler, inner.settings.handoff_fade_seconds, never, |t| {
        presentation.fader.borrow_mut().set_alpha(Interpolation::lerp(from, 0.0, t));
    })
    .await;

    inner.services.gate.borrow_mut().set_player_input_enabled(true);
    tracing::debug!("Handed control back to gameplay");
}

fn never() -> bool {
    false
}

/// Drive `apply` with linear progress `0..=1` over `duration` seconds,
/// one call per frame. `apply(1.0)` is always the last call unless
/// `should_abort` fires first.
async fn animate(
    scheduler: &FrameScheduler,
    duration: f32,
    mut should_abort: impl FnMut() -> bool,
    mut apply: impl FnMut(f32),
) -> ShotResult {
    let clock = scheduler.clock();
    let mut elapsed = 0.0f32;
    loop {
        if should_abort() {
            return ShotResult::Aborted;
        }

        let t = if duration > 0.0 && elapsed + PROGRESS_EPSILON < duration {
            elapsed / duration
        } else {
            1.0
        };
        apply(t);
        if t >= 1.0 {
            return ShotResult::Finished;
        }

        scheduler.next_frame().await;
        elapsed += clock.delta();
    }
}

struct ShotExecutor<'a> {
    scheduler: &'a FrameScheduler,
    presentation: &'a Presentation,
    settings: &'a CinematicSettings,
    sequence: &'a SequenceDefinition,
}

impl ShotExecutor<'_> {
    async fn run_shots(&self, state: &RefCell<RunnerState>) -> PlaybackOutcome {
        for (index, shot) in self.sequence.shots().iter().enumerate() {
            if self.skip_requested() {
                tracing::info!(shot = index, "Sequence skipped");
                return PlaybackOutcome::Skipped;
            }

            state.borrow_mut().current_shot = Some(index);
            if let Some(hooks) = &self.presentation.hooks {
                hooks.borrow_mut().shot_started(index, shot);
            }
            tracing::debug!(shot = index, name = %shot.name, kind = shot.kind.name(), "Shot started");

            let result = self.run_shot(shot).await;

            if let Some(hooks) = &self.presentation.hooks {
                hooks.borrow_mut().shot_ended(index, shot);
            }

            if result == ShotResult::Aborted {
                tracing::info!(shot = index, "Sequence skipped mid-shot");
                return PlaybackOutcome::Skipped;
            }
        }
        PlaybackOutcome::Completed
    }

    fn skip_requested(&self) -> bool {
        self.sequence.skippable
            && self
                .presentation
                .skip
                .borrow()
                .is_active(&self.sequence.skip_trigger)
    }

    fn scaled(&self, seconds: f32) -> f32 {
        seconds / self.sequence.time_scale
    }

    /// Animate over scaled `seconds`, polling skip per frame when the shot kind allows
    async fn timed(&self, shot: &Shot, seconds: f32, apply: impl FnMut(f32)) -> ShotResult {
        let duration = self.scaled(seconds);
        if shot.kind.polls_skip_per_frame() {
            animate(self.scheduler, duration, || self.skip_requested(), apply).await
        } else {
            animate(self.scheduler, duration, never, apply).await
        }
    }

    async fn run_shot(&self, shot: &Shot) -> ShotResult {
        match shot.kind {
            ShotKind::Wait => self.timed(shot, shot.duration, |_| {}).await,
            ShotKind::CameraMove => self.camera_move(shot).await,
            ShotKind::FocusTarget => self.focus_target(shot).await,
            ShotKind::ShowText => self.show_text(shot).await,
            ShotKind::FadeOnly => self.fade_only(shot).await,
            ShotKind::PlaySfx => {
                if let Some(cue) = &shot.sfx {
                    self.presentation.audio.borrow_mut().play_one_shot(&cue.clip, cue.volume);
                }
                self.timed(shot, shot.duration, |_| {}).await
            }
        }
    }

    async fn fade_overlay(&self, shot: &Shot, from: f32, to: f32) -> ShotResult {
        let fader = &self.presentation.fader;
        self.timed(shot, shot.fade.duration, |t| {
            fader.borrow_mut().set_alpha(Interpolation::lerp(from, to, t));
        })
        .await
    }

    async fn camera_move(&self, shot: &Shot) -> ShotResult {
        let camera = &self.presentation.camera;
        if let Some(from) = shot.from {
            camera.borrow_mut().set_pose(from);
        }

        if shot.fade.fade_in && self.fade_overlay(shot, 1.0, 0.0).await == ShotResult::Aborted {
            return ShotResult::Aborted;
        }

        let motion = {
            let camera = camera.borrow();
            CameraMotion::from_shot(shot, camera.pose(), camera.fov())
        };
        let look_blend = self.settings.move_look_blend;
        let result = self
            .timed(shot, shot.duration, |t| {
                let eased = shot.easing.evaluate(t);
                let current = camera.borrow().pose().rotation;
                let sample = motion.sample(eased, current, look_blend);

                let mut camera = camera.borrow_mut();
                camera.set_pose(sample.pose);
                if let Some(fov) = sample.fov {
                    camera.set_fov(fov);
                }
            })
            .await;
        if result == ShotResult::Aborted {
            return result;
        }

        if shot.fade.fade_out {
            return self.fade_overlay(shot, 0.0, 1.0).await;
        }
        ShotResult::Finished
    }

    async fn focus_target(&self, shot: &Shot) -> ShotResult {
        let Some(target) = shot.look_at else {
            tracing::debug!(name = %shot.name, "Focus shot without target; waiting only");
            return self.timed(shot, shot.duration, |_| {}).await;
        };

        let camera = &self.presentation.camera;
        let blend = self.settings.focus_look_blend;
        self.timed(shot, shot.duration, |_| {
            let mut pose = camera.borrow().pose();
            pose.rotation = blend_towards_target(pose.rotation, pose.position, target, blend);
            camera.borrow_mut().set_pose(pose);
        })
        .await
    }

    async fn show_text(&self, shot: &Shot) -> ShotResult {
        let Some(subtitle) = &shot.subtitle else {
            tracing::debug!(name = %shot.name, "Text shot without subtitle");
            return ShotResult::Finished;
        };
        let subtitles = &self.presentation.subtitles;

        self.timed(shot, subtitle.lead_in, |_| {}).await;

        {
            let mut sink = subtitles.borrow_mut();
            sink.set_text(&subtitle.text);
            sink.set_alpha(0.0);
        }
        self.timed(shot, subtitle.fade, |t| subtitles.borrow_mut().set_alpha(t)).await;
        self.timed(shot, subtitle.hold, |_| {}).await;
        self.timed(shot, subtitle.fade, |t| subtitles.borrow_mut().set_alpha(1.0 - t)).await;

        subtitles.borrow_mut().clear();
        ShotResult::Finished
    }

    async fn fade_only(&self, shot: &Shot) -> ShotResult {
        if shot.fade.fade_in {
            self.fade_overlay(shot, 1.0, 0.0).await;
        }
        if shot.fade.fade_out {
            self.fade_overlay(shot, 0.0, 1.0).await;
        }
        self.timed(shot, shot.duration, |_| {}).await
    }
}
