// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording fakes for every collaborator, and helpers to drive the scheduler.

use crate::config::{CinematicSettings, SceneCinematicConfig, SceneLoadMode};
use crate::error::{CallbackResult, CinematicError, Result};
use crate::events::FinishedEvent;
use crate::interpolation::Pose;
use crate::loader::SceneCinematicLoader;
use crate::policy::SeenFlagStore;
use crate::runner::SequenceRunner;
use crate::scheduler::{FrameClock, FrameScheduler};
use crate::services::{
    shared, AudioSink, CameraRig, CinematicServices, Director, GameplayGate, LegacySkipBridge,
    PlaybackPolicyStore, PlayerBody, Presentation, QuestNotifier, SceneHandle, SceneProvider,
    SceneServices, ScreenFader, Shared, ShotHooks, SkipInput, SpawnPositioning, StopListener,
    SubtitleSink, WrapMode,
};
use crate::shot::Shot;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Fixed frame step used by tests (60 fps)
pub(crate) const FRAME: f32 = 1.0 / 60.0;

/// Tick `frames` fixed frames
pub(crate) fn run_frames(scheduler: &FrameScheduler, frames: usize) {
    for _ in 0..frames {
        scheduler.tick(FRAME);
    }
}

/// Tick until `done` holds or `max_seconds` pass; returns seconds ticked
pub(crate) fn run_until(scheduler: &FrameScheduler, max_seconds: f64, mut done: impl FnMut() -> bool) -> f64 {
    let mut elapsed = 0.0;
    while elapsed < max_seconds {
        scheduler.tick(FRAME);
        elapsed += f64::from(FRAME);
        if done() {
            break;
        }
    }
    elapsed
}

pub(crate) struct RecordingGate {
    pub input_enabled: bool,
    pub object_calls: Vec<(Vec<String>, bool)>,
}

impl RecordingGate {
    pub fn reenable_count(&self) -> usize {
        self.object_calls.iter().filter(|(_, active)| *active).count()
    }
}

impl GameplayGate for RecordingGate {
    fn set_objects_active(&mut self, objects: &[String], active: bool) {
        self.object_calls.push((objects.to_vec(), active));
    }

    fn set_player_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }
}

#[derive(Default)]
pub(crate) struct RecordingSpawn {
    pub anchors: Vec<String>,
    pub teleports: Vec<bool>,
}

impl SpawnPositioning for RecordingSpawn {
    fn set_current_anchor(&mut self, anchor: &str) -> Result<()> {
        self.anchors.push(anchor.to_string());
        Ok(())
    }

    fn teleport_to_current(&mut self, use_transition: bool) -> Result<()> {
        self.teleports.push(use_transition);
        Ok(())
    }
}

pub(crate) struct RecordingCamera {
    pub pose: Pose,
    pub fov: f32,
    pub fov_writes: usize,
}

impl CameraRig for RecordingCamera {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn fov(&self) -> f32 {
        self.fov
    }

    fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.fov_writes += 1;
    }
}

#[derive(Default)]
pub(crate) struct RecordingFader {
    pub alpha: f32,
}

impl ScreenFader for RecordingFader {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}

#[derive(Default)]
pub(crate) struct RecordingSubtitles {
    pub text: Option<String>,
    pub alpha: f32,
    pub alpha_peak: f32,
}

impl SubtitleSink for RecordingSubtitles {
    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.alpha_peak = self.alpha_peak.max(alpha);
    }

    fn clear(&mut self) {
        self.text = None;
        self.alpha = 0.0;
    }
}

#[derive(Default)]
pub(crate) struct RecordingAudio {
    pub played: Vec<(String, f32)>,
}

impl AudioSink for RecordingAudio {
    fn play_one_shot(&mut self, clip: &str, volume: f32) {
        self.played.push((clip.to_string(), volume));
    }
}

#[derive(Default)]
pub(crate) struct HeldSkip {
    pub held: bool,
}

impl SkipInput for HeldSkip {
    fn is_active(&self, _trigger: &str) -> bool {
        self.held
    }
}

#[derive(Default)]
pub(crate) struct RecordingHooks {
    pub log: Vec<String>,
    pub events: Vec<String>,
}

impl ShotHooks for RecordingHooks {
    fn shot_started(&mut self, index: usize, shot: &Shot) {
        self.log.push(format!("start {index}"));
        self.events.extend(shot.start_events.iter().cloned());
    }

    fn shot_ended(&mut self, index: usize, shot: &Shot) {
        self.log.push(format!("end {index}"));
        self.events.extend(shot.end_events.iter().cloned());
    }
}

#[derive(Default)]
pub(crate) struct RecordingPlayer {
    pub pose: Pose,
    pub log: Vec<&'static str>,
}

impl PlayerBody for RecordingPlayer {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.log.push("pose");
    }

    fn has_collision_controller(&self) -> bool {
        true
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.log.push(if enabled { "collision on" } else { "collision off" });
    }

    fn zero_velocity(&mut self) {
        self.log.push("zero velocity");
    }
}

#[derive(Default)]
pub(crate) struct CountingBridge {
    pub completions: usize,
    pub fail: bool,
}

impl LegacySkipBridge for CountingBridge {
    fn complete(&mut self) -> CallbackResult {
        self.completions += 1;
        if self.fail {
            return Err("skip widget missing".into());
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct CountingQuests {
    pub finished: Vec<String>,
    pub fail: bool,
}

impl QuestNotifier for CountingQuests {
    fn cinematic_finished(&mut self, id: &str) -> CallbackResult {
        self.finished.push(id.to_string());
        if self.fail {
            return Err("quest manager offline".into());
        }
        Ok(())
    }
}

/// How a fake timeline behaves once played
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimelineScript {
    pub duration: f64,
    /// Time moves forward each frame
    pub advances: bool,
    /// `stop` raises the stopped notification
    pub emits_stop: bool,
    /// The graph reports done at the natural end
    pub graph_done_at_end: bool,
}

impl TimelineScript {
    pub fn finite(duration: f64) -> Self {
        Self {
            duration,
            advances: true,
            emits_stop: true,
            graph_done_at_end: false,
        }
    }

    pub fn endless() -> Self {
        Self::finite(f64::INFINITY)
    }
}

pub(crate) struct TimelineState {
    pub script: TimelineScript,
    pub playing: bool,
    pub graph_done: bool,
    pub time: f64,
    pub wrap_mode: WrapMode,
    pub listener: Option<StopListener>,
    pub plays: usize,
    pub stops: usize,
}

impl TimelineState {
    fn new(script: TimelineScript) -> Self {
        Self {
            script,
            playing: false,
            graph_done: false,
            time: 0.0,
            wrap_mode: WrapMode::Hold,
            listener: None,
            plays: 0,
            stops: 0,
        }
    }
}

fn stop_timeline(state: &Shared<TimelineState>) {
    let listener = {
        let mut s = state.borrow_mut();
        if !s.playing {
            return;
        }
        s.playing = false;
        s.stops += 1;
        if s.script.emits_stop {
            s.listener.take()
        } else {
            None
        }
    };

    // Listener runs without the state borrowed, then goes back unless replaced
    if let Some(mut listener) = listener {
        listener();
        let mut s = state.borrow_mut();
        if s.listener.is_none() {
            s.listener = Some(listener);
        }
    }
}

/// Advance a timeline every frame and end it naturally at its duration
fn drive_timeline(scheduler: &FrameScheduler, state: Shared<TimelineState>) {
    let clock = scheduler.clock();
    let frames = scheduler.clone();
    scheduler.spawn(async move {
        loop {
            frames.next_frame().await;
            let ended = {
                let mut s = state.borrow_mut();
                if !s.playing || !s.script.advances {
                    false
                } else {
                    s.time += f64::from(clock.delta());
                    if s.time >= s.script.duration && s.wrap_mode == WrapMode::None {
                        s.time = s.script.duration;
                        s.graph_done = s.script.graph_done_at_end;
                        true
                    } else {
                        false
                    }
                }
            };
            if ended {
                stop_timeline(&state);
            }
        }
    });
}

pub(crate) struct FakeDirector(Shared<TimelineState>);

impl Director for FakeDirector {
    fn play(&mut self) {
        let mut s = self.0.borrow_mut();
        s.playing = true;
        s.plays += 1;
    }

    fn stop(&mut self) {
        stop_timeline(&self.0);
    }

    fn is_playing(&self) -> bool {
        self.0.borrow().playing
    }

    fn graph_done(&self) -> bool {
        self.0.borrow().graph_done
    }

    fn time(&self) -> f64 {
        self.0.borrow().time
    }

    fn duration(&self) -> f64 {
        self.0.borrow().script.duration
    }

    fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.0.borrow_mut().wrap_mode = mode;
    }

    fn subscribe_stopped(&mut self, listener: StopListener) {
        self.0.borrow_mut().listener = Some(listener);
    }

    fn unsubscribe_stopped(&mut self) {
        self.0.borrow_mut().listener = None;
    }
}

/// Scene provider whose loads and unloads complete after a number of frames
pub(crate) struct FakeSceneProvider {
    clock: FrameClock,
    directors: Vec<Shared<TimelineState>>,
    loading: HashMap<SceneHandle, u64>,
    unloading: HashMap<SceneHandle, u64>,
    pub loads: Vec<String>,
    pub unloads: usize,
    pub load_frames: u64,
    pub unload_frames: u64,
    pub fail_load: bool,
}

impl FakeSceneProvider {
    fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            directors: Vec::new(),
            loading: HashMap::new(),
            unloading: HashMap::new(),
            loads: Vec::new(),
            unloads: 0,
            load_frames: 1,
            unload_frames: 1,
            fail_load: false,
        }
    }
}

impl SceneProvider for FakeSceneProvider {
    fn begin_load(&mut self, scene: &str, _mode: SceneLoadMode) -> Result<SceneHandle> {
        if self.fail_load {
            return Err(CinematicError::SceneNotFound(scene.to_string()));
        }
        self.loads.push(scene.to_string());
        let handle = SceneHandle::new();
        self.loading.insert(handle, self.clock.frame() + self.load_frames);
        Ok(handle)
    }

    fn is_loaded(&self, handle: SceneHandle) -> bool {
        self.loading
            .get(&handle)
            .is_some_and(|ready| self.clock.frame() >= *ready)
    }

    fn take_directors(&mut self, _handle: SceneHandle) -> Vec<Box<dyn Director>> {
        self.directors
            .iter()
            .map(|state| Box::new(FakeDirector(state.clone())) as Box<dyn Director>)
            .collect()
    }

    fn begin_unload(&mut self, handle: SceneHandle) {
        self.unloads += 1;
        self.unloading.insert(handle, self.clock.frame() + self.unload_frames);
    }

    fn is_unloaded(&self, handle: SceneHandle) -> bool {
        self.unloading
            .get(&handle)
            .is_some_and(|ready| self.clock.frame() >= *ready)
    }
}

/// Scheduler plus one recording fake per collaborator
pub(crate) struct Fixture {
    pub scheduler: FrameScheduler,
    pub gate: Shared<RecordingGate>,
    pub spawn: Shared<RecordingSpawn>,
    pub policy: Shared<SeenFlagStore>,
    pub camera: Shared<RecordingCamera>,
    pub fader: Shared<RecordingFader>,
    pub subtitles: Shared<RecordingSubtitles>,
    pub audio: Shared<RecordingAudio>,
    pub skip: Shared<HeldSkip>,
    pub hooks: Shared<RecordingHooks>,
    pub player: Shared<RecordingPlayer>,
    pub bridge: Shared<CountingBridge>,
    pub quests: Shared<CountingQuests>,
    pub scenes: Shared<FakeSceneProvider>,
}

impl Fixture {
    pub fn new() -> Self {
        let scheduler = FrameScheduler::new();
        let scenes = shared(FakeSceneProvider::new(scheduler.clock()));
        Self {
            gate: shared(RecordingGate {
                input_enabled: true,
                object_calls: Vec::new(),
            }),
            spawn: shared(RecordingSpawn::default()),
            policy: shared(SeenFlagStore::new()),
            camera: shared(RecordingCamera {
                pose: Pose::default(),
                fov: 60.0,
                fov_writes: 0,
            }),
            fader: shared(RecordingFader::default()),
            subtitles: shared(RecordingSubtitles::default()),
            audio: shared(RecordingAudio::default()),
            skip: shared(HeldSkip::default()),
            hooks: shared(RecordingHooks::default()),
            player: shared(RecordingPlayer::default()),
            bridge: shared(CountingBridge::default()),
            quests: shared(CountingQuests::default()),
            scenes,
            scheduler,
        }
    }

    pub fn services(&self) -> CinematicServices {
        CinematicServices::new(self.gate.clone())
            .with_policy(self.policy.clone())
            .with_spawn(self.spawn.clone())
    }

    pub fn presentation(&self) -> Presentation {
        Presentation {
            camera: self.camera.clone(),
            fader: self.fader.clone(),
            subtitles: self.subtitles.clone(),
            audio: self.audio.clone(),
            skip: self.skip.clone(),
            hooks: Some(self.hooks.clone()),
        }
    }

    pub fn scene_services(&self) -> SceneServices {
        SceneServices::new(self.scenes.clone())
            .with_player(self.player.clone())
            .with_legacy_skip(self.bridge.clone())
            .with_quests(self.quests.clone())
    }

    pub fn runner(&self) -> SequenceRunner {
        SequenceRunner::new(
            self.scheduler.clone(),
            self.services(),
            self.presentation(),
            CinematicSettings::default(),
        )
    }

    pub fn loader(&self, config: SceneCinematicConfig) -> SceneCinematicLoader {
        SceneCinematicLoader::new(
            self.scheduler.clone(),
            config,
            CinematicSettings::default(),
            self.services(),
            self.scene_services(),
        )
    }

    /// Add a director to the scene and drive it every frame
    pub fn add_director(&self, script: TimelineScript) -> Shared<TimelineState> {
        let state = shared(TimelineState::new(script));
        self.scenes.borrow_mut().directors.push(state.clone());
        drive_timeline(&self.scheduler, state.clone());
        state
    }

    pub fn count_finished(&self, event: &FinishedEvent) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        event.subscribe(move || counter.set(counter.get() + 1));
        count
    }

    pub fn count_callbacks(&self, loader: &SceneCinematicLoader) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        loader.on_finished(move || {
            counter.set(counter.get() + 1);
            Ok(())
        });
        count
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.policy.borrow().is_seen(id)
    }

    pub fn mark_seen(&self, id: &str) {
        self.policy.borrow_mut().mark_seen(id).unwrap();
    }
}
