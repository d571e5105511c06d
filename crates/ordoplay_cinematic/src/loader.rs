// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene-timeline cinematics.
//!
//! A [`SceneCinematicLoader`] loads a sub-scene holding a pre-authored
//! [`Director`] timeline, plays it and unloads it again. The timeline is
//! not trusted to report its own end, so three detectors race to finish it:
//! 1. the director's stopped notification
//! 2. a per-frame monitor task
//! 3. a late-update backstop hook on the scheduler
//!
//! Finish actions and unload are check-and-set, so whichever detector fires
//! first wins and the others become no-ops.

use crate::config::{CinematicSettings, ExitPlacement, SceneCinematicConfig};
use crate::error::CallbackResult;
use crate::events::FinishedEvent;
use crate::interpolation::Pose;
use crate::scheduler::{FrameScheduler, TaskHandle};
use crate::services::{
    CinematicServices, Director, SceneHandle, SceneServices, StopListener, WrapMode,
};
use crate::watchdog::{evaluate, DirectorProbe, Verdict};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::Instrument;

/// Callback run once when a scene cinematic finishes
pub type FinishCallback = Box<dyn FnMut() -> CallbackResult>;

type DirectorCell = Rc<RefCell<Box<dyn Director>>>;

/// Lifecycle phase of a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    /// Ready to play
    Idle,
    /// Scene load in flight
    Loading,
    /// Director playing
    Playing,
    /// Scene unload in flight
    Unloading,
}

#[derive(Default)]
struct PlaybackState {
    is_playing: bool,
    is_unloading: bool,
    finish_actions_invoked: bool,
    scene: Option<SceneHandle>,
    director: Option<DirectorCell>,
    started_at: Option<f64>,
    snapshot: Option<Pose>,
    play_task: Option<TaskHandle>,
    monitor: Option<TaskHandle>,
}

struct LoaderInner {
    scheduler: FrameScheduler,
    config: SceneCinematicConfig,
    settings: CinematicSettings,
    services: CinematicServices,
    scene: SceneServices,
    state: RefCell<PlaybackState>,
    callbacks: RefCell<Vec<FinishCallback>>,
    finished: FinishedEvent,
}

impl LoaderInner {
    fn id(&self) -> &str {
        self.config.effective_id()
    }

    fn elapsed_since_start(&self) -> Option<f64> {
        self.state
            .borrow()
            .started_at
            .map(|started| self.scheduler.now() - started)
    }
}

/// Plays a scene cinematic through load, playback and unload
#[derive(Clone)]
pub struct SceneCinematicLoader {
    inner: Rc<LoaderInner>,
}

impl SceneCinematicLoader {
    /// Create a loader and install its backstop hook on the scheduler
    pub fn new(
        scheduler: FrameScheduler,
        config: SceneCinematicConfig,
        settings: CinematicSettings,
        services: CinematicServices,
        scene: SceneServices,
    ) -> Self {
        let inner = Rc::new(LoaderInner {
            scheduler,
            config,
            settings,
            services,
            scene,
            state: RefCell::new(PlaybackState::default()),
            callbacks: RefCell::new(Vec::new()),
            finished: FinishedEvent::new(),
        });

        let weak = Rc::downgrade(&inner);
        inner.scheduler.add_late_update(move |_| match weak.upgrade() {
            Some(inner) => {
                backstop(&inner);
                true
            }
            None => false,
        });

        Self { inner }
    }

    /// Register a callback run as part of the finish actions
    pub fn on_finished(&self, callback: impl FnMut() -> CallbackResult + 'static) {
        self.inner.callbacks.borrow_mut().push(Box::new(callback));
    }

    /// Event fired once per play when the cinematic finishes
    pub fn finished(&self) -> &FinishedEvent {
        &self.inner.finished
    }

    /// Loader configuration
    pub fn config(&self) -> &SceneCinematicConfig {
        &self.inner.config
    }

    /// Whether a play is in progress, including its unload
    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().is_playing
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> LoaderPhase {
        let state = self.inner.state.borrow();
        if !state.is_playing {
            LoaderPhase::Idle
        } else if state.is_unloading {
            LoaderPhase::Unloading
        } else if state.director.is_some() {
            LoaderPhase::Playing
        } else {
            LoaderPhase::Loading
        }
    }

    /// Start the cinematic.
    ///
    /// Returns `false` when nothing happened: no scene configured, or a play
    /// is already in progress. A play-once cinematic that was already seen
    /// finishes immediately without loading and returns `true`.
    pub fn play(&self) -> bool {
        let inner = &self.inner;
        if !inner.config.has_scene() {
            tracing::warn!(id = inner.id(), "Scene cinematic has no scene reference; ignoring play");
            return false;
        }

        {
            let mut state = inner.state.borrow_mut();
            if state.is_playing {
                tracing::debug!(id = inner.id(), "Scene cinematic already playing; ignoring play");
                return false;
            }
            state.finish_actions_invoked = false;
        }

        if inner.config.play_once && inner.services.is_seen(inner.id()) {
            tracing::info!(id = inner.id(), "Scene cinematic already seen; skipping load");
            invoke_finish_actions(inner);
            set_objects_active(inner, true);
            restore_placement(inner, None);
            return true;
        }

        inner.state.borrow_mut().is_playing = true;
        let span = tracing::info_span!("scene_cinematic", id = %inner.id());
        let task = inner.scheduler.spawn(run_play(inner.clone()).instrument(span));
        inner.state.borrow_mut().play_task = Some(task);
        true
    }

    /// End a playing cinematic early through the regular finish and unload path
    pub fn stop(&self) {
        if !self.is_playing() {
            return;
        }
        tracing::info!(id = self.inner.id(), "Scene cinematic stopped by caller");
        finish_and_unload(&self.inner);
    }
}

async fn run_play(inner: Rc<LoaderInner>) {
    let config = &inner.config;

    // Stopped before the first poll; the unload task owns cleanup
    if inner.state.borrow().is_unloading {
        tracing::debug!(id = inner.id(), "Scene cinematic stopped before loading");
        return;
    }

    if let Some(anchor) = &config.exit_anchor {
        register_anchor(&inner, anchor);
    }

    if config.placement == ExitPlacement::RestoreSnapshot {
        match &inner.scene.player {
            Some(player) => inner.state.borrow_mut().snapshot = Some(player.borrow().pose()),
            None => tracing::warn!("Snapshot placement configured without a player body"),
        }
    }

    set_objects_active(&inner, false);

    let load = inner
        .scene
        .scenes
        .borrow_mut()
        .begin_load(&config.scene, config.load_mode);
    let handle = match load {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(scene = %config.scene, "Failed to load cinematic scene: {e}");
            finish_and_unload(&inner);
            return;
        }
    };
    inner.state.borrow_mut().scene = Some(handle);
    tracing::debug!(scene = %config.scene, mode = ?config.load_mode, "Loading cinematic scene");

    let scenes = inner.scene.scenes.clone();
    inner
        .scheduler
        .wait_until(move || scenes.borrow().is_loaded(handle))
        .await;

    if inner.state.borrow().is_unloading {
        return;
    }

    let mut directors = inner.scene.scenes.borrow_mut().take_directors(handle);
    if directors.is_empty() {
        tracing::warn!(scene = %config.scene, "No director found in cinematic scene");
        finish_and_unload(&inner);
        return;
    }
    if directors.len() > 1 {
        tracing::warn!(
            scene = %config.scene,
            count = directors.len(),
            "Multiple directors in cinematic scene; using the first"
        );
    }
    let director: DirectorCell = Rc::new(RefCell::new(directors.swap_remove(0)));

    {
        let mut d = director.borrow_mut();
        d.subscribe_stopped(stop_listener(&inner));
        d.set_wrap_mode(WrapMode::None);
        d.play();
    }

    {
        let mut state = inner.state.borrow_mut();
        state.director = Some(director.clone());
        state.started_at = Some(inner.scheduler.now());
    }
    tracing::info!(duration = director.borrow().duration(), "Scene cinematic playing");

    let monitor = inner.scheduler.spawn(monitor(inner.clone(), director));
    inner.state.borrow_mut().monitor = Some(monitor);
}

/// Stopped notifications arrive inside `Director::stop`, so the work is
/// deferred to a task instead of touching loader state re-entrantly.
fn stop_listener(inner: &Rc<LoaderInner>) -> StopListener {
    let weak: Weak<LoaderInner> = Rc::downgrade(inner);
    let scheduler = inner.scheduler.clone();
    Box::new(move || {
        let weak = weak.clone();
        scheduler.spawn(async move {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!(id = inner.id(), "Director stopped");
                finish_and_unload(&inner);
            }
        });
    })
}

async fn monitor(inner: Rc<LoaderInner>, director: DirectorCell) {
    loop {
        inner.scheduler.next_frame().await;
        if inner.state.borrow().is_unloading {
            return;
        }

        let probe = DirectorProbe::observe(&**director.borrow());
        let Some(elapsed) = inner.elapsed_since_start() else {
            return;
        };

        match evaluate(&probe, elapsed, &inner.settings) {
            Verdict::Running => continue,
            Verdict::GraphDone => {
                tracing::debug!("Director graph done");
                finish_and_unload(&inner);
            }
            Verdict::ReachedEnd => {
                tracing::debug!(time = probe.time, "Director reached its duration; stopping");
                director.borrow_mut().stop();
            }
            Verdict::TimedOut { still_playing: true } => {
                tracing::warn!(elapsed, "Scene cinematic timed out; force-stopping director");
                director.borrow_mut().stop();
            }
            Verdict::TimedOut { still_playing: false } => {
                tracing::warn!(elapsed, "Scene cinematic timed out after director went idle");
                finish_and_unload(&inner);
            }
        }
        return;
    }
}

fn backstop(inner: &Rc<LoaderInner>) {
    let (director, started_at) = {
        let state = inner.state.borrow();
        if !state.is_playing || state.is_unloading {
            return;
        }
        match (&state.director, state.started_at) {
            (Some(director), Some(started_at)) => (director.clone(), started_at),
            _ => return,
        }
    };

    let probe = DirectorProbe::observe(&**director.borrow());
    let verdict = evaluate(&probe, inner.scheduler.now() - started_at, &inner.settings);
    if verdict.is_complete() {
        tracing::debug!(?verdict, "Backstop detected completion");
        finish_and_unload(inner);
    }
}

fn finish_and_unload(inner: &Rc<LoaderInner>) {
    invoke_finish_actions(inner);
    begin_unload(inner);
}

fn invoke_finish_actions(inner: &LoaderInner) {
    {
        let mut state = inner.state.borrow_mut();
        if state.finish_actions_invoked {
            return;
        }
        state.finish_actions_invoked = true;
    }
    let id = inner.id();
    tracing::info!(id, "Scene cinematic finished");

    let mut callbacks = std::mem::take(&mut *inner.callbacks.borrow_mut());
    for callback in &mut callbacks {
        if let Err(e) = callback() {
            tracing::error!(id, "Finish callback failed: {e}");
        }
    }
    {
        let mut registered = inner.callbacks.borrow_mut();
        callbacks.append(&mut registered);
        *registered = callbacks;
    }

    if let Some(bridge) = &inner.scene.legacy_skip {
        if let Err(e) = bridge.borrow_mut().complete() {
            tracing::error!(id, "Legacy skip completion failed: {e}");
        }
    }

    if let Some(quests) = &inner.scene.quests {
        if let Err(e) = quests.borrow_mut().cinematic_finished(id) {
            tracing::error!(id, "Quest notification failed: {e}");
        }
    }

    if inner.config.play_once {
        inner.services.mark_seen(id);
    }

    inner.finished.emit();
}

fn begin_unload(inner: &Rc<LoaderInner>) {
    {
        let mut state = inner.state.borrow_mut();
        if !state.is_playing || state.is_unloading {
            tracing::debug!(id = inner.id(), "Unload already in progress");
            return;
        }
        state.is_unloading = true;
    }

    let span = tracing::info_span!("scene_unload", id = %inner.id());
    inner.scheduler.spawn(run_unload(inner.clone()).instrument(span));
}

async fn run_unload(inner: Rc<LoaderInner>) {
    let (play_task, monitor, director, scene, snapshot) = {
        let mut state = inner.state.borrow_mut();
        (
            state.play_task.take(),
            state.monitor.take(),
            state.director.take(),
            state.scene,
            state.snapshot,
        )
    };
    for task in [play_task, monitor].into_iter().flatten() {
        task.cancel();
    }

    if let Some(director) = director {
        let mut d = director.borrow_mut();
        d.unsubscribe_stopped();
        if d.is_playing() {
            d.stop();
        }
    }

    if let Some(handle) = scene {
        inner.scene.scenes.borrow_mut().begin_unload(handle);
        let scenes = inner.scene.scenes.clone();
        inner
            .scheduler
            .wait_until(move || scenes.borrow().is_unloaded(handle))
            .await;
        tracing::debug!(scene = %inner.config.scene, "Cinematic scene unloaded");
    }

    set_objects_active(&inner, true);
    restore_placement(&inner, snapshot);

    *inner.state.borrow_mut() = PlaybackState {
        finish_actions_invoked: true,
        ..Default::default()
    };
    tracing::info!("Scene cinematic cleaned up");
}

fn set_objects_active(inner: &LoaderInner, active: bool) {
    let objects = &inner.config.disable_objects;
    if !objects.is_empty() {
        inner.services.gate.borrow_mut().set_objects_active(objects, active);
    }
}

fn register_anchor(inner: &LoaderInner, anchor: &str) -> bool {
    let Some(spawn) = &inner.services.spawn else {
        tracing::debug!(anchor, "No spawn positioning; exit anchor ignored");
        return false;
    };
    match spawn.borrow_mut().set_current_anchor(anchor) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(anchor, "Failed to register exit anchor: {e}");
            false
        }
    }
}

fn restore_placement(inner: &LoaderInner, snapshot: Option<Pose>) {
    if inner.config.placement == ExitPlacement::RestoreSnapshot {
        if let (Some(pose), Some(player)) = (snapshot, &inner.scene.player) {
            let mut player = player.borrow_mut();
            let collision = player.has_collision_controller();
            if collision {
                player.set_collision_enabled(false);
            }
            player.set_pose(pose);
            player.zero_velocity();
            if collision {
                player.set_collision_enabled(true);
            }
            tracing::debug!(position = ?pose.position, "Restored player snapshot");
            return;
        }
    }

    let Some(anchor) = &inner.config.exit_anchor else {
        return;
    };
    if !register_anchor(inner, anchor) {
        return;
    }
    if let Some(spawn) = &inner.services.spawn {
        if let Err(e) = spawn
            .borrow_mut()
            .teleport_to_current(inner.config.teleport_with_transition)
        {
            tracing::warn!(anchor = %anchor, "Failed to teleport player to exit anchor: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{run_frames, run_until, Fixture, TimelineScript, FRAME};

    fn intro() -> SceneCinematicConfig {
        SceneCinematicConfig::new("intro_scene")
            .play_once("intro_01")
            .with_disabled_objects(&["hud", "enemies"])
            .with_exit_anchor("intro_exit")
    }

    #[test]
    fn test_natural_end_finishes_and_unloads_once() {
        let fixture = Fixture::new();
        let timeline = fixture.add_director(TimelineScript::finite(2.0));
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        assert!(loader.play());
        run_frames(&fixture.scheduler, 2);
        assert_eq!(loader.phase(), LoaderPhase::Playing);
        assert_eq!(timeline.borrow().wrap_mode, WrapMode::None);
        assert_eq!(fixture.gate.borrow().object_calls, vec![(vec!["hud".to_string(), "enemies".to_string()], false)]);

        run_until(&fixture.scheduler, 10.0, || !loader.is_playing());
        assert_eq!(fired.get(), 1);
        assert_eq!(fixture.scenes.borrow().loads, vec!["intro_scene".to_string()]);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
        assert_eq!(fixture.gate.borrow().reenable_count(), 1);
        assert_eq!(fixture.spawn.borrow().teleports, vec![true]);
        assert_eq!(fixture.spawn.borrow().anchors[0], "intro_exit");
        assert_eq!(fixture.quests.borrow().finished, vec!["intro_01".to_string()]);
        assert_eq!(fixture.bridge.borrow().completions, 1);
        assert!(fixture.is_seen("intro_01"));
        assert_eq!(loader.phase(), LoaderPhase::Idle);
    }

    #[test]
    fn test_detectors_in_same_tick_finish_once() {
        let fixture = Fixture::new();
        // Graph done, end of duration and stopped notification all land together
        let mut script = TimelineScript::finite(1.0);
        script.graph_done_at_end = true;
        fixture.add_director(script);
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());
        let callbacks = fixture.count_callbacks(&loader);

        loader.play();
        run_until(&fixture.scheduler, 5.0, || !loader.is_playing());
        run_frames(&fixture.scheduler, 30);

        assert_eq!(fired.get(), 1);
        assert_eq!(callbacks.get(), 1);
        assert_eq!(fixture.quests.borrow().finished.len(), 1);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
    }

    #[test]
    fn test_silent_director_is_force_stopped_within_grace() {
        let fixture = Fixture::new();
        let mut script = TimelineScript::finite(5.0);
        script.emits_stop = false;
        script.advances = false;
        let timeline = fixture.add_director(script);
        let loader = fixture.loader(intro());

        loader.play();
        let mut started_at = None;
        let mut unload_began_at = None;
        while loader.is_playing() && fixture.scheduler.now() < 10.0 {
            fixture.scheduler.tick(FRAME);
            let now = fixture.scheduler.now();
            if started_at.is_none() && timeline.borrow().plays == 1 {
                started_at = Some(now);
            }
            if unload_began_at.is_none() && fixture.scenes.borrow().unloads == 1 {
                unload_began_at = Some(now);
            }
        }

        // Stop and unload start on the frame the 5.5s soft timeout elapses
        let waited = unload_began_at.unwrap() - started_at.unwrap();
        assert!(waited >= 5.5 - 1e-6, "unloaded early after {waited}s");
        assert!(waited <= 5.5 + f64::from(FRAME) / 2.0, "unloaded late after {waited}s");
        assert!(!loader.is_playing());
        assert_eq!(timeline.borrow().stops, 1);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
    }

    #[test]
    fn test_director_reaching_end_without_notification() {
        let fixture = Fixture::new();
        let mut script = TimelineScript::finite(5.0);
        script.emits_stop = false;
        fixture.add_director(script);
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        let elapsed = run_until(&fixture.scheduler, 10.0, || !loader.is_playing());
        assert!(elapsed <= 5.5, "took {elapsed}s");
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_seen_cinematic_skips_loading() {
        let fixture = Fixture::new();
        fixture.add_director(TimelineScript::finite(1.0));
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        run_until(&fixture.scheduler, 5.0, || !loader.is_playing());
        assert_eq!(fixture.scenes.borrow().loads.len(), 1);

        assert!(loader.play());
        assert!(!loader.is_playing());
        run_frames(&fixture.scheduler, 10);

        assert_eq!(fixture.scenes.borrow().loads.len(), 1);
        assert_eq!(fired.get(), 2);
        assert_eq!(fixture.gate.borrow().reenable_count(), 2);
        assert_eq!(fixture.spawn.borrow().teleports.len(), 2);
    }

    #[test]
    fn test_double_unload_is_suppressed() {
        let fixture = Fixture::new();
        fixture.scenes.borrow_mut().unload_frames = 5;
        fixture.add_director(TimelineScript::endless());
        let loader = fixture.loader(intro());

        loader.play();
        run_frames(&fixture.scheduler, 3);
        loader.stop();
        loader.stop();
        assert_eq!(loader.phase(), LoaderPhase::Unloading);
        run_frames(&fixture.scheduler, 1);
        loader.stop();

        run_until(&fixture.scheduler, 2.0, || !loader.is_playing());
        assert_eq!(fixture.scenes.borrow().unloads, 1);
        assert_eq!(fixture.gate.borrow().reenable_count(), 1);
        assert_eq!(fixture.quests.borrow().finished.len(), 1);
    }

    #[test]
    fn test_missing_director_is_zero_length() {
        let fixture = Fixture::new();
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        let elapsed = run_until(&fixture.scheduler, 2.0, || !loader.is_playing());
        assert!(elapsed < 0.2);
        assert_eq!(fired.get(), 1);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
        assert_eq!(fixture.gate.borrow().reenable_count(), 1);
    }

    #[test]
    fn test_load_error_behaves_like_missing_director() {
        let fixture = Fixture::new();
        fixture.scenes.borrow_mut().fail_load = true;
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        run_until(&fixture.scheduler, 2.0, || !loader.is_playing());
        assert_eq!(fired.get(), 1);
        assert_eq!(fixture.scenes.borrow().unloads, 0);
        assert_eq!(fixture.gate.borrow().reenable_count(), 1);
    }

    #[test]
    fn test_blank_scene_is_noop() {
        let fixture = Fixture::new();
        let loader = fixture.loader(SceneCinematicConfig::new("  "));
        let fired = fixture.count_finished(loader.finished());

        assert!(!loader.play());
        run_frames(&fixture.scheduler, 10);
        assert!(fixture.scenes.borrow().loads.is_empty());
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn test_play_while_playing_is_noop() {
        let fixture = Fixture::new();
        fixture.add_director(TimelineScript::endless());
        let loader = fixture.loader(intro());

        assert!(loader.play());
        run_frames(&fixture.scheduler, 3);
        assert!(!loader.play());
        assert_eq!(fixture.scenes.borrow().loads.len(), 1);
    }

    #[test]
    fn test_failing_callbacks_do_not_block_unload() {
        let fixture = Fixture::new();
        fixture.bridge.borrow_mut().fail = true;
        fixture.quests.borrow_mut().fail = true;
        fixture.add_director(TimelineScript::finite(0.5));
        let loader = fixture.loader(intro());
        loader.on_finished(|| Err("callback exploded".into()));
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        run_until(&fixture.scheduler, 5.0, || !loader.is_playing());
        assert_eq!(fired.get(), 1);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
        assert!(fixture.is_seen("intro_01"));
    }

    #[test]
    fn test_snapshot_placement_restores_pose() {
        let fixture = Fixture::new();
        let start = Pose::at([3.0, 0.0, -7.0]);
        fixture.player.borrow_mut().pose = start;
        fixture.add_director(TimelineScript::finite(1.0));
        let loader = fixture.loader(
            SceneCinematicConfig::new("bridge_scene").with_placement(ExitPlacement::RestoreSnapshot),
        );

        loader.play();
        run_frames(&fixture.scheduler, 5);
        fixture.player.borrow_mut().pose = Pose::at([50.0, 0.0, 0.0]);

        run_until(&fixture.scheduler, 5.0, || !loader.is_playing());
        let player = fixture.player.borrow();
        assert_eq!(player.pose, start);
        assert_eq!(player.log, vec!["collision off", "pose", "zero velocity", "collision on"]);
        assert!(fixture.spawn.borrow().teleports.is_empty());
    }

    #[test]
    fn test_caller_stop_finishes_early() {
        let fixture = Fixture::new();
        let timeline = fixture.add_director(TimelineScript::endless());
        let loader = fixture.loader(SceneCinematicConfig::new("ambient"));
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        run_frames(&fixture.scheduler, 30);
        loader.stop();
        run_until(&fixture.scheduler, 1.0, || !loader.is_playing());

        assert_eq!(fired.get(), 1);
        assert!(!timeline.borrow().playing);
        assert!(timeline.borrow().listener.is_none());
        // Not play-once, so nothing is recorded
        assert!(!fixture.is_seen("ambient"));
    }

    #[test]
    fn test_extra_directors_are_ignored() {
        let fixture = Fixture::new();
        let first = fixture.add_director(TimelineScript::finite(0.5));
        let second = fixture.add_director(TimelineScript::finite(0.5));
        let loader = fixture.loader(intro());

        loader.play();
        run_until(&fixture.scheduler, 5.0, || !loader.is_playing());
        assert_eq!(first.borrow().plays, 1);
        assert_eq!(second.borrow().plays, 0);
    }

    #[test]
    fn test_stop_before_first_tick_loads_nothing() {
        let fixture = Fixture::new();
        let timeline = fixture.add_director(TimelineScript::finite(2.0));
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        assert!(loader.play());
        loader.stop();
        assert_eq!(fired.get(), 1);
        assert!(fixture.is_seen("intro_01"));

        run_until(&fixture.scheduler, 1.0, || !loader.is_playing());
        assert!(!loader.is_playing());
        assert!(fixture.scenes.borrow().loads.is_empty());
        assert_eq!(fixture.scenes.borrow().unloads, 0);
        assert_eq!(timeline.borrow().plays, 0);
        assert_eq!(
            fixture.gate.borrow().object_calls,
            vec![(vec!["hud".to_string(), "enemies".to_string()], true)]
        );
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_graph_done_alone_finishes_once() {
        let fixture = Fixture::new();
        let mut script = TimelineScript::finite(10.0);
        script.emits_stop = false;
        let timeline = fixture.add_director(script);
        let loader = fixture.loader(intro());
        let fired = fixture.count_finished(loader.finished());

        loader.play();
        run_frames(&fixture.scheduler, 30);
        assert_eq!(loader.phase(), LoaderPhase::Playing);

        // Still playing and short of its duration; only the graph reports done
        timeline.borrow_mut().graph_done = true;
        let elapsed = run_until(&fixture.scheduler, 1.0, || !loader.is_playing());

        assert!(elapsed < 0.1, "took {elapsed}s");
        assert!(timeline.borrow().time < 10.0);
        assert_eq!(fired.get(), 1);
        assert_eq!(timeline.borrow().stops, 1);
        assert_eq!(fixture.scenes.borrow().unloads, 1);
        assert_eq!(fixture.gate.borrow().reenable_count(), 1);
    }
}
