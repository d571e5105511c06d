// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulated scene provider and director timeline.
//!
//! The simulated director advances with the frame clock and, like many real
//! timelines, never reports its own end: it only raises the stopped
//! notification when something calls [`Director::stop`].

use ordoplay_cinematic::{
    CinematicError, Director, FrameClock, SceneHandle, SceneLoadMode, SceneProvider, StopListener,
    WrapMode,
};
use std::collections::HashMap;

/// Simulated seconds a scene takes to load or unload
const SCENE_STREAMING_SECONDS: f64 = 0.2;

/// Timeline driven by the frame clock
pub struct SimulatedDirector {
    clock: FrameClock,
    duration: f64,
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    wrap_mode: WrapMode,
    listener: Option<StopListener>,
}

impl SimulatedDirector {
    /// Create a stopped timeline of the given length
    pub fn new(clock: FrameClock, duration: f64) -> Self {
        Self {
            clock,
            duration,
            started_at: None,
            stopped_at: None,
            wrap_mode: WrapMode::Hold,
            listener: None,
        }
    }
}

impl Director for SimulatedDirector {
    fn play(&mut self) {
        tracing::debug!(duration = self.duration, wrap = ?self.wrap_mode, "Director playing");
        self.started_at = Some(self.clock.now());
        self.stopped_at = None;
    }

    fn stop(&mut self) {
        if !self.is_playing() {
            return;
        }
        let time = self.time();
        self.stopped_at = Some(time);
        tracing::debug!(time, "Director stopped");

        if let Some(listener) = self.listener.as_mut() {
            listener();
        }
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    fn graph_done(&self) -> bool {
        false
    }

    fn time(&self) -> f64 {
        match (self.started_at, self.stopped_at) {
            (_, Some(stopped)) => stopped,
            (Some(started), None) => {
                let elapsed = self.clock.now() - started;
                match self.wrap_mode {
                    WrapMode::Loop if self.duration > 0.0 => elapsed % self.duration,
                    _ => elapsed.min(self.duration),
                }
            }
            (None, None) => 0.0,
        }
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    fn subscribe_stopped(&mut self, listener: StopListener) {
        self.listener = Some(listener);
    }

    fn unsubscribe_stopped(&mut self) {
        self.listener = None;
    }
}

/// Provides one named scene holding a single simulated director
pub struct SimulatedScenes {
    clock: FrameClock,
    scene: String,
    duration: f64,
    loading: HashMap<SceneHandle, f64>,
    unloading: HashMap<SceneHandle, f64>,
    loads: usize,
}

impl SimulatedScenes {
    /// Create a provider for `scene` whose timeline runs `duration` seconds
    pub fn new(clock: FrameClock, scene: impl Into<String>, duration: f64) -> Self {
        Self {
            clock,
            scene: scene.into(),
            duration,
            loading: HashMap::new(),
            unloading: HashMap::new(),
            loads: 0,
        }
    }

    /// Scene loads started so far
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn is_ready(&self, pending: &HashMap<SceneHandle, f64>, handle: SceneHandle) -> bool {
        pending.get(&handle).is_some_and(|ready| self.clock.now() >= *ready)
    }
}

impl SceneProvider for SimulatedScenes {
    fn begin_load(&mut self, scene: &str, mode: SceneLoadMode) -> ordoplay_cinematic::Result<SceneHandle> {
        if scene != self.scene {
            return Err(CinematicError::SceneNotFound(scene.to_string()));
        }
        let handle = SceneHandle::new();
        self.loads += 1;
        tracing::info!(scene, ?mode, handle = %handle.0, "Scene load started");
        self.loading
            .insert(handle, self.clock.now() + SCENE_STREAMING_SECONDS);
        Ok(handle)
    }

    fn is_loaded(&self, handle: SceneHandle) -> bool {
        self.is_ready(&self.loading, handle)
    }

    fn take_directors(&mut self, _handle: SceneHandle) -> Vec<Box<dyn Director>> {
        vec![Box::new(SimulatedDirector::new(self.clock.clone(), self.duration))]
    }

    fn begin_unload(&mut self, handle: SceneHandle) {
        tracing::info!(handle = %handle.0, "Scene unload started");
        self.loading.remove(&handle);
        self.unloading
            .insert(handle, self.clock.now() + SCENE_STREAMING_SECONDS);
    }

    fn is_unloaded(&self, handle: SceneHandle) -> bool {
        self.is_ready(&self.unloading, handle)
    }
}
