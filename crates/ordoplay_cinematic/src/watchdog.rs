// SPDX-License-Identifier: MIT OR Apache-2.0
//! Completion detection for scene timelines.
//!
//! The per-frame monitor task and the late-update backstop both evaluate
//! the same conditions, in priority order, through [`evaluate`].

use crate::config::{is_valid_duration, CinematicSettings};
use crate::services::Director;

/// Director state observed on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectorProbe {
    /// Playback graph reports done
    pub graph_done: bool,
    /// Director is playing
    pub playing: bool,
    /// Playback time in seconds
    pub time: f64,
    /// Reported duration in seconds
    pub duration: f64,
}

impl DirectorProbe {
    /// Read the current state of a director
    pub fn observe(director: &dyn Director) -> Self {
        Self {
            graph_done: director.graph_done(),
            playing: director.is_playing(),
            time: director.time(),
            duration: director.duration(),
        }
    }
}

/// What a completion check concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to do this frame
    Running,
    /// Graph finished on its own
    GraphDone,
    /// Playback time passed a valid duration
    ReachedEnd,
    /// Soft timeout elapsed since playback started
    TimedOut {
        /// Director still reported playing
        still_playing: bool,
    },
}

impl Verdict {
    /// Whether the timeline should end
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Evaluate completion for `elapsed` seconds of wall time since play
pub fn evaluate(probe: &DirectorProbe, elapsed: f64, settings: &CinematicSettings) -> Verdict {
    if probe.graph_done {
        return Verdict::GraphDone;
    }
    if is_valid_duration(probe.duration) && probe.time >= probe.duration {
        return Verdict::ReachedEnd;
    }
    if elapsed >= settings.soft_timeout(probe.duration) {
        return Verdict::TimedOut {
            still_playing: probe.playing,
        };
    }
    Verdict::Running
}
