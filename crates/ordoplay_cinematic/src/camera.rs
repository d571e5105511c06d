// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera motion for camera and focus shots.

use crate::interpolation::{Interpolation, Pose};
use crate::shot::Shot;

/// Sample a piecewise-linear waypoint path at progress `u`.
///
/// `u` is clamped to `[0, 1]`; `u = 0` is exactly the first waypoint and
/// `u = 1` exactly the last. Returns `None` for an empty path.
pub fn sample_path(path: &[[f32; 3]], u: f32) -> Option<[f32; 3]> {
    match path.len() {
        0 => None,
        1 => Some(path[0]),
        len => {
            let u = u.clamp(0.0, 1.0);
            let scaled = u * (len - 1) as f32;
            let index = (scaled.floor() as usize).min(len - 2);
            let blend = scaled - index as f32;
            if blend >= 1.0 {
                return Some(path[index + 1]);
            }
            Some(Interpolation::lerp_vec3(path[index], path[index + 1], blend))
        }
    }
}

/// Turn `current` towards looking at `target` by a fixed fraction.
///
/// The fraction is applied per call, so the turn rate follows frame rate.
pub fn blend_towards_target(current: [f32; 4], position: [f32; 3], target: [f32; 3], factor: f32) -> [f32; 4] {
    match Interpolation::look_at(position, target) {
        Some(look) => Interpolation::slerp(current, look, factor.clamp(0.0, 1.0)),
        None => current,
    }
}

/// Camera state sampled for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Camera pose
    pub pose: Pose,
    /// New field of view, when the shot changes it
    pub fov: Option<f32>,
}

/// Motion of a camera shot, captured when the shot starts
#[derive(Debug, Clone)]
pub struct CameraMotion {
    start: Pose,
    start_fov: f32,
    to: Option<Pose>,
    path: Vec<[f32; 3]>,
    look_at: Option<[f32; 3]>,
    target_fov: Option<f32>,
}

impl CameraMotion {
    /// Capture motion for a shot starting from the camera's current state
    pub fn from_shot(shot: &Shot, start: Pose, start_fov: f32) -> Self {
        Self {
            start,
            start_fov,
            to: shot.to,
            path: shot.path.clone(),
            look_at: shot.look_at,
            target_fov: shot.changes_fov().then_some(shot.target_fov),
        }
    }

    /// Position at eased progress
    pub fn position_at(&self, eased: f32) -> [f32; 3] {
        let eased = eased.clamp(0.0, 1.0);
        if let Some(position) = sample_path(&self.path, eased) {
            return position;
        }
        match &self.to {
            Some(to) if eased >= 1.0 => to.position,
            Some(to) => Interpolation::lerp_vec3(self.start.position, to.position, eased),
            None => self.start.position,
        }
    }

    /// Rotation at eased progress, given the camera's current rotation
    pub fn rotation_at(&self, eased: f32, position: [f32; 3], current: [f32; 4], look_blend: f32) -> [f32; 4] {
        if let Some(target) = self.look_at {
            return blend_towards_target(current, position, target, look_blend);
        }
        match &self.to {
            Some(to) => Interpolation::slerp(self.start.rotation, to.rotation, eased.clamp(0.0, 1.0)),
            None => current,
        }
    }

    /// Field of view at eased progress; `None` leaves FOV untouched
    pub fn fov_at(&self, eased: f32) -> Option<f32> {
        self.target_fov
            .map(|target| Interpolation::lerp(self.start_fov, target, eased.clamp(0.0, 1.0)))
    }

    /// Sample everything for one frame
    pub fn sample(&self, eased: f32, current_rotation: [f32; 4], look_blend: f32) -> CameraSample {
        let position = self.position_at(eased);
        let rotation = self.rotation_at(eased, position, current_rotation, look_blend);
        CameraSample {
            pose: Pose::new(position, rotation),
            fov: self.fov_at(eased),
        }
    }
}
