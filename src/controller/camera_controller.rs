use glam::Vec3;

use crate::model::camera::MAX_PITCH;
use crate::model::world::HeightField;
use crate::model::Camera;

/// Nominal frame length movement speeds are tuned for
pub const REFERENCE_FRAME_MS: f32 = 16.67;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    /// Eye height above the ground
    pub player_height: f32,
    /// Degrees of turn per pixel of pointer movement
    pub mouse_sensitivity: f32,
    /// Degrees per tick while Q/E is held
    pub rotate_speed: f32,
    /// Units per reference frame
    pub move_speed: f32,
    /// Fraction of the height error corrected per tick
    pub smoothing: f32,
    pub head_bob_amount: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            player_height: 1.0,
            mouse_sensitivity: 0.2,
            rotate_speed: 2.0,
            move_speed: 0.1,
            smoothing: 0.15,
            head_bob_amount: 0.03,
        }
    }
}

/// First-person camera: look, walk, and glide over the terrain
pub struct CameraController {
    pub config: CameraConfig,
    last_terrain_height: f32,
    head_bob_phase: f32,
    moving: bool,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self { config, last_terrain_height: 0.0, head_bob_phase: 0.0, moving: false }
    }

    /// Stand the camera on the terrain with no easing
    pub fn place_on_terrain(&mut self, camera: &mut Camera, terrain: &HeightField) {
        self.last_terrain_height = terrain.height_at(camera.eye.x, camera.eye.z);
        camera.eye.y = self.last_terrain_height + self.config.player_height;
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        let sensitivity = self.config.mouse_sensitivity.to_radians();
        camera.yaw += dx * sensitivity;
        camera.pitch = (camera.pitch - dy * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Key turning; positive turns right
    pub fn apply_rotate(&self, camera: &mut Camera, direction: f32) {
        camera.yaw += direction * self.config.rotate_speed.to_radians();
    }

    /// Move along the ground plane in camera space, plus straight up/down.
    /// `move_vector` is (strafe, vertical, forward).
    pub fn update_movement(&mut self, camera: &mut Camera, move_vector: Vec3, dt_ms: f32) {
        let horizontal = camera.horizontal_forward() * move_vector.z + camera.right() * move_vector.x;
        let mut step = horizontal.normalize_or_zero();
        step.y = move_vector.y.clamp(-1.0, 1.0);

        self.moving = horizontal != Vec3::ZERO;
        if step != Vec3::ZERO {
            camera.eye += step * self.config.move_speed * (dt_ms / REFERENCE_FRAME_MS);
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Ease the eye toward terrain + player height. Big steps in the
    /// ground are taken gradually and long drops are left alone.
    pub fn follow_terrain(&mut self, camera: &mut Camera, terrain: &HeightField) {
        let ground = terrain.height_at(camera.eye.x, camera.eye.z);
        let delta = ground - self.last_terrain_height;
        if delta.abs() > 0.5 {
            self.last_terrain_height += delta * 0.3;
        } else {
            self.last_terrain_height = ground;
        }

        let mut target = self.last_terrain_height + self.config.player_height;
        if self.moving {
            self.head_bob_phase += 1.0;
            target += self.head_bob_phase.sin() * self.config.head_bob_amount;
        }

        let diff = target - camera.eye.y;
        if diff.abs() > 0.01 && (diff > 0.0 || diff.abs() < 1.5) {
            camera.eye.y += diff * self.config.smoothing;
        }
    }

    /// Feet position fed to the quest
    pub fn player_position(&self, camera: &Camera) -> Vec3 {
        camera.eye - Vec3::new(0.0, self.config.player_height, 0.0)
    }
}
