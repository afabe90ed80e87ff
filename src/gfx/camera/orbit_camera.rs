use cgmath::{perspective, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, Zero};

use super::camera_utils::CameraUniform;

/// Maps OpenGL clip space (z in -1..1) onto wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// How far the camera may zoom and tilt
#[derive(Debug, Clone, Copy)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pitch is kept within `-max_pitch..=max_pitch`
    pub max_pitch: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.2,
            max_distance: 20.0,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

/// Y-up camera orbiting a target point.
///
/// With zero pitch and yaw the eye sits on +Z at `distance` from the target,
/// so a mesh at the origin is seen from the front.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub target: Vector3<f32>,
    pub limits: OrbitLimits,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    initial: (f32, f32, f32, Vector3<f32>),
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        Self {
            distance,
            pitch,
            yaw,
            target,
            limits: OrbitLimits::default(),
            aspect,
            fovy: Rad::from(Deg(75.0)),
            znear: 0.1,
            zfar: 100.0,
            initial: (distance, pitch, yaw, target),
        }
    }

    /// Perspective parameters, field of view in degrees
    pub fn with_projection(mut self, fovy_degrees: f32, znear: f32, zfar: f32) -> Self {
        self.fovy = Rad::from(Deg(fovy_degrees));
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn eye(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target
            + Vector3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch) * self.distance
    }

    pub fn reset(&mut self) {
        let (distance, pitch, yaw, target) = self.initial;
        self.distance = distance;
        self.pitch = pitch;
        self.yaw = yaw;
        self.target = target;
    }

    /// Zooms by `delta`, scaled so steps grow with distance.
    pub fn zoom(&mut self, delta: f32) {
        let step = self.distance.max(1.0).log10().max(0.1) * delta;
        self.distance =
            (self.distance + step).clamp(self.limits.min_distance, self.limits.max_distance);
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-self.limits.max_pitch, self.limits.max_pitch);
    }

    /// Slides the target within the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);
        self.target += (right * dx + up * dy) * (self.distance * 0.1);
    }

    /// Zero-sized surfaces keep the previous aspect.
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(
            Point3::from_vec(self.eye()),
            Point3::from_vec(self.target),
            Vector3::unit_y(),
        );
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar) * view
    }

    pub fn uniform(&self) -> CameraUniform {
        let eye = self.eye();
        CameraUniform {
            view_position: [eye.x, eye.y, eye.z, 1.0],
            view_proj: self.view_projection().into(),
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(2.0, 0.0, 0.0, Vector3::zero(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_eye_on_positive_z() {
        let camera = OrbitCamera::default();
        let eye = camera.eye();
        assert!((eye.z - 2.0).abs() < 1e-6);
        assert!(eye.x.abs() < 1e-6 && eye.y.abs() < 1e-6);
        assert!((Deg::from(camera.fovy).0 - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_resize_updates_aspect_and_ignores_zero() {
        let mut camera = OrbitCamera::default();
        camera.resize_projection(1600, 900);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        camera.resize_projection(0, 900);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_and_distance_are_clamped() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.0, 10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, camera.limits.min_distance);
    }

    #[test]
    fn test_reset_restores_initial_orbit() {
        let mut camera = OrbitCamera::default();
        camera.rotate(1.0, 0.5);
        camera.pan(1.0, 1.0);
        camera.reset();
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.target, Vector3::zero());
    }

    #[test]
    fn test_uniform_carries_eye_position() {
        let camera = OrbitCamera::default();
        let uniform = camera.uniform();
        assert!((uniform.view_position[2] - 2.0).abs() < 1e-6);
        assert_eq!(uniform.view_position[3], 1.0);
    }
}
