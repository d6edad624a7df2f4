use glam::{Mat4, Vec3};

/// Look-at perspective camera with orbit controls.
///
/// Right-handed, depth range 0..1 (wgpu clip space).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Closest the eye may get to the target.
    pub const MIN_DISTANCE: f32 = 0.5;

    /// Pitch limit, just short of straight up/down where look-at degenerates.
    const MAX_PITCH: f32 = 1.55;

    pub fn look_at(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 200.0,
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-4), self.near, self.far)
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        (self.eye - self.target).length()
    }

    /// Rotates the eye around the target. `yaw` turns about +Y, `pitch`
    /// tilts towards the poles and is clamped.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.eye - self.target;
        let radius = offset.length().max(Self::MIN_DISTANCE);

        let cur_yaw = offset.x.atan2(offset.z);
        let cur_pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();

        let new_yaw = cur_yaw + yaw;
        let new_pitch = (cur_pitch + pitch).clamp(-Self::MAX_PITCH, Self::MAX_PITCH);

        let (sy, cy) = new_yaw.sin_cos();
        let (sp, cp) = new_pitch.sin_cos();
        self.eye = self.target + Vec3::new(radius * cp * sy, radius * sp, radius * cp * cy);
    }

    /// Moves the eye towards (positive) or away from the target.
    pub fn dolly(&mut self, amount: f32) {
        let offset = self.eye - self.target;
        let radius = (offset.length() - amount).max(Self::MIN_DISTANCE);
        self.eye = self.target + offset.try_normalize().unwrap_or(Vec3::Z) * radius;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(10.0, 5.0, 7.0), Vec3::new(3.0, 0.5, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn view_puts_target_on_negative_z() {
        let cam = Camera::default();
        let t = cam.view().transform_point3(cam.target);
        assert!(t.x.abs() < 1e-4 && t.y.abs() < 1e-4);
        assert!((t.z + cam.distance()).abs() < 1e-4);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let cam = Camera::default();
        let proj = cam.projection(16.0 / 9.0);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -cam.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -cam.far));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut cam = Camera::default();
        let d = cam.distance();
        cam.orbit(0.7, 0.2);
        assert!((cam.distance() - d).abs() < 1e-3);
        assert!(!close(cam.eye, Camera::default().eye));
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.orbit(0.0, 10.0);
        let offset = (cam.eye - cam.target).normalize();
        assert!(offset.y < 1.0);
        assert!(cam.view().is_finite());
    }

    #[test]
    fn dolly_stops_at_min_distance() {
        let mut cam = Camera::default();
        cam.dolly(1000.0);
        assert!((cam.distance() - Camera::MIN_DISTANCE).abs() < 1e-4);
        cam.dolly(-2.0);
        assert!((cam.distance() - (Camera::MIN_DISTANCE + 2.0)).abs() < 1e-4);
    }
}
