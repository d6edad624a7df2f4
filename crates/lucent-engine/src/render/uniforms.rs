use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera state for one rendered view (the mono view or one eye).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewParams {
    pub view: Mat4,
    pub projection: Mat4,
}

impl ViewParams {
    /// World-space eye position, recovered from the view matrix.
    #[inline]
    pub fn eye_position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }
}

/// Per-view uniform block (352 bytes), bound at group 0 by every pass.
///
/// Matrices are column-major, matching WGSL; no transpose is needed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    pub inverse_view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub viewport: [f32; 2],
    pub time: f32,
    pub debug_view: u32,
}

impl FrameUniforms {
    pub fn new(params: &ViewParams, viewport: (u32, u32), time: f32, debug_view: u32) -> Self {
        let inverse_view = params.view.inverse();
        Self {
            projection: params.projection.to_cols_array_2d(),
            view: params.view.to_cols_array_2d(),
            view_projection: (params.projection * params.view).to_cols_array_2d(),
            inverse_projection: params.projection.inverse().to_cols_array_2d(),
            inverse_view: inverse_view.to_cols_array_2d(),
            camera_position: inverse_view.w_axis.truncate().extend(1.0).to_array(),
            viewport: [viewport.0.max(1) as f32, viewport.1.max(1) as f32],
            time,
            debug_view,
        }
    }

    pub(crate) fn min_binding_size() -> std::num::NonZeroU64 {
        // 5 * 64 + 16 + 16: never zero.
        std::num::NonZeroU64::new(std::mem::size_of::<Self>() as u64)
            .unwrap_or(std::num::NonZeroU64::MIN)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::render::Camera;

    fn params() -> ViewParams {
        let cam = Camera::default();
        ViewParams {
            view: cam.view(),
            projection: cam.projection(1.5),
        }
    }

    #[test]
    fn layout_matches_wgsl_block() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 352);
    }

    #[test]
    fn eye_position_recovered() {
        let p = params();
        assert!((p.eye_position() - Camera::default().eye).length() < 1e-4);
        let u = FrameUniforms::new(&p, (800, 600), 0.0, 0);
        assert!((Vec3::from_slice(&u.camera_position[..3]) - Camera::default().eye).length() < 1e-4);
    }

    #[test]
    fn inverse_matrices_reconstruct_world_position() {
        // Same path the lighting shader takes: NDC + depth -> view -> world.
        let p = params();
        let u = FrameUniforms::new(&p, (800, 600), 0.0, 0);
        let world = Vec3::new(3.0, 0.5, 0.0);

        let clip = Mat4::from_cols_array_2d(&u.view_projection) * world.extend(1.0);
        let ndc = clip / clip.w;

        let inv_proj = Mat4::from_cols_array_2d(&u.inverse_projection);
        let inv_view = Mat4::from_cols_array_2d(&u.inverse_view);
        let mut view_pos = inv_proj * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        view_pos /= view_pos.w;
        let back = (inv_view * view_pos).truncate();

        assert!((back - world).length() < 1e-3, "{back:?}");
    }

    #[test]
    fn zero_viewport_is_clamped() {
        let u = FrameUniforms::new(&params(), (0, 0), 1.0, 3);
        assert_eq!(u.viewport, [1.0, 1.0]);
        assert_eq!(u.debug_view, 3);
    }
}
