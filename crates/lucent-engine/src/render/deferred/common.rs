//! Shared GPU helpers for the deferred passes.

use bytemuck::Pod;

use crate::render::gbuffer::{formats, COLOUR_TARGETS};
use crate::render::light::LightKind;

// ── fixed-function state ──────────────────────────────────────────────────

/// Geometry pass depth: nearest surface wins and is recorded.
pub(super) fn geometry_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: formats::DEPTH,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub(super) const GEOMETRY_CULL: Option<wgpu::Face> = Some(wgpu::Face::Back);

/// Face culling of a light volume.
///
/// Sphere volumes keep only their back faces, so a camera inside the sphere
/// still shades the pixels it covers. Lighting passes have no depth test.
pub(super) fn volume_cull(kind: LightKind) -> Option<wgpu::Face> {
    match kind {
        LightKind::Directional => None,
        LightKind::Point => Some(wgpu::Face::Front),
    }
}

/// G-buffer targets written by the geometry pass, opaque.
pub(super) fn gbuffer_targets() -> [Option<wgpu::ColorTargetState>; COLOUR_TARGETS] {
    let target = |format| {
        Some(wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })
    };
    [target(formats::ALBEDO_SPEC), target(formats::NORMAL_POW)]
}

/// Output target of a lighting-stage pipeline.
pub(super) fn output_target(
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend,
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

/// Light accumulation: `dst = src * src.a + dst`, colour and alpha alike.
pub(super) fn additive_blend() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: add,
        alpha: add,
    }
}

// ── instance buffers ──────────────────────────────────────────────────────

/// Growable vertex buffer for per-instance data.
pub(super) struct InstanceBuffer {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
}

impl InstanceBuffer {
    pub(super) const fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: None,
            capacity: 0,
        }
    }

    /// Uploads `data`, growing the buffer first when it is too small.
    pub(super) fn write<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        if data.is_empty() {
            return;
        }
        if data.len() > self.capacity || self.buffer.is_none() {
            let new_cap = grown_capacity(data.len());
            log::debug!("{}: growing to {new_cap} instances", self.label);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: (new_cap * std::mem::size_of::<T>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = new_cap;
        }
        if let Some(buffer) = self.buffer.as_ref() {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }

    #[inline]
    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

pub(super) fn grown_capacity(required: usize) -> usize {
    required.next_power_of_two().max(64)
}

// ── bind group layouts ────────────────────────────────────────────────────

/// Layouts shared by every deferred pipeline.
///
/// Group 0 is always the frame uniform block. Group 1 is the albedo texture
/// during the geometry pass and the G-buffer during lighting.
pub(super) struct Layouts {
    pub frame: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub gbuffer: wgpu::BindGroupLayout,
}

impl Layouts {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lucent frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(crate::render::uniforms::FrameUniforms::min_binding_size()),
                },
                count: None,
            }],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lucent material bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            frame,
            material,
            gbuffer: crate::render::GBuffer::create_read_layout(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_in_powers_of_two() {
        assert_eq!(grown_capacity(1), 64);
        assert_eq!(grown_capacity(64), 64);
        assert_eq!(grown_capacity(65), 128);
        assert_eq!(grown_capacity(577), 1024);
    }

    #[test]
    fn geometry_pass_keeps_nearest_surface() {
        let depth = geometry_depth_state();
        assert_eq!(depth.format, formats::DEPTH);
        assert!(depth.depth_write_enabled);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert!(!depth.stencil.is_enabled());
        assert_eq!(GEOMETRY_CULL, Some(wgpu::Face::Back));
    }

    #[test]
    fn gbuffer_targets_are_opaque() {
        let targets = gbuffer_targets();
        let got: Vec<_> = targets.iter().flatten().map(|t| t.format).collect();
        assert_eq!(got, vec![formats::ALBEDO_SPEC, formats::NORMAL_POW]);
        assert!(targets.iter().flatten().all(|t| t.blend.is_none()));
    }

    #[test]
    fn sphere_volumes_cull_front_faces() {
        assert_eq!(volume_cull(LightKind::Point), Some(wgpu::Face::Front));
        assert_eq!(volume_cull(LightKind::Directional), None);
    }

    #[test]
    fn output_target_carries_blend() {
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;
        let [Some(debug)] = output_target(format, None) else { panic!("one target") };
        assert_eq!(debug.format, format);
        assert!(debug.blend.is_none());
        let [Some(lit)] = output_target(format, Some(additive_blend())) else { panic!("one target") };
        assert_eq!(lit.blend, Some(additive_blend()));
    }

    #[test]
    fn additive_blend_sums_weighted_source() {
        let b = additive_blend();
        assert_eq!(b.color, b.alpha);
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(b.color.operation, wgpu::BlendOperation::Add);
    }
}
