//! G-buffer attachments.
//!
//! Layout:
//! - target 0 `albedo_spec`: RGB albedo, A specular intensity
//! - target 1 `normal_pow`: RGB normal encoded `n * 0.5 + 0.5`, A specular power
//! - depth: 32-bit float, written by the geometry pass and read back by the
//!   lighting pass to reconstruct world positions

/// Formats and clear values of each attachment.
pub mod formats {
    use wgpu::TextureFormat;

    pub const ALBEDO_SPEC: TextureFormat = TextureFormat::Rgba16Float;
    pub const NORMAL_POW: TextureFormat = TextureFormat::Rgba16Float;
    pub const DEPTH: TextureFormat = TextureFormat::Depth32Float;

    pub const ALBEDO_SPEC_CLEAR: wgpu::Color = wgpu::Color::TRANSPARENT;
    /// Encodes a zero-length normal, so unlit background stays neutral.
    pub const NORMAL_POW_CLEAR: wgpu::Color = wgpu::Color { r: 0.5, g: 0.5, b: 0.5, a: 0.0 };
    pub const DEPTH_CLEAR: f32 = 1.0;
}

/// Number of colour targets bound during the geometry pass.
pub const COLOUR_TARGETS: usize = 2;

/// One complete set of G-buffer textures for a given size.
///
/// Resizing replaces the whole set; the previous textures are released when
/// the old `GBuffer` is dropped.
pub struct GBuffer {
    size: (u32, u32),
    pub albedo_spec: wgpu::TextureView,
    pub normal_pow: wgpu::TextureView,
    pub depth: wgpu::TextureView,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = clamp_size(size);
        let make = |format: wgpu::TextureFormat, label: &str| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: size.0,
                        height: size.1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        log::debug!("creating G-buffer {}x{}", size.0, size.1);

        Self {
            size,
            albedo_spec: make(formats::ALBEDO_SPEC, "lucent gbuffer albedo+spec"),
            normal_pow: make(formats::NORMAL_POW, "lucent gbuffer normal+power"),
            depth: make(formats::DEPTH, "lucent gbuffer depth"),
        }
    }

    /// True when this set can be reused for a target of `size`.
    #[inline]
    pub fn is_compatible(&self, size: (u32, u32)) -> bool {
        self.size == clamp_size(size)
    }

    /// Colour attachments for the geometry pass, cleared to their reset values.
    pub fn colour_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; COLOUR_TARGETS] {
        let clear = |view, colour| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })
        };
        [
            clear(&self.albedo_spec, formats::ALBEDO_SPEC_CLEAR),
            clear(&self.normal_pow, formats::NORMAL_POW_CLEAR),
        ]
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(formats::DEPTH_CLEAR),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    /// Layout used by the lighting and debug passes to read the attachments.
    pub fn create_read_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let colour = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                // Read with textureLoad; float16 targets need no filtering.
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lucent gbuffer read bgl"),
            entries: &[
                colour(0),
                colour(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        })
    }

    pub fn create_read_bind_group(&self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lucent gbuffer read bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.albedo_spec),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.normal_pow),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.depth),
                },
            ],
        })
    }
}

/// wgpu rejects zero-sized textures.
#[inline]
pub(crate) fn clamp_size(size: (u32, u32)) -> (u32, u32) {
    (size.0.max(1), size.1.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sizes_clamp_to_one() {
        assert_eq!(clamp_size((0, 0)), (1, 1));
        assert_eq!(clamp_size((640, 0)), (640, 1));
        assert_eq!(clamp_size((3, 4)), (3, 4));
    }

    #[test]
    fn colour_targets_are_half_float() {
        // Specular power is stored unnormalized, so the targets must be float.
        assert_eq!(formats::ALBEDO_SPEC, wgpu::TextureFormat::Rgba16Float);
        assert_eq!(formats::NORMAL_POW, wgpu::TextureFormat::Rgba16Float);
        assert!(formats::DEPTH.has_depth_aspect());
    }

    #[test]
    fn albedo_and_depth_clear_to_empty_far_plane() {
        let c = formats::ALBEDO_SPEC_CLEAR;
        assert_eq!([c.r, c.g, c.b, c.a], [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(formats::DEPTH_CLEAR, 1.0);
    }

    #[test]
    fn normal_clear_encodes_zero_vector() {
        let c = formats::NORMAL_POW_CLEAR;
        let decoded = [c.r * 2.0 - 1.0, c.g * 2.0 - 1.0, c.b * 2.0 - 1.0];
        assert_eq!(decoded, [0.0, 0.0, 0.0]);
    }
}
