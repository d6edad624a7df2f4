//! Stereo rendering and compositor submission.
//!
//! Each eye runs the full deferred pipeline into its own colour buffer; the
//! compositor then receives both buffers. The desktop [`MirrorCompositor`]
//! shows them side by side on the window surface. A headset compositor plugs
//! in through the same [`Compositor`] trait.

use glam::{Mat4, Vec3};

use crate::render::camera::Camera;
use crate::render::deferred::DeferredRenderer;
use crate::render::gbuffer::clamp_size;
use crate::render::scene::Scene;
use crate::render::settings::RenderSettings;
use crate::render::uniforms::ViewParams;
use crate::render::{RenderCtx, RenderTarget};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Renderer view slot (and index into per-eye arrays).
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Eye placement relative to the head.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoRig {
    /// Interpupillary distance in metres.
    pub ipd: f32,
}

impl Default for StereoRig {
    fn default() -> Self {
        Self { ipd: 0.064 }
    }
}

impl StereoRig {
    /// View matrix of `eye`, offset by half the IPD along the head's X axis.
    pub fn eye_view(&self, head_view: Mat4, eye: Eye) -> Mat4 {
        let half = self.ipd * 0.5;
        // The left eye sits at -X in head space, so the world moves +X.
        let shift = match eye {
            Eye::Left => half,
            Eye::Right => -half,
        };
        Mat4::from_translation(Vec3::new(shift, 0.0, 0.0)) * head_view
    }
}

/// Receives finished eye buffers.
pub trait Compositor {
    /// Size each eye buffer should be rendered at, given the window size.
    fn eye_size(&self, surface: (u32, u32)) -> (u32, u32);

    /// Hands both eye buffers over, indexed by [`Eye::slot`].
    fn submit(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, eyes: [&wgpu::TextureView; 2]);
}

/// Per-eye colour buffers, recreated when the size or format changes.
#[derive(Default)]
pub struct EyeTargets {
    size: (u32, u32),
    format: Option<wgpu::TextureFormat>,
    views: Option<[wgpu::TextureView; 2]>,
}

impl EyeTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, size: (u32, u32)) {
        let size = clamp_size(size);
        if self.views.is_some() && self.size == size && self.format == Some(format) {
            return;
        }
        log::debug!("creating eye buffers {}x{} ({format:?})", size.0, size.1);

        let make = |eye: Eye| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(match eye {
                        Eye::Left => "lucent left eye",
                        Eye::Right => "lucent right eye",
                    }),
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

        self.views = Some(Eye::BOTH.map(make));
        self.size = size;
        self.format = Some(format);
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn view(&self, eye: Eye) -> Option<&wgpu::TextureView> {
        self.views.as_ref().map(|v| &v[eye.slot()])
    }
}

// ── mirror compositor ─────────────────────────────────────────────────────

/// Desktop compositor: left eye on the left half of the window, right eye on
/// the right half.
#[derive(Default)]
pub struct MirrorCompositor {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
}

impl MirrorCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lucent mirror shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mirror.wgsl").into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lucent mirror bgl"),
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

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lucent mirror pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent mirror pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mirror"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mirror"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lucent mirror sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.sampler = Some(sampler);
    }
}

impl Compositor for MirrorCompositor {
    fn eye_size(&self, surface: (u32, u32)) -> (u32, u32) {
        clamp_size((surface.0 / 2, surface.1))
    }

    fn submit(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, eyes: [&wgpu::TextureView; 2]) {
        self.ensure_pipeline(ctx);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let bind_groups = eyes.map(|view| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lucent mirror bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        });

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lucent mirror pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(pipeline);

        let (w, h) = self.eye_size(target.size);
        for eye in Eye::BOTH {
            let x = (eye.slot() as u32 * w) as f32;
            rpass.set_viewport(x, 0.0, w as f32, h as f32, 0.0, 1.0);
            rpass.set_bind_group(0, &bind_groups[eye.slot()], &[]);
            rpass.draw(0..3, 0..1);
        }
    }
}

// ── stereo renderer ───────────────────────────────────────────────────────

/// Renders both eyes with a shared [`DeferredRenderer`] and submits them.
pub struct StereoRenderer<C: Compositor = MirrorCompositor> {
    pub rig: StereoRig,
    compositor: C,
    eyes: EyeTargets,
}

impl Default for StereoRenderer<MirrorCompositor> {
    fn default() -> Self {
        Self::new(StereoRig::default(), MirrorCompositor::new())
    }
}

impl<C: Compositor> StereoRenderer<C> {
    pub fn new(rig: StereoRig, compositor: C) -> Self {
        Self {
            rig,
            compositor,
            eyes: EyeTargets::new(),
        }
    }

    /// Head pose comes from `camera`; each eye gets its own view slot.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        deferred: &mut DeferredRenderer,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
    ) {
        let eye_size = self.compositor.eye_size(target.size);
        self.eyes.ensure(ctx.device, ctx.surface_format, eye_size);

        let head_view = camera.view();
        for eye in Eye::BOTH {
            let Some(color_view) = self.eyes.view(eye) else { return };
            let mut eye_target = RenderTarget::new(&mut *target.encoder, color_view, self.eyes.size());
            let view = ViewParams {
                view: self.rig.eye_view(head_view, eye),
                projection: camera.projection(eye_target.aspect()),
            };
            deferred.render(ctx, &mut eye_target, eye.slot(), scene, &view, settings);
        }

        let (Some(left), Some(right)) = (self.eyes.view(Eye::Left), self.eyes.view(Eye::Right)) else {
            return;
        };
        self.compositor.submit(ctx, target, [left, right]);
    }
}
