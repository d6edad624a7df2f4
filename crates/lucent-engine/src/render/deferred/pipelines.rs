//! Render pipelines of the deferred passes.

use crate::render::light::{LightInstance, LightKind};
use crate::render::mesh::MeshVertex;
use crate::render::scene::DrawInstance;

use super::common::{
    additive_blend, gbuffer_targets, geometry_depth_state, output_target, volume_cull, Layouts,
    GEOMETRY_CULL,
};

const GEOMETRY_WGSL: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/geometry.wgsl"),
);

const LIGHTING_WGSL: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/gbuffer_read.wgsl"),
    include_str!("../shaders/lighting.wgsl"),
);

const DEBUG_WGSL: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/gbuffer_read.wgsl"),
    include_str!("../shaders/gbuffer_debug.wgsl"),
);

/// Every pipeline the renderer needs for one output format.
pub(super) struct Pipelines {
    pub format: wgpu::TextureFormat,
    pub geometry: wgpu::RenderPipeline,
    pub directional: wgpu::RenderPipeline,
    pub point: wgpu::RenderPipeline,
    pub debug: wgpu::RenderPipeline,
    pub markers: wgpu::RenderPipeline,
}

impl Pipelines {
    pub(super) fn new(device: &wgpu::Device, layouts: &Layouts, format: wgpu::TextureFormat) -> Self {
        log::debug!("creating deferred pipelines for {format:?}");

        let module = |label: &str, src: &'static str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(src.into()),
            })
        };
        let geometry_shader = module("lucent geometry shader", GEOMETRY_WGSL);
        let lighting_shader = module("lucent lighting shader", LIGHTING_WGSL);
        let debug_shader = module("lucent gbuffer debug shader", DEBUG_WGSL);

        let geometry_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lucent geometry pipeline layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.material],
            immediate_size: 0,
        });
        let lighting_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lucent lighting pipeline layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.gbuffer],
            immediate_size: 0,
        });

        // ── geometry ──────────────────────────────────────────────────────

        let gbuffer_targets = gbuffer_targets();

        let geometry = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent geometry pipeline"),
            layout: Some(&geometry_layout),
            vertex: wgpu::VertexState {
                module: &geometry_shader,
                entry_point: Some("vs_geometry"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), DrawInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &geometry_shader,
                entry_point: Some("fs_geometry"),
                compilation_options: Default::default(),
                targets: &gbuffer_targets,
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList, GEOMETRY_CULL),
            depth_stencil: Some(geometry_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // ── lighting ──────────────────────────────────────────────────────

        let light_targets = output_target(format, Some(additive_blend()));
        let directional = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent directional light pipeline"),
            layout: Some(&lighting_layout),
            vertex: wgpu::VertexState {
                module: &lighting_shader,
                entry_point: Some("vs_fullscreen_light"),
                compilation_options: Default::default(),
                buffers: &[LightInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lighting_shader,
                entry_point: Some("fs_directional_light"),
                compilation_options: Default::default(),
                targets: &light_targets,
            }),
            primitive: primitive(
                wgpu::PrimitiveTopology::TriangleList,
                volume_cull(LightKind::Directional),
            ),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let point = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent point light pipeline"),
            layout: Some(&lighting_layout),
            vertex: wgpu::VertexState {
                module: &lighting_shader,
                entry_point: Some("vs_light_volume"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), LightInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lighting_shader,
                entry_point: Some("fs_point_light"),
                compilation_options: Default::default(),
                targets: &light_targets,
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList, volume_cull(LightKind::Point)),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // ── debug ─────────────────────────────────────────────────────────

        let overlay_targets = output_target(format, None);
        let debug = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent gbuffer debug pipeline"),
            layout: Some(&lighting_layout),
            vertex: wgpu::VertexState {
                module: &debug_shader,
                entry_point: Some("vs_debug"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &debug_shader,
                entry_point: Some("fs_debug"),
                compilation_options: Default::default(),
                targets: &overlay_targets,
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList, None),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // ── light markers ─────────────────────────────────────────────────

        let markers = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lucent light marker pipeline"),
            layout: Some(&lighting_layout),
            vertex: wgpu::VertexState {
                module: &lighting_shader,
                entry_point: Some("vs_light_marker"),
                compilation_options: Default::default(),
                buffers: &[LightInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lighting_shader,
                entry_point: Some("fs_light_marker"),
                compilation_options: Default::default(),
                targets: &overlay_targets,
            }),
            primitive: primitive(wgpu::PrimitiveTopology::LineList, None),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            format,
            geometry,
            directional,
            point,
            debug,
            markers,
        }
    }
}

fn primitive(topology: wgpu::PrimitiveTopology, cull_mode: Option<wgpu::Face>) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}
