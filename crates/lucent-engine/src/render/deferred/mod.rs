//! Deferred shading renderer.
//!
//! Each call to [`DeferredRenderer::render`] records two passes:
//! - geometry: scene objects into the G-buffer (MRT + depth), opaque;
//! - lighting: G-buffer read back as shader input, one light volume per light
//!   added into the output view, or a single debug draw of one channel.
//!
//! Per-view resources live in slots. Mono rendering uses slot 0; stereo
//! rendering uses one slot per eye so both eyes can be recorded before the
//! queue is submitted. `queue.write_buffer` lands at submit, so every buffer
//! written during `render` (frame uniforms and both instance buffers) belongs
//! to a slot and is never shared between views.

mod batch;
mod common;
mod pipelines;

use crate::render::gbuffer::GBuffer;
use crate::render::mesh::{GpuMesh, MeshData};
use crate::render::scene::{Scene, SceneId};
use crate::render::settings::{RenderSettings, ShadingView};
use crate::render::texture::{create_repeat_sampler, GpuTexture, TextureData};
use crate::render::uniforms::{FrameUniforms, ViewParams};
use crate::render::{RenderCtx, RenderTarget};

use batch::plan_draws;
use common::{InstanceBuffer, Layouts};
use pipelines::Pipelines;

/// Stands in for a texture that cannot be uploaded.
const PLACEHOLDER_TEXEL: [u8; 4] = [255, 0, 255, 255];

/// Resources owned by one view slot.
struct ViewResources {
    gbuffer: GBuffer,
    gbuffer_bind_group: wgpu::BindGroup,
    frame_ubo: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_instances: InstanceBuffer,
    light_instances: InstanceBuffer,
}

struct UploadedTexture {
    _texture: GpuTexture,
    bind_group: wgpu::BindGroup,
}

pub struct DeferredRenderer {
    layouts: Option<Layouts>,
    pipelines: Option<Pipelines>,
    sampler: Option<wgpu::Sampler>,

    views: Vec<Option<ViewResources>>,

    /// Scene the uploaded meshes and textures belong to.
    assets_of: Option<SceneId>,
    meshes: Vec<GpuMesh>,
    textures: Vec<UploadedTexture>,
    light_volume: Option<GpuMesh>,

    warned_skipped: bool,
}

impl Default for DeferredRenderer {
    fn default() -> Self {
        Self {
            layouts: None,
            pipelines: None,
            sampler: None,
            views: Vec::new(),
            assets_of: None,
            meshes: Vec::new(),
            textures: Vec::new(),
            light_volume: None,
            warned_skipped: false,
        }
    }
}

impl DeferredRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `scene` seen through `view` into `target.color_view`.
    ///
    /// `slot` selects the per-view G-buffer, uniform and instance buffers.
    /// Switching to another `Scene` re-uploads its assets.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        slot: usize,
        scene: &Scene,
        view: &ViewParams,
        settings: &RenderSettings,
    ) {
        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_view(ctx, slot, target.size);
        self.ensure_assets(ctx, scene);

        // ── uploads ───────────────────────────────────────────────────────

        let plan = plan_draws(scene);
        if plan.skipped > 0 && !self.warned_skipped {
            log::warn!("{} scene objects reference missing assets; skipped", plan.skipped);
            self.warned_skipped = true;
        }
        let lights = settings.light_batch(&scene.lights);

        let Some(Some(view_res)) = self.views.get_mut(slot) else { return };
        view_res.draw_instances.write(ctx.device, ctx.queue, &plan.instances);
        view_res.light_instances.write(ctx.device, ctx.queue, &lights.instances);
        let uniforms = FrameUniforms::new(view, target.size, settings.time, settings.debug_selector());
        ctx.queue.write_buffer(&view_res.frame_ubo, 0, bytemuck::bytes_of(&uniforms));

        let Some(pipelines) = self.pipelines.as_ref() else { return };

        // ── geometry pass ─────────────────────────────────────────────────
        {
            let colour = view_res.gbuffer.colour_attachments();
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lucent geometry pass"),
                color_attachments: &colour,
                depth_stencil_attachment: Some(view_res.gbuffer.depth_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(instances) = view_res.draw_instances.buffer() {
                rpass.set_pipeline(&pipelines.geometry);
                rpass.set_bind_group(0, &view_res.frame_bind_group, &[]);
                rpass.set_vertex_buffer(1, instances.slice(..));

                for batch in &plan.batches {
                    let (Some(mesh), Some(texture)) =
                        (self.meshes.get(batch.mesh), self.textures.get(batch.texture))
                    else {
                        continue;
                    };
                    rpass.set_bind_group(1, &texture.bind_group, &[]);
                    mesh.bind(&mut rpass);
                    rpass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
                }
            }
        }

        // ── lighting pass ─────────────────────────────────────────────────

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lucent lighting pass"),
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
        rpass.set_bind_group(0, &view_res.frame_bind_group, &[]);
        rpass.set_bind_group(1, &view_res.gbuffer_bind_group, &[]);

        if let ShadingView::Debug(_) = settings.view {
            rpass.set_pipeline(&pipelines.debug);
            rpass.draw(0..3, 0..1);
            return;
        }

        let Some(instances) = view_res.light_instances.buffer() else { return };
        if lights.is_empty() {
            return;
        }

        if !lights.directional.is_empty() {
            rpass.set_pipeline(&pipelines.directional);
            rpass.set_vertex_buffer(0, instances.slice(..));
            rpass.draw(0..3, lights.directional.clone());
        }

        if lights.point.is_empty() {
            return;
        }
        if let Some(volume) = self.light_volume.as_ref() {
            rpass.set_pipeline(&pipelines.point);
            volume.bind(&mut rpass);
            rpass.set_vertex_buffer(1, instances.slice(..));
            rpass.draw_indexed(0..volume.index_count, 0, lights.point.clone());
        }

        // Drawn last so they sit on top of the accumulated light.
        if settings.light_markers {
            rpass.set_pipeline(&pipelines.markers);
            rpass.set_vertex_buffer(0, instances.slice(..));
            rpass.draw(0..6, lights.point.clone());
        }
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        let layouts = self.layouts.get_or_insert_with(|| Layouts::new(ctx.device));
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.format == ctx.surface_format)
        {
            return;
        }
        self.pipelines = Some(Pipelines::new(ctx.device, layouts, ctx.surface_format));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.light_volume.is_none() {
            self.light_volume = Some(GpuMesh::upload(
                ctx.device,
                "lucent light volume",
                &MeshData::light_volume(),
            ));
        }
        if self.sampler.is_none() {
            self.sampler = Some(create_repeat_sampler(ctx.device));
        }
    }

    fn ensure_view(&mut self, ctx: &RenderCtx<'_>, slot: usize, size: (u32, u32)) {
        let Some(layouts) = self.layouts.as_ref() else { return };
        if self.views.len() <= slot {
            self.views.resize_with(slot + 1, || None);
        }

        let entry = &mut self.views[slot];
        if let Some(v) = entry.as_mut() {
            if !v.gbuffer.is_compatible(size) {
                v.gbuffer = GBuffer::new(ctx.device, size);
                v.gbuffer_bind_group = v.gbuffer.create_read_bind_group(ctx.device, &layouts.gbuffer);
            }
            return;
        }

        log::debug!("creating view slot {slot}");
        let gbuffer = GBuffer::new(ctx.device, size);
        let gbuffer_bind_group = gbuffer.create_read_bind_group(ctx.device, &layouts.gbuffer);

        let frame_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lucent frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lucent frame bind group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        *entry = Some(ViewResources {
            gbuffer,
            gbuffer_bind_group,
            frame_ubo,
            frame_bind_group,
            draw_instances: InstanceBuffer::new("lucent draw instance vbo"),
            light_instances: InstanceBuffer::new("lucent light instance vbo"),
        });
    }

    /// Binds the uploaded assets to `scene`, dropping any that belong to a
    /// different scene. Returns true when uploads were dropped.
    fn adopt_scene(&mut self, scene: &Scene) -> bool {
        if self.assets_of == Some(scene.id()) {
            return false;
        }
        let stale = self.assets_of.is_some();
        if stale {
            log::debug!("scene changed; re-uploading assets");
        }
        self.assets_of = Some(scene.id());
        self.meshes.clear();
        self.textures.clear();
        self.warned_skipped = false;
        stale
    }

    fn ensure_assets(&mut self, ctx: &RenderCtx<'_>, scene: &Scene) {
        self.adopt_scene(scene);

        for (name, data) in &scene.meshes[self.meshes.len()..] {
            log::debug!("uploading mesh '{name}' ({} triangles)", data.triangle_count());
            self.meshes.push(GpuMesh::upload(ctx.device, name, data));
        }

        let (Some(layouts), Some(sampler)) = (self.layouts.as_ref(), self.sampler.as_ref()) else {
            return;
        };
        for (name, data) in &scene.textures[self.textures.len()..] {
            log::debug!("uploading texture '{name}' ({}x{})", data.width, data.height);
            let texture = GpuTexture::upload(ctx.device, ctx.queue, name, data).or_else(|err| {
                log::warn!("{err:#}; using a placeholder");
                GpuTexture::upload(ctx.device, ctx.queue, name, &TextureData::solid(PLACEHOLDER_TEXEL))
            });
            let texture = match texture {
                Ok(texture) => texture,
                Err(err) => {
                    log::error!("{err:#}");
                    return;
                }
            };
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(name.as_str()),
                layout: &layouts.material,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });
            self.textures.push(UploadedTexture {
                _texture: texture,
                bind_group,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_follow_the_rendered_scene() {
        let mut renderer = DeferredRenderer::new();
        let first = Scene::new();
        let second = Scene::new();

        assert!(!renderer.adopt_scene(&first));
        assert!(!renderer.adopt_scene(&first));
        assert!(renderer.adopt_scene(&second));
        assert_eq!(renderer.assets_of, Some(second.id()));
        assert!(renderer.adopt_scene(&first));
    }
}
