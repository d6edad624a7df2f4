//! Deferred rendering subsystem.
//!
//! CPU-side scene data (`scene`, `mesh`, `texture`, `light`) is plain Rust;
//! the renderers upload what they need and own every GPU resource they
//! create (pipelines, buffers, G-buffers).
//!
//! Conventions:
//! - right-handed world space, +Y up, depth range 0..1;
//! - matrices are column-major (`glam`), uploaded without transposition;
//! - triangles wind counter-clockwise seen from the front.

pub mod camera;
mod ctx;
pub mod deferred;
pub mod gbuffer;
pub mod light;
pub mod mesh;
pub mod scene;
pub mod settings;
pub mod stereo;
pub mod texture;
pub mod uniforms;

pub use camera::Camera;
pub use ctx::{RenderCtx, RenderTarget};
pub use deferred::DeferredRenderer;
pub use gbuffer::GBuffer;
pub use light::{Light, LightBatch, LightKind, LightVolume};
pub use mesh::{GpuMesh, MeshData, MeshVertex};
pub use scene::{Material, MeshId, Scene, SceneId, SceneObject, TextureId};
pub use settings::{GBufferView, RenderSettings, ShadingView};
pub use stereo::{Compositor, Eye, EyeTargets, MirrorCompositor, StereoRenderer, StereoRig};
pub use texture::{GpuTexture, TextureData};
pub use uniforms::{FrameUniforms, ViewParams};
