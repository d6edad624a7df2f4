//! Albedo textures: procedural generation, image loading and upload.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Straight-alpha sRGB RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

impl TextureData {
    /// Single-colour texture.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba8: rgba.to_vec(),
        }
    }

    /// Running-bond brick pattern with one-pixel-wide mortar joints.
    ///
    /// `size` is the texture edge in pixels; four courses of two bricks tile
    /// the texture seamlessly.
    pub fn brick(size: u32, brick: [u8; 4], mortar: [u8; 4]) -> Self {
        let size = size.max(8);
        let course = size / 4;
        let brick_w = size / 2;
        let joint = (size / 64).max(1);

        Self::from_fn(size, size, |x, y| {
            let row = y / course;
            let offset = if row % 2 == 1 { brick_w / 2 } else { 0 };
            let in_row = y % course;
            let in_brick = (x + offset) % brick_w;
            if in_row < joint || in_brick < joint {
                mortar
            } else {
                // Cheap per-brick tint so the wall does not look flat.
                let id = row * 2 + (x + offset) / brick_w;
                shade(brick, 0.85 + 0.05 * (id % 4) as f32)
            }
        })
    }

    /// `cells` x `cells` checkerboard.
    pub fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        Self::from_fn(size, size, |x, y| if (x / cell + y / cell) % 2 == 0 { a } else { b })
    }

    /// Loads any format the `image` crate was built with.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to load texture {}", path.display()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgba8: img.into_raw(),
        })
    }

    /// Copy scaled down to at most `max_dim` pixels on either axis, keeping
    /// the aspect ratio. `None` when the texture already fits.
    pub fn downscaled(&self, max_dim: u32) -> Result<Option<Self>> {
        if self.width <= max_dim && self.height <= max_dim {
            return Ok(None);
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, self.rgba8.clone())
            .with_context(|| format!("{}x{} texture has a short pixel buffer", self.width, self.height))?;

        let max_dim = max_dim.max(1);
        let scale = max_dim as f64 / self.width.max(self.height) as f64;
        let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_dim);
        let (width, height) = (fit(self.width), fit(self.height));

        let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
        Ok(Some(Self {
            width,
            height,
            rgba8: resized.into_raw(),
        }))
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba8[i], self.rgba8[i + 1], self.rgba8[i + 2], self.rgba8[i + 3]]
    }

    fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut rgba8 = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba8.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            rgba8,
        }
    }
}

fn shade(c: [u8; 4], k: f32) -> [u8; 4] {
    let s = |v: u8| (v as f32 * k).round().clamp(0.0, 255.0) as u8;
    [s(c[0]), s(c[1]), s(c[2]), c[3]]
}

/// Sampled albedo texture on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Uploads `data`, scaling it down first when it exceeds the device's
    /// 2D texture limit.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, data: &TextureData) -> Result<Self> {
        if data.width == 0 || data.height == 0 {
            bail!("texture '{label}' is empty");
        }
        let expected = data.width as usize * data.height as usize * 4;
        if data.rgba8.len() != expected {
            bail!(
                "texture '{label}' holds {} bytes, expected {expected} for {}x{}",
                data.rgba8.len(),
                data.width,
                data.height
            );
        }

        let max_dim = device.limits().max_texture_dimension_2d;
        let scaled = data.downscaled(max_dim)?;
        if let Some(s) = &scaled {
            log::warn!(
                "texture '{label}' is {}x{}, over the {max_dim} px limit; scaled to {}x{}",
                data.width,
                data.height,
                s.width,
                s.height
            );
        }
        let data = scaled.as_ref().unwrap_or(data);

        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba8,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view })
    }
}

/// Linear sampler with repeat addressing on both axes.
pub fn create_repeat_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("lucent repeat sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [180, 60, 40, 255];
    const GREY: [u8; 4] = [200, 200, 200, 255];

    #[test]
    fn brick_has_mortar_on_course_lines() {
        let t = TextureData::brick(64, RED, GREY);
        assert_eq!(t.rgba8.len(), 64 * 64 * 4);
        // First row of every course is mortar.
        for x in 0..64 {
            assert_eq!(t.pixel(x, 0), GREY);
            assert_eq!(t.pixel(x, 16), GREY);
        }
        assert_ne!(t.pixel(5, 5), GREY);
    }

    #[test]
    fn brick_courses_are_offset() {
        let t = TextureData::brick(64, RED, GREY);
        // Vertical joint at x = 0 on even courses, x = 16 on odd ones.
        assert_eq!(t.pixel(0, 5), GREY);
        assert_ne!(t.pixel(0, 21), GREY);
        assert_eq!(t.pixel(16, 21), GREY);
    }

    #[test]
    fn checker_alternates() {
        let t = TextureData::checker(8, 2, RED, GREY);
        assert_eq!(t.pixel(0, 0), RED);
        assert_eq!(t.pixel(4, 0), GREY);
        assert_eq!(t.pixel(4, 4), RED);
    }

    #[test]
    fn oversized_texture_scales_to_limit() {
        let wide = TextureData {
            width: 8193,
            height: 1,
            rgba8: RED.repeat(8193),
        };
        let scaled = wide.downscaled(8192).unwrap().expect("over the limit");
        assert_eq!((scaled.width, scaled.height), (8192, 1));
        assert_eq!(scaled.rgba8.len(), 8192 * 4);

        let square = TextureData::checker(64, 2, RED, GREY);
        let tall = TextureData {
            width: 64,
            height: 128,
            rgba8: square.rgba8.repeat(2),
        };
        let scaled = tall
            .downscaled(32)
            .unwrap()
            .expect("over the limit");
        assert_eq!((scaled.width, scaled.height), (16, 32));
    }

    #[test]
    fn texture_within_limit_is_kept() {
        let t = TextureData::checker(64, 2, RED, GREY);
        assert_eq!(t.downscaled(64).unwrap(), None);
    }

    #[test]
    fn short_pixel_buffer_is_an_error() {
        let t = TextureData {
            width: 4096,
            height: 4096,
            rgba8: vec![0; 16],
        };
        assert!(t.downscaled(1024).is_err());
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(TextureData::load("/no/such/texture.png").is_err());
    }
}
