use std::num::NonZeroU32;

use crate::{
    error::{BridgeError, Result},
    host::Resolution,
};

use super::{Context, align_up, depad, read_staged};

/// RGBA8 texture receiving the display pixels of the bridge's frame buffer.
/// - Owned by the host (typically whoever presents it), the bridge keeps only a weak reference.
/// - Its size is fixed, to resize it the owner creates a new one and attaches it again.
#[derive(Debug)]
pub struct MemoryTexture {
    label:      String,
    texture:    wgpu::Texture,
    view:       wgpu::TextureView,
    resolution: Resolution,
}

impl MemoryTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    #[profiler::function]
    pub fn new(gpu: &Context, label: &str, resolution: Resolution) -> Result<Self> {
        if resolution.is_empty() {
            return Err(BridgeError::InvalidViewport(resolution));
        }
        let limit = gpu.device.limits().max_texture_dimension_2d;
        if resolution.width > limit || resolution.height > limit {
            return Err(BridgeError::ResolutionTooLarge {
                requested: resolution,
                limit:     limit as u64,
                what:      "texture dimension",
            });
        }

        let (texture, error) = gpu.catch_errors(|| {
            gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width:                 resolution.width,
                    height:                resolution.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count:    1,
                dimension:       wgpu::TextureDimension::D2,
                format:          Self::FORMAT,
                usage:           wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats:    &[],
            })
        });
        if let Some(error) = error {
            return Err(BridgeError::Allocation(error));
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            label: label.to_owned(),
            texture,
            view,
            resolution,
        })
    }
}

// Getters
impl MemoryTexture {
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width:                 self.resolution.width,
            height:                self.resolution.height,
            depth_or_array_layers: 1,
        }
    }
}

// Transfers
impl MemoryTexture {

    /// Encodes a copy of a pitched buffer of packed RGBA8 pixels into this texture.
    /// - `bytes_per_row` must be a multiple of `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
    pub fn encode_copy_from(&self, encoder: &mut wgpu::CommandEncoder, buffer: &wgpu::Buffer, bytes_per_row: u32) {
        encoder.copy_buffer_to_texture(
            wgpu::ImageCopyBuffer {
                buffer,
                layout: wgpu::ImageDataLayout {
                    offset:         0,
                    bytes_per_row:  NonZeroU32::new(bytes_per_row),
                    rows_per_image: NonZeroU32::new(self.resolution.height),
                },
            },
            self.texture.as_image_copy(),
            self.extent(),
        );
    }

    /// Reads the texture back as packed RGBA8 pixels, rows tightly packed.
    #[profiler::function]
    pub fn read(&self, gpu: &Context) -> Result<Vec<u32>> {
        let pitch = align_up(self.resolution.width, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT / 4);
        let bytes_per_row = pitch * 4;
        let size = bytes_per_row as u64 * self.resolution.height as u64;

        let padded: Vec<u32> = read_staged(gpu, size, |encoder, staging| {
            encoder.copy_texture_to_buffer(
                self.texture.as_image_copy(),
                wgpu::ImageCopyBuffer {
                    buffer: staging,
                    layout: wgpu::ImageDataLayout {
                        offset:         0,
                        bytes_per_row:  NonZeroU32::new(bytes_per_row),
                        rows_per_image: NonZeroU32::new(self.resolution.height),
                    },
                },
                self.extent(),
            );
        })?;

        Ok(depad(
            &padded,
            self.resolution.width as usize,
            pitch as usize,
            self.resolution.height as usize,
        ))
    }
}
