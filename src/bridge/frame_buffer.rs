use rand::Rng;

use crate::{
    debug,
    error::{BridgeError, Result},
    gpu::{self, Buffer2D, MemoryTexture},
    host::Resolution,
};

/// HDR running estimate of one pixel.
pub type EstimatePixel = [f32; 4];

/// GPU storage the kernel renders into.
/// - All planes share one pitch, which the kernel receives in `RenderInfo::frame.y`.
/// - The estimate is progressive, `iterations` passes have been averaged into it.
#[derive(Debug)]
pub struct FrameBuffer {
    resolution:   Resolution,
    estimate:     Buffer2D<EstimatePixel>,
    display:      Buffer2D<u32>,
    random_seeds: Buffer2D<u32>,
    iterations:   u32,
}

// Construction
impl FrameBuffer {

    /// Allocates all planes for given resolution.
    /// - Fails if any plane exceeds device limits or the device runs out of memory.
    #[profiler::function]
    pub fn new(gpu: &gpu::Context, resolution: Resolution) -> Result<Self> {
        if resolution.is_empty() {
            return Err(BridgeError::InvalidViewport(resolution));
        }
        Self::check_limits(gpu, resolution)?;

        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST;

        let (planes, error) = gpu.catch_errors(|| {
            let estimate = Buffer2D::new_empty(gpu, "Frame Buffer Estimate", resolution, usage);
            let display = Buffer2D::new_empty(gpu, "Frame Buffer Display", resolution, usage);
            let mut rng = rand::thread_rng();
            // zero seed would lock xorshift at zero
            let random_seeds = Buffer2D::new_with(gpu, "Frame Buffer Random Seeds", resolution, usage, || rng.gen::<u32>() | 1);
            (estimate, display, random_seeds)
        });
        if let Some(error) = error {
            return Err(BridgeError::Allocation(error));
        }
        let (estimate, display, random_seeds) = planes;

        debug!("Allocated frame buffer {} with pitch {}", resolution, display.pitch());
        Ok(Self {
            resolution,
            estimate,
            display,
            random_seeds,
            iterations: 0,
        })
    }

    fn check_limits(gpu: &gpu::Context, resolution: Resolution) -> Result<()> {
        let limits = gpu.device.limits();
        let largest_plane = Buffer2D::<EstimatePixel>::bytes_for(resolution);

        let binding_limit = limits.max_storage_buffer_binding_size as u64;
        if largest_plane > binding_limit {
            return Err(BridgeError::ResolutionTooLarge {
                requested: resolution,
                limit:     binding_limit,
                what:      "storage buffer binding size",
            });
        }
        let buffer_limit = limits.max_buffer_size;
        if largest_plane > buffer_limit {
            return Err(BridgeError::ResolutionTooLarge {
                requested: resolution,
                limit:     buffer_limit,
                what:      "buffer size",
            });
        }
        Ok(())
    }
}

// Getters
impl FrameBuffer {
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
    pub fn pitch(&self) -> u32 {
        self.display.pitch()
    }
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
    pub fn estimate(&self) -> &Buffer2D<EstimatePixel> {
        &self.estimate
    }
    pub fn display(&self) -> &Buffer2D<u32> {
        &self.display
    }
    pub fn random_seeds(&self) -> &Buffer2D<u32> {
        &self.random_seeds
    }
}

// Accumulation
impl FrameBuffer {
    /// Next pass overwrites the estimate instead of averaging into it.
    pub fn restart(&mut self) {
        self.iterations = 0;
    }

    /// Records one finished pass.
    pub fn advance(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }
}

// Transfers
impl FrameBuffer {

    /// Packed RGBA8 display pixels, rows tightly packed.
    pub fn read_display(&self, gpu: &gpu::Context) -> Result<Vec<u32>> {
        self.display.read(gpu)
    }

    /// HDR running estimate, rows tightly packed.
    pub fn read_estimate(&self, gpu: &gpu::Context) -> Result<Vec<EstimatePixel>> {
        self.estimate.read(gpu)
    }

    /// Encodes a copy of display pixels into the memory texture.
    pub fn encode_display_copy(&self, encoder: &mut wgpu::CommandEncoder, texture: &MemoryTexture) {
        texture.encode_copy_from(encoder, self.display.buffer(), self.display.bytes_per_row());
    }

    /// Creates the bind group matching [`super::RenderBridge::create_bind_group_layout`].
    #[profiler::function]
    pub fn create_bind_group(
        &self,
        gpu: &gpu::Context,
        layout: &wgpu::BindGroupLayout,
        render_info: wgpu::BindingResource,
        lighting: wgpu::BindingResource,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Render Bridge Bind Group"),
            layout,
            entries: &[
                // render info
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: render_info,
                },
                // lighting
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting,
                },
                // estimate
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.estimate.as_entire_binding(),
                },
                // display
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.display.as_entire_binding(),
                },
                // random seeds
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.random_seeds.as_entire_binding(),
                },
            ],
        })
    }
}
