use std::{fmt::Display, sync::{Arc, Weak}};

use glam::UVec4;

use crate::{
    info,
    warn,
    error,
    config::BridgeConfig,
    error::{BridgeError, Result},
    gpu::{self, MemoryTexture},
    host::{HostRenderer, Resolution},
};

use super::{
    BindState,
    BoundFrame,
    FrameBuffer,
    HostState,
    Lighting,
    RenderInfo,
    RenderSettings,
};

/// Resources available to a kernel while the bridge is bound.
#[derive(Debug, Clone, Copy)]
pub struct BoundResources<'b> {
    pub bind_group:   &'b wgpu::BindGroup,
    pub layout:       &'b wgpu::BindGroupLayout,
    pub frame_buffer: &'b FrameBuffer,
    /// Render info exactly as uploaded for this pass.
    pub render_info:  &'b RenderInfo,
}

impl<'b> BoundResources<'b> {
    pub fn resolution(&self) -> Resolution {
        self.frame_buffer.resolution()
    }

    /// Number of workgroups covering the frame buffer with workgroups of given size.
    pub fn workgroup_count(&self, workgroup_size: (u32, u32)) -> (u32, u32) {
        let resolution = self.resolution();
        (
            gpu::align_up(resolution.width, workgroup_size.0) / workgroup_size.0,
            gpu::align_up(resolution.height, workgroup_size.1) / workgroup_size.1,
        )
    }
}

/// Binds host renderer state to GPU resident render state.
///
/// Per frame the render loop calls `update`, then `bind`, encodes its kernel with `dispatch`
/// and finally `unbind` (or uses `bind_scoped` which unbinds on every exit path).
/// `reset` reallocates the frame buffer after a viewport resize.
#[derive(Debug)]
pub struct RenderBridge {
    gpu: Arc<gpu::Context>,

    /// Host side mirror written by `update`.
    host: HostState,

    state: BindState,

    bind_group_layout:  wgpu::BindGroupLayout,
    /// Exists while the frame buffer it points to exists.
    bind_group:         Option<wgpu::BindGroup>,
    render_info_buffer: gpu::Buffer<RenderInfo>,
    lighting_buffer:    gpu::Buffer<Lighting>,

    /// Render info as last uploaded, with frame counters.
    uploaded: RenderInfo,

    frame_buffer:   Option<FrameBuffer>,
    memory_texture: Option<Weak<MemoryTexture>>,
}

// Construction
impl RenderBridge {

    #[profiler::function]
    pub fn new(gpu: Arc<gpu::Context>, settings: RenderSettings) -> Self {
        let bind_group_layout = Self::create_bind_group_layout(&gpu, wgpu::ShaderStages::COMPUTE);

        let uniform = wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        let render_info_buffer = gpu::Buffer::new(&gpu, Some("Render Info Uniform"), &[RenderInfo::default()], uniform);
        let lighting_buffer = gpu::Buffer::new(&gpu, Some("Lighting Uniform"), &[Lighting::default()], uniform);

        Self {
            gpu,
            host: HostState::new(settings),
            state: BindState::Unbound,
            bind_group_layout,
            bind_group: None,
            render_info_buffer,
            lighting_buffer,
            uploaded: RenderInfo::default(),
            frame_buffer: None,
            memory_texture: None,
        }
    }

    pub fn from_config(gpu: Arc<gpu::Context>, config: &BridgeConfig) -> Self {
        Self::new(gpu, config.settings)
    }

    /// Layout of the group the kernel binds.
    /// - 0: `RenderInfo` uniform
    /// - 1: `Lighting` uniform
    /// - 2: estimate, `array<vec4<f32>>`
    /// - 3: display, `array<u32>` of packed RGBA8
    /// - 4: random seeds, `array<u32>`
    #[profiler::function]
    pub fn create_bind_group_layout(gpu: &gpu::Context, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
        let uniform = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            count: None,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        };
        let storage = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            count: None,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        };

        gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bridge Bind Group Layout"),
            entries: &[
                uniform(0), // render info
                uniform(1), // lighting
                storage(2), // estimate
                storage(3), // display
                storage(4), // random seeds
            ],
        })
    }
}

// Getters
impl RenderBridge {
    pub fn gpu(&self) -> &Arc<gpu::Context> {
        &self.gpu
    }
    pub fn state(&self) -> BindState {
        self.state
    }
    pub fn is_bound(&self) -> bool {
        self.state.is_bound()
    }
    pub fn settings(&self) -> &RenderSettings {
        self.host.settings()
    }
    /// Render info of the last `update`, frame counters are zero.
    pub fn render_info(&self) -> &RenderInfo {
        self.host.render_info()
    }
    /// Render info snapshotted by the last `bind`, frame counters as of the last `bind` or `dispatch`.
    pub fn uploaded_render_info(&self) -> &RenderInfo {
        &self.uploaded
    }
    pub fn lighting(&self) -> &Lighting {
        self.host.lighting()
    }
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        self.frame_buffer.as_ref()
    }
    /// Number of passes accumulated in the frame buffer.
    pub fn iterations(&self) -> u32 {
        self.frame_buffer.as_ref().map_or(0, FrameBuffer::iterations)
    }
    pub fn has_renderer(&self) -> bool {
        self.host.has_renderer()
    }

    /// Whether the frame buffer is missing or does not match the last updated viewport.
    pub fn needs_reset(&self) -> bool {
        match (&self.frame_buffer, self.host.resolution()) {
            (None, _)                        => true,
            (Some(frame_buffer), Some(film)) => frame_buffer.resolution() != film,
            (Some(_), None)                  => false,
        }
    }

    /// Resources for encoding a kernel, fails unless bound.
    pub fn resources(&self) -> Result<BoundResources<'_>> {
        self.state.ensure_bound()?;
        match (&self.bind_group, &self.frame_buffer) {
            (Some(bind_group), Some(frame_buffer)) => Ok(BoundResources {
                bind_group,
                layout: &self.bind_group_layout,
                frame_buffer,
                render_info: &self.uploaded,
            }),
            _ => Err(BridgeError::NoFrameBuffer),
        }
    }
}

// Host association
impl RenderBridge {

    /// Associates the bridge with a host renderer, replacing any previous one.
    /// - Only a weak reference is kept, the host must keep the renderer alive.
    pub fn set_renderer<R: HostRenderer + 'static>(&mut self, renderer: &Arc<R>) {
        self.host.set_renderer(renderer);
    }

    /// Attaches the texture that receives display pixels on every `unbind`.
    /// - Only a weak reference is kept, the owner must keep the texture alive.
    pub fn set_memory_texture(&mut self, texture: &Arc<MemoryTexture>) {
        self.memory_texture = Some(Arc::downgrade(texture));
    }

    pub fn detach_memory_texture(&mut self) {
        self.memory_texture = None;
    }

    /// Takes effect on the next `update`.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.host.set_settings(settings);
    }
}

// Lifecycle
impl RenderBridge {

    /// Reads the associated renderer into the host side render info and lighting.
    /// - No GPU work happens here, changes are uploaded by the next `bind`.
    #[profiler::function]
    pub fn update(&mut self) -> Result<()> {
        self.host.update()
    }

    /// Uploads render info and lighting and binds the frame buffer for a kernel.
    /// - Fails without side effects when already bound or when the frame buffer or memory texture do not match.
    #[profiler::function]
    pub fn bind(&mut self) -> Result<()> {
        if self.state.is_bound() {
            return Err(BridgeError::AlreadyBound);
        }
        let film = self.host.resolution().ok_or(BridgeError::NotUpdated)?;

        let actual = self.frame_buffer.as_ref().map(FrameBuffer::resolution);
        if actual != Some(film) {
            return Err(BridgeError::StaleFrameBuffer { expected: film, actual });
        }

        if let Some(texture) = &self.memory_texture {
            let texture = texture.upgrade().ok_or(BridgeError::MemoryTextureReleased)?;
            if texture.resolution() != film {
                return Err(BridgeError::MemoryTextureMismatch {
                    texture:      texture.resolution(),
                    frame_buffer: film,
                });
            }
        }

        let dirty = self.host.take_dirty();
        if dirty.restarts_accumulation() {
            if let Some(frame_buffer) = self.frame_buffer.as_mut() {
                frame_buffer.restart();
            }
        }

        // host state is snapshotted here only, updates while bound wait for the next bind
        self.uploaded = *self.host.render_info();
        self.lighting_buffer.queue_update(&self.gpu, &[*self.host.lighting()]);
        self.upload_frame_counters();

        if self.bind_group.is_none() {
            self.bind_group = self.frame_buffer.as_ref().map(|frame_buffer| {
                frame_buffer.create_bind_group(
                    &self.gpu,
                    &self.bind_group_layout,
                    self.render_info_buffer.as_entire_binding(),
                    self.lighting_buffer.as_entire_binding(),
                )
            });
        }

        self.state.bind()
    }

    /// Encodes a kernel invocation against the bound resources and submits it.
    /// - On a failure of `encode` nothing is submitted and the bridge stays bound.
    /// - Each successful submission counts as one accumulated pass.
    #[profiler::function]
    pub fn dispatch<F, E>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &BoundResources<'_>) -> std::result::Result<(), E>,
        E: Display,
    {
        self.state.ensure_bound()?;
        self.upload_frame_counters();

        let gpu = self.gpu.clone();
        let resources = self.resources()?;
        let (outcome, gpu_error) = gpu.catch_errors(|| {
            let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Bridge Dispatch Encoder"),
            });
            encode(&mut encoder, &resources).map_err(|error| BridgeError::Kernel(error.to_string()))?;
            gpu.queue.submit(Some(encoder.finish()));
            Ok::<(), BridgeError>(())
        });
        outcome?;
        if let Some(error) = gpu_error {
            return Err(BridgeError::Gpu(error));
        }

        if let Some(frame_buffer) = self.frame_buffer.as_mut() {
            frame_buffer.advance();
        }
        Ok(())
    }

    /// Releases the binding, copies display pixels into the memory texture and waits for the GPU.
    /// - The bridge is unbound afterwards even when an error is returned.
    #[profiler::function]
    pub fn unbind(&mut self) -> Result<()> {
        self.state.unbind()?;

        let texture = match &self.memory_texture {
            Some(texture) => {
                let texture = texture.upgrade();
                if texture.is_none() {
                    warn!("Memory texture was dropped while bound, display pixels are not copied");
                }
                texture
            },
            None => None,
        };

        let (_, error) = self.gpu.catch_errors(|| {
            let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Bridge Unbind Encoder"),
            });
            if let (Some(texture), Some(frame_buffer)) = (&texture, &self.frame_buffer) {
                frame_buffer.encode_display_copy(&mut encoder, texture);
            }
            self.gpu.queue.submit(Some(encoder.finish()));
        });
        profiler::call!(self.gpu.device.poll(wgpu::Maintain::Wait));

        match error {
            Some(error) => Err(BridgeError::Gpu(error)),
            None => Ok(()),
        }
    }

    /// Binds and returns a guard which unbinds when finished or dropped.
    pub fn bind_scoped(&mut self) -> Result<BoundFrame<'_>> {
        self.bind()?;
        Ok(BoundFrame::new(self))
    }

    /// Reallocates the frame buffer at the renderer's current viewport size.
    /// - Rejected while bound.
    /// - After a failure the bridge has no frame buffer until a successful reset.
    #[profiler::function]
    pub fn reset(&mut self) -> Result<()> {
        self.state.ensure_resettable()?;

        let viewport = self.host.renderer()?.viewport();
        if viewport.is_empty() {
            return Err(BridgeError::InvalidViewport(viewport));
        }

        // release before allocating, both may not fit into memory at once
        self.bind_group = None;
        self.frame_buffer = None;

        let frame_buffer = FrameBuffer::new(&self.gpu, viewport).map_err(|error| {
            error!("Frame buffer reset to {} failed: {}", viewport, error);
            error
        })?;
        info!("Frame buffer reset to {}", viewport);

        self.frame_buffer = Some(frame_buffer);
        self.host.invalidate();
        Ok(())
    }
}

// Host consumption
impl RenderBridge {

    /// Display pixels as packed RGBA8, rows tightly packed.
    pub fn read_display(&self) -> Result<Vec<u32>> {
        self.readable_frame_buffer()?.read_display(&self.gpu)
    }

    /// HDR running estimate, rows tightly packed.
    pub fn read_estimate(&self) -> Result<Vec<super::EstimatePixel>> {
        self.readable_frame_buffer()?.read_estimate(&self.gpu)
    }

    fn readable_frame_buffer(&self) -> Result<&FrameBuffer> {
        if self.state.is_bound() {
            return Err(BridgeError::AlreadyBound);
        }
        self.frame_buffer.as_ref().ok_or(BridgeError::NoFrameBuffer)
    }
}

// Internals
impl RenderBridge {

    /// Refreshes frame counters of the bound render info and writes it into the uniform.
    fn upload_frame_counters(&mut self) {
        let pitch      = self.frame_buffer.as_ref().map_or(0, FrameBuffer::pitch);
        let iterations = self.iterations();
        self.uploaded.frame = UVec4::new(iterations, pitch, rand::random::<u32>() | 1, 0);
        self.render_info_buffer.queue_update(&self.gpu, &[self.uploaded]);
    }
}

impl Drop for RenderBridge {
    fn drop(&mut self) {
        if self.state.is_bound() {
            warn!("Render bridge dropped while bound, unbinding");
            if let Err(error) = self.unbind() {
                error!("Unbinding dropped render bridge failed: {}", error);
            }
        }
    }
}
