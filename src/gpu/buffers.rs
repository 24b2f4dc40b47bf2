use std::{marker::PhantomData, fmt::Debug};

use wgpu::util::DeviceExt;

use crate::{
    warn,
    error::Result,
    host::Resolution,
};

use super::{Context, align_up, depad, read_staged};

/// Bound of items stored in GPU buffers.
pub trait BufferItem: Debug + Copy + bytemuck::Pod + bytemuck::Zeroable {}
impl<I: Debug + Copy + bytemuck::Pod + bytemuck::Zeroable> BufferItem for I {}

/// Typed linear buffer on the GPU.
#[derive(Debug)]
pub struct Buffer<I: BufferItem> {
    /// Label of buffer on GPU.
    pub label: Option<&'static str>,
    /// Buffer on GPU.
    pub buffer: wgpu::Buffer,
    /// The number of items in the buffer.
    pub size: usize,
    /// Capacity of the buffer (how many items it can hold).
    pub capacity: usize,
    usage: wgpu::BufferUsages,
    _phantom: PhantomData<I>,
}

// Statics (Helpers, Constructors)
impl<I: BufferItem> Buffer<I> {

    /// Create a new buffer on the GPU initialized with `data`.
    #[profiler::function]
    pub fn new(gpu: &Context, label: Option<&'static str>, data: &[I], usage: wgpu::BufferUsages) -> Buffer<I> {
        let size = data.len();
        let buffer = gpu.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor { label, usage, contents: bytemuck::cast_slice(data) }
        );

        Buffer { label, buffer, size, capacity: size, usage, _phantom: PhantomData }
    }

    /// Create a new zeroed buffer on the GPU with a given capacity.
    #[profiler::function]
    pub fn new_empty(gpu: &Context, label: Option<&'static str>, capacity: usize, usage: wgpu::BufferUsages) -> Buffer<I> {
        let buffer = gpu.device.create_buffer(
            &wgpu::BufferDescriptor {
                label,
                size: Self::bytes_for_item_count(capacity) as u64,
                usage,
                mapped_at_creation: false,
            }
        );
        Buffer { label, buffer, size: capacity, capacity, usage, _phantom: PhantomData }
    }

    /// Helper function to compute how many bytes will occupy given number of items in this buffer
    pub fn bytes_for_item_count(count: usize) -> usize {
        count * std::mem::size_of::<I>()
    }
}

// Instance methods
impl<I: BufferItem> Buffer<I> {

    /// Returns used number of bytes (on GPU) for this buffer
    pub fn byte_size(&self) -> usize {
        Self::bytes_for_item_count(self.size)
    }

    /// Returns the usage with which this buffer was created
    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// Update the buffer on the GPU using wgpu queue with the given data.
    /// - If the buffer is not large enough, it will be reallocated with the new size.
    /// - Returns true if the buffer was resized and thus the old bindings is invalid.
    #[profiler::function]
    pub fn queue_update(&mut self, gpu: &Context, new_data: &[I]) -> bool {
        self.size = new_data.len();
        if new_data.len() > self.capacity {
            profiler::scope!("Updating Buffer with reallocation");
            warn!("Updating Buffer {:?} with reallocation {} -> {}", self.label, self.capacity, new_data.len());
            self.buffer = gpu.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: self.label,
                    usage: self.usage(),
                    contents: bytemuck::cast_slice(new_data),
                }
            );
            self.capacity = new_data.len();
            return true;
        }
        profiler::scope!("Updating Buffer without reallocation");
        gpu.queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(new_data));
        false
    }

    /// Reads the used part of the buffer back to the host.
    /// - The buffer must have been created with `COPY_SRC` usage.
    pub fn read(&self, gpu: &Context) -> Result<Vec<I>> {
        let byte_size = self.byte_size() as u64;
        read_staged(gpu, byte_size, |encoder, staging| {
            encoder.copy_buffer_to_buffer(&self.buffer, 0, staging, 0, byte_size);
        })
    }
}

/// Number of items every row of a [`Buffer2D`] is padded to.
/// - 64 items of 4 bytes make 256 bytes, the row alignment required for buffer <-> texture copies.
pub const PITCH_ALIGNMENT: u32 = 64;

/// Pitched 2D buffer on the GPU, row `y` starts at item `y * pitch`.
#[derive(Debug)]
pub struct Buffer2D<I: BufferItem> {
    buffer:     Buffer<I>,
    resolution: Resolution,
    pitch:      u32,
}

impl<I: BufferItem> Buffer2D<I> {

    /// Row length in items for a buffer `width` items wide.
    pub fn pitch_for(width: u32) -> u32 {
        align_up(width.max(1), PITCH_ALIGNMENT)
    }

    /// Bytes occupied by a buffer of given resolution, computed without overflow for any resolution.
    pub fn bytes_for(resolution: Resolution) -> u64 {
        let alignment = PITCH_ALIGNMENT as u64;
        let pitch = (resolution.width.max(1) as u64 + alignment - 1) / alignment * alignment;
        pitch * resolution.height as u64 * std::mem::size_of::<I>() as u64
    }

    /// Zero initialized buffer.
    pub fn new_empty(gpu: &Context, label: &'static str, resolution: Resolution, usage: wgpu::BufferUsages) -> Self {
        let pitch = Self::pitch_for(resolution.width);
        let count = pitch as usize * resolution.height as usize;
        Self {
            buffer: Buffer::new_empty(gpu, Some(label), count, usage),
            resolution,
            pitch,
        }
    }

    /// Buffer initialized by calling `init` for every item, padding included.
    pub fn new_with(gpu: &Context, label: &'static str, resolution: Resolution, usage: wgpu::BufferUsages, init: impl FnMut() -> I) -> Self {
        let pitch = Self::pitch_for(resolution.width);
        let count = pitch as usize * resolution.height as usize;
        let data: Vec<I> = std::iter::repeat_with(init).take(count).collect();
        Self {
            buffer: Buffer::new(gpu, Some(label), &data, usage),
            resolution,
            pitch,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer.buffer
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.pitch * std::mem::size_of::<I>() as u32
    }

    /// Reads the buffer back, rows tightly packed (`width * height` items).
    #[profiler::function]
    pub fn read(&self, gpu: &Context) -> Result<Vec<I>> {
        let padded = self.buffer.read(gpu)?;
        Ok(depad(
            &padded,
            self.resolution.width as usize,
            self.pitch as usize,
            self.resolution.height as usize,
        ))
    }
}
