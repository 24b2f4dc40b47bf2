use std::sync::mpsc;

use crate::error::{BridgeError, Result};

use super::Context;

/// Rounds `value` up to the nearest multiple of `alignment`.
/// - Returns `None` when the result does not fit into `u32`.
pub fn checked_align_up(value: u32, alignment: u32) -> Option<u32> {
    debug_assert!(alignment > 0);
    let aligned = (value as u64 + alignment as u64 - 1) / alignment as u64 * alignment as u64;
    u32::try_from(aligned).ok()
}

/// Rounds `value` up to the nearest multiple of `alignment`, saturating at the largest multiple in `u32`.
pub fn align_up(value: u32, alignment: u32) -> u32 {
    checked_align_up(value, alignment).unwrap_or(u32::MAX / alignment * alignment)
}

/// Copies `size` bytes into a mappable staging buffer using `encode_copy` and reads them back to the host.
/// - Blocks until the GPU finished all submitted work.
#[profiler::function]
pub fn read_staged<T: bytemuck::Pod>(
    gpu: &Context,
    size: u64,
    encode_copy: impl FnOnce(&mut wgpu::CommandEncoder, &wgpu::Buffer),
) -> Result<Vec<T>> {
    let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback staging buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let (_, error) = gpu.catch_errors(|| {
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback encoder"),
        });
        encode_copy(&mut encoder, &staging);
        gpu.queue.submit(Some(encoder.finish()));
    });
    if let Some(error) = error {
        return Err(BridgeError::Readback(error));
    }

    let data = {
        let buffer_slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        profiler::call!(buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // receiver outlives the poll below
            let _ = sender.send(result);
        }));
        profiler::call!(gpu.device.poll(wgpu::Maintain::Wait));

        receiver.recv()
            .map_err(|error| BridgeError::Readback(error.to_string()))?
            .map_err(|error| BridgeError::Readback(error.to_string()))?;

        let data = profiler::call!(buffer_slice.get_mapped_range());
        bytemuck::cast_slice(&data).to_vec()
    };
    staging.unmap();
    Ok(data)
}

/// Drops row padding: `rows` rows of `pitch` items become rows of `width` items.
pub fn depad<T: Copy>(padded: &[T], width: usize, pitch: usize, rows: usize) -> Vec<T> {
    debug_assert!(width <= pitch);
    padded
        .chunks(pitch)
        .take(rows)
        .flat_map(|row| &row[..width])
        .copied()
        .collect()
}
