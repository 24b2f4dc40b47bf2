//! A small compute kernel consuming the bridge's bound resources.
//!
//! Renders a soft emissive/absorbing sphere lit by the bridge's lights and accumulates it
//! progressively into the frame buffer. Useful to exercise the bridge end to end.

use std::borrow::Cow;

use crate::{
    bridge::BoundResources,
    gpu,
};

/// Workgroup size declared in `_preview_kernel.wgsl`.
pub const WORKGROUP_SIZE: (u32, u32) = (8, 8);

#[derive(Debug)]
pub struct PreviewKernel {
    pipeline: wgpu::ComputePipeline,
}

impl PreviewKernel {

    /// Builds the pipeline against the bridge's bind group layout.
    #[profiler::function]
    pub fn new(gpu: &gpu::Context, layout: &wgpu::BindGroupLayout) -> Self {
        let pipeline = {
            profiler::scope!("Create preview kernel pipeline");
            gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Preview Kernel Pipeline"),
                entry_point: "main",
                layout: Some(
                    &gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("Preview Kernel Pipeline Layout"),
                        bind_group_layouts: &[layout],
                        push_constant_ranges: &[],
                    })
                ),
                module: &gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Preview Kernel Shader Module"),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("_preview_kernel.wgsl"))),
                }),
            })
        };
        Self { pipeline }
    }

    /// Records one accumulation pass over the whole frame buffer.
    #[profiler::function]
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, resources: &BoundResources<'_>) {
        let (x, y) = resources.workgroup_count(WORKGROUP_SIZE);

        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Preview kernel pass"),
        });
        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, resources.bind_group, &[]);
        compute_pass.dispatch_workgroups(x, y, 1);
    }
}
