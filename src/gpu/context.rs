use crate::{
    info,
    config::GpuConfig,
    error::{BridgeError, Result},
};

/// Headless GPU context shared by the bridge and its resources.
#[derive(Debug)]
pub struct Context {
    pub adapter: wgpu::Adapter,
    pub device:  wgpu::Device,
    pub queue:   wgpu::Queue,
}

impl Context {

    /// Requests an adapter and a device without any presentation surface.
    /// - `WGPU_BACKEND` and `WGPU_POWER_PREF` environment variables override the configuration.
    #[profiler::function]
    pub async fn headless(config: &GpuConfig) -> Result<Self> {
        let backends = wgpu::util::backend_bits_from_env()
            .unwrap_or_else(|| config.backend.backends());
        let power_preference = wgpu::util::power_preference_from_env()
            .unwrap_or_else(|| config.power_preference.power_preference());

        let instance = {
            profiler::scope!("Creating instance");
            wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends,
                dx12_shader_compiler: wgpu::Dx12Compiler::default(),
            })
        };

        let adapter = profiler::call!(
            instance.request_adapter(
                &wgpu::RequestAdapterOptions {
                    power_preference,
                    force_fallback_adapter: config.force_fallback_adapter,
                    compatible_surface: None,
                }
            ).await.ok_or(BridgeError::NoAdapter)?
        );

        let adapter_info = adapter.get_info();
        info!("Using adapter \"{}\" ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = Self::new_device_queue(&adapter, &config.label).await?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Blocking variant of [`Context::headless`].
    pub fn headless_blocking(config: &GpuConfig) -> Result<Self> {
        pollster::block_on(Self::headless(config))
    }

    #[profiler::function]
    pub async fn new_device_queue(adapter: &wgpu::Adapter, label: &str) -> Result<(wgpu::Device, wgpu::Queue)> {
        let device_queue = adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some(label),
                // frame buffer lives in plain storage buffers, no optional features are needed
                features: wgpu::Features::empty(),
                // large viewports need whatever the adapter can give
                limits: adapter.limits(),
            },
            None
        ).await?;
        Ok(device_queue)
    }

    /// Runs `action` inside out-of-memory and validation error scopes.
    /// - Returns the result of `action` together with the first captured error (if any).
    #[profiler::function]
    pub fn catch_errors<T>(&self, action: impl FnOnce() -> T) -> (T, Option<String>) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = action();

        let validation    = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        let error = validation.or(out_of_memory).map(|error| error.to_string());
        (value, error)
    }
}
