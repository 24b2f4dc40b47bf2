use std::{convert::Infallible, sync::Arc};

use glam::Vec3;

use volume_bridge::{
    info,
    error,
    BridgeConfig,
    RenderBridge,
    Result,
    gpu::{self, MemoryTexture},
    host::{Camera, Light, Scene, SceneRenderer},
    kernel::PreviewKernel,
};

const DEFAULT_FRAMES: u32 = 16;

/// Usage: `volume-bridge [config.json] [frames]`
fn main() {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let frames = args.next()
        .and_then(|frames| frames.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let config = match config_path {
        Some(path) => match BridgeConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load config \"{}\": {}", path, err);
                std::process::exit(2);
            },
        },
        None => BridgeConfig::default(),
    };

    volume_bridge::log::init_logging(config.log_filter.as_deref());
    profiler::session_begin!("volume-bridge");

    if let Err(err) = run(&config, frames) {
        error!("{}", err);
        std::process::exit(1);
    }

    #[cfg(feature = "stats")]
    for scope in profiler::report() {
        info!(
            "{:<60} count: {:>6} avg: {:>10.3?} min: {:>10.3?} max: {:>10.3?}",
            scope.name, scope.count, scope.average, scope.min, scope.max
        );
    }
}

#[profiler::function]
fn run(config: &BridgeConfig, frames: u32) -> Result<()> {
    let gpu = Arc::new(gpu::Context::headless_blocking(&config.gpu)?);

    let scene = Scene {
        camera: Camera::default()
            .with_position(Vec3::new(0.6, 0.4, 1.6))
            .look_at(Vec3::ZERO),
        lights: vec![
            Light::headlight().with_intensity(0.6),
            Light::scene(Vec3::new(2.0, 2.0, 1.0), Vec3::ZERO)
                .with_color(Vec3::new(1.0, 0.8, 0.6))
                .with_intensity(4.0)
                .positional(),
        ],
        ..Scene::default()
    };
    let renderer = Arc::new(SceneRenderer::new(scene));

    let mut bridge = RenderBridge::from_config(gpu.clone(), config);
    let kernel = PreviewKernel::new(&gpu, bridge.bind_group_layout());
    bridge.set_renderer(&renderer);

    let mut texture = Arc::new(MemoryTexture::new(&gpu, "Display Memory Texture", renderer.snapshot().viewport)?);
    bridge.set_memory_texture(&texture);

    for frame in 0..frames {
        // halfway through the host resizes its viewport
        if frame == frames / 2 && frame > 0 {
            let viewport = renderer.snapshot().viewport;
            renderer.set_viewport(volume_bridge::host::Resolution::new(viewport.width / 2, viewport.height / 2));
        }

        bridge.update()?;
        if bridge.needs_reset() {
            bridge.reset()?;
            let viewport = renderer.snapshot().viewport;
            if texture.resolution() != viewport {
                texture = Arc::new(MemoryTexture::new(&gpu, "Display Memory Texture", viewport)?);
                bridge.set_memory_texture(&texture);
            }
        }

        let mut bound = bridge.bind_scoped()?;
        bound.dispatch(|encoder, resources| {
            kernel.encode(encoder, resources);
            Ok::<(), Infallible>(())
        })?;
        bound.finish()?;

        info!("Frame {} accumulated {} iterations", frame, bridge.iterations());
    }

    let pixels = texture.read(&gpu)?;
    let mean = mean_luminance(&pixels);
    info!("Rendered {} frames at {}, mean luminance {:.4}", frames, texture.resolution(), mean);
    Ok(())
}

fn mean_luminance(pixels: &[u32]) -> f32 {
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: f32 = pixels
        .iter()
        .map(|pixel| {
            let [r, g, b, _] = pixel.to_le_bytes();
            0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
        })
        .sum();
    sum / (pixels.len() as f32 * 255.0)
}
