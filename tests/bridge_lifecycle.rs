use std::{convert::Infallible, sync::Arc};

use glam::Vec3;

use volume_bridge::{
    BridgeError,
    RenderBridge,
    RenderSettings,
    bridge::BindState,
    config::{BackendChoice, GpuConfig},
    gpu::{Context, MemoryTexture},
    host::{Camera, Resolution, Scene, SceneRenderer},
    kernel::PreviewKernel,
};

// not a multiple of the pitch, rows are padded
const VIEWPORT: Resolution = Resolution::new(70, 20);

struct Fixture {
    gpu:      Arc<Context>,
    renderer: Arc<SceneRenderer>,
    bridge:   RenderBridge,
    kernel:   PreviewKernel,
}

/// Set to run the suite on machines without any adapter, GPU tests then pass without running.
const ALLOW_NO_GPU: &str = "VOLUME_BRIDGE_ALLOW_NO_GPU";

/// Any backend first, then a software fallback adapter.
fn create_context() -> Option<Context> {
    let config = GpuConfig { backend: BackendChoice::All, ..GpuConfig::default() };
    if let Ok(gpu) = Context::headless_blocking(&config) {
        return Some(gpu);
    }
    let fallback = GpuConfig { force_fallback_adapter: true, ..config };
    match Context::headless_blocking(&fallback) {
        Ok(gpu) => Some(gpu),
        Err(error) if std::env::var_os(ALLOW_NO_GPU).is_some() => {
            eprintln!("No adapter available ({}), {} is set", error, ALLOW_NO_GPU);
            None
        },
        Err(error) => panic!("No adapter available ({}), set {} to skip GPU tests", error, ALLOW_NO_GPU),
    }
}

fn create_fixture() -> Option<Fixture> {
    let gpu = Arc::new(create_context()?);
    let renderer = Arc::new(SceneRenderer::new(Scene {
        viewport: VIEWPORT,
        camera: Camera::default().with_position(Vec3::new(0.0, 0.0, 2.0)),
        ..Scene::default()
    }));
    let mut bridge = RenderBridge::new(gpu.clone(), RenderSettings::default());
    let kernel = PreviewKernel::new(&gpu, bridge.bind_group_layout());
    bridge.set_renderer(&renderer);
    Some(Fixture { gpu, renderer, bridge, kernel })
}

macro_rules! fixture_or_skip {
    ($name:literal) => {
        match create_fixture() {
            Some(fixture) => fixture,
            None => {
                eprintln!("Skipping {} ({} is set)", $name, ALLOW_NO_GPU);
                return;
            },
        }
    };
}

/// update + reset, ready to bind.
fn prepare(fixture: &mut Fixture) {
    fixture.bridge.update().unwrap();
    fixture.bridge.reset().unwrap();
}

fn render_pass(fixture: &mut Fixture) {
    let kernel = &fixture.kernel;
    fixture.bridge.bind().unwrap();
    fixture.bridge.dispatch(|encoder, resources| {
        kernel.encode(encoder, resources);
        Ok::<(), Infallible>(())
    }).unwrap();
    fixture.bridge.unbind().unwrap();
}

#[test]
fn update_before_set_renderer_returns_no_renderer() {
    let fixture = fixture_or_skip!("update_before_set_renderer_returns_no_renderer");
    let mut bridge = RenderBridge::new(fixture.gpu.clone(), RenderSettings::default());
    assert!(matches!(bridge.update(), Err(BridgeError::NoRenderer)));
    assert!(matches!(bridge.reset(), Err(BridgeError::NoRenderer)));
    assert_eq!(bridge.state(), BindState::Unbound);
    assert!(bridge.frame_buffer().is_none());
}

#[test]
fn update_reflects_renderer_camera() {
    let mut fixture = fixture_or_skip!("update_reflects_renderer_camera");
    prepare(&mut fixture);

    let position = Vec3::new(1.0, 2.0, 3.0);
    fixture.renderer.set_camera(Camera::default().with_position(position).look_at(Vec3::ZERO));
    fixture.bridge.update().unwrap();

    let render_info = fixture.bridge.render_info();
    assert!(render_info.eye().abs_diff_eq(position, 1e-6));
    assert_eq!(render_info.resolution(), VIEWPORT);
    // no GPU upload before bind
    assert!(!fixture.bridge.uploaded_render_info().same_scene(render_info));

    fixture.bridge.bind().unwrap();
    assert!(fixture.bridge.uploaded_render_info().same_scene(fixture.bridge.render_info()));
    fixture.bridge.unbind().unwrap();
}

#[test]
fn bind_and_unbind_without_work_leaves_frame_buffer_unchanged() {
    let mut fixture = fixture_or_skip!("bind_and_unbind_without_work_leaves_frame_buffer_unchanged");
    prepare(&mut fixture);
    render_pass(&mut fixture);

    let before = fixture.bridge.read_display().unwrap();
    assert_eq!(before.len(), VIEWPORT.pixel_count() as usize);

    fixture.bridge.bind().unwrap();
    fixture.bridge.unbind().unwrap();

    assert_eq!(fixture.bridge.read_display().unwrap(), before);
}

#[test]
fn reset_while_bound_is_rejected() {
    let mut fixture = fixture_or_skip!("reset_while_bound_is_rejected");
    prepare(&mut fixture);

    fixture.bridge.bind().unwrap();
    assert!(matches!(fixture.bridge.reset(), Err(BridgeError::ResetWhileBound)));
    assert!(fixture.bridge.is_bound());
    assert!(fixture.bridge.frame_buffer().is_some());
    fixture.bridge.unbind().unwrap();
    fixture.bridge.reset().unwrap();
}

#[test]
fn bind_while_bound_is_rejected() {
    let mut fixture = fixture_or_skip!("bind_while_bound_is_rejected");
    prepare(&mut fixture);

    fixture.bridge.bind().unwrap();
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::AlreadyBound)));
    assert!(fixture.bridge.is_bound());
    fixture.bridge.unbind().unwrap();
    assert!(matches!(fixture.bridge.unbind(), Err(BridgeError::NotBound)));
}

#[test]
fn bind_before_update_is_rejected() {
    let mut fixture = fixture_or_skip!("bind_before_update_is_rejected");
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::NotUpdated)));
    assert_eq!(fixture.bridge.state(), BindState::Unbound);
}

#[test]
fn failed_kernel_encoding_still_unbinds() {
    let mut fixture = fixture_or_skip!("failed_kernel_encoding_still_unbinds");
    prepare(&mut fixture);

    fixture.bridge.bind().unwrap();
    let result = fixture.bridge.dispatch(|_, _| Err("kernel exploded"));
    match result {
        Err(BridgeError::Kernel(message)) => assert_eq!(message, "kernel exploded"),
        other => panic!("unexpected dispatch result {:?}", other),
    }
    assert!(fixture.bridge.is_bound());
    assert_eq!(fixture.bridge.iterations(), 0);

    fixture.bridge.unbind().unwrap();
    assert_eq!(fixture.bridge.state(), BindState::Unbound);
}

#[test]
fn dispatch_requires_binding() {
    let mut fixture = fixture_or_skip!("dispatch_requires_binding");
    prepare(&mut fixture);

    let result = fixture.bridge.dispatch(|_, _| Ok::<(), Infallible>(()));
    assert!(matches!(result, Err(BridgeError::NotBound)));
    assert!(matches!(fixture.bridge.resources(), Err(BridgeError::NotBound)));
}

#[test]
fn viewport_change_requires_reset() {
    let mut fixture = fixture_or_skip!("viewport_change_requires_reset");
    prepare(&mut fixture);
    assert!(!fixture.bridge.needs_reset());

    let resized = Resolution::new(33, 17);
    fixture.renderer.set_viewport(resized);
    fixture.bridge.update().unwrap();
    assert!(fixture.bridge.needs_reset());
    match fixture.bridge.bind() {
        Err(BridgeError::StaleFrameBuffer { expected, actual }) => {
            assert_eq!(expected, resized);
            assert_eq!(actual, Some(VIEWPORT));
        },
        other => panic!("unexpected bind result {:?}", other),
    }

    fixture.bridge.reset().unwrap();
    assert!(!fixture.bridge.needs_reset());
    render_pass(&mut fixture);
    assert_eq!(fixture.bridge.read_display().unwrap().len(), resized.pixel_count() as usize);
}

#[test]
fn kernel_accumulates_until_camera_changes() {
    let mut fixture = fixture_or_skip!("kernel_accumulates_until_camera_changes");
    prepare(&mut fixture);

    for _ in 0..3 {
        render_pass(&mut fixture);
    }
    assert_eq!(fixture.bridge.iterations(), 3);

    // unchanged scene keeps accumulating
    fixture.bridge.update().unwrap();
    fixture.bridge.bind().unwrap();
    assert_eq!(fixture.bridge.uploaded_render_info().iterations(), 3);
    fixture.bridge.unbind().unwrap();

    fixture.renderer.set_camera(Camera::default().with_position(Vec3::new(0.0, 1.0, 2.0)).look_at(Vec3::ZERO));
    fixture.bridge.update().unwrap();
    fixture.bridge.bind().unwrap();
    assert_eq!(fixture.bridge.iterations(), 0);
    assert_eq!(fixture.bridge.uploaded_render_info().iterations(), 0);
    fixture.bridge.unbind().unwrap();
}

#[test]
fn preview_kernel_renders_sphere_over_background() {
    let mut fixture = fixture_or_skip!("preview_kernel_renders_sphere_over_background");
    prepare(&mut fixture);
    render_pass(&mut fixture);

    let pixels = fixture.bridge.read_display().unwrap();
    let center = pixels[(VIEWPORT.height / 2 * VIEWPORT.width + VIEWPORT.width / 2) as usize];
    let corner = pixels[0];
    let [center_red, ..] = center.to_le_bytes();
    let [corner_red, _, _, corner_alpha] = corner.to_le_bytes();
    assert!(center_red > corner_red);
    assert_eq!(corner_alpha, 255);
}

#[test]
fn unbind_copies_display_into_memory_texture() {
    let mut fixture = fixture_or_skip!("unbind_copies_display_into_memory_texture");
    let texture = Arc::new(MemoryTexture::new(&fixture.gpu, "Test Memory Texture", VIEWPORT).unwrap());
    fixture.bridge.set_memory_texture(&texture);
    prepare(&mut fixture);
    render_pass(&mut fixture);

    let display = fixture.bridge.read_display().unwrap();
    assert_eq!(texture.read(&fixture.gpu).unwrap(), display);
}

#[test]
fn memory_texture_must_match_and_be_alive() {
    let mut fixture = fixture_or_skip!("memory_texture_must_match_and_be_alive");
    prepare(&mut fixture);

    let small = Arc::new(MemoryTexture::new(&fixture.gpu, "Small Memory Texture", Resolution::new(8, 8)).unwrap());
    fixture.bridge.set_memory_texture(&small);
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::MemoryTextureMismatch { .. })));

    drop(small);
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::MemoryTextureReleased)));
    assert_eq!(fixture.bridge.state(), BindState::Unbound);

    fixture.bridge.detach_memory_texture();
    fixture.bridge.bind().unwrap();
    fixture.bridge.unbind().unwrap();
}

#[test]
fn scoped_binding_unbinds_on_drop() {
    let mut fixture = fixture_or_skip!("scoped_binding_unbinds_on_drop");
    prepare(&mut fixture);

    {
        let bound = fixture.bridge.bind_scoped().unwrap();
        assert!(bound.bridge().is_bound());
        assert!(bound.resources().is_ok());
    }
    assert!(!fixture.bridge.is_bound());

    let kernel = &fixture.kernel;
    let mut bound = fixture.bridge.bind_scoped().unwrap();
    bound.dispatch(|encoder, resources| {
        kernel.encode(encoder, resources);
        Ok::<(), Infallible>(())
    }).unwrap();
    bound.finish().unwrap();
    assert!(!fixture.bridge.is_bound());
    assert_eq!(fixture.bridge.iterations(), 1);
}

#[test]
fn readback_is_rejected_while_bound() {
    let mut fixture = fixture_or_skip!("readback_is_rejected_while_bound");
    assert!(matches!(fixture.bridge.read_display(), Err(BridgeError::NoFrameBuffer)));
    prepare(&mut fixture);

    fixture.bridge.bind().unwrap();
    assert!(matches!(fixture.bridge.read_display(), Err(BridgeError::AlreadyBound)));
    fixture.bridge.unbind().unwrap();
    assert!(fixture.bridge.read_display().is_ok());
}

#[test]
fn released_renderer_is_reported() {
    let mut fixture = fixture_or_skip!("released_renderer_is_reported");
    prepare(&mut fixture);

    let Fixture { renderer, mut bridge, .. } = fixture;
    drop(renderer);
    assert!(matches!(bridge.update(), Err(BridgeError::RendererReleased)));
    // the last mirrored state still binds
    bridge.bind().unwrap();
    bridge.unbind().unwrap();
}

#[test]
fn update_while_bound_waits_for_next_bind() {
    let mut fixture = fixture_or_skip!("update_while_bound_waits_for_next_bind");
    prepare(&mut fixture);

    let kernel = &fixture.kernel;
    fixture.bridge.bind().unwrap();
    for _ in 0..2 {
        fixture.bridge.dispatch(|encoder, resources| {
            kernel.encode(encoder, resources);
            Ok::<(), Infallible>(())
        }).unwrap();
    }

    let moved = Vec3::new(5.0, 0.0, 0.0);
    let resized = Resolution::new(200, 100);
    fixture.renderer.set_camera(Camera::default().with_position(moved).look_at(Vec3::ZERO));
    fixture.renderer.set_viewport(resized);
    fixture.bridge.update().unwrap();
    assert!(fixture.bridge.render_info().eye().abs_diff_eq(moved, 1e-6));

    // the bound pass keeps rendering the scene it was bound with
    fixture.bridge.dispatch(|encoder, resources| {
        kernel.encode(encoder, resources);
        Ok::<(), Infallible>(())
    }).unwrap();
    let uploaded = *fixture.bridge.uploaded_render_info();
    assert!(uploaded.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
    assert_eq!(uploaded.resolution(), VIEWPORT);
    assert_eq!(uploaded.iterations(), 2);
    assert_eq!(fixture.bridge.iterations(), 3);
    fixture.bridge.unbind().unwrap();
    assert_eq!(fixture.bridge.read_display().unwrap().len(), VIEWPORT.pixel_count() as usize);

    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::StaleFrameBuffer { .. })));
    fixture.bridge.reset().unwrap();
    fixture.bridge.bind().unwrap();
    let uploaded = *fixture.bridge.uploaded_render_info();
    assert!(uploaded.eye().abs_diff_eq(moved, 1e-6));
    assert_eq!(uploaded.resolution(), resized);
    assert_eq!(uploaded.iterations(), 0);
    fixture.bridge.unbind().unwrap();
}

#[test]
fn failed_reset_leaves_no_frame_buffer() {
    let mut fixture = fixture_or_skip!("failed_reset_leaves_no_frame_buffer");
    prepare(&mut fixture);
    render_pass(&mut fixture);

    // pitched to 2^32 pixels, the estimate plane alone needs 64 GiB
    let huge = Resolution::new(u32::MAX - 3, 1);
    fixture.renderer.set_viewport(huge);
    fixture.bridge.update().unwrap();
    match fixture.bridge.reset() {
        Err(BridgeError::ResolutionTooLarge { requested, .. }) => assert_eq!(requested, huge),
        other => panic!("unexpected reset result {:?}", other),
    }
    assert!(fixture.bridge.frame_buffer().is_none());
    assert_eq!(fixture.bridge.state(), BindState::Unbound);
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::StaleFrameBuffer { actual: None, .. })));
    assert!(matches!(fixture.bridge.read_display(), Err(BridgeError::NoFrameBuffer)));

    fixture.renderer.set_viewport(VIEWPORT);
    prepare(&mut fixture);
    render_pass(&mut fixture);
    assert_eq!(fixture.bridge.iterations(), 1);
}

#[test]
fn memory_texture_dropped_while_bound_skips_copy() {
    let mut fixture = fixture_or_skip!("memory_texture_dropped_while_bound_skips_copy");
    let texture = Arc::new(MemoryTexture::new(&fixture.gpu, "Test Memory Texture", VIEWPORT).unwrap());
    fixture.bridge.set_memory_texture(&texture);
    prepare(&mut fixture);

    let kernel = &fixture.kernel;
    fixture.bridge.bind().unwrap();
    fixture.bridge.dispatch(|encoder, resources| {
        kernel.encode(encoder, resources);
        Ok::<(), Infallible>(())
    }).unwrap();
    drop(texture);

    fixture.bridge.unbind().unwrap();
    assert!(!fixture.bridge.is_bound());
    assert_eq!(fixture.bridge.read_display().unwrap().len(), VIEWPORT.pixel_count() as usize);
    assert!(matches!(fixture.bridge.bind(), Err(BridgeError::MemoryTextureReleased)));
}

#[test]
fn estimate_holds_one_opaque_sample_per_pixel() {
    let mut fixture = fixture_or_skip!("estimate_holds_one_opaque_sample_per_pixel");
    prepare(&mut fixture);
    render_pass(&mut fixture);

    let estimate = fixture.bridge.read_estimate().unwrap();
    assert_eq!(estimate.len(), VIEWPORT.pixel_count() as usize);
    assert!(estimate.iter().all(|pixel| pixel[3] == 1.0));

    fixture.bridge.bind().unwrap();
    assert!(matches!(fixture.bridge.read_estimate(), Err(BridgeError::AlreadyBound)));
    fixture.bridge.unbind().unwrap();
}
