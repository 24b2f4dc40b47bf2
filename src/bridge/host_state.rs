use std::sync::{Arc, Weak};

use crate::{
    debug,
    error::{BridgeError, Result},
    host::{HostRenderer, Resolution},
};

use super::{Dirty, Lighting, RenderInfo, RenderSettings};

/// Host side mirror of the GPU structures.
/// - Only `update` writes it, uploading to the GPU is the bridge's business during bind.
#[derive(Default)]
pub struct HostState {
    renderer:    Option<Weak<dyn HostRenderer>>,
    settings:    RenderSettings,
    render_info: RenderInfo,
    lighting:    Lighting,
    dirty:       Dirty,
    updated:     bool,
}

impl std::fmt::Debug for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostState")
            .field("renderer", &self.renderer.as_ref().map(|renderer| renderer.strong_count() > 0))
            .field("settings", &self.settings)
            .field("resolution", &self.render_info.resolution())
            .field("lights", &self.lighting.len())
            .field("dirty", &self.dirty)
            .field("updated", &self.updated)
            .finish()
    }
}

// Construction
impl HostState {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings, ..Default::default() }
    }
}

// Getters
impl HostState {
    pub fn render_info(&self) -> &RenderInfo {
        &self.render_info
    }
    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
    pub fn dirty(&self) -> Dirty {
        self.dirty
    }
    /// Whether `update` succeeded at least once since the renderer was set.
    pub fn is_updated(&self) -> bool {
        self.updated
    }
    /// Film resolution of the last successful update.
    pub fn resolution(&self) -> Option<Resolution> {
        self.updated.then(|| self.render_info.resolution())
    }
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Upgrades the renderer reference.
    pub fn renderer(&self) -> Result<Arc<dyn HostRenderer>> {
        self.renderer
            .as_ref()
            .ok_or(BridgeError::NoRenderer)?
            .upgrade()
            .ok_or(BridgeError::RendererReleased)
    }
}

// Mutation
impl HostState {

    /// Replaces the associated renderer, everything is considered changed.
    pub fn set_renderer<R: HostRenderer + 'static>(&mut self, renderer: &Arc<R>) {
        let renderer: Weak<R> = Arc::downgrade(renderer);
        self.renderer = Some(renderer);
        self.updated  = false;
        self.dirty    = Dirty::all();
    }

    /// Staged until the next `update`, which marks `SETTINGS` dirty if the kernel sees a difference.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    /// Reads the renderer and rewrites render info and lighting.
    /// - On error nothing is changed.
    #[profiler::function]
    pub fn update(&mut self) -> Result<()> {
        let renderer = self.renderer()?;

        let viewport = renderer.viewport();
        if viewport.is_empty() {
            return Err(BridgeError::InvalidViewport(viewport));
        }

        let mut camera = renderer.camera();
        camera.aspect_ratio = viewport.aspect_ratio();

        let render_info = RenderInfo::from_host(&camera, viewport, &self.settings, renderer.background());
        let lighting = Lighting::from_host(&renderer.lights(), &camera);

        let changes = self.changes(&render_info, &lighting);
        if !changes.is_empty() {
            debug!("Host state changed: {:?}", changes);
        }

        self.dirty      |= changes;
        self.render_info = render_info;
        self.lighting    = lighting;
        self.updated     = true;
        Ok(())
    }

    /// Returns what changed since the last call and marks everything clean.
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    /// Marks everything changed, e.g. after the frame buffer was reallocated.
    pub fn invalidate(&mut self) {
        self.dirty = Dirty::all();
    }

    fn changes(&self, render_info: &RenderInfo, lighting: &Lighting) -> Dirty {
        if !self.updated {
            return Dirty::all();
        }
        let old = &self.render_info;
        let mut dirty = Dirty::empty();
        if old.view != render_info.view || old.projection != render_info.projection || old.lens != render_info.lens {
            dirty |= Dirty::CAMERA;
        }
        if old.film != render_info.film {
            dirty |= Dirty::FILM;
        }
        if old.tone != render_info.tone || old.background != render_info.background {
            dirty |= Dirty::SETTINGS;
        }
        if self.lighting != *lighting {
            dirty |= Dirty::LIGHTING;
        }
        dirty
    }
}
