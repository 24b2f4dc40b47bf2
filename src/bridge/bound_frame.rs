use std::fmt::Display;

use crate::{
    error,
    error::Result,
};

use super::{BoundResources, RenderBridge};

/// A bound [`RenderBridge`] which unbinds on [`BoundFrame::finish`] or when dropped.
#[derive(Debug)]
pub struct BoundFrame<'b> {
    bridge:   &'b mut RenderBridge,
    finished: bool,
}

impl<'b> BoundFrame<'b> {
    /// Wraps an already bound bridge.
    pub(super) fn new(bridge: &'b mut RenderBridge) -> Self {
        debug_assert!(bridge.is_bound());
        Self { bridge, finished: false }
    }

    pub fn resources(&self) -> Result<BoundResources<'_>> {
        self.bridge.resources()
    }

    pub fn bridge(&self) -> &RenderBridge {
        &*self.bridge
    }

    /// See [`RenderBridge::dispatch`].
    pub fn dispatch<F, E>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &BoundResources<'_>) -> std::result::Result<(), E>,
        E: Display,
    {
        self.bridge.dispatch(encode)
    }

    /// Unbinds and reports the outcome, dropping unbinds too but can only log it.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.bridge.unbind()
    }
}

impl Drop for BoundFrame<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(error) = self.bridge.unbind() {
                error!("Unbinding on frame drop failed: {}", error);
            }
        }
    }
}
