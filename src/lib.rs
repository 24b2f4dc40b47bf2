//! Render context bridge between a host renderer and a GPU volume rendering kernel.
//!
//! The bridge mirrors host camera, viewport and lighting into GPU layout structures, owns the
//! frame buffer a kernel renders into and scopes the kernel invocation with `bind`/`unbind`.

pub mod log;
pub mod error;
pub mod config;
pub mod host;
pub mod gpu;
pub mod bridge;
pub mod kernel;

pub use bridge::{BoundFrame, BoundResources, RenderBridge, RenderInfo, RenderSettings, Lighting};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
