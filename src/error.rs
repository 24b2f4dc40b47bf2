//! Errors surfaced by the bridge and its GPU resources.

use crate::host::Resolution;

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("No host renderer is associated with the bridge")]
    NoRenderer,

    #[error("Host renderer was dropped while still associated with the bridge")]
    RendererReleased,

    #[error("Host renderer reports an empty viewport {0}")]
    InvalidViewport(Resolution),

    #[error("Bridge has not been updated from its renderer yet")]
    NotUpdated,

    #[error("Frame buffer has not been allocated, reset the bridge first")]
    NoFrameBuffer,

    #[error("Bridge is already bound")]
    AlreadyBound,

    #[error("Bridge is not bound")]
    NotBound,

    #[error("Frame buffer cannot be reset while the bridge is bound")]
    ResetWhileBound,

    #[error("Frame buffer is stale: viewport is {expected} but frame buffer is {}", .actual.as_ref().map(|r| r.to_string()).unwrap_or_else(|| "not allocated".to_owned()))]
    StaleFrameBuffer {
        expected: Resolution,
        actual:   Option<Resolution>,
    },

    #[error("Memory texture was dropped while still attached to the bridge")]
    MemoryTextureReleased,

    #[error("Memory texture is {texture} but frame buffer is {frame_buffer}")]
    MemoryTextureMismatch {
        texture:      Resolution,
        frame_buffer: Resolution,
    },

    #[error("Resolution {requested} exceeds device limit of {limit} ({what})")]
    ResolutionTooLarge {
        requested: Resolution,
        limit:     u64,
        what:      &'static str,
    },

    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Kernel invocation failed: {0}")]
    Kernel(String),

    #[error("Readback failed: {0}")]
    Readback(String),

    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_frame_buffer_message_names_both_sizes() {
        let error = BridgeError::StaleFrameBuffer {
            expected: Resolution::new(640, 480),
            actual:   Some(Resolution::new(320, 240)),
        };
        assert_eq!(error.to_string(), "Frame buffer is stale: viewport is 640x480 but frame buffer is 320x240");

        let error = BridgeError::StaleFrameBuffer { expected: Resolution::new(8, 8), actual: None };
        assert!(error.to_string().ends_with("not allocated"));
    }
}
