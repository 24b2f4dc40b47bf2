//! The render context bridge.
//!
//! Mirrors host renderer state on the host side, uploads it together with the frame buffer
//! it owns for a kernel invocation and hands the result back to the host.

mod render_info;
pub use render_info::*;

mod lighting;
pub use lighting::*;

mod state;
pub use state::*;

mod host_state;
pub use host_state::*;

mod frame_buffer;
pub use frame_buffer::*;

#[allow(clippy::module_inception)]
mod bridge;
pub use bridge::*;

mod bound_frame;
pub use bound_frame::*;
