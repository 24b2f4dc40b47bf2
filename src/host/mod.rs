//! Host-side collaborators of the bridge.
//!
//! The host framework owns the scene; the bridge only reads it through [`HostRenderer`].

mod camera;
pub use camera::*;

mod light;
pub use light::*;

mod renderer;
pub use renderer::*;
