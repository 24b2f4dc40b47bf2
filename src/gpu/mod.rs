mod buffers;
mod context;
mod memory_texture;
mod utils;

pub use buffers::*;
pub use context::*;
pub use memory_texture::*;
pub use utils::*;
