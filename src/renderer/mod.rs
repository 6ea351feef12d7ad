mod frame_sync;
mod pixel_dump;
mod render_loop;
mod screenshot;
mod triangle;
mod triangle_ubo;

#[cfg(test)]
mod test_utils;

pub use frame_sync::*;
pub use pixel_dump::*;
pub use render_loop::*;
pub use screenshot::*;
pub use triangle::*;
pub use triangle_ubo::*;
