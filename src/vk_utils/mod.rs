// mostly inspired by:
// - https://github.com/zeux/niagara/tree/master/src
// - https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L256
pub mod debug;
mod device;
mod memory_type;
mod one_shot;
mod pipeline;
mod render_pass;
mod resources;
mod scoped;
mod swapchain;
mod synchronization;
mod uniforms;
mod vk_buffer;

pub use device::*;
pub use memory_type::*;
pub use one_shot::*;
pub use pipeline::*;
pub use render_pass::*;
pub use resources::*;
pub use scoped::*;
pub use swapchain::*;
pub use synchronization::*;
pub use uniforms::*;
pub use vk_buffer::*;
