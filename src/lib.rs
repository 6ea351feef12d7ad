//! Single triangle rendered with Vulkan. Press `P` to save the presented frame
//! to a PPM file.

pub mod app_error;
pub mod app_input;
pub mod app_timer;
pub mod config;
pub mod renderer;
pub mod vk_ctx;
pub mod vk_utils;
