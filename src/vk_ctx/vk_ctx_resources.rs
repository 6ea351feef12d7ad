use ash::vk;
use log::warn;

use super::*;
use crate::app_error::AppError;
use crate::vk_utils::debug::set_object_debug_label;
use crate::vk_utils::VkBuffer;

impl VkCtx {
  /// GPU-only buffer filled through a one-shot copy
  pub fn create_buffer_from_data(
    &self,
    name: String,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
  ) -> Result<VkBuffer, AppError> {
    let buffer = VkBuffer::from_data(name, bytes, usage, &self.allocator, self)?;
    self.assign_debug_label(buffer.buffer, &buffer.name);
    Ok(buffer)
  }

  pub fn assign_debug_label<H: vk::Handle>(&self, handle: H, name: &str) {
    if let Some((debug_utils_loader, _)) = &self.debug_utils {
      let device = self.device.device.handle();
      if let Err(e) = set_object_debug_label(debug_utils_loader, device, handle, name) {
        warn!("Could not set debug label '{}': {}", name, e);
      }
    }
  }
}
