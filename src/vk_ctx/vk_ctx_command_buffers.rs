use ash::vk;

use crate::app_error::AppError;
use crate::vk_utils::create_command_buffers;

pub struct VkCtxCommandBuffers {
  /// Also source of one-shot command buffers
  pub pool: vk::CommandPool,
  // one per each swapchain image:
  pub cmd_buffers: Vec<vk::CommandBuffer>,
}

impl VkCtxCommandBuffers {
  pub unsafe fn reallocate(&mut self, device: &ash::Device, count: usize) -> Result<(), AppError> {
    if !self.cmd_buffers.is_empty() {
      device.free_command_buffers(self.pool, &self.cmd_buffers);
    }
    self.cmd_buffers = create_command_buffers(device, self.pool, count)?;
    Ok(())
  }

  pub unsafe fn destroy(&self, device: &ash::Device) {
    // also frees command buffers
    device.destroy_command_pool(self.pool, None);
  }
}
