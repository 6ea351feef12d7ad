use ash::vk;

use crate::app_error::AppError;
use crate::renderer::FrameSyncObjects;
use crate::vk_utils::{create_fences, create_semaphore};

/// One semaphore pair for the whole session, one fence per swapchain image.
///
/// https://www.khronos.org/assets/uploads/developers/library/2016-vulkan-devday-uk/7-Keeping-your-GPU-fed.pdf
pub struct VkCtxSynchronize {
  pub present_complete_semaphore: vk::Semaphore,
  pub rendering_complete_semaphore: vk::Semaphore,
  // one per each swapchain image:
  pub draw_commands_fences: Vec<vk::Fence>,
}

impl VkCtxSynchronize {
  pub fn new(device: &ash::Device, frames_in_flight: usize) -> Result<Self, AppError> {
    Ok(Self {
      present_complete_semaphore: create_semaphore(device)?,
      rendering_complete_semaphore: create_semaphore(device)?,
      draw_commands_fences: create_fences(device, frames_in_flight)?,
    })
  }

  /// Swapchain image count can change after resize. Device has to be idle.
  pub unsafe fn recreate_fences(
    &mut self,
    device: &ash::Device,
    frames_in_flight: usize,
  ) -> Result<(), AppError> {
    self.destroy_fences(device);
    self.draw_commands_fences = create_fences(device, frames_in_flight)?;
    Ok(())
  }

  pub fn sync_objects(&self) -> FrameSyncObjects {
    FrameSyncObjects {
      image_acquired: self.present_complete_semaphore,
      render_complete: self.rendering_complete_semaphore,
      slot_fences: self.draw_commands_fences.clone(),
    }
  }

  unsafe fn destroy_fences(&mut self, device: &ash::Device) {
    for obj in self.draw_commands_fences.drain(..) {
      device.destroy_fence(obj, None)
    }
  }

  pub unsafe fn destroy(&mut self, device: &ash::Device) {
    device.destroy_semaphore(self.present_complete_semaphore, None);
    device.destroy_semaphore(self.rendering_complete_semaphore, None);
    self.destroy_fences(device);
  }
}
