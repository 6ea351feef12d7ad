use ash::vk;

use super::VkCtx;
use crate::app_error::{AppError, VkResultExt};
use crate::renderer::{AcquireOutcome, FrameBackend, PresentOutcome, SlotSubmission};
use crate::vk_utils::wait_for_fence;

fn map_acquire_result(result: ash::prelude::VkResult<(u32, bool)>) -> Result<AcquireOutcome, AppError> {
  match result {
    Ok((image_idx, suboptimal)) => Ok(AcquireOutcome::Acquired {
      slot: image_idx as usize,
      suboptimal,
    }),
    Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
    Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => Err(AppError::DeviceLost {
      call: "vkAcquireNextImageKHR",
    }),
    Err(e) => Err(AppError::vk("vkAcquireNextImageKHR", e)),
  }
}

fn map_present_result(result: ash::prelude::VkResult<bool>) -> Result<PresentOutcome, AppError> {
  match result {
    Ok(false) => Ok(PresentOutcome::Presented),
    Ok(true) => Ok(PresentOutcome::Suboptimal),
    Err(e) => Err(AppError::vk("vkQueuePresentKHR", e)),
  }
}

impl FrameBackend for VkCtx {
  fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<AcquireOutcome, AppError> {
    let result = unsafe {
      self.swapchain.swapchain_loader.acquire_next_image(
        self.swapchain.swapchain,
        self.frame_timeout_ns,
        signal,
        vk::Fence::null(),
      )
    };
    map_acquire_result(result)
  }

  fn wait_for_fence(&self, fence: vk::Fence) -> Result<(), AppError> {
    wait_for_fence(&self.device.device, fence, self.frame_timeout_ns)
  }

  fn reset_fence(&self, fence: vk::Fence) -> Result<(), AppError> {
    unsafe { self.device.device.reset_fences(&[fence]) }.check("vkResetFences")
  }

  fn submit(&self, submission: &SlotSubmission) -> Result<(), AppError> {
    let wait_semaphores = [submission.wait_semaphore];
    let wait_stages = [submission.wait_stage];
    let command_buffers = [submission.command_buffer];
    let signal_semaphores = [submission.signal_semaphore];
    let submit_info = vk::SubmitInfo::builder()
      .wait_semaphores(&wait_semaphores)
      .wait_dst_stage_mask(&wait_stages)
      .command_buffers(&command_buffers)
      .signal_semaphores(&signal_semaphores)
      .build();

    unsafe {
      self
        .device
        .device
        .queue_submit(self.device.queue, &[submit_info], submission.fence)
    }
    .check("vkQueueSubmit")
  }

  fn present(&self, slot: usize, wait: vk::Semaphore) -> Result<PresentOutcome, AppError> {
    let wait_semaphores = [wait];
    let swapchains = [self.swapchain.swapchain];
    let image_indices = [slot as u32];
    let present_info = vk::PresentInfoKHR::builder()
      .wait_semaphores(&wait_semaphores)
      .swapchains(&swapchains)
      .image_indices(&image_indices)
      .build();

    let result = unsafe {
      self
        .swapchain
        .swapchain_loader
        .queue_present(self.device.queue, &present_info)
    };
    map_present_result(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acquire_out_of_date_is_not_an_error() {
    assert_eq!(
      map_acquire_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
      AcquireOutcome::OutOfDate
    );
    assert_eq!(
      map_acquire_result(Ok((2, true))).unwrap(),
      AcquireOutcome::Acquired {
        slot: 2,
        suboptimal: true
      }
    );
  }

  #[test]
  fn acquire_timeout_is_device_lost() {
    let err = map_acquire_result(Err(vk::Result::TIMEOUT)).unwrap_err();
    assert!(matches!(err, AppError::DeviceLost { .. }));
  }

  #[test]
  fn present_accepts_only_success_and_suboptimal() {
    assert_eq!(map_present_result(Ok(false)).unwrap(), PresentOutcome::Presented);
    assert_eq!(map_present_result(Ok(true)).unwrap(), PresentOutcome::Suboptimal);
    assert!(map_present_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).is_err());
    assert!(map_present_result(Err(vk::Result::ERROR_SURFACE_LOST_KHR)).is_err());
  }
}
