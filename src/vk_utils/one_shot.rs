use ash::vk;
use log::{trace, warn};

use super::scoped::{ScopedCommandBuffer, ScopedFence};
use super::synchronization::wait_for_fence;
use crate::app_error::{AppError, VkResultExt};

/// Anything that can record, submit and wait for a throwaway command buffer.
/// Used for resource uploads and screenshot copies.
pub trait WithOneShotCommands {
  fn run_once<R>(
    &self,
    record: impl FnOnce(&ash::Device, vk::CommandBuffer) -> R,
  ) -> Result<R, AppError>;
}

/// Allocate a primary command buffer, let `record` fill it, submit and block
/// until its private fence signals. Fence and command buffer are released on every path.
pub fn execute_one_shot<R>(
  device: &ash::Device,
  pool: vk::CommandPool,
  queue: vk::Queue,
  timeout_ns: u64,
  record: impl FnOnce(&ash::Device, vk::CommandBuffer) -> R,
) -> Result<R, AppError> {
  let cmd_buf = ScopedCommandBuffer::allocate(device, pool)?;

  let begin_info = vk::CommandBufferBeginInfo::builder()
    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
    .build();
  unsafe { device.begin_command_buffer(cmd_buf.cmd_buf, &begin_info) }
    .check("vkBeginCommandBuffer")?;

  let result = record(device, cmd_buf.cmd_buf);

  unsafe { device.end_command_buffer(cmd_buf.cmd_buf) }.check("vkEndCommandBuffer")?;

  let fence = ScopedFence::new(device, vk::FenceCreateFlags::empty())?;
  let submit_info = vk::SubmitInfo::builder()
    .command_buffers(std::slice::from_ref(&cmd_buf.cmd_buf))
    .build();
  unsafe { device.queue_submit(queue, &[submit_info], fence.fence) }.check("vkQueueSubmit")?;

  trace!("One-shot commands submitted, waiting for fence");
  if let Err(e) = wait_for_fence(device, fence.fence, timeout_ns) {
    if submission_may_be_pending(&e) {
      // GPU can still use both. Command buffer goes away with its pool on teardown.
      warn!("One-shot submission did not finish, leaking its fence and command buffer");
      std::mem::forget(fence);
      std::mem::forget(cmd_buf);
    }
    return Err(e);
  }

  Ok(result)
}

/// Wait gave up before the fence signaled
fn submission_may_be_pending(err: &AppError) -> bool {
  matches!(err, AppError::DeviceLost { .. })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timed_out_wait_keeps_handles_alive() {
    let timeout = AppError::DeviceLost {
      call: "vkWaitForFences",
    };
    assert!(submission_may_be_pending(&timeout));
  }

  #[test]
  fn failed_wait_releases_handles() {
    let lost = AppError::vk("vkWaitForFences", vk::Result::ERROR_DEVICE_LOST);
    assert!(!submission_may_be_pending(&lost));
  }
}
