use ash::vk;

use crate::app_error::AppError;

/*
https://github.com/KhronosGroup/Vulkan-Docs/wiki/Synchronization-Examples
https://gpuopen.com/learn/vulkan-barriers-explained/
*/

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkImageMemoryBarrier.html
pub fn create_image_barrier(
  image: vk::Image,
  aspect_mask: vk::ImageAspectFlags,
  old_layout: vk::ImageLayout,
  new_layout: vk::ImageLayout,
  src_access_mask: vk::AccessFlags,
  dst_access_mask: vk::AccessFlags,
) -> vk::ImageMemoryBarrier {
  vk::ImageMemoryBarrier::builder()
    .old_layout(old_layout)
    .new_layout(new_layout)
    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    .image(image)
    .src_access_mask(src_access_mask)
    .dst_access_mask(dst_access_mask)
    .subresource_range(vk::ImageSubresourceRange {
      aspect_mask,
      base_mip_level: 0,
      level_count: 1, // vk::REMAINING_MIP_LEVELS
      base_array_layer: 0,
      layer_count: 1, // vk::REMAINING_ARRAY_LAYERS
    })
    .build()
}

/// Record single image barrier between 2 pipeline stages
pub unsafe fn cmd_image_barrier(
  device: &ash::Device,
  command_buffer: vk::CommandBuffer,
  src_stage_mask: vk::PipelineStageFlags,
  dst_stage_mask: vk::PipelineStageFlags,
  barrier: vk::ImageMemoryBarrier,
) {
  device.cmd_pipeline_barrier(
    command_buffer,
    src_stage_mask,
    dst_stage_mask,
    vk::DependencyFlags::empty(),
    &[],
    &[],
    &[barrier],
  );
}

/// Block until fence is signaled. Timeout is reported as `AppError::DeviceLost`.
pub fn wait_for_fence(
  device: &ash::Device,
  fence: vk::Fence,
  timeout_ns: u64,
) -> Result<(), AppError> {
  let result = unsafe { device.wait_for_fences(&[fence], true, timeout_ns) };
  map_fence_wait_result(result)
}

fn map_fence_wait_result(result: ash::prelude::VkResult<()>) -> Result<(), AppError> {
  match result {
    Ok(_) => Ok(()),
    Err(vk::Result::TIMEOUT) => Err(AppError::DeviceLost {
      call: "vkWaitForFences",
    }),
    Err(e) => Err(AppError::vk("vkWaitForFences", e)),
  }
}
