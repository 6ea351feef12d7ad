use ash::vk;

use crate::app_error::{AppError, VkResultExt};

// https://github.com/zeux/niagara/blob/master/src/resources.cpp

pub fn create_image_view(
  device: &ash::Device,
  image: vk::Image,
  image_format: vk::Format,
  aspect_mask_flags: vk::ImageAspectFlags,
) -> Result<vk::ImageView, AppError> {
  let subresource_range = vk::ImageSubresourceRange::builder()
    .aspect_mask(aspect_mask_flags)
    .base_array_layer(0)
    .layer_count(1)
    .base_mip_level(0)
    .level_count(1)
    .build();

  let create_info = vk::ImageViewCreateInfo::builder()
    .image(image)
    .view_type(vk::ImageViewType::TYPE_2D)
    .format(image_format)
    .subresource_range(subresource_range)
    .build();

  unsafe { device.create_image_view(&create_info, None) }.check("vkCreateImageView")
}

pub fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore, AppError> {
  let semaphore_create_info = vk::SemaphoreCreateInfo::builder()
    .flags(vk::SemaphoreCreateFlags::empty())
    .build();
  unsafe { device.create_semaphore(&semaphore_create_info, None) }.check("vkCreateSemaphore")
}

/// Fences start signaled, so the very first wait on each does not block
pub fn create_fences(device: &ash::Device, count: usize) -> Result<Vec<vk::Fence>, AppError> {
  let create_info = vk::FenceCreateInfo::builder()
    .flags(vk::FenceCreateFlags::SIGNALED)
    .build();

  (0..count)
    .map(|_| unsafe { device.create_fence(&create_info, None) }.check("vkCreateFence"))
    .collect()
}

pub fn create_viewport(size: &vk::Extent2D) -> vk::Viewport {
  vk::Viewport {
    x: 0f32,
    y: 0f32,
    width: size.width as f32,
    height: size.height as f32,
    min_depth: 0f32,
    max_depth: 1.0f32,
  }
}

pub fn size_to_rect_vk(size: &vk::Extent2D) -> vk::Rect2D {
  vk::Rect2D {
    offset: vk::Offset2D { x: 0, y: 0 },
    extent: *size,
  }
}

pub fn create_command_pool(
  device: &ash::Device,
  queue_family_index: u32,
) -> Result<vk::CommandPool, AppError> {
  // per-slot buffers are re-recorded after resize, so they have to be resettable
  let cmd_pool_create_info = vk::CommandPoolCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
    .build();

  unsafe { device.create_command_pool(&cmd_pool_create_info, None) }.check("vkCreateCommandPool")
}

pub fn create_command_buffers(
  device: &ash::Device,
  cmd_pool: vk::CommandPool,
  count: usize,
) -> Result<Vec<vk::CommandBuffer>, AppError> {
  let cmd_buf_create_info = vk::CommandBufferAllocateInfo::builder()
    .command_buffer_count(count as u32)
    .command_pool(cmd_pool)
    .level(vk::CommandBufferLevel::PRIMARY)
    .build();

  unsafe { device.allocate_command_buffers(&cmd_buf_create_info) }
    .check("vkAllocateCommandBuffers")
}

pub fn create_framebuffer(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  image_views: &[vk::ImageView],
  size: &vk::Extent2D,
) -> Result<vk::Framebuffer, AppError> {
  let create_info = vk::FramebufferCreateInfo::builder()
    .render_pass(render_pass)
    .attachments(image_views)
    .width(size.width)
    .height(size.height)
    .layers(1)
    .build();

  unsafe { device.create_framebuffer(&create_info, None) }.check("vkCreateFramebuffer")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn viewport_covers_whole_surface() {
    let size = vk::Extent2D {
      width: 1280,
      height: 720,
    };
    let vp = create_viewport(&size);
    assert_eq!((vp.width, vp.height), (1280.0, 720.0));
    assert_eq!(size_to_rect_vk(&size).extent.width, 1280);
  }
}
