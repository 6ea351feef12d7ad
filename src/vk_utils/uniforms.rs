use ash::vk;

use super::VkBuffer;
use crate::app_error::{AppError, VkResultExt};

/*
https://vulkan-tutorial.com/Uniform_buffers/Descriptor_layout_and_buffer <3

Steps:
  1. Create descriptor pool. Specify how many descriptors will be allocated
  2. Allocate descriptor set(s) with a DescriptorSetLayout. Each descriptor set
     contains some number of uniform buffers, each assigned a `binding`.
  3. Connect the real data buffer to a (descriptor_set, binding) using `vkUpdateDescriptorSets`.
  4. Bind the descriptor sets before draw call: `vkCmdBindDescriptorSets`.

DescriptorSetLayout is required during:
- allocating descriptor set so we can bind the data
- creating pipeline layout
*/

/// Create layout for a single uniform buffer object.
/// That layout will be one of layouts gathered in DescriptorSetLayout.
pub fn create_ubo_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  vk::DescriptorSetLayoutBinding::builder()
    .binding(binding)
    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
    .descriptor_count(1)
    .stage_flags(stage_flags)
    .build()
}

pub fn create_descriptor_set_layout(
  device: &ash::Device,
  bindings: &[vk::DescriptorSetLayoutBinding],
) -> Result<vk::DescriptorSetLayout, AppError> {
  let create_info = vk::DescriptorSetLayoutCreateInfo::builder()
    .bindings(bindings)
    .build();
  unsafe { device.create_descriptor_set_layout(&create_info, None) }
    .check("vkCreateDescriptorSetLayout")
}

fn ubo_pool_sizes(ubo_count: u32) -> [vk::DescriptorPoolSize; 1] {
  [vk::DescriptorPoolSize {
    ty: vk::DescriptorType::UNIFORM_BUFFER,
    descriptor_count: ubo_count,
  }]
}

/// Pool for `max_sets` sets holding `ubo_count` uniform buffers in total
pub fn create_ubo_descriptor_pool(
  device: &ash::Device,
  ubo_count: u32,
  max_sets: u32,
) -> Result<vk::DescriptorPool, AppError> {
  let pool_sizes = ubo_pool_sizes(ubo_count);
  let create_info = vk::DescriptorPoolCreateInfo::builder()
    .pool_sizes(&pool_sizes)
    .max_sets(max_sets)
    .build();
  unsafe { device.create_descriptor_pool(&create_info, None) }.check("vkCreateDescriptorPool")
}

/// Freed together with the pool
pub fn allocate_descriptor_set(
  device: &ash::Device,
  pool: vk::DescriptorPool,
  layout: vk::DescriptorSetLayout,
) -> Result<vk::DescriptorSet, AppError> {
  let layouts = [layout];
  let alloc_info = vk::DescriptorSetAllocateInfo::builder()
    .descriptor_pool(pool)
    .set_layouts(&layouts)
    .build();
  let sets =
    unsafe { device.allocate_descriptor_sets(&alloc_info) }.check("vkAllocateDescriptorSets")?;
  Ok(sets[0])
}

fn ubo_buffer_info(buffer: &VkBuffer) -> vk::DescriptorBufferInfo {
  vk::DescriptorBufferInfo {
    buffer: buffer.buffer,
    offset: 0,
    range: buffer.size as u64,
  }
}

/// Point `binding` of `descriptor_set` at the whole `buffer`
pub fn bind_ubo_to_descriptor_set(
  device: &ash::Device,
  descriptor_set: vk::DescriptorSet,
  binding: u32,
  buffer: &VkBuffer,
) {
  // vk::WriteDescriptorSet keeps a pointer to this
  let buffer_infos = [ubo_buffer_info(buffer)];
  let write = vk::WriteDescriptorSet::builder()
    .dst_set(descriptor_set)
    .dst_binding(binding)
    .dst_array_element(0)
    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
    .buffer_info(&buffer_infos)
    .build();
  unsafe { device.update_descriptor_sets(&[write], &[]) };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ubo_binding_is_single_uniform_buffer() {
    let binding = create_ubo_binding(0, vk::ShaderStageFlags::VERTEX);
    assert_eq!(binding.binding, 0);
    assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(binding.descriptor_count, 1);
    assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
  }

  #[test]
  fn pool_has_room_for_requested_ubos() {
    let [size] = ubo_pool_sizes(3);
    assert_eq!(size.ty, vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(size.descriptor_count, 3);
  }
}
