use ash::vk;

use crate::app_error::AppError;

/// Pick the lowest memory type index that is allowed by `type_bits`
/// (from `vk::MemoryRequirements`) and has all of the `required` property flags.
///
/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPhysicalDeviceMemoryProperties.html
pub fn select_memory_type(
  memory_props: &vk::PhysicalDeviceMemoryProperties,
  type_bits: u32,
  required: vk::MemoryPropertyFlags,
) -> Result<u32, AppError> {
  let type_count = (memory_props.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);

  memory_props.memory_types[..type_count]
    .iter()
    .enumerate()
    .find(|&(idx, mem_type)| {
      let allowed = (type_bits >> idx) & 1 == 1;
      allowed && mem_type.property_flags.contains(required)
    })
    .map(|(idx, _)| idx as u32)
    .ok_or(AppError::NoSuitableMemoryType {
      type_bits,
      required,
    })
}
