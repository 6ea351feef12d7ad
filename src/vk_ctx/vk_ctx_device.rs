use ash::vk;

pub struct VkCtxDevice {
  pub phys_device: vk::PhysicalDevice,
  pub queue_family_index: u32,
  pub device: ash::Device,
  /// Graphics queue. Also used for present and transfers
  pub queue: vk::Queue,
  /// Queried once, used to pick memory for host-readable images
  pub memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl VkCtxDevice {
  pub unsafe fn destroy(&self) {
    self.device.destroy_device(None);
  }
}
