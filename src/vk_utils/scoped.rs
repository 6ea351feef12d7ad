use ash::vk;

use crate::app_error::{AppError, VkResultExt};

// Wrappers that release the Vulkan object when they go out of scope.
// Used for short lived objects, so that `?` in the middle of a function does not leak.

pub struct ScopedFence<'a> {
  device: &'a ash::Device,
  pub fence: vk::Fence,
}

impl<'a> ScopedFence<'a> {
  pub fn new(device: &'a ash::Device, flags: vk::FenceCreateFlags) -> Result<Self, AppError> {
    let create_info = vk::FenceCreateInfo::builder().flags(flags).build();
    let fence = unsafe { device.create_fence(&create_info, None) }.check("vkCreateFence")?;
    Ok(Self { device, fence })
  }
}

impl<'a> Drop for ScopedFence<'a> {
  fn drop(&mut self) {
    unsafe { self.device.destroy_fence(self.fence, None) };
  }
}

pub struct ScopedCommandBuffer<'a> {
  device: &'a ash::Device,
  pool: vk::CommandPool,
  pub cmd_buf: vk::CommandBuffer,
}

impl<'a> ScopedCommandBuffer<'a> {
  /// Allocate single primary command buffer
  pub fn allocate(device: &'a ash::Device, pool: vk::CommandPool) -> Result<Self, AppError> {
    let alloc_info = vk::CommandBufferAllocateInfo::builder()
      .command_buffer_count(1)
      .command_pool(pool)
      .level(vk::CommandBufferLevel::PRIMARY)
      .build();
    let cmd_bufs =
      unsafe { device.allocate_command_buffers(&alloc_info) }.check("vkAllocateCommandBuffers")?;

    Ok(Self {
      device,
      pool,
      cmd_buf: cmd_bufs[0],
    })
  }
}

impl<'a> Drop for ScopedCommandBuffer<'a> {
  fn drop(&mut self) {
    unsafe {
      self
        .device
        .free_command_buffers(self.pool, std::slice::from_ref(&self.cmd_buf))
    };
  }
}

pub struct ScopedImage<'a> {
  device: &'a ash::Device,
  pub image: vk::Image,
}

impl<'a> ScopedImage<'a> {
  pub fn new(device: &'a ash::Device, create_info: &vk::ImageCreateInfo) -> Result<Self, AppError> {
    let image = unsafe { device.create_image(create_info, None) }.check("vkCreateImage")?;
    Ok(Self { device, image })
  }
}

impl<'a> Drop for ScopedImage<'a> {
  fn drop(&mut self) {
    unsafe { self.device.destroy_image(self.image, None) };
  }
}

pub struct ScopedMemory<'a> {
  device: &'a ash::Device,
  pub memory: vk::DeviceMemory,
}

impl<'a> ScopedMemory<'a> {
  pub fn allocate(
    device: &'a ash::Device,
    size: vk::DeviceSize,
    memory_type_index: u32,
  ) -> Result<Self, AppError> {
    let alloc_info = vk::MemoryAllocateInfo::builder()
      .allocation_size(size)
      .memory_type_index(memory_type_index)
      .build();
    let memory = unsafe { device.allocate_memory(&alloc_info, None) }.check("vkAllocateMemory")?;
    Ok(Self { device, memory })
  }

  /// Map whole allocation. `size` is how many bytes the returned view exposes.
  pub fn map(&self, size: usize) -> Result<MappedMemory<'_>, AppError> {
    let ptr = unsafe {
      self
        .device
        .map_memory(self.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
    }
    .check("vkMapMemory")?;

    Ok(MappedMemory {
      device: self.device,
      memory: self.memory,
      ptr: ptr as *const u8,
      size,
    })
  }
}

impl<'a> Drop for ScopedMemory<'a> {
  fn drop(&mut self) {
    unsafe { self.device.free_memory(self.memory, None) };
  }
}

/// Host view of mapped `vk::DeviceMemory`. Unmapped on drop.
pub struct MappedMemory<'a> {
  device: &'a ash::Device,
  memory: vk::DeviceMemory,
  ptr: *const u8,
  size: usize,
}

impl<'a> MappedMemory<'a> {
  /// Bytes starting at `offset` till the end of mapped range
  pub fn bytes_from(&self, offset: usize) -> &[u8] {
    assert!(
      offset <= self.size,
      "Offset {} is past mapped range of {} bytes",
      offset,
      self.size
    );
    let all = unsafe { std::slice::from_raw_parts(self.ptr, self.size) };
    &all[offset..]
  }
}

impl<'a> Drop for MappedMemory<'a> {
  fn drop(&mut self) {
    unsafe { self.device.unmap_memory(self.memory) };
  }
}
