use ash::vk;
use log::trace;
use vma::Alloc;

use super::one_shot::WithOneShotCommands;
use crate::app_error::{AppError, VkResultExt};

// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/quick_start.html
// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/choosing_memory_type.html

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum VkMemoryPreference {
  /// Usage: vertex, index buffers.
  GpuOnly,
  /// CPU-writable memory that is read on GPU. Host coherent, so no flush after write.
  ///
  /// Usage: Uniform buffers.
  GpuMappable,
  /// Temporary allocation used when copying CPU data to GPU-only memory.
  /// No guarantee if it's CPU or GPU. Nor should you care.
  ScratchTransfer,
}

fn determine_gpu_allocation_info(memory_pref: VkMemoryPreference) -> vma::AllocationCreateInfo {
  match memory_pref {
    VkMemoryPreference::GpuOnly => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      ..Default::default()
    },
    VkMemoryPreference::GpuMappable => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE,
      required_flags: vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
      ..Default::default()
    },
    VkMemoryPreference::ScratchTransfer => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::Auto,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE,
      ..Default::default()
    },
  }
}

pub struct VkBuffer {
  // For debugging
  pub name: String,
  /// Size in bytes
  pub size: usize,
  /// Native Vulkan buffer
  pub buffer: vk::Buffer,
  allocation: vma::Allocation,
}

impl VkBuffer {
  /// Allocate empty vulkan buffer
  pub fn empty(
    name: String,
    size: usize,
    usage: vk::BufferUsageFlags,
    allocator: &vma::Allocator,
    memory_pref: VkMemoryPreference,
  ) -> Result<Self, AppError> {
    let buffer_info = vk::BufferCreateInfo::builder()
      .size(size as u64)
      .usage(usage)
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .build();
    let alloc_info = determine_gpu_allocation_info(memory_pref);

    let (buffer, allocation) =
      unsafe { allocator.create_buffer(&buffer_info, &alloc_info) }.check("vmaCreateBuffer")?;
    trace!("Allocated buffer '{}' ({} bytes)", name, size);

    Ok(Self {
      name,
      size,
      buffer,
      allocation,
    })
  }

  /// Allocate GPU-only buffer and fill it with `bytes`. Goes through a temporary
  /// host-visible buffer and a one-shot copy command.
  pub fn from_data(
    name: String,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
    allocator: &vma::Allocator,
    uploader: &impl WithOneShotCommands,
  ) -> Result<Self, AppError> {
    let size = bytes.len();

    let mut scratch = VkBuffer::empty(
      format!("{}-scratch", name),
      size,
      vk::BufferUsageFlags::TRANSFER_SRC,
      allocator,
      VkMemoryPreference::ScratchTransfer,
    )?;
    let upload = scratch
      .write_mapped(allocator, bytes)
      .and_then(|_| {
        VkBuffer::empty(
          name,
          size,
          usage | vk::BufferUsageFlags::TRANSFER_DST,
          allocator,
          VkMemoryPreference::GpuOnly,
        )
      })
      .and_then(|mut buffer| {
        let copy = uploader.run_once(|device, cmd_buf| {
          let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: size as u64,
          };
          unsafe { device.cmd_copy_buffer(cmd_buf, scratch.buffer, buffer.buffer, &[region]) };
        });
        match copy {
          Ok(_) => Ok(buffer),
          Err(e) => {
            unsafe { buffer.delete(allocator) };
            Err(e)
          }
        }
      });

    unsafe { scratch.delete(allocator) };
    upload
  }

  /// Map, copy `bytes` to the start of the buffer, unmap
  pub fn write_mapped(&mut self, allocator: &vma::Allocator, bytes: &[u8]) -> Result<(), AppError> {
    assert!(
      bytes.len() <= self.size,
      "Tried to write {} bytes to buffer '{}' of {} bytes",
      bytes.len(),
      self.name,
      self.size
    );

    let pointer = unsafe { allocator.map_memory(&mut self.allocation) }.check("vmaMapMemory")?;
    unsafe {
      let slice = std::slice::from_raw_parts_mut(pointer, bytes.len());
      slice.copy_from_slice(bytes);
      allocator.unmap_memory(&mut self.allocation);
    }
    Ok(())
  }

  pub unsafe fn delete(&mut self, allocator: &vma::Allocator) -> () {
    allocator.destroy_buffer(self.buffer, &mut self.allocation)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mappable_memory_is_host_coherent() {
    let info = determine_gpu_allocation_info(VkMemoryPreference::GpuMappable);
    assert!(info
      .required_flags
      .contains(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT));
    assert!(info
      .flags
      .contains(vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE));
  }

  #[test]
  fn gpu_only_memory_is_not_host_accessed() {
    let info = determine_gpu_allocation_info(VkMemoryPreference::GpuOnly);
    assert!(info.required_flags.is_empty());
    assert!(!info
      .flags
      .contains(vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE));
  }
}
