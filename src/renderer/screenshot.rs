use std::path::PathBuf;

use ash::vk;
use log::{debug, info};

use super::pixel_dump::{
  blit_support, needs_channel_swizzle, write_pixel_dump_file, BLIT_DST_FORMAT,
};
use super::render_loop::FrameCapture;
use crate::app_error::{AppError, CaptureError, VkResultExt};
use crate::vk_ctx::VkCtx;
use crate::vk_utils::{
  cmd_image_barrier, create_image_barrier, select_memory_type, ScopedImage, ScopedMemory,
  WithOneShotCommands,
};

/// Linear, host-visible image the swapchain image is blitted/copied into.
/// Image is destroyed before its memory is freed (field order).
struct StagingCaptureImage<'a> {
  image: ScopedImage<'a>,
  memory: ScopedMemory<'a>,
  device: &'a ash::Device,
}

impl<'a> StagingCaptureImage<'a> {
  fn new(
    device: &'a ash::Device,
    memory_props: &vk::PhysicalDeviceMemoryProperties,
    size: vk::Extent2D,
  ) -> Result<Self, AppError> {
    let create_info = vk::ImageCreateInfo::builder()
      .image_type(vk::ImageType::TYPE_2D)
      .format(BLIT_DST_FORMAT)
      .extent(vk::Extent3D {
        width: size.width,
        height: size.height,
        depth: 1,
      })
      .mip_levels(1)
      .array_layers(1)
      .samples(vk::SampleCountFlags::TYPE_1)
      .tiling(vk::ImageTiling::LINEAR)
      .usage(vk::ImageUsageFlags::TRANSFER_DST)
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .initial_layout(vk::ImageLayout::UNDEFINED)
      .build();
    let image = ScopedImage::new(device, &create_info)?;

    let mem_reqs = unsafe { device.get_image_memory_requirements(image.image) };
    let memory_type_index = select_memory_type(
      memory_props,
      mem_reqs.memory_type_bits,
      vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )?;
    let memory = ScopedMemory::allocate(device, mem_reqs.size, memory_type_index)?;
    unsafe { device.bind_image_memory(image.image, memory.memory, 0) }
      .check("vkBindImageMemory")?;

    Ok(Self {
      image,
      memory,
      device,
    })
  }

  fn subresource_layout(&self) -> vk::SubresourceLayout {
    let subresource = vk::ImageSubresource {
      aspect_mask: vk::ImageAspectFlags::COLOR,
      mip_level: 0,
      array_layer: 0,
    };
    unsafe {
      self
        .device
        .get_image_subresource_layout(self.image.image, subresource)
    }
  }
}

/// Layout transitions around the transfer. All in TRANSFER stage.
struct CaptureBarriers {
  /// staging: UNDEFINED -> TRANSFER_DST, swapchain: PRESENT_SRC -> TRANSFER_SRC
  before: [vk::ImageMemoryBarrier; 2],
  /// staging: TRANSFER_DST -> GENERAL, swapchain: TRANSFER_SRC -> PRESENT_SRC
  after: [vk::ImageMemoryBarrier; 2],
}

fn capture_barriers(src_image: vk::Image, dst_image: vk::Image) -> CaptureBarriers {
  let color = vk::ImageAspectFlags::COLOR;
  CaptureBarriers {
    before: [
      create_image_barrier(
        dst_image,
        color,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
      ),
      create_image_barrier(
        src_image,
        color,
        vk::ImageLayout::PRESENT_SRC_KHR,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::MEMORY_READ,
        vk::AccessFlags::TRANSFER_READ,
      ),
    ],
    after: [
      create_image_barrier(
        dst_image,
        color,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::GENERAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::MEMORY_READ,
      ),
      create_image_barrier(
        src_image,
        color,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::ImageLayout::PRESENT_SRC_KHR,
        vk::AccessFlags::TRANSFER_READ,
        vk::AccessFlags::MEMORY_READ,
      ),
    ],
  }
}

fn color_subresource_layers() -> vk::ImageSubresourceLayers {
  vk::ImageSubresourceLayers {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    mip_level: 0,
    base_array_layer: 0,
    layer_count: 1,
  }
}

/// Full extent, no scaling
fn blit_region(size: vk::Extent2D) -> vk::ImageBlit {
  let far_corner = vk::Offset3D {
    x: size.width as i32,
    y: size.height as i32,
    z: 1,
  };
  vk::ImageBlit {
    src_subresource: color_subresource_layers(),
    src_offsets: [vk::Offset3D::default(), far_corner],
    dst_subresource: color_subresource_layers(),
    dst_offsets: [vk::Offset3D::default(), far_corner],
  }
}

fn copy_region(size: vk::Extent2D) -> vk::ImageCopy {
  vk::ImageCopy {
    src_subresource: color_subresource_layers(),
    src_offset: vk::Offset3D::default(),
    dst_subresource: color_subresource_layers(),
    dst_offset: vk::Offset3D::default(),
    extent: vk::Extent3D {
      width: size.width,
      height: size.height,
      depth: 1,
    },
  }
}

unsafe fn record_capture_commands(
  device: &ash::Device,
  cmd_buf: vk::CommandBuffer,
  src_image: vk::Image,
  dst_image: vk::Image,
  size: vk::Extent2D,
  supports_blit: bool,
) {
  let barriers = capture_barriers(src_image, dst_image);
  let transfer = vk::PipelineStageFlags::TRANSFER;

  for barrier in barriers.before.iter() {
    cmd_image_barrier(device, cmd_buf, transfer, transfer, *barrier);
  }

  if supports_blit {
    device.cmd_blit_image(
      cmd_buf,
      src_image,
      vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
      dst_image,
      vk::ImageLayout::TRANSFER_DST_OPTIMAL,
      &[blit_region(size)],
      vk::Filter::NEAREST,
    );
  } else {
    // no format conversion, channel order fixed when writing the file
    device.cmd_copy_image(
      cmd_buf,
      src_image,
      vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
      dst_image,
      vk::ImageLayout::TRANSFER_DST_OPTIMAL,
      &[copy_region(size)],
    );
  }

  for barrier in barriers.after.iter() {
    cmd_image_barrier(device, cmd_buf, transfer, transfer, *barrier);
  }
}

/// Reads presented swapchain image back to CPU and saves it as PPM.
///
/// Swapchain images have to be created with `TRANSFER_SRC` usage.
/// Call only after the slot's rendering finished (its fence is signaled).
pub struct ScreenshotCapturer<'a> {
  ctx: &'a VkCtx,
  output_path: PathBuf,
}

impl<'a> ScreenshotCapturer<'a> {
  pub fn new(ctx: &'a VkCtx, output_path: PathBuf) -> Self {
    Self { ctx, output_path }
  }

  fn io_error(&self, source: std::io::Error) -> CaptureError {
    CaptureError::Io {
      path: self.output_path.clone(),
      source,
    }
  }
}

impl<'a> FrameCapture for ScreenshotCapturer<'a> {
  fn capture_slot(&mut self, slot: usize) -> Result<(), CaptureError> {
    let ctx = self.ctx;
    let device = &ctx.device.device;
    let src_image = ctx.swapchain.image(slot);
    let src_format = ctx.swapchain.surface_format.format;
    let size = ctx.swapchain.size;

    let supports_blit = blit_support(
      &ctx.format_properties(src_format),
      &ctx.format_properties(BLIT_DST_FORMAT),
    );
    let swizzle = needs_channel_swizzle(supports_blit, src_format);
    debug!(
      "Capturing swapchain image {} ({}x{}, {:?}), blit={}, swizzle={}",
      slot, size.width, size.height, src_format, supports_blit, swizzle
    );

    let staging = StagingCaptureImage::new(device, &ctx.device.memory_properties, size)?;
    let dst_image = staging.image.image;
    ctx.run_once(|device, cmd_buf| unsafe {
      record_capture_commands(device, cmd_buf, src_image, dst_image, size, supports_blit)
    })?;

    let layout = staging.subresource_layout();
    let mapped = staging.memory.map((layout.offset + layout.size) as usize)?;
    let pixels = mapped.bytes_from(layout.offset as usize);

    write_pixel_dump_file(
      &self.output_path,
      size.width,
      size.height,
      pixels,
      layout.row_pitch as usize,
      swizzle,
    )
    .map_err(|e| self.io_error(e))?;

    info!("Screenshot saved to disk: '{}'", self.output_path.display());
    Ok(())
  }
}
