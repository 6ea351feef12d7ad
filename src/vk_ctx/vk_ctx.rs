use log::{info, trace};
use std::mem::ManuallyDrop;

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Surface;
use ash::vk;

use super::*;
use crate::app_error::{AppError, VkResultExt};
use crate::vk_utils::{
  create_swapchain_images, create_swapchain_khr, execute_one_shot, get_surface_capabilities,
  get_swapchain_extent, SwapchainCreateParams, WithOneShotCommands,
};

/** Kitchen sink for Vulkan stuff */
pub struct VkCtx {
  pub entry: ash::Entry,
  pub instance: ash::Instance,
  pub swapchain: VkCtxSwapchain,
  pub synchronize: VkCtxSynchronize,
  pub device: VkCtxDevice,
  pub command_buffers: VkCtxCommandBuffers,
  /// Has to be dropped before the device
  pub allocator: ManuallyDrop<vma::Allocator>,

  // surface
  pub surface_loader: Surface,
  pub surface_khr: vk::SurfaceKHR,

  // debug
  pub debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,

  // timeouts
  pub one_shot_timeout_ns: u64,
  pub frame_timeout_ns: u64,
}

impl VkCtx {
  pub fn frames_in_flight(&self) -> usize {
    self.swapchain.image_count()
  }

  pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
    unsafe {
      self
        .instance
        .get_physical_device_format_properties(self.device.phys_device, format)
    }
  }

  /// Rebuild swapchain for new window size. Also recreates everything
  /// that depends on image count (per-slot fences and command buffers).
  pub fn recreate_swapchain(&mut self, window_size: vk::Extent2D) -> Result<(), AppError> {
    let device = &self.device.device;
    unsafe { device.device_wait_idle() }.check("vkDeviceWaitIdle")?;

    let surface_capabilities = get_surface_capabilities(
      self.device.phys_device,
      &self.surface_loader,
      self.surface_khr,
    )?;
    let size = get_swapchain_extent(&surface_capabilities, window_size);
    trace!("Recreating swapchain with size {:?}", size);

    let old_swapchain = self.swapchain.swapchain;
    let swapchain = create_swapchain_khr(
      &self.swapchain.swapchain_loader,
      &SwapchainCreateParams {
        surface_khr: self.surface_khr,
        surface_format: self.swapchain.surface_format,
        surface_capabilities,
        size,
        present_mode: self.swapchain.present_mode,
        old_swapchain,
      },
    )?;
    unsafe { self.swapchain.destroy(device) };
    self.swapchain.swapchain = swapchain;
    self.swapchain.size = size;

    let (images, image_views) = create_swapchain_images(
      &self.swapchain.swapchain_loader,
      swapchain,
      device,
      self.swapchain.surface_format.format,
    )?;
    self.swapchain.images = images;
    self.swapchain.image_views = image_views;

    let frames_in_flight = self.swapchain.image_count();
    unsafe {
      self.synchronize.recreate_fences(device, frames_in_flight)?;
      self.command_buffers.reallocate(device, frames_in_flight)?;
    }
    info!(
      "Swapchain recreated: {}x{}, {} images",
      size.width, size.height, frames_in_flight
    );
    Ok(())
  }

  pub unsafe fn destroy(&mut self) {
    info!("VkCtx::destroy()");
    let device = &self.device.device;
    if let Err(e) = device.device_wait_idle() {
      log::warn!("vkDeviceWaitIdle failed during shutdown: {:?}", e);
    }

    self.synchronize.destroy(device);
    self.command_buffers.destroy(device);
    self.swapchain.destroy(device);
    self.surface_loader.destroy_surface(self.surface_khr, None);
    ManuallyDrop::drop(&mut self.allocator);

    if let Some((debug_utils_loader, debug_messenger)) = &self.debug_utils {
      debug_utils_loader.destroy_debug_utils_messenger(*debug_messenger, None);
    }

    self.device.destroy();

    self.instance.destroy_instance(None);
    info!("VkCtx::destroy() finished");
  }
}

impl WithOneShotCommands for VkCtx {
  fn run_once<R>(
    &self,
    record: impl FnOnce(&ash::Device, vk::CommandBuffer) -> R,
  ) -> Result<R, AppError> {
    execute_one_shot(
      &self.device.device,
      self.command_buffers.pool,
      self.device.queue,
      self.one_shot_timeout_ns,
      record,
    )
  }
}
