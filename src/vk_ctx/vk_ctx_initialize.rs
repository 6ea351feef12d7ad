use log::{info, trace};
use std::mem::ManuallyDrop;

use ash::extensions::khr::{Surface, Swapchain};
use ash::vk;
use raw_window_handle::HasRawDisplayHandle;

use super::*;
use crate::app_error::{AppError, VkResultExt};
use crate::config::Config;
use crate::vk_utils::debug::setup_debug_reporting;
use crate::vk_utils::*;

fn get_window_size(window: &winit::window::Window) -> vk::Extent2D {
  let size = window.inner_size();
  vk::Extent2D {
    width: size.width,
    height: size.height,
  }
}

// https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L332
pub fn vk_ctx_initialize(
  window: &winit::window::Window,
  config: &Config,
) -> Result<VkCtx, AppError> {
  let (entry, instance) = create_instance(window.raw_display_handle(), config.graphics_debugging)?;
  let debug_utils = if config.graphics_debugging {
    Some(setup_debug_reporting(&entry, &instance)?)
  } else {
    None
  };

  // surface data
  let surface_loader = Surface::new(&entry, &instance);
  let surface_khr = create_surface_khr(&entry, &instance, window)?; // real OS-backed thing

  // devices
  let (phys_device, queue_family_index) =
    pick_physical_device_and_queue_family_idx(&instance, &surface_loader, surface_khr)?;
  let (device, queue) = pick_device_and_queue(&instance, phys_device, queue_family_index)?;
  let memory_properties = unsafe { instance.get_physical_device_memory_properties(phys_device) };

  // swapchain - prepare
  let surface_format = get_swapchain_format(&surface_loader, surface_khr, phys_device)?;
  let surface_capabilities = get_surface_capabilities(phys_device, &surface_loader, surface_khr)?;
  let present_mode = get_present_mode(&surface_loader, surface_khr, phys_device, config.vsync)?;
  let size = get_swapchain_extent(&surface_capabilities, get_window_size(window));
  trace!(
    "Swapchain: size={:?}, format={:?}, present_mode={:?}",
    size,
    surface_format,
    present_mode
  );

  // swapchain
  let swapchain_loader = Swapchain::new(&instance, &device);
  let swapchain = create_swapchain_khr(
    &swapchain_loader,
    &SwapchainCreateParams {
      surface_khr,
      surface_format,
      surface_capabilities,
      size,
      present_mode,
      old_swapchain: vk::SwapchainKHR::null(),
    },
  )?;
  let (swapchain_images, swapchain_image_views) =
    create_swapchain_images(&swapchain_loader, swapchain, &device, surface_format.format)?;
  let frames_in_flight = swapchain_images.len();
  info!("Will use {} frames in flight", frames_in_flight);

  // command buffers
  let cmd_pool = create_command_pool(&device, queue_family_index)?;
  let cmd_bufs = create_command_buffers(&device, cmd_pool, frames_in_flight)?;

  // gpu memory allocator
  let allocator = vma::Allocator::new(vma::AllocatorCreateInfo::new(
    &instance,
    &device,
    phys_device,
  ))
  .check("vmaCreateAllocator")?;

  let synchronize = VkCtxSynchronize::new(&device, frames_in_flight)?;

  Ok(VkCtx {
    entry,
    instance,
    allocator: ManuallyDrop::new(allocator),
    swapchain: VkCtxSwapchain {
      swapchain_loader,
      swapchain,
      size,
      surface_format,
      present_mode,
      image_views: swapchain_image_views,
      images: swapchain_images,
    },
    synchronize,
    device: VkCtxDevice {
      phys_device,
      queue_family_index,
      device,
      queue,
      memory_properties,
    },
    command_buffers: VkCtxCommandBuffers {
      pool: cmd_pool,
      cmd_buffers: cmd_bufs,
    },
    surface_loader,
    surface_khr,
    debug_utils,
    one_shot_timeout_ns: config.one_shot_timeout_ns,
    frame_timeout_ns: config.frame_timeout_ns,
  })
}
