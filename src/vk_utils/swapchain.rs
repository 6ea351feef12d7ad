use log::trace;

use ash::extensions::khr::{Surface, Swapchain};
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use super::create_image_view;
use crate::app_error::{AppError, VkResultExt};

/// Gets surface from OS window
pub fn create_surface_khr(
  entry: &ash::Entry,
  instance: &ash::Instance,
  window: &winit::window::Window,
) -> Result<vk::SurfaceKHR, AppError> {
  unsafe {
    ash_window::create_surface(
      entry,
      instance,
      window.raw_display_handle(),
      window.raw_window_handle(),
      None,
    )
  }
  .check("vkCreateSurfaceKHR")
}

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkSurfaceFormatKHR.html
pub fn get_swapchain_format(
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> Result<vk::SurfaceFormatKHR, AppError> {
  let surface_formats =
    unsafe { surface_loader.get_physical_device_surface_formats(phys_device, surface_khr) }
      .check("vkGetPhysicalDeviceSurfaceFormatsKHR")?;

  // https://stackoverflow.com/questions/66401081/vulkan-swapchain-format-unorm-vs-srgb
  let preferred = surface_formats.iter().find(|surface_fmt| {
    let fmt_ok = surface_fmt.format == vk::Format::B8G8R8A8_UNORM;
    let color_space_ok = surface_fmt.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR;
    fmt_ok && color_space_ok
  });

  preferred
    .or_else(|| surface_formats.first())
    .copied()
    .ok_or(AppError::NoSurfaceFormat)
}

pub fn get_surface_capabilities(
  device: vk::PhysicalDevice,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
) -> Result<vk::SurfaceCapabilitiesKHR, AppError> {
  let surface_capabilities =
    unsafe { surface_loader.get_physical_device_surface_capabilities(device, surface_khr) }
      .check("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
  trace!("Surface_capabilities {:?}", surface_capabilities);
  Ok(surface_capabilities)
}

/// Surface either dictates the size, or lets us pick anything in the supported range
pub fn get_swapchain_extent(
  capabilities: &vk::SurfaceCapabilitiesKHR,
  window_size: vk::Extent2D,
) -> vk::Extent2D {
  if capabilities.current_extent.width != u32::MAX {
    return capabilities.current_extent;
  }

  let min = capabilities.min_image_extent;
  let max = capabilities.max_image_extent;
  vk::Extent2D {
    width: window_size.width.clamp(min.width, max.width),
    height: window_size.height.clamp(min.height, max.height),
  }
}

fn get_pre_transform(
  surface_capabilities: &vk::SurfaceCapabilitiesKHR,
) -> vk::SurfaceTransformFlagsKHR {
  // Check if surface supports SurfaceTransformFlagsKHR::IDENTITY
  let can_identity = surface_capabilities
    .supported_transforms
    .contains(vk::SurfaceTransformFlagsKHR::IDENTITY);
  if can_identity {
    vk::SurfaceTransformFlagsKHR::IDENTITY
  } else {
    surface_capabilities.current_transform
  }
}

fn get_image_count(surface_capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
  let wanted = surface_capabilities.min_image_count + 1;
  // max_image_count == 0 means no limit
  match surface_capabilities.max_image_count {
    0 => wanted,
    max => wanted.min(max),
  }
}

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPresentModeKHR.html
/// https://github.com/EmbarkStudios/kajiya/blob/main/crates/lib/kajiya-backend/src/vulkan/swapchain.rs#L85
pub fn get_present_mode(
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
  vsync: bool,
) -> Result<vk::PresentModeKHR, AppError> {
  let present_modes = unsafe {
    surface_loader.get_physical_device_surface_present_modes(phys_device, surface_khr)
  }
  .check("vkGetPhysicalDeviceSurfacePresentModesKHR")?;

  Ok(pick_present_mode(&present_modes, vsync))
}

fn pick_present_mode(present_modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
  let present_mode_preference = if vsync {
    [vk::PresentModeKHR::FIFO_RELAXED, vk::PresentModeKHR::FIFO]
  } else {
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
  };

  present_mode_preference
    .iter()
    .copied()
    .find(|mode| present_modes.contains(mode))
    .unwrap_or(vk::PresentModeKHR::FIFO) // FIFO is guaranteed
}

pub struct SwapchainCreateParams {
  pub surface_khr: vk::SurfaceKHR,
  pub surface_format: vk::SurfaceFormatKHR,
  pub surface_capabilities: vk::SurfaceCapabilitiesKHR,
  pub size: vk::Extent2D,
  pub present_mode: vk::PresentModeKHR,
  /// previous swapchain when recreating, `null` otherwise
  pub old_swapchain: vk::SwapchainKHR,
}

/// TRANSFER_SRC: screenshot reads straight from swapchain image
fn get_swapchain_image_usage(
  surface_capabilities: &vk::SurfaceCapabilitiesKHR,
) -> Result<vk::ImageUsageFlags, AppError> {
  let required = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC;
  let supported = surface_capabilities.supported_usage_flags;
  if supported.contains(required) {
    Ok(required)
  } else {
    Err(AppError::UnsupportedSwapchainUsage {
      required,
      supported,
    })
  }
}

/// Creates OS-dependent swapchain
pub fn create_swapchain_khr(
  swapchain_loader: &Swapchain,
  params: &SwapchainCreateParams,
) -> Result<vk::SwapchainKHR, AppError> {
  let image_usage = get_swapchain_image_usage(&params.surface_capabilities)?;
  let create_info = vk::SwapchainCreateInfoKHR::builder()
    .surface(params.surface_khr)
    .min_image_count(get_image_count(&params.surface_capabilities))
    .image_format(params.surface_format.format)
    .image_color_space(params.surface_format.color_space)
    .image_extent(params.size)
    .image_array_layers(1)
    .image_usage(image_usage)
    .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
    .present_mode(params.present_mode)
    .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
    .pre_transform(get_pre_transform(&params.surface_capabilities))
    .clipped(true)
    .old_swapchain(params.old_swapchain)
    .build();

  let swapchain =
    unsafe { swapchain_loader.create_swapchain(&create_info, None) }.check("vkCreateSwapchainKHR")?;
  trace!("Swapchain created");
  Ok(swapchain)
}

pub fn create_swapchain_images(
  swapchain_loader: &Swapchain,
  swapchain: vk::SwapchainKHR,
  device: &ash::Device,
  image_format: vk::Format,
) -> Result<(Vec<vk::Image>, Vec<vk::ImageView>), AppError> {
  // auto destroyed with swapchain
  let swapchain_images =
    unsafe { swapchain_loader.get_swapchain_images(swapchain) }.check("vkGetSwapchainImagesKHR")?;
  trace!("Will create {} swapchain images", swapchain_images.len());

  let swapchain_image_views = swapchain_images
    .iter()
    .map(|&image| create_image_view(device, image, image_format, vk::ImageAspectFlags::COLOR))
    .collect::<Result<Vec<_>, _>>()?;

  trace!("Swapchain images created");
  Ok((swapchain_images, swapchain_image_views))
}
