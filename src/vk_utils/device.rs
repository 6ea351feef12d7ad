use log::{info, trace};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::extensions::{
  ext::DebugUtils,
  khr::{Surface, Swapchain},
};
use ash::vk;
use raw_window_handle::RawDisplayHandle;

use crate::app_error::{AppError, VkResultExt};

fn from_c_str<'a>(s: &'a [c_char]) -> &'a CStr {
  unsafe { CStr::from_ptr(s.as_ptr()) }
}

fn get_app_version() -> u32 {
  let to_u32 = |s: &str| s.parse::<u32>().unwrap_or(0);

  vk::make_api_version(
    0,
    to_u32(env!("CARGO_PKG_VERSION_MAJOR")),
    to_u32(env!("CARGO_PKG_VERSION_MINOR")),
    to_u32(env!("CARGO_PKG_VERSION_PATCH")),
  )
}

const VALIDATION_LAYER: &[u8] = b"VK_LAYER_KHRONOS_validation\0";

fn get_layer_names(graphics_debugging: bool) -> Vec<*const c_char> {
  let mut layer_names = Vec::new();
  if graphics_debugging {
    layer_names.push(VALIDATION_LAYER.as_ptr() as *const c_char);
  }
  layer_names
}

fn get_extension_names(
  display_handle: RawDisplayHandle,
  graphics_debugging: bool,
) -> Result<Vec<*const c_char>, AppError> {
  // surface + platform specific surface
  let mut names = ash_window::enumerate_required_extensions(display_handle)
    .check("vkEnumerateInstanceExtensionProperties")?
    .to_vec();
  if graphics_debugging {
    names.push(DebugUtils::name().as_ptr());
  }
  Ok(names)
}

pub fn create_instance(
  display_handle: RawDisplayHandle,
  graphics_debugging: bool,
) -> Result<(ash::Entry, ash::Instance), AppError> {
  let entry = unsafe { ash::Entry::load()? };

  let app_name = CString::new(env!("CARGO_PKG_NAME")).unwrap_or_default();
  let app_info = vk::ApplicationInfo::builder()
    .application_name(&app_name)
    .application_version(get_app_version())
    .api_version(vk::API_VERSION_1_0)
    .build();

  let layers_names_raw = get_layer_names(graphics_debugging);
  let extension_names_raw = get_extension_names(display_handle, graphics_debugging)?;

  let create_info = vk::InstanceCreateInfo::builder()
    .application_info(&app_info)
    .enabled_layer_names(&layers_names_raw)
    .enabled_extension_names(&extension_names_raw)
    .build();

  let instance = unsafe { entry.create_instance(&create_info, None) }.check("vkCreateInstance")?;

  trace!("Ash instance created");
  Ok((entry, instance))
}

fn find_queue_family(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> Result<Option<u32>, AppError> {
  let q_props = unsafe { instance.get_physical_device_queue_family_properties(phys_device) };

  for (index, q) in q_props.iter().enumerate() {
    let index = index as u32;
    // graphics queue always supports transfer, so blit/copy can go on the same queue
    let is_gfx = q.queue_flags.contains(vk::QueueFlags::GRAPHICS);
    let is_present_support = unsafe {
      surface_loader.get_physical_device_surface_support(phys_device, index, surface_khr)
    }
    .check("vkGetPhysicalDeviceSurfaceSupportKHR")?;

    if is_gfx && is_present_support {
      return Ok(Some(index));
    }
  }

  Ok(None)
}

/// Picks physical device e.g. "GeForce GTX 1050 Ti" and graphic queue family index.
/// Same queue will also be used to present result. Discrete GPUs are preferred.
pub fn pick_physical_device_and_queue_family_idx(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32), AppError> {
  let phys_devices =
    unsafe { instance.enumerate_physical_devices() }.check("vkEnumeratePhysicalDevices")?;
  trace!("Found {} physical devices", phys_devices.len());

  let mut best: Option<(vk::PhysicalDevice, u32, bool)> = None;
  for phys_device in phys_devices {
    let props = unsafe { instance.get_physical_device_properties(phys_device) };
    let is_discrete = props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;

    let queue_idx = find_queue_family(instance, surface_loader, surface_khr, phys_device)?;
    match (queue_idx, best) {
      (Some(idx), None) => best = Some((phys_device, idx, is_discrete)),
      (Some(idx), Some((_, _, false))) if is_discrete => {
        best = Some((phys_device, idx, is_discrete))
      }
      _ => (),
    }
  }

  let (phys_device, queue_family_index, _) = best.ok_or(AppError::NoSuitableDevice)?;
  let props = unsafe { instance.get_physical_device_properties(phys_device) };
  let device_name = from_c_str(&props.device_name);
  info!("Using physical device: {:?}", device_name);
  Ok((phys_device, queue_family_index))
}

/// Pick logical device
pub fn pick_device_and_queue(
  instance: &ash::Instance,
  phys_device: vk::PhysicalDevice,
  queue_family_index: u32,
) -> Result<(ash::Device, vk::Queue), AppError> {
  trace!("Will pick logical device");
  let queue_prio = [1.0f32]; // only one queue
  let queue_create_infos = [vk::DeviceQueueCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .queue_priorities(&queue_prio)
    .build()];

  let device_extension_names_raw = [Swapchain::name().as_ptr()];
  let features = vk::PhysicalDeviceFeatures::default();

  let device_create_info = vk::DeviceCreateInfo::builder()
    .queue_create_infos(&queue_create_infos)
    .enabled_extension_names(&device_extension_names_raw)
    .enabled_features(&features)
    .build();

  let device = unsafe { instance.create_device(phys_device, &device_create_info, None) }
    .check("vkCreateDevice")?;
  trace!("Logical device selected");

  let queue = unsafe { device.get_device_queue(queue_family_index, 0) }; // only one queue created above
  trace!("Queue on logical device selected");

  Ok((device, queue))
}
