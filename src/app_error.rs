use std::path::PathBuf;

use ash::prelude::VkResult;
use ash::vk;
use thiserror::Error;

/// Fatal errors. Anything here ends the render loop.
#[derive(Debug, Error)]
pub enum AppError {
  /// Vulkan call returned something else than `VK_SUCCESS`.
  #[error("{call} failed: {result:?} (VkResult {code}): {result}", code = .result.as_raw())]
  Vk {
    call: &'static str,
    result: vk::Result,
  },

  /// Wait on fence did not finish in the provided time. We treat it as lost device.
  #[error("{call} timed out, assuming the device is lost")]
  DeviceLost { call: &'static str },

  #[error(
    "No memory type matches type bits {type_bits:#b} with properties {required:?}"
  )]
  NoSuitableMemoryType {
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
  },

  #[error("Failed to load Vulkan library: {0}")]
  Loading(#[from] ash::LoadingError),

  #[error("Failed to read shader '{path}': {source}")]
  ShaderLoad {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("No physical device with graphics queue that can present to our window")]
  NoSuitableDevice,

  #[error("Surface does not support any known swapchain format")]
  NoSurfaceFormat,

  #[error("Swapchain images need usage {required:?}, surface supports only {supported:?}")]
  UnsupportedSwapchainUsage {
    required: vk::ImageUsageFlags,
    supported: vk::ImageUsageFlags,
  },
}

impl AppError {
  pub fn vk(call: &'static str, result: vk::Result) -> Self {
    AppError::Vk { call, result }
  }
}

/// Attach call site name to raw `VkResult`.
pub trait VkResultExt<T> {
  fn check(self, call: &'static str) -> Result<T, AppError>;
}

impl<T> VkResultExt<T> for VkResult<T> {
  fn check(self, call: &'static str) -> Result<T, AppError> {
    self.map_err(|result| AppError::vk(call, result))
  }
}

/// Failure of the screenshot capture. Only `Gpu` is fatal.
#[derive(Debug, Error)]
pub enum CaptureError {
  #[error(transparent)]
  Gpu(#[from] AppError),

  #[error("Could not write screenshot to '{path}': {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn vk_error_message_has_call_code_and_description() {
    let err: Result<(), _> = Err::<(), _>(vk::Result::ERROR_DEVICE_LOST).check("vkQueueSubmit");
    let msg = err.unwrap_err().to_string();
    assert!(msg.starts_with("vkQueueSubmit failed"), "{}", msg);
    assert!(msg.contains("ERROR_DEVICE_LOST"), "{}", msg);
    assert!(msg.contains("-4"), "{}", msg);
  }

  #[test]
  fn ok_result_passes_through() {
    let value = Ok::<u32, vk::Result>(7).check("vkAcquireNextImageKHR");
    assert_eq!(value.unwrap(), 7);
  }

  #[test]
  fn io_capture_error_is_not_gpu() {
    let err = CaptureError::Io {
      path: PathBuf::from("screenshot.ppm"),
      source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert!(matches!(err, CaptureError::Io { .. }));
    assert!(err.to_string().contains("screenshot.ppm"));
  }
}
