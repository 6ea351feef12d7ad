use std::path::PathBuf;

use ash::vk;
use glam::{vec3, Vec3};

pub struct Config {
  // window
  pub window_title: String,
  pub window_width: f64,
  pub window_height: f64,
  pub resizable: bool,
  /// how often we refresh fps in window title
  pub fps_title_refresh_secs: f32,
  // vulkan
  pub vsync: bool,
  /// validation layers + debug messenger
  pub graphics_debugging: bool,
  pub log_level: log::LevelFilter,
  // render
  pub clear_color: Vec3,
  pub shader_vert_path: PathBuf,
  pub shader_frag_path: PathBuf,
  // screenshot
  pub screenshot_path: PathBuf,
  /// How long to wait for one-shot command submissions (uploads, screenshot copy)
  pub one_shot_timeout_ns: u64,
  /// How long to wait for acquire/per-slot fences. `u64::MAX` means forever
  pub frame_timeout_ns: u64,
}

impl Config {
  pub const ONE_SHOT_TIMEOUT_NS: u64 = 100_000_000_000;

  pub fn new() -> Config {
    Config {
      // window
      window_title: String::from("Vulkan screenshot"),
      window_width: 1280f64,
      window_height: 720f64,
      resizable: false,
      fps_title_refresh_secs: 1.0,
      // vulkan
      vsync: true,
      graphics_debugging: cfg!(debug_assertions),
      log_level: log::LevelFilter::Info,
      // render
      clear_color: vec3(0.0, 0.0, 0.2),
      shader_vert_path: PathBuf::from("./assets/shaders-compiled/triangle.vert.spv"),
      shader_frag_path: PathBuf::from("./assets/shaders-compiled/triangle.frag.spv"),
      // screenshot
      screenshot_path: PathBuf::from("screenshot.ppm"),
      one_shot_timeout_ns: Self::ONE_SHOT_TIMEOUT_NS,
      frame_timeout_ns: u64::MAX,
    }
  }

  pub fn clear_color(&self) -> vk::ClearValue {
    let cc = self.clear_color;
    vk::ClearValue {
      color: vk::ClearColorValue {
        float32: [cc[0], cc[1], cc[2], 1f32],
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_screenshot_goes_to_working_dir() {
    let cfg = Config::new();
    assert_eq!(cfg.screenshot_path, PathBuf::from("screenshot.ppm"));
    assert_eq!(cfg.one_shot_timeout_ns, 100_000_000_000);
    assert!(!cfg.resizable);
  }

  #[test]
  fn clear_color_is_opaque() {
    let value = Config::new().clear_color();
    let rgba = unsafe { value.color.float32 };
    assert_eq!(rgba, [0.0, 0.0, 0.2, 1.0]);
  }
}
